//! Group directory: the named user sets notifications can target.

use std::collections::BTreeSet;

use uuid::Uuid;

use super::Messaging;
use crate::{
  Entity, Error, Result,
  group::{
    GroupDetail, GroupInput, MAX_GROUP_DESCRIPTION_CHARS, MAX_GROUP_NAME_CHARS,
    UserGroup,
  },
  store::MessagingStore,
  validate::bounded_text,
};

/// A validated [`GroupInput`].
struct GroupFields {
  name:        String,
  description: Option<String>,
  member_ids:  Vec<Uuid>,
}

impl<S: MessagingStore> Messaging<S> {
  pub async fn create_group(&self, input: GroupInput) -> Result<GroupDetail> {
    let fields = self.validate_group(input).await?;
    let group = UserGroup {
      group_id:    Uuid::new_v4(),
      name:        fields.name,
      description: fields.description,
      created_at:  crate::now(),
    };

    self
      .store
      .insert_group(group.clone(), fields.member_ids.clone())
      .await
      .map_err(Error::internal)?;
    tracing::debug!(group_id = %group.group_id, members = fields.member_ids.len(), "created group");
    Ok(GroupDetail { group, member_ids: fields.member_ids })
  }

  /// Replace a group's name, description, and entire membership.
  pub async fn update_group(&self, group_id: Uuid, input: GroupInput) -> Result<GroupDetail> {
    let fields = self.validate_group(input).await?;
    let existing = self
      .store
      .get_group(group_id)
      .await
      .map_err(Error::internal)?
      .ok_or(Error::NotFound(Entity::Group(group_id)))?;

    let group = UserGroup {
      name: fields.name,
      description: fields.description,
      ..existing.group
    };
    let replaced = self
      .store
      .replace_group(group.clone(), fields.member_ids.clone())
      .await
      .map_err(Error::internal)?;
    if !replaced {
      return Err(Error::NotFound(Entity::Group(group_id)));
    }
    tracing::debug!(%group_id, members = fields.member_ids.len(), "replaced group membership");
    Ok(GroupDetail { group, member_ids: fields.member_ids })
  }

  pub async fn delete_group(&self, group_id: Uuid) -> Result<()> {
    if self.store.delete_group(group_id).await.map_err(Error::internal)? {
      Ok(())
    } else {
      Err(Error::NotFound(Entity::Group(group_id)))
    }
  }

  pub async fn get_group(&self, group_id: Uuid) -> Result<GroupDetail> {
    self
      .store
      .get_group(group_id)
      .await
      .map_err(Error::internal)?
      .ok_or(Error::NotFound(Entity::Group(group_id)))
  }

  pub async fn list_groups(&self) -> Result<Vec<UserGroup>> {
    self.store.list_groups().await.map_err(Error::internal)
  }

  async fn validate_group(&self, input: GroupInput) -> Result<GroupFields> {
    let name = bounded_text("name", &input.name, MAX_GROUP_NAME_CHARS)?;
    let description = match input.description.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(d) => Some(bounded_text("description", d, MAX_GROUP_DESCRIPTION_CHARS)?),
    };

    let member_ids: BTreeSet<Uuid> = input.member_ids.into_iter().collect();
    for user_id in &member_ids {
      self.require_user(*user_id).await?;
    }

    Ok(GroupFields { name, description, member_ids: member_ids.into_iter().collect() })
  }
}
