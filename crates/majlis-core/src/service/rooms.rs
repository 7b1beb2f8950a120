//! Room directory: group and direct room creation, membership, room lists.

use std::collections::HashMap;

use uuid::Uuid;

use super::Messaging;
use crate::{
  Entity, Error, Result,
  room::{
    ChatRoom, DirectPair, MAX_ROOM_NAME_CHARS, MemberRole, MessagePreview,
    RoomDetail, RoomListing, RoomMember, RoomSummary,
  },
  store::{DirectRoomInsert, MemberInsert, MemberRemoval, MessagingStore},
  validate::bounded_text,
};

impl<S: MessagingStore> Messaging<S> {
  /// Create a group room owned by `creator_id`.
  pub async fn create_group_room(&self, creator_id: Uuid, name: &str) -> Result<ChatRoom> {
    let name = bounded_text("name", name, MAX_ROOM_NAME_CHARS)?;
    self.require_user(creator_id).await?;

    let now = crate::now();
    let room = ChatRoom {
      room_id:      Uuid::new_v4(),
      display_name: name,
      is_group:     true,
      created_at:   now,
    };
    let owner = RoomMember {
      room_id:   room.room_id,
      user_id:   creator_id,
      role:      MemberRole::Owner,
      joined_at: now,
    };

    self
      .store
      .insert_group_room(room.clone(), owner)
      .await
      .map_err(Error::internal)?;
    tracing::debug!(room_id = %room.room_id, %creator_id, "created group room");
    Ok(room)
  }

  /// Return the one direct room between `user_a` and `user_b`, creating it on
  /// first use.
  ///
  /// Argument order does not matter. If a concurrent caller creates the room
  /// between our lookup and our insert, the store reports the conflict and we
  /// return the winner's room instead of a second one.
  pub async fn get_or_create_direct_room(
    &self,
    user_a: Uuid,
    user_b: Uuid,
  ) -> Result<ChatRoom> {
    let pair = DirectPair::new(user_a, user_b)?;

    let mut names = Vec::with_capacity(2);
    for user_id in pair.members() {
      let name = self
        .store
        .user_name(user_id)
        .await
        .map_err(Error::internal)?
        .ok_or(Error::NotFound(Entity::User(user_id)))?;
      names.push(name);
    }

    if let Some(room) = self.store.find_direct_room(pair).await.map_err(Error::internal)? {
      return Ok(room);
    }

    let room = ChatRoom {
      room_id:      Uuid::new_v4(),
      display_name: names.join(", "),
      is_group:     false,
      created_at:   crate::now(),
    };

    match self
      .store
      .insert_direct_room(room, pair)
      .await
      .map_err(Error::internal)?
    {
      DirectRoomInsert::Created(room) => {
        tracing::debug!(room_id = %room.room_id, %pair, "created direct room");
        Ok(room)
      }
      DirectRoomInsert::Exists => {
        tracing::debug!(%pair, "direct room created concurrently, re-reading");
        self
          .store
          .find_direct_room(pair)
          .await
          .map_err(Error::internal)?
          .ok_or_else(|| {
            Error::Conflict(format!("direct room for {pair} missing after conflict"))
          })
      }
    }
  }

  /// Add `user_id` to a group room. `actor_id` must be a member.
  ///
  /// Adding someone who is already a member returns their existing row.
  pub async fn add_member(
    &self,
    room_id: Uuid,
    actor_id: Uuid,
    user_id: Uuid,
  ) -> Result<RoomMember> {
    let room = self.require_room(room_id).await?;
    self.require_member(room_id, actor_id).await?;
    if !room.is_group {
      return Err(direct_room_fixed());
    }
    self.require_user(user_id).await?;

    let member = RoomMember {
      room_id,
      user_id,
      role: MemberRole::Member,
      joined_at: crate::now(),
    };
    match self
      .store
      .insert_member(member)
      .await
      .map_err(Error::internal)?
    {
      MemberInsert::Added(member) => {
        tracing::debug!(%room_id, %actor_id, %user_id, "added room member");
        Ok(member)
      }
      MemberInsert::Existing(member) => Ok(member),
    }
  }

  /// Remove `user_id` from a group room.
  ///
  /// Any member may remove themselves; removing someone else takes the owner.
  /// A group room never drops below one member.
  pub async fn remove_member(&self, room_id: Uuid, actor_id: Uuid, user_id: Uuid) -> Result<()> {
    let room = self.require_room(room_id).await?;
    let actor = self.require_member(room_id, actor_id).await?;
    if !room.is_group {
      return Err(direct_room_fixed());
    }
    if actor_id != user_id && actor.role != MemberRole::Owner {
      return Err(Error::Forbidden);
    }

    match self
      .store
      .delete_member(room_id, user_id)
      .await
      .map_err(Error::internal)?
    {
      MemberRemoval::Removed => {
        tracing::debug!(%room_id, %actor_id, %user_id, "removed room member");
        Ok(())
      }
      MemberRemoval::NotMember => Err(Error::NotFound(Entity::User(user_id))),
      MemberRemoval::LastMember => Err(Error::invalid(
        "user_id",
        "a group room must keep at least one member",
      )),
    }
  }

  /// A room with its members, as seen by `viewer_id`.
  pub async fn get_room(&self, room_id: Uuid, viewer_id: Uuid) -> Result<RoomDetail> {
    let room = self.require_room(room_id).await?;
    self.require_member(room_id, viewer_id).await?;

    let members = self.store.list_members(room_id).await.map_err(Error::internal)?;
    let counterpart = (!room.is_group)
      .then(|| members.iter().map(|m| m.user_id).find(|id| *id != viewer_id))
      .flatten();

    let mut names = NameCache::default();
    let display_name = self.display_name(&room, counterpart, &mut names).await?;
    Ok(RoomDetail { room, display_name, members })
  }

  /// Every room `user_id` belongs to, most recently active first.
  pub async fn list_rooms_for_user(&self, user_id: Uuid) -> Result<Vec<RoomSummary>> {
    let listings = self
      .store
      .list_rooms_for_user(user_id)
      .await
      .map_err(Error::internal)?;

    let mut names = NameCache::default();
    let mut summaries = Vec::with_capacity(listings.len());
    for RoomListing { room, counterpart, last_message } in listings {
      let display_name = self.display_name(&room, counterpart, &mut names).await?;
      let last_message = match last_message {
        Some(m) => Some(MessagePreview {
          sender_name: self.cached_name(m.sender_id, &mut names).await?,
          content:     m.content,
          created_at:  m.created_at,
          sender_id:   m.sender_id,
        }),
        None => None,
      };
      summaries.push(RoomSummary { room, display_name, last_message });
    }
    Ok(summaries)
  }

  /// Group rooms show their stored name. Direct rooms show the counterpart's
  /// current name, falling back to the stored name if it cannot be resolved.
  async fn display_name(
    &self,
    room: &ChatRoom,
    counterpart: Option<Uuid>,
    names: &mut NameCache,
  ) -> Result<String> {
    if room.is_group {
      return Ok(room.display_name.clone());
    }
    let resolved = match counterpart {
      Some(id) => self.cached_name(id, names).await?,
      None => None,
    };
    Ok(resolved.unwrap_or_else(|| room.display_name.clone()))
  }

  async fn cached_name(&self, user_id: Uuid, names: &mut NameCache) -> Result<Option<String>> {
    if let Some(name) = names.get(&user_id) {
      return Ok(name.clone());
    }
    let name = self.store.user_name(user_id).await.map_err(Error::internal)?;
    names.insert(user_id, name.clone());
    Ok(name)
  }
}

type NameCache = HashMap<Uuid, Option<String>>;

fn direct_room_fixed() -> Error {
  Error::invalid("room_id", "direct rooms are fixed at two members")
}
