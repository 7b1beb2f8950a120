//! Notification fan-out and per-recipient read tracking.

use std::collections::BTreeSet;

use uuid::Uuid;

use super::Messaging;
use crate::{
  Entity, Error, Result,
  notification::{
    DEFAULT_INBOX_SIZE, InboxEntry, MAX_BODY_CHARS, MAX_INBOX_SIZE,
    MAX_TITLE_CHARS, NewNotification, Notification, NotificationRecipient,
    Published, Target,
  },
  store::MessagingStore,
  validate::{bounded_text, page_limit},
};

impl<S: MessagingStore> Messaging<S> {
  /// Resolve the target to concrete users and persist the notification with
  /// one unread row per user, all or nothing.
  pub async fn publish(&self, input: NewNotification) -> Result<Published> {
    let title = bounded_text("title", &input.title, MAX_TITLE_CHARS)?;
    let body = bounded_text("body", &input.body, MAX_BODY_CHARS)?;

    let recipients = self.resolve_target(&input.target).await?;
    if recipients.is_empty() {
      return Err(Error::invalid("target", "no recipients"));
    }

    let notification = Notification {
      notification_id: Uuid::new_v4(),
      title,
      body,
      kind: input.kind,
      target: input.target,
      created_at: crate::now(),
    };
    let recipient_count = recipients.len();

    self
      .store
      .insert_notification(notification.clone(), recipients)
      .await
      .map_err(Error::internal)?;
    tracing::info!(
      notification_id = %notification.notification_id,
      target = notification.target.discriminant(),
      recipient_count,
      "published notification"
    );
    Ok(Published { notification, recipient_count })
  }

  /// The deduplicated, sorted set of users a target addresses right now.
  async fn resolve_target(&self, target: &Target) -> Result<Vec<Uuid>> {
    let ids: BTreeSet<Uuid> = match target {
      Target::All => self
        .store
        .all_user_ids()
        .await
        .map_err(Error::internal)?
        .into_iter()
        .collect(),
      Target::Group { group_id } => self
        .store
        .group_members(*group_id)
        .await
        .map_err(Error::internal)?
        .ok_or(Error::NotFound(Entity::Group(*group_id)))?
        .into_iter()
        .collect(),
      Target::Individual { user_ids } => {
        for user_id in user_ids {
          self.require_user(*user_id).await?;
        }
        user_ids.clone()
      }
    };
    Ok(ids.into_iter().collect())
  }

  /// Mark one notification read for `user_id`.
  ///
  /// Idempotent: repeating the call leaves the first `read_at` in place.
  /// A user with no row for this notification gets `NotFound`, whether or not
  /// the notification exists.
  pub async fn mark_read(
    &self,
    notification_id: Uuid,
    user_id: Uuid,
  ) -> Result<NotificationRecipient> {
    self
      .store
      .mark_read(notification_id, user_id, crate::now())
      .await
      .map_err(Error::internal)?
      .ok_or(Error::NotFound(Entity::Notification(notification_id)))
  }

  /// Mark every unread notification of `user_id` read. Returns how many rows
  /// changed.
  pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
    self
      .store
      .mark_all_read(user_id, crate::now())
      .await
      .map_err(Error::internal)
  }

  pub async fn unread_count(&self, user_id: Uuid) -> Result<u64> {
    self.store.unread_count(user_id).await.map_err(Error::internal)
  }

  /// `user_id`'s notifications, newest first.
  pub async fn list_for_user(
    &self,
    user_id: Uuid,
    limit: Option<usize>,
  ) -> Result<Vec<InboxEntry>> {
    let limit = page_limit(limit, DEFAULT_INBOX_SIZE, MAX_INBOX_SIZE);
    self
      .store
      .list_inbox(user_id, limit)
      .await
      .map_err(Error::internal)
  }

  /// Delivery rows of one notification, for audit.
  pub async fn recipients(&self, notification_id: Uuid) -> Result<Vec<NotificationRecipient>> {
    let rows = self
      .store
      .list_recipients(notification_id)
      .await
      .map_err(Error::internal)?;
    if rows.is_empty() {
      return Err(Error::NotFound(Entity::Notification(notification_id)));
    }
    Ok(rows)
  }
}
