//! Message log: membership-gated append and paginated reads.

use uuid::Uuid;

use super::Messaging;
use crate::{
  Entity, Error, Result,
  message::{
    DEFAULT_PAGE_SIZE, MAX_MESSAGE_CHARS, MAX_PAGE_SIZE, Message, MessageCursor,
    MessageQuery, NewMessage,
  },
  store::MessagingStore,
  validate::{bounded_text, page_limit},
};

impl<S: MessagingStore> Messaging<S> {
  /// Append a message to a room.
  ///
  /// The sender must be a member at the moment of insertion. A rejected post
  /// writes nothing.
  pub async fn post_message(
    &self,
    room_id: Uuid,
    sender_id: Uuid,
    content: &str,
  ) -> Result<Message> {
    let content = bounded_text("content", content, MAX_MESSAGE_CHARS)?;
    self.require_room(room_id).await?;

    let input = NewMessage { room_id, sender_id, content, created_at: crate::now() };
    self
      .store
      .insert_message(input)
      .await
      .map_err(Error::internal)?
      .ok_or(Error::Forbidden)
  }

  /// A page of a room's messages, oldest first.
  ///
  /// With `before`, only messages strictly older than that message are
  /// returned, so paging backwards is a matter of passing the first id of the
  /// previous page.
  pub async fn list_messages(
    &self,
    room_id: Uuid,
    viewer_id: Uuid,
    query: MessageQuery,
  ) -> Result<Vec<Message>> {
    self.require_room(room_id).await?;
    self.require_member(room_id, viewer_id).await?;

    let before = match query.before {
      Some(message_id) => {
        let anchor = self
          .store
          .get_message(room_id, message_id)
          .await
          .map_err(Error::internal)?
          .ok_or(Error::NotFound(Entity::Message(message_id)))?;
        Some(MessageCursor::from(&anchor))
      }
      None => None,
    };

    let limit = page_limit(query.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    self
      .store
      .list_messages(room_id, before, limit)
      .await
      .map_err(Error::internal)
  }
}
