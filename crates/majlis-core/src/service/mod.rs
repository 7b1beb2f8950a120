//! [`Messaging`]: every room, message, group, and notification operation,
//! written against any [`MessagingStore`].
//!
//! Identity is explicit: each operation takes the acting user's id as a
//! parameter. The transport layer is responsible for making sure that id is
//! the authenticated caller.

mod groups;
mod messages;
mod notifications;
mod rooms;

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Entity, Error, Result,
  room::{ChatRoom, RoomMember},
  store::MessagingStore,
};

pub struct Messaging<S> {
  store: Arc<S>,
}

impl<S> Clone for Messaging<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: MessagingStore> Messaging<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  async fn require_user(&self, user_id: Uuid) -> Result<()> {
    if self.store.user_exists(user_id).await.map_err(Error::internal)? {
      Ok(())
    } else {
      Err(Error::NotFound(Entity::User(user_id)))
    }
  }

  async fn require_room(&self, room_id: Uuid) -> Result<ChatRoom> {
    self
      .store
      .get_room(room_id)
      .await
      .map_err(Error::internal)?
      .ok_or(Error::NotFound(Entity::Room(room_id)))
  }

  /// The caller's membership, or `Forbidden` without saying why.
  async fn require_member(&self, room_id: Uuid, user_id: Uuid) -> Result<RoomMember> {
    self
      .store
      .get_member(room_id, user_id)
      .await
      .map_err(Error::internal)?
      .ok_or(Error::Forbidden)
  }
}
