//! Messages: the append-only per-room log.
//!
//! Messages are never updated or deleted. Within a room they are totally
//! ordered by `(created_at, message_id)`; the surrogate id breaks ties between
//! messages stamped in the same instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_MESSAGE_CHARS: usize = 1_000;
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  /// Monotonically increasing, assigned by the store.
  pub message_id: i64,
  pub room_id:    Uuid,
  pub sender_id:  Uuid,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}

/// A message as handed to the store, before it has an id.
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub room_id:    Uuid,
  pub sender_id:  Uuid,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}

/// Parameters for [`Messaging::list_messages`](crate::Messaging::list_messages).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MessageQuery {
  /// Defaults to [`DEFAULT_PAGE_SIZE`]; capped at [`MAX_PAGE_SIZE`].
  pub limit:  Option<usize>,
  /// Only return messages strictly older than this one.
  pub before: Option<i64>,
}

/// A position in a room's `(created_at, message_id)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MessageCursor {
  pub created_at: DateTime<Utc>,
  pub message_id: i64,
}

impl From<&Message> for MessageCursor {
  fn from(m: &Message) -> Self {
    Self { created_at: m.created_at, message_id: m.message_id }
  }
}
