//! Error types for `majlis-core`.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// The kind of record an operation failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
  User(Uuid),
  Room(Uuid),
  Message(i64),
  Group(Uuid),
  Notification(Uuid),
}

impl fmt::Display for Entity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Entity::User(id) => write!(f, "user {id}"),
      Entity::Room(id) => write!(f, "room {id}"),
      Entity::Message(id) => write!(f, "message {id}"),
      Entity::Group(id) => write!(f, "group {id}"),
      Entity::Notification(id) => write!(f, "notification {id}"),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  /// The request is malformed: a length bound, an empty field, a
  /// self-targeting pair, or a membership change on a direct room.
  #[error("invalid {field}: {reason}")]
  InvalidInput { field: &'static str, reason: String },

  #[error("{0} not found")]
  NotFound(Entity),

  /// The caller is authenticated but may not touch this room or resource.
  #[error("forbidden")]
  Forbidden,

  /// A uniqueness race that could not be recovered. Never expected to reach
  /// a caller; the direct-room path re-reads on conflict.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("storage failure: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
    Error::InvalidInput { field, reason: reason.into() }
  }

  /// Wrap a storage backend error. Used with `map_err` at every port call.
  pub fn internal<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Internal(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
