//! Chat rooms and their memberships.
//!
//! A group room has a free-form name and one or more members. A direct room
//! has exactly two members, fixed at creation; its stored name is only a
//! fallback and the name shown to a viewer is the counterpart's current user
//! name.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, message::Message};

pub const MAX_ROOM_NAME_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
  Owner,
  Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRoom {
  pub room_id:      Uuid,
  /// Authoritative for group rooms, a fallback for direct rooms.
  pub display_name: String,
  pub is_group:     bool,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMember {
  pub room_id:   Uuid,
  pub user_id:   Uuid,
  pub role:      MemberRole,
  pub joined_at: DateTime<Utc>,
}

// ─── Direct pairs ────────────────────────────────────────────────────────────

/// An unordered pair of distinct users, normalised so `low < high`.
///
/// `(a, b)` and `(b, a)` produce the same pair and therefore the same
/// [`key`](Self::key), which storage backends hold unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectPair {
  low:  Uuid,
  high: Uuid,
}

impl DirectPair {
  pub fn new(a: Uuid, b: Uuid) -> Result<Self> {
    if a == b {
      return Err(Error::invalid(
        "user_id",
        "cannot open a direct room with yourself",
      ));
    }
    Ok(if a < b { Self { low: a, high: b } } else { Self { low: b, high: a } })
  }

  pub fn low(&self) -> Uuid { self.low }

  pub fn high(&self) -> Uuid { self.high }

  pub fn members(&self) -> [Uuid; 2] { [self.low, self.high] }

  /// The storage key for this pair, `"<low>:<high>"`.
  pub fn key(&self) -> String { format!("{}:{}", self.low, self.high) }
}

impl fmt::Display for DirectPair {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.low, self.high)
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// What a storage backend returns for each room in a user's room list, before
/// display names are resolved.
#[derive(Debug, Clone)]
pub struct RoomListing {
  pub room:         ChatRoom,
  /// The other member of a direct room; `None` for group rooms.
  pub counterpart:  Option<Uuid>,
  pub last_message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePreview {
  pub content:     String,
  pub created_at:  DateTime<Utc>,
  pub sender_id:   Uuid,
  pub sender_name: Option<String>,
}

/// One entry of `list_rooms_for_user`, with the display name resolved for the
/// viewing user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummary {
  pub room:         ChatRoom,
  pub display_name: String,
  pub last_message: Option<MessagePreview>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetail {
  pub room:         ChatRoom,
  pub display_name: String,
  pub members:      Vec<RoomMember>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pair_is_order_independent() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let ab = DirectPair::new(a, b).unwrap();
    let ba = DirectPair::new(b, a).unwrap();
    assert_eq!(ab, ba);
    assert_eq!(ab.key(), ba.key());
    assert!(ab.low() < ab.high());
  }

  #[test]
  fn pair_rejects_self() {
    let a = Uuid::new_v4();
    assert!(matches!(
      DirectPair::new(a, a),
      Err(Error::InvalidInput { field: "user_id", .. })
    ));
  }
}
