//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`),
//! so lexical order in SQL equals chronological order. UUIDs are stored as
//! hyphenated lowercase strings. Notification targets are stored as JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use majlis_core::{
  group::UserGroup,
  message::Message,
  notification::{InboxEntry, Notification, NotificationKind, NotificationRecipient, Target},
  room::{ChatRoom, MemberRole, RoomListing, RoomMember},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── MemberRole ──────────────────────────────────────────────────────────────

pub fn encode_role(role: MemberRole) -> &'static str {
  match role {
    MemberRole::Owner => "owner",
    MemberRole::Member => "member",
  }
}

pub fn decode_role(s: &str) -> Result<MemberRole> {
  match s {
    "owner" => Ok(MemberRole::Owner),
    "member" => Ok(MemberRole::Member),
    other => Err(Error::UnknownValue { column: "role", value: other.to_owned() }),
  }
}

// ─── NotificationKind ────────────────────────────────────────────────────────

pub fn encode_kind(kind: NotificationKind) -> &'static str {
  match kind {
    NotificationKind::Info => "info",
    NotificationKind::Warning => "warning",
    NotificationKind::Success => "success",
    NotificationKind::Error => "error",
  }
}

pub fn decode_kind(s: &str) -> Result<NotificationKind> {
  match s {
    "info" => Ok(NotificationKind::Info),
    "warning" => Ok(NotificationKind::Warning),
    "success" => Ok(NotificationKind::Success),
    "error" => Ok(NotificationKind::Error),
    other => Err(Error::UnknownValue { column: "kind", value: other.to_owned() }),
  }
}

// ─── Target ──────────────────────────────────────────────────────────────────

pub fn encode_target(target: &Target) -> Result<String> {
  Ok(serde_json::to_string(target)?)
}

pub fn decode_target(s: &str) -> Result<Target> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each raw type is read inside a `Connection::call` closure, where only
// `rusqlite::Error` can be raised, and decoded into its domain type outside.
// `from_row` reads the type's columns starting at `at`, in the order given by
// its `COLUMNS` constant.

/// Raw strings read from a `chat_rooms` row.
pub struct RawRoom {
  pub room_id:      String,
  pub display_name: String,
  pub is_group:     bool,
  pub created_at:   String,
}

impl RawRoom {
  pub const COLUMNS: &'static str = "r.room_id, r.display_name, r.is_group, r.created_at";

  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      room_id:      row.get(at)?,
      display_name: row.get(at + 1)?,
      is_group:     row.get(at + 2)?,
      created_at:   row.get(at + 3)?,
    })
  }

  pub fn into_room(self) -> Result<ChatRoom> {
    Ok(ChatRoom {
      room_id:      decode_uuid(&self.room_id)?,
      display_name: self.display_name,
      is_group:     self.is_group,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a `room_members` row.
pub struct RawMember {
  pub room_id:   String,
  pub user_id:   String,
  pub role:      String,
  pub joined_at: String,
}

impl RawMember {
  pub const COLUMNS: &'static str = "room_id, user_id, role, joined_at";

  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      room_id:   row.get(at)?,
      user_id:   row.get(at + 1)?,
      role:      row.get(at + 2)?,
      joined_at: row.get(at + 3)?,
    })
  }

  pub fn into_member(self) -> Result<RoomMember> {
    Ok(RoomMember {
      room_id:   decode_uuid(&self.room_id)?,
      user_id:   decode_uuid(&self.user_id)?,
      role:      decode_role(&self.role)?,
      joined_at: decode_dt(&self.joined_at)?,
    })
  }
}

/// Raw values read from a `messages` row.
pub struct RawMessage {
  pub message_id: i64,
  pub room_id:    String,
  pub sender_id:  String,
  pub content:    String,
  pub created_at: String,
}

impl RawMessage {
  pub const COLUMNS: &'static str = "m.message_id, m.room_id, m.sender_id, m.content, m.created_at";

  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id: row.get(at)?,
      room_id:    row.get(at + 1)?,
      sender_id:  row.get(at + 2)?,
      content:    row.get(at + 3)?,
      created_at: row.get(at + 4)?,
    })
  }

  /// Like [`from_row`](Self::from_row), for a LEFT JOIN that may have matched
  /// nothing.
  pub fn from_optional_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Option<Self>> {
    let message_id: Option<i64> = row.get(at)?;
    match message_id {
      Some(_) => Self::from_row(row, at).map(Some),
      None => Ok(None),
    }
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id: self.message_id,
      room_id:    decode_uuid(&self.room_id)?,
      sender_id:  decode_uuid(&self.sender_id)?,
      content:    self.content,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A room-list row: the room, the other member of a direct room, and the
/// room's newest message.
pub struct RawRoomListing {
  pub room:         RawRoom,
  pub counterpart:  Option<String>,
  pub last_message: Option<RawMessage>,
}

impl RawRoomListing {
  pub fn into_listing(self) -> Result<RoomListing> {
    Ok(RoomListing {
      room:         self.room.into_room()?,
      counterpart:  self.counterpart.as_deref().map(decode_uuid).transpose()?,
      last_message: self.last_message.map(RawMessage::into_message).transpose()?,
    })
  }
}

/// Raw strings read from a `user_groups` row.
pub struct RawGroup {
  pub group_id:    String,
  pub name:        String,
  pub description: Option<String>,
  pub created_at:  String,
}

impl RawGroup {
  pub const COLUMNS: &'static str = "group_id, name, description, created_at";

  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      group_id:    row.get(at)?,
      name:        row.get(at + 1)?,
      description: row.get(at + 2)?,
      created_at:  row.get(at + 3)?,
    })
  }

  pub fn into_group(self) -> Result<UserGroup> {
    Ok(UserGroup {
      group_id:    decode_uuid(&self.group_id)?,
      name:        self.name,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub title:           String,
  pub body:            String,
  pub kind:            String,
  pub target_json:     String,
  pub created_at:      String,
}

impl RawNotification {
  pub const COLUMNS: &'static str =
    "n.notification_id, n.title, n.body, n.kind, n.target_json, n.created_at";

  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(at)?,
      title:           row.get(at + 1)?,
      body:            row.get(at + 2)?,
      kind:            row.get(at + 3)?,
      target_json:     row.get(at + 4)?,
      created_at:      row.get(at + 5)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      title:           self.title,
      body:            self.body,
      kind:            decode_kind(&self.kind)?,
      target:          decode_target(&self.target_json)?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from a `notification_recipients` row.
pub struct RawRecipient {
  pub recipient_id:    String,
  pub notification_id: String,
  pub user_id:         String,
  pub is_read:         bool,
  pub read_at:         Option<String>,
}

impl RawRecipient {
  pub const COLUMNS: &'static str = "recipient_id, notification_id, user_id, is_read, read_at";

  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      recipient_id:    row.get(at)?,
      notification_id: row.get(at + 1)?,
      user_id:         row.get(at + 2)?,
      is_read:         row.get(at + 3)?,
      read_at:         row.get(at + 4)?,
    })
  }

  pub fn into_recipient(self) -> Result<NotificationRecipient> {
    Ok(NotificationRecipient {
      recipient_id:    decode_uuid(&self.recipient_id)?,
      notification_id: decode_uuid(&self.notification_id)?,
      user_id:         decode_uuid(&self.user_id)?,
      is_read:         self.is_read,
      read_at:         self.read_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// A notification joined with one user's read state.
pub struct RawInboxEntry {
  pub notification: RawNotification,
  pub is_read:      bool,
  pub read_at:      Option<String>,
}

impl RawInboxEntry {
  pub fn into_entry(self) -> Result<InboxEntry> {
    Ok(InboxEntry {
      notification: self.notification.into_notification()?,
      is_read:      self.is_read,
      read_at:      self.read_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
