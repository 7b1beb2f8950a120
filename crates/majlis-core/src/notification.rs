//! Notifications and their per-recipient read state.
//!
//! A notification is immutable once published. Its [`Target`] is kept for
//! audit, but recipients are resolved exactly once, at publish time, into
//! [`NotificationRecipient`] rows. Later changes to a group never change who
//! received a past notification.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_BODY_CHARS: usize = 2_000;
pub const DEFAULT_INBOX_SIZE: usize = 50;
pub const MAX_INBOX_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
  #[default]
  Info,
  Warning,
  Success,
  Error,
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
  /// Every user that exists at publish time.
  All,
  /// The members of a group at publish time.
  Group { group_id: Uuid },
  /// An explicit set of users; each must exist.
  Individual { user_ids: BTreeSet<Uuid> },
}

impl Target {
  pub fn discriminant(&self) -> &'static str {
    match self {
      Target::All => "all",
      Target::Group { .. } => "group",
      Target::Individual { .. } => "individual",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub title:           String,
  pub body:            String,
  pub kind:            NotificationKind,
  pub target:          Target,
  pub created_at:      DateTime<Utc>,
}

/// Input for [`Messaging::publish`](crate::Messaging::publish).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
  pub title:  String,
  pub body:   String,
  #[serde(default)]
  pub kind:   NotificationKind,
  pub target: Target,
}

/// One user's delivery row for one notification.
///
/// Read state only moves `unread → read`; `read_at` is set by the first
/// `mark_read` and never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecipient {
  pub recipient_id:    Uuid,
  pub notification_id: Uuid,
  pub user_id:         Uuid,
  pub is_read:         bool,
  pub read_at:         Option<DateTime<Utc>>,
}

/// A notification as it appears in one user's inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxEntry {
  pub notification: Notification,
  pub is_read:      bool,
  pub read_at:      Option<DateTime<Utc>>,
}

/// The result of a successful publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Published {
  pub notification:    Notification,
  pub recipient_count: usize,
}
