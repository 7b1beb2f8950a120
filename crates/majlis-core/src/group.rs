//! User groups: named sets of users used as notification targets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_GROUP_NAME_CHARS: usize = 120;
pub const MAX_GROUP_DESCRIPTION_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
  pub group_id:    Uuid,
  pub name:        String,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// A group together with its current member ids, sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDetail {
  pub group:      UserGroup,
  pub member_ids: Vec<Uuid>,
}

/// Input for creating a group or replacing an existing one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupInput {
  pub name:        String,
  pub description: Option<String>,
  #[serde(default)]
  pub member_ids:  Vec<Uuid>,
}
