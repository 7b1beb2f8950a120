//! Users as seen from the messaging core.
//!
//! Users are owned by the identity module. The core only ever reads them
//! through [`MessagingStore`](crate::store::MessagingStore); it never creates,
//! renames, or deletes one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id: Uuid,
  pub name:    String,
  pub email:   String,
}
