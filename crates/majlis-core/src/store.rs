//! The `MessagingStore` trait and the outcome types its writes report.
//!
//! The trait is implemented by storage backends (e.g. `majlis-store-sqlite`).
//! [`Messaging`](crate::Messaging) is written against this abstraction, never
//! against a concrete backend.
//!
//! Every method that writes more than one row must do so atomically: either
//! all rows become visible or none do.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  group::{GroupDetail, UserGroup},
  message::{Message, MessageCursor, NewMessage},
  notification::{InboxEntry, Notification, NotificationRecipient},
  room::{ChatRoom, DirectPair, RoomListing, RoomMember},
};

// ─── Write outcomes ──────────────────────────────────────────────────────────

/// Result of [`MessagingStore::insert_direct_room`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectRoomInsert {
  /// The room and both memberships were committed.
  Created(ChatRoom),
  /// A direct room for the pair already exists; nothing was written.
  Exists,
}

/// Result of [`MessagingStore::insert_member`]. Both variants carry the row
/// as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberInsert {
  Added(RoomMember),
  /// The user already belonged to the room; the existing row is unchanged.
  Existing(RoomMember),
}

/// Result of [`MessagingStore::delete_member`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRemoval {
  Removed,
  NotMember,
  /// The user is the room's only member; nothing was written.
  LastMember,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Majlis storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait MessagingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identity directory (read-only) ────────────────────────────────────

  fn user_exists(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The user's current display name, or `None` if the user is unknown.
  fn user_name(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  fn all_user_ids(
    &self,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  fn insert_group(
    &self,
    group: UserGroup,
    member_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Overwrite a group's name and description and replace its membership in
  /// one transaction. Readers see either the old member set or the new one.
  /// Returns `false` if the group does not exist.
  fn replace_group(
    &self,
    group: UserGroup,
    member_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns `false` if the group does not exist.
  fn delete_group(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_group(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Option<GroupDetail>, Self::Error>> + Send + '_;

  fn list_groups(
    &self,
  ) -> impl Future<Output = Result<Vec<UserGroup>, Self::Error>> + Send + '_;

  /// Current member ids of a group, or `None` if the group does not exist.
  fn group_members(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Option<Vec<Uuid>>, Self::Error>> + Send + '_;

  // ── Rooms ─────────────────────────────────────────────────────────────

  /// Persist a group room together with its owner membership.
  fn insert_group_room(
    &self,
    room: ChatRoom,
    owner: RoomMember,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn find_direct_room(
    &self,
    pair: DirectPair,
  ) -> impl Future<Output = Result<Option<ChatRoom>, Self::Error>> + Send + '_;

  /// Persist a direct room and both memberships, unless a room for `pair`
  /// already exists. The existence check and the insert must be atomic with
  /// respect to a concurrent insert for the same pair.
  fn insert_direct_room(
    &self,
    room: ChatRoom,
    pair: DirectPair,
  ) -> impl Future<Output = Result<DirectRoomInsert, Self::Error>> + Send + '_;

  fn get_room(
    &self,
    room_id: Uuid,
  ) -> impl Future<Output = Result<Option<ChatRoom>, Self::Error>> + Send + '_;

  fn get_member(
    &self,
    room_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<RoomMember>, Self::Error>> + Send + '_;

  /// Members in join order.
  fn list_members(
    &self,
    room_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RoomMember>, Self::Error>> + Send + '_;

  /// Insert a membership unless the user already has one in that room. The
  /// check and the insert must be atomic with respect to a concurrent insert
  /// of the same membership.
  fn insert_member(
    &self,
    member: RoomMember,
  ) -> impl Future<Output = Result<MemberInsert, Self::Error>> + Send + '_;

  /// Remove a membership, refusing to remove a room's last member.
  fn delete_member(
    &self,
    room_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<MemberRemoval, Self::Error>> + Send + '_;

  /// Every room `user_id` belongs to, most recently active first. Activity is
  /// the newest message's timestamp, or the room's creation time if empty.
  fn list_rooms_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RoomListing>, Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  /// Append a message if, and only if, the sender is a member of the room at
  /// the moment of insertion. Returns `None` (and writes nothing) otherwise.
  fn insert_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Option<Message>, Self::Error>> + Send + '_;

  fn get_message(
    &self,
    room_id: Uuid,
    message_id: i64,
  ) -> impl Future<Output = Result<Option<Message>, Self::Error>> + Send + '_;

  /// Up to `limit` messages strictly before `before` (or the newest, if
  /// `None`), returned oldest first.
  fn list_messages(
    &self,
    room_id: Uuid,
    before: Option<MessageCursor>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  /// Persist a notification and one unread recipient row per user id, all in
  /// one transaction.
  fn insert_notification(
    &self,
    notification: Notification,
    recipients: Vec<Uuid>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Mark the user's row read, keeping any existing `read_at`. Returns the
  /// row after the update, or `None` if the user has no row.
  fn mark_read(
    &self,
    notification_id: Uuid,
    user_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<NotificationRecipient>, Self::Error>>
  + Send
  + '_;

  /// Mark every unread row of the user read at `at`. Returns how many rows
  /// changed.
  fn mark_all_read(
    &self,
    user_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn unread_count(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// The user's notifications, newest first.
  fn list_inbox(
    &self,
    user_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<InboxEntry>, Self::Error>> + Send + '_;

  /// All recipient rows of one notification. Empty if it does not exist.
  fn list_recipients(
    &self,
    notification_id: Uuid,
  ) -> impl Future<Output = Result<Vec<NotificationRecipient>, Self::Error>>
  + Send
  + '_;
}
