//! [`SqliteStore`], the SQLite implementation of [`MessagingStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use majlis_core::{
  group::{GroupDetail, UserGroup},
  message::{Message, MessageCursor, NewMessage},
  notification::{InboxEntry, Notification, NotificationRecipient},
  room::{ChatRoom, DirectPair, MemberRole, RoomListing, RoomMember},
  store::{DirectRoomInsert, MemberInsert, MemberRemoval, MessagingStore},
  user::User,
};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    RawGroup, RawMember, RawMessage, RawNotification, RawRoom, decode_uuid,
    encode_dt, encode_kind, encode_role, encode_target, encode_uuid,
  },
  schema::SCHEMA,
  sql::{self, Removal},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Majlis store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls are
/// serialised on the connection's thread; uniqueness constraints and
/// transactions provide the cross-call guarantees.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Register a user, or update the name and email of an existing one.
  ///
  /// This is the identity module's write path; the messaging core never calls
  /// it.
  pub async fn upsert_user(&self, user: &User) -> Result<()> {
    let id_str = encode_uuid(user.user_id);
    let name = user.name.clone();
    let email = user.email.clone();
    let at_str = encode_dt(majlis_core::now());

    self
      .conn
      .call(move |conn| Ok(sql::upsert_user(conn, &id_str, &name, &email, &at_str)?))
      .await?;
    Ok(())
  }
}

#[cfg(test)]
impl SqliteStore {
  /// How many `notifications` rows carry this id, read directly rather than
  /// through the recipient join.
  pub(crate) async fn notification_rows(&self, notification_id: Uuid) -> Result<i64> {
    let id_str = encode_uuid(notification_id);
    let count = self
      .conn
      .call(move |conn| Ok(sql::notification_rows(conn, &id_str)?))
      .await?;
    Ok(count)
  }
}

fn raw_room(room: &ChatRoom) -> RawRoom {
  RawRoom {
    room_id:      encode_uuid(room.room_id),
    display_name: room.display_name.clone(),
    is_group:     room.is_group,
    created_at:   encode_dt(room.created_at),
  }
}

fn raw_member(member: &RoomMember) -> RawMember {
  RawMember {
    room_id:   encode_uuid(member.room_id),
    user_id:   encode_uuid(member.user_id),
    role:      encode_role(member.role).to_owned(),
    joined_at: encode_dt(member.joined_at),
  }
}

fn raw_group(group: &UserGroup) -> RawGroup {
  RawGroup {
    group_id:    encode_uuid(group.group_id),
    name:        group.name.clone(),
    description: group.description.clone(),
    created_at:  encode_dt(group.created_at),
  }
}

fn encode_ids(ids: &[Uuid]) -> Vec<String> { ids.iter().copied().map(encode_uuid).collect() }

// ─── MessagingStore impl ─────────────────────────────────────────────────────

impl MessagingStore for SqliteStore {
  type Error = crate::Error;

  // ── Identity directory ────────────────────────────────────────────────────

  async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
    Ok(self.user_name(user_id).await?.is_some())
  }

  async fn user_name(&self, user_id: Uuid) -> Result<Option<String>> {
    let id_str = encode_uuid(user_id);
    let name = self
      .conn
      .call(move |conn| Ok(sql::user_name(conn, &id_str)?))
      .await?;
    Ok(name)
  }

  async fn all_user_ids(&self) -> Result<Vec<Uuid>> {
    let ids = self.conn.call(|conn| Ok(sql::all_user_ids(conn)?)).await?;
    ids.iter().map(|s| decode_uuid(s)).collect()
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn insert_group(&self, group: UserGroup, member_ids: Vec<Uuid>) -> Result<()> {
    let raw = raw_group(&group);
    let members = encode_ids(&member_ids);

    self
      .conn
      .call(move |conn| Ok(sql::insert_group(conn, &raw, &members)?))
      .await?;
    Ok(())
  }

  async fn replace_group(&self, group: UserGroup, member_ids: Vec<Uuid>) -> Result<bool> {
    let raw = raw_group(&group);
    let members = encode_ids(&member_ids);

    let replaced = self
      .conn
      .call(move |conn| Ok(sql::replace_group(conn, &raw, &members)?))
      .await?;
    Ok(replaced)
  }

  async fn delete_group(&self, group_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(group_id);
    let deleted = self
      .conn
      .call(move |conn| Ok(sql::delete_group(conn, &id_str)?))
      .await?;
    Ok(deleted)
  }

  async fn get_group(&self, group_id: Uuid) -> Result<Option<GroupDetail>> {
    let id_str = encode_uuid(group_id);

    let raw = self
      .conn
      .call(move |conn| {
        let Some(group) = sql::get_group(conn, &id_str)? else {
          return Ok(None);
        };
        let members = sql::group_members(conn, &id_str)?.unwrap_or_default();
        Ok(Some((group, members)))
      })
      .await?;

    raw
      .map(|(group, members)| {
        Ok(GroupDetail {
          group:      group.into_group()?,
          member_ids: members.iter().map(|s| decode_uuid(s)).collect::<Result<_>>()?,
        })
      })
      .transpose()
  }

  async fn list_groups(&self) -> Result<Vec<UserGroup>> {
    let raws = self.conn.call(|conn| Ok(sql::list_groups(conn)?)).await?;
    raws.into_iter().map(RawGroup::into_group).collect()
  }

  async fn group_members(&self, group_id: Uuid) -> Result<Option<Vec<Uuid>>> {
    let id_str = encode_uuid(group_id);
    let ids = self
      .conn
      .call(move |conn| Ok(sql::group_members(conn, &id_str)?))
      .await?;
    ids
      .map(|ids| ids.iter().map(|s| decode_uuid(s)).collect())
      .transpose()
  }

  // ── Rooms ─────────────────────────────────────────────────────────────────

  async fn insert_group_room(&self, room: ChatRoom, owner: RoomMember) -> Result<()> {
    let raw = raw_room(&room);
    let owner = raw_member(&owner);

    self
      .conn
      .call(move |conn| Ok(sql::insert_group_room(conn, &raw, &owner)?))
      .await?;
    Ok(())
  }

  async fn find_direct_room(&self, pair: DirectPair) -> Result<Option<ChatRoom>> {
    let key = pair.key();
    let raw = self
      .conn
      .call(move |conn| Ok(sql::find_direct_room(conn, &key)?))
      .await?;
    raw.map(RawRoom::into_room).transpose()
  }

  async fn insert_direct_room(&self, room: ChatRoom, pair: DirectPair) -> Result<DirectRoomInsert> {
    let raw = raw_room(&room);
    let key = pair.key();
    let members = pair.members().map(|user_id| {
      raw_member(&RoomMember {
        room_id: room.room_id,
        user_id,
        role: MemberRole::Member,
        joined_at: room.created_at,
      })
    });

    let created = self
      .conn
      .call(move |conn| Ok(sql::insert_direct_room(conn, &raw, &key, &members)?))
      .await?;

    if created {
      Ok(DirectRoomInsert::Created(room))
    } else {
      tracing::debug!(%pair, "direct room key already taken");
      Ok(DirectRoomInsert::Exists)
    }
  }

  async fn get_room(&self, room_id: Uuid) -> Result<Option<ChatRoom>> {
    let id_str = encode_uuid(room_id);
    let raw = self
      .conn
      .call(move |conn| Ok(sql::get_room(conn, &id_str)?))
      .await?;
    raw.map(RawRoom::into_room).transpose()
  }

  async fn get_member(&self, room_id: Uuid, user_id: Uuid) -> Result<Option<RoomMember>> {
    let room_str = encode_uuid(room_id);
    let user_str = encode_uuid(user_id);
    let raw = self
      .conn
      .call(move |conn| Ok(sql::get_member(conn, &room_str, &user_str)?))
      .await?;
    raw.map(RawMember::into_member).transpose()
  }

  async fn list_members(&self, room_id: Uuid) -> Result<Vec<RoomMember>> {
    let id_str = encode_uuid(room_id);
    let raws = self
      .conn
      .call(move |conn| Ok(sql::list_members(conn, &id_str)?))
      .await?;
    raws.into_iter().map(RawMember::into_member).collect()
  }

  async fn insert_member(&self, member: RoomMember) -> Result<MemberInsert> {
    let raw = raw_member(&member);
    let (inserted, stored) = self
      .conn
      .call(move |conn| Ok(sql::insert_member_if_absent(conn, &raw)?))
      .await?;

    let stored = stored.into_member()?;
    Ok(if inserted { MemberInsert::Added(stored) } else { MemberInsert::Existing(stored) })
  }

  async fn delete_member(&self, room_id: Uuid, user_id: Uuid) -> Result<MemberRemoval> {
    let room_str = encode_uuid(room_id);
    let user_str = encode_uuid(user_id);
    let removal = self
      .conn
      .call(move |conn| Ok(sql::delete_member(conn, &room_str, &user_str)?))
      .await?;

    Ok(match removal {
      Removal::Removed => MemberRemoval::Removed,
      Removal::NotMember => MemberRemoval::NotMember,
      Removal::LastMember => MemberRemoval::LastMember,
    })
  }

  async fn list_rooms_for_user(&self, user_id: Uuid) -> Result<Vec<RoomListing>> {
    let id_str = encode_uuid(user_id);
    let raws = self
      .conn
      .call(move |conn| Ok(sql::list_rooms_for_user(conn, &id_str)?))
      .await?;
    raws.into_iter().map(|raw| raw.into_listing()).collect()
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn insert_message(&self, input: NewMessage) -> Result<Option<Message>> {
    let room_str = encode_uuid(input.room_id);
    let sender_str = encode_uuid(input.sender_id);
    let at_str = encode_dt(input.created_at);
    let content = input.content.clone();

    let message_id = self
      .conn
      .call(move |conn| {
        Ok(sql::insert_message_if_member(conn, &room_str, &sender_str, &content, &at_str)?)
      })
      .await?;

    Ok(message_id.map(|message_id| Message {
      message_id,
      room_id: input.room_id,
      sender_id: input.sender_id,
      content: input.content,
      created_at: input.created_at,
    }))
  }

  async fn get_message(&self, room_id: Uuid, message_id: i64) -> Result<Option<Message>> {
    let room_str = encode_uuid(room_id);
    let raw = self
      .conn
      .call(move |conn| Ok(sql::get_message(conn, &room_str, message_id)?))
      .await?;
    raw.map(RawMessage::into_message).transpose()
  }

  async fn list_messages(
    &self,
    room_id: Uuid,
    before: Option<MessageCursor>,
    limit: usize,
  ) -> Result<Vec<Message>> {
    let room_str = encode_uuid(room_id);
    let before = before.map(|c| (encode_dt(c.created_at), c.message_id));
    let limit = limit as i64;

    let raws = self
      .conn
      .call(move |conn| Ok(sql::list_messages_desc(conn, &room_str, before, limit)?))
      .await?;

    let mut messages = raws
      .into_iter()
      .map(RawMessage::into_message)
      .collect::<Result<Vec<_>>>()?;
    messages.reverse();
    Ok(messages)
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn insert_notification(&self, notification: Notification, recipients: Vec<Uuid>) -> Result<()> {
    let raw = RawNotification {
      notification_id: encode_uuid(notification.notification_id),
      title:           notification.title.clone(),
      body:            notification.body.clone(),
      kind:            encode_kind(notification.kind).to_owned(),
      target_json:     encode_target(&notification.target)?,
      created_at:      encode_dt(notification.created_at),
    };
    let target_kind = notification.target.discriminant();
    let rows: Vec<(String, String)> = recipients
      .into_iter()
      .map(|user_id| (encode_uuid(Uuid::new_v4()), encode_uuid(user_id)))
      .collect();

    self
      .conn
      .call(move |conn| Ok(sql::insert_notification(conn, &raw, target_kind, &rows)?))
      .await?;
    Ok(())
  }

  async fn mark_read(
    &self,
    notification_id: Uuid,
    user_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Option<NotificationRecipient>> {
    let notification_str = encode_uuid(notification_id);
    let user_str = encode_uuid(user_id);
    let at_str = encode_dt(at);

    let raw = self
      .conn
      .call(move |conn| Ok(sql::mark_read(conn, &notification_str, &user_str, &at_str)?))
      .await?;
    raw.map(|r| r.into_recipient()).transpose()
  }

  async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<u64> {
    let user_str = encode_uuid(user_id);
    let at_str = encode_dt(at);
    let changed = self
      .conn
      .call(move |conn| Ok(sql::mark_all_read(conn, &user_str, &at_str)?))
      .await?;
    Ok(changed as u64)
  }

  async fn unread_count(&self, user_id: Uuid) -> Result<u64> {
    let user_str = encode_uuid(user_id);
    let count = self
      .conn
      .call(move |conn| Ok(sql::unread_count(conn, &user_str)?))
      .await?;
    Ok(count.max(0) as u64)
  }

  async fn list_inbox(&self, user_id: Uuid, limit: usize) -> Result<Vec<InboxEntry>> {
    let user_str = encode_uuid(user_id);
    let limit = limit as i64;
    let raws = self
      .conn
      .call(move |conn| Ok(sql::list_inbox(conn, &user_str, limit)?))
      .await?;
    raws.into_iter().map(|raw| raw.into_entry()).collect()
  }

  async fn list_recipients(&self, notification_id: Uuid) -> Result<Vec<NotificationRecipient>> {
    let id_str = encode_uuid(notification_id);
    let raws = self
      .conn
      .call(move |conn| Ok(sql::list_recipients(conn, &id_str)?))
      .await?;
    raws.into_iter().map(|raw| raw.into_recipient()).collect()
  }
}
