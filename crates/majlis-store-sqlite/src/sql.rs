//! Synchronous queries run inside [`tokio_rusqlite::Connection::call`].
//!
//! Every function here takes already-encoded column values and returns raw
//! row types from [`crate::encode`]. Functions that take `&mut Connection`
//! write several rows and do so inside one transaction; dropping the
//! transaction on an early return rolls it back.

use rusqlite::{Connection, ErrorCode, OptionalExtension as _, params};

use crate::encode::{
  RawGroup, RawInboxEntry, RawMember, RawMessage, RawNotification, RawRecipient,
  RawRoom, RawRoomListing,
};

/// True for a `UNIQUE` or `PRIMARY KEY` constraint failure.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.code == ErrorCode::ConstraintViolation
        && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
          || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
  )
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn upsert_user(
  conn: &Connection,
  user_id: &str,
  name: &str,
  email: &str,
  created_at: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO users (user_id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (user_id) DO UPDATE SET name = excluded.name, email = excluded.email",
    params![user_id, name, email, created_at],
  )?;
  Ok(())
}

pub fn user_name(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT name FROM users WHERE user_id = ?1",
      params![user_id],
      |row| row.get(0),
    )
    .optional()
}

pub fn all_user_ids(conn: &Connection) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare("SELECT user_id FROM users ORDER BY user_id")?;
  stmt
    .query_map([], |row| row.get(0))?
    .collect()
}

// ─── Groups ──────────────────────────────────────────────────────────────────

fn insert_group_members(
  conn: &Connection,
  group_id: &str,
  member_ids: &[String],
) -> rusqlite::Result<()> {
  let mut stmt =
    conn.prepare("INSERT INTO group_members (group_id, user_id) VALUES (?1, ?2)")?;
  for user_id in member_ids {
    stmt.execute(params![group_id, user_id])?;
  }
  Ok(())
}

pub fn insert_group(
  conn: &mut Connection,
  group: &RawGroup,
  member_ids: &[String],
) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  tx.execute(
    "INSERT INTO user_groups (group_id, name, description, created_at)
     VALUES (?1, ?2, ?3, ?4)",
    params![group.group_id, group.name, group.description, group.created_at],
  )?;
  insert_group_members(&tx, &group.group_id, member_ids)?;
  tx.commit()
}

/// Delete-then-insert, inside one transaction so no reader sees the group
/// momentarily empty.
pub fn replace_group(
  conn: &mut Connection,
  group: &RawGroup,
  member_ids: &[String],
) -> rusqlite::Result<bool> {
  let tx = conn.transaction()?;
  let updated = tx.execute(
    "UPDATE user_groups SET name = ?2, description = ?3 WHERE group_id = ?1",
    params![group.group_id, group.name, group.description],
  )?;
  if updated == 0 {
    return Ok(false);
  }
  tx.execute(
    "DELETE FROM group_members WHERE group_id = ?1",
    params![group.group_id],
  )?;
  insert_group_members(&tx, &group.group_id, member_ids)?;
  tx.commit()?;
  Ok(true)
}

pub fn delete_group(conn: &Connection, group_id: &str) -> rusqlite::Result<bool> {
  let deleted = conn.execute("DELETE FROM user_groups WHERE group_id = ?1", params![group_id])?;
  Ok(deleted > 0)
}

pub fn get_group(conn: &Connection, group_id: &str) -> rusqlite::Result<Option<RawGroup>> {
  conn
    .query_row(
      &format!("SELECT {} FROM user_groups WHERE group_id = ?1", RawGroup::COLUMNS),
      params![group_id],
      |row| RawGroup::from_row(row, 0),
    )
    .optional()
}

pub fn list_groups(conn: &Connection) -> rusqlite::Result<Vec<RawGroup>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM user_groups ORDER BY name, group_id",
    RawGroup::COLUMNS
  ))?;
  stmt
    .query_map([], |row| RawGroup::from_row(row, 0))?
    .collect()
}

/// `None` if the group does not exist; otherwise its member ids, sorted.
pub fn group_members(conn: &Connection, group_id: &str) -> rusqlite::Result<Option<Vec<String>>> {
  let exists = conn
    .query_row(
      "SELECT 1 FROM user_groups WHERE group_id = ?1",
      params![group_id],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if !exists {
    return Ok(None);
  }

  let mut stmt =
    conn.prepare("SELECT user_id FROM group_members WHERE group_id = ?1 ORDER BY user_id")?;
  let ids = stmt
    .query_map(params![group_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(Some(ids))
}

// ─── Rooms ───────────────────────────────────────────────────────────────────

fn insert_room(conn: &Connection, room: &RawRoom, direct_key: Option<&str>) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO chat_rooms (room_id, display_name, is_group, direct_key, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![room.room_id, room.display_name, room.is_group, direct_key, room.created_at],
  )?;
  Ok(())
}

fn insert_member(conn: &Connection, member: &RawMember) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO room_members (room_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)",
    params![member.room_id, member.user_id, member.role, member.joined_at],
  )?;
  Ok(())
}

/// Insert a membership unless `(room_id, user_id)` already has one, then read
/// back the stored row. Returns whether this call inserted it.
pub fn insert_member_if_absent(
  conn: &Connection,
  member: &RawMember,
) -> rusqlite::Result<(bool, RawMember)> {
  let inserted = conn.execute(
    "INSERT INTO room_members (room_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (room_id, user_id) DO NOTHING",
    params![member.room_id, member.user_id, member.role, member.joined_at],
  )?;
  let stored = conn.query_row(
    &format!(
      "SELECT {} FROM room_members WHERE room_id = ?1 AND user_id = ?2",
      RawMember::COLUMNS
    ),
    params![member.room_id, member.user_id],
    |row| RawMember::from_row(row, 0),
  )?;
  Ok((inserted > 0, stored))
}

pub fn insert_group_room(
  conn: &mut Connection,
  room: &RawRoom,
  owner: &RawMember,
) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  insert_room(&tx, room, None)?;
  insert_member(&tx, owner)?;
  tx.commit()
}

/// Insert a direct room and both memberships. Returns `false`, having written
/// nothing, if the pair's key is already taken.
pub fn insert_direct_room(
  conn: &mut Connection,
  room: &RawRoom,
  direct_key: &str,
  members: &[RawMember; 2],
) -> rusqlite::Result<bool> {
  let tx = conn.transaction()?;
  match insert_room(&tx, room, Some(direct_key)) {
    Ok(()) => {}
    Err(e) if is_unique_violation(&e) => return Ok(false),
    Err(e) => return Err(e),
  }
  for member in members {
    insert_member(&tx, member)?;
  }
  tx.commit()?;
  Ok(true)
}

pub fn find_direct_room(conn: &Connection, direct_key: &str) -> rusqlite::Result<Option<RawRoom>> {
  conn
    .query_row(
      &format!("SELECT {} FROM chat_rooms r WHERE r.direct_key = ?1", RawRoom::COLUMNS),
      params![direct_key],
      |row| RawRoom::from_row(row, 0),
    )
    .optional()
}

pub fn get_room(conn: &Connection, room_id: &str) -> rusqlite::Result<Option<RawRoom>> {
  conn
    .query_row(
      &format!("SELECT {} FROM chat_rooms r WHERE r.room_id = ?1", RawRoom::COLUMNS),
      params![room_id],
      |row| RawRoom::from_row(row, 0),
    )
    .optional()
}

pub fn get_member(
  conn: &Connection,
  room_id: &str,
  user_id: &str,
) -> rusqlite::Result<Option<RawMember>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM room_members WHERE room_id = ?1 AND user_id = ?2",
        RawMember::COLUMNS
      ),
      params![room_id, user_id],
      |row| RawMember::from_row(row, 0),
    )
    .optional()
}

pub fn list_members(conn: &Connection, room_id: &str) -> rusqlite::Result<Vec<RawMember>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM room_members WHERE room_id = ?1 ORDER BY joined_at, user_id",
    RawMember::COLUMNS
  ))?;
  stmt
    .query_map(params![room_id], |row| RawMember::from_row(row, 0))?
    .collect()
}

/// Outcome codes mirrored by [`majlis_core::store::MemberRemoval`].
pub enum Removal {
  Removed,
  NotMember,
  LastMember,
}

pub fn delete_member(conn: &mut Connection, room_id: &str, user_id: &str) -> rusqlite::Result<Removal> {
  let tx = conn.transaction()?;
  if get_member(&tx, room_id, user_id)?.is_none() {
    return Ok(Removal::NotMember);
  }
  let count: i64 = tx.query_row(
    "SELECT COUNT(*) FROM room_members WHERE room_id = ?1",
    params![room_id],
    |row| row.get(0),
  )?;
  if count <= 1 {
    return Ok(Removal::LastMember);
  }
  tx.execute(
    "DELETE FROM room_members WHERE room_id = ?1 AND user_id = ?2",
    params![room_id, user_id],
  )?;
  tx.commit()?;
  Ok(Removal::Removed)
}

pub fn list_rooms_for_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<RawRoomListing>> {
  let sql = format!(
    "SELECT {room},
            (SELECT o.user_id FROM room_members o
              WHERE o.room_id = r.room_id AND o.user_id != ?1 AND r.is_group = 0
              LIMIT 1) AS counterpart,
            {message}
     FROM room_members rm
     JOIN chat_rooms r ON r.room_id = rm.room_id
     LEFT JOIN messages m ON m.message_id = (
       SELECT m2.message_id FROM messages m2
        WHERE m2.room_id = r.room_id
        ORDER BY m2.created_at DESC, m2.message_id DESC
        LIMIT 1)
     WHERE rm.user_id = ?1
     ORDER BY COALESCE(m.created_at, r.created_at) DESC, r.room_id",
    room = RawRoom::COLUMNS,
    message = RawMessage::COLUMNS,
  );

  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(params![user_id], |row| {
      Ok(RawRoomListing {
        room:         RawRoom::from_row(row, 0)?,
        counterpart:  row.get(4)?,
        last_message: RawMessage::from_optional_row(row, 5)?,
      })
    })?
    .collect()
}

// ─── Messages ────────────────────────────────────────────────────────────────

/// Insert a message only if the sender is a member right now. Returns the new
/// message id, or `None` if nothing was written.
pub fn insert_message_if_member(
  conn: &Connection,
  room_id: &str,
  sender_id: &str,
  content: &str,
  created_at: &str,
) -> rusqlite::Result<Option<i64>> {
  let inserted = conn.execute(
    "INSERT INTO messages (room_id, sender_id, content, created_at)
     SELECT ?1, ?2, ?3, ?4
      WHERE EXISTS (SELECT 1 FROM room_members WHERE room_id = ?1 AND user_id = ?2)",
    params![room_id, sender_id, content, created_at],
  )?;
  Ok((inserted > 0).then(|| conn.last_insert_rowid()))
}

pub fn get_message(
  conn: &Connection,
  room_id: &str,
  message_id: i64,
) -> rusqlite::Result<Option<RawMessage>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM messages m WHERE m.room_id = ?1 AND m.message_id = ?2",
        RawMessage::COLUMNS
      ),
      params![room_id, message_id],
      |row| RawMessage::from_row(row, 0),
    )
    .optional()
}

/// Newest-first page strictly before `(before_at, before_id)`; the caller
/// reverses it.
pub fn list_messages_desc(
  conn: &Connection,
  room_id: &str,
  before: Option<(String, i64)>,
  limit: i64,
) -> rusqlite::Result<Vec<RawMessage>> {
  let (before_at, before_id) = before.unzip();
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM messages m
      WHERE m.room_id = ?1
        AND (?2 IS NULL
             OR m.created_at < ?2
             OR (m.created_at = ?2 AND m.message_id < ?3))
      ORDER BY m.created_at DESC, m.message_id DESC
      LIMIT ?4",
    RawMessage::COLUMNS
  ))?;
  stmt
    .query_map(params![room_id, before_at, before_id, limit], |row| {
      RawMessage::from_row(row, 0)
    })?
    .collect()
}

// ─── Notifications ───────────────────────────────────────────────────────────

/// Insert the notification row, then one recipient row per `(recipient_id,
/// user_id)`. Any failure rolls back every row, the notification included.
pub fn insert_notification(
  conn: &mut Connection,
  notification: &RawNotification,
  target_kind: &str,
  recipients: &[(String, String)],
) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  tx.execute(
    "INSERT INTO notifications
       (notification_id, title, body, kind, target_kind, target_json, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      notification.notification_id,
      notification.title,
      notification.body,
      notification.kind,
      target_kind,
      notification.target_json,
      notification.created_at,
    ],
  )?;
  {
    let mut stmt = tx.prepare(
      "INSERT INTO notification_recipients
         (recipient_id, notification_id, user_id, is_read, read_at)
       VALUES (?1, ?2, ?3, 0, NULL)",
    )?;
    for (recipient_id, user_id) in recipients {
      stmt.execute(params![recipient_id, notification.notification_id, user_id])?;
    }
  }
  tx.commit()
}

fn get_recipient(
  conn: &Connection,
  notification_id: &str,
  user_id: &str,
) -> rusqlite::Result<Option<RawRecipient>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM notification_recipients WHERE notification_id = ?1 AND user_id = ?2",
        RawRecipient::COLUMNS
      ),
      params![notification_id, user_id],
      |row| RawRecipient::from_row(row, 0),
    )
    .optional()
}

/// Set the row read. `COALESCE` keeps the first `read_at`, so concurrent or
/// repeated calls converge on the same row.
pub fn mark_read(
  conn: &Connection,
  notification_id: &str,
  user_id: &str,
  read_at: &str,
) -> rusqlite::Result<Option<RawRecipient>> {
  conn.execute(
    "UPDATE notification_recipients
        SET is_read = 1, read_at = COALESCE(read_at, ?3)
      WHERE notification_id = ?1 AND user_id = ?2",
    params![notification_id, user_id, read_at],
  )?;
  get_recipient(conn, notification_id, user_id)
}

pub fn mark_all_read(conn: &Connection, user_id: &str, read_at: &str) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE notification_recipients SET is_read = 1, read_at = ?2
      WHERE user_id = ?1 AND is_read = 0",
    params![user_id, read_at],
  )
}

#[cfg(test)]
pub fn notification_rows(conn: &Connection, notification_id: &str) -> rusqlite::Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM notifications WHERE notification_id = ?1",
    params![notification_id],
    |row| row.get(0),
  )
}

pub fn unread_count(conn: &Connection, user_id: &str) -> rusqlite::Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM notification_recipients WHERE user_id = ?1 AND is_read = 0",
    params![user_id],
    |row| row.get(0),
  )
}

pub fn list_inbox(conn: &Connection, user_id: &str, limit: i64) -> rusqlite::Result<Vec<RawInboxEntry>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {}, nr.is_read, nr.read_at
       FROM notification_recipients nr
       JOIN notifications n ON n.notification_id = nr.notification_id
      WHERE nr.user_id = ?1
      ORDER BY n.created_at DESC, n.notification_id DESC
      LIMIT ?2",
    RawNotification::COLUMNS
  ))?;
  stmt
    .query_map(params![user_id, limit], |row| {
      Ok(RawInboxEntry {
        notification: RawNotification::from_row(row, 0)?,
        is_read:      row.get(6)?,
        read_at:      row.get(7)?,
      })
    })?
    .collect()
}

pub fn list_recipients(conn: &Connection, notification_id: &str) -> rusqlite::Result<Vec<RawRecipient>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM notification_recipients WHERE notification_id = ?1 ORDER BY user_id",
    RawRecipient::COLUMNS
  ))?;
  stmt
    .query_map(params![notification_id], |row| RawRecipient::from_row(row, 0))?
    .collect()
}
