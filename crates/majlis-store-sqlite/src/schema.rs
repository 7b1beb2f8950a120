//! SQL schema for the Majlis SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Owned by the identity module; read-only to the messaging core.
CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_groups (
    group_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS group_members (
    group_id    TEXT NOT NULL REFERENCES user_groups(group_id) ON DELETE CASCADE,
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    UNIQUE (group_id, user_id)
);

-- direct_key is '<low>:<high>' of the sorted member pair for direct rooms and
-- NULL for group rooms. Its UNIQUE constraint is the direct-room dedup guard.
CREATE TABLE IF NOT EXISTS chat_rooms (
    room_id      TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    is_group     INTEGER NOT NULL,
    direct_key   TEXT UNIQUE,
    created_at   TEXT NOT NULL,
    CHECK ((is_group = 1) = (direct_key IS NULL))
);

CREATE TABLE IF NOT EXISTS room_members (
    room_id     TEXT NOT NULL REFERENCES chat_rooms(room_id),
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    role        TEXT NOT NULL,   -- 'owner' | 'member'
    joined_at   TEXT NOT NULL,
    PRIMARY KEY (room_id, user_id)
);

-- Messages are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS messages (
    message_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id     TEXT NOT NULL REFERENCES chat_rooms(room_id),
    sender_id   TEXT NOT NULL REFERENCES users(user_id),
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    body            TEXT NOT NULL,
    kind            TEXT NOT NULL,   -- 'info' | 'warning' | 'success' | 'error'
    target_kind     TEXT NOT NULL,   -- 'all' | 'group' | 'individual'
    target_json     TEXT NOT NULL,   -- full target descriptor, kept for audit
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notification_recipients (
    recipient_id    TEXT PRIMARY KEY,
    notification_id TEXT NOT NULL REFERENCES notifications(notification_id),
    user_id         TEXT NOT NULL REFERENCES users(user_id),
    is_read         INTEGER NOT NULL DEFAULT 0,
    read_at         TEXT,
    UNIQUE (notification_id, user_id)
);

CREATE INDEX IF NOT EXISTS room_members_user_idx  ON room_members(user_id);
CREATE INDEX IF NOT EXISTS messages_room_order_idx ON messages(room_id, created_at, message_id);
CREATE INDEX IF NOT EXISTS recipients_user_idx    ON notification_recipients(user_id, is_read);
CREATE INDEX IF NOT EXISTS notifications_time_idx ON notifications(created_at);

PRAGMA user_version = 1;
";
