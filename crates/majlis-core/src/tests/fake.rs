//! An in-memory [`MessagingStore`] for exercising the service without SQLite.

use std::{
  collections::BTreeMap,
  convert::Infallible,
  sync::{
    Mutex, MutexGuard,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  group::{GroupDetail, UserGroup},
  message::{Message, MessageCursor, NewMessage},
  notification::{InboxEntry, Notification, NotificationRecipient},
  room::{ChatRoom, DirectPair, MemberRole, RoomListing, RoomMember},
  store::{DirectRoomInsert, MemberInsert, MemberRemoval, MessagingStore},
};

#[derive(Default)]
struct State {
  users:           BTreeMap<Uuid, String>,
  groups:          BTreeMap<Uuid, (UserGroup, Vec<Uuid>)>,
  rooms:           Vec<ChatRoom>,
  direct_keys:     BTreeMap<String, Uuid>,
  members:         Vec<RoomMember>,
  messages:        Vec<Message>,
  notifications:   Vec<Notification>,
  recipients:      Vec<NotificationRecipient>,
}

#[derive(Default)]
pub struct FakeStore {
  state:              Mutex<State>,
  lose_next_race:     AtomicBool,
  pub direct_inserts: AtomicUsize,
}

impl FakeStore {
  fn lock(&self) -> MutexGuard<'_, State> { self.state.lock().unwrap() }

  pub fn add_user(&self, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    self.lock().users.insert(id, name.to_owned());
    id
  }

  pub fn rename_user(&self, id: Uuid, name: &str) {
    self.lock().users.insert(id, name.to_owned());
  }

  /// Make the next `insert_direct_room` find that another caller committed a
  /// room for the same pair a moment earlier.
  pub fn lose_next_direct_race(&self) { self.lose_next_race.store(true, Ordering::SeqCst); }

  pub fn direct_room_count(&self) -> usize { self.lock().direct_keys.len() }

  pub fn message_count(&self) -> usize { self.lock().messages.len() }

  pub fn notification_count(&self) -> usize { self.lock().notifications.len() }
}

fn commit_direct(state: &mut State, room: ChatRoom, pair: DirectPair) {
  for user_id in pair.members() {
    state.members.push(RoomMember {
      room_id: room.room_id,
      user_id,
      role: MemberRole::Member,
      joined_at: room.created_at,
    });
  }
  state.direct_keys.insert(pair.key(), room.room_id);
  state.rooms.push(room);
}

impl MessagingStore for FakeStore {
  type Error = Infallible;

  async fn user_exists(&self, user_id: Uuid) -> Result<bool, Infallible> {
    Ok(self.lock().users.contains_key(&user_id))
  }

  async fn user_name(&self, user_id: Uuid) -> Result<Option<String>, Infallible> {
    Ok(self.lock().users.get(&user_id).cloned())
  }

  async fn all_user_ids(&self) -> Result<Vec<Uuid>, Infallible> {
    Ok(self.lock().users.keys().copied().collect())
  }

  async fn insert_group(&self, group: UserGroup, member_ids: Vec<Uuid>) -> Result<(), Infallible> {
    self.lock().groups.insert(group.group_id, (group, member_ids));
    Ok(())
  }

  async fn replace_group(&self, group: UserGroup, member_ids: Vec<Uuid>) -> Result<bool, Infallible> {
    let mut state = self.lock();
    match state.groups.get_mut(&group.group_id) {
      Some(slot) => {
        *slot = (group, member_ids);
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn delete_group(&self, group_id: Uuid) -> Result<bool, Infallible> {
    Ok(self.lock().groups.remove(&group_id).is_some())
  }

  async fn get_group(&self, group_id: Uuid) -> Result<Option<GroupDetail>, Infallible> {
    Ok(self.lock().groups.get(&group_id).map(|(group, members)| GroupDetail {
      group:      group.clone(),
      member_ids: members.clone(),
    }))
  }

  async fn list_groups(&self) -> Result<Vec<UserGroup>, Infallible> {
    Ok(self.lock().groups.values().map(|(g, _)| g.clone()).collect())
  }

  async fn group_members(&self, group_id: Uuid) -> Result<Option<Vec<Uuid>>, Infallible> {
    Ok(self.lock().groups.get(&group_id).map(|(_, m)| m.clone()))
  }

  async fn insert_group_room(&self, room: ChatRoom, owner: RoomMember) -> Result<(), Infallible> {
    let mut state = self.lock();
    state.rooms.push(room);
    state.members.push(owner);
    Ok(())
  }

  async fn find_direct_room(&self, pair: DirectPair) -> Result<Option<ChatRoom>, Infallible> {
    let state = self.lock();
    Ok(
      state
        .direct_keys
        .get(&pair.key())
        .and_then(|id| state.rooms.iter().find(|r| r.room_id == *id))
        .cloned(),
    )
  }

  async fn insert_direct_room(
    &self,
    room: ChatRoom,
    pair: DirectPair,
  ) -> Result<DirectRoomInsert, Infallible> {
    self.direct_inserts.fetch_add(1, Ordering::SeqCst);
    let mut state = self.lock();

    if self.lose_next_race.swap(false, Ordering::SeqCst) {
      let winner = ChatRoom { room_id: Uuid::new_v4(), ..room.clone() };
      commit_direct(&mut state, winner, pair);
    }
    if state.direct_keys.contains_key(&pair.key()) {
      return Ok(DirectRoomInsert::Exists);
    }
    commit_direct(&mut state, room.clone(), pair);
    Ok(DirectRoomInsert::Created(room))
  }

  async fn get_room(&self, room_id: Uuid) -> Result<Option<ChatRoom>, Infallible> {
    Ok(self.lock().rooms.iter().find(|r| r.room_id == room_id).cloned())
  }

  async fn get_member(&self, room_id: Uuid, user_id: Uuid) -> Result<Option<RoomMember>, Infallible> {
    Ok(
      self
        .lock()
        .members
        .iter()
        .find(|m| m.room_id == room_id && m.user_id == user_id)
        .cloned(),
    )
  }

  async fn list_members(&self, room_id: Uuid) -> Result<Vec<RoomMember>, Infallible> {
    Ok(self.lock().members.iter().filter(|m| m.room_id == room_id).cloned().collect())
  }

  async fn insert_member(&self, member: RoomMember) -> Result<MemberInsert, Infallible> {
    let mut state = self.lock();
    if let Some(existing) = state
      .members
      .iter()
      .find(|m| m.room_id == member.room_id && m.user_id == member.user_id)
    {
      return Ok(MemberInsert::Existing(existing.clone()));
    }
    state.members.push(member.clone());
    Ok(MemberInsert::Added(member))
  }

  async fn delete_member(&self, room_id: Uuid, user_id: Uuid) -> Result<MemberRemoval, Infallible> {
    let mut state = self.lock();
    let count = state.members.iter().filter(|m| m.room_id == room_id).count();
    let Some(pos) = state
      .members
      .iter()
      .position(|m| m.room_id == room_id && m.user_id == user_id)
    else {
      return Ok(MemberRemoval::NotMember);
    };
    if count <= 1 {
      return Ok(MemberRemoval::LastMember);
    }
    state.members.remove(pos);
    Ok(MemberRemoval::Removed)
  }

  async fn list_rooms_for_user(&self, user_id: Uuid) -> Result<Vec<RoomListing>, Infallible> {
    let state = self.lock();
    let mut listings: Vec<RoomListing> = state
      .members
      .iter()
      .filter(|m| m.user_id == user_id)
      .filter_map(|m| state.rooms.iter().find(|r| r.room_id == m.room_id))
      .map(|room| RoomListing {
        room:         room.clone(),
        counterpart:  (!room.is_group)
          .then(|| {
            state
              .members
              .iter()
              .find(|o| o.room_id == room.room_id && o.user_id != user_id)
              .map(|o| o.user_id)
          })
          .flatten(),
        last_message: state
          .messages
          .iter()
          .filter(|msg| msg.room_id == room.room_id)
          .max_by_key(|msg| MessageCursor::from(*msg))
          .cloned(),
      })
      .collect();
    listings.sort_by_key(|l| {
      std::cmp::Reverse(
        l.last_message
          .as_ref()
          .map(|m| m.created_at)
          .unwrap_or(l.room.created_at),
      )
    });
    Ok(listings)
  }

  async fn insert_message(&self, input: NewMessage) -> Result<Option<Message>, Infallible> {
    let mut state = self.lock();
    let is_member = state
      .members
      .iter()
      .any(|m| m.room_id == input.room_id && m.user_id == input.sender_id);
    if !is_member {
      return Ok(None);
    }
    let message = Message {
      message_id: state.messages.len() as i64 + 1,
      room_id:    input.room_id,
      sender_id:  input.sender_id,
      content:    input.content,
      created_at: input.created_at,
    };
    state.messages.push(message.clone());
    Ok(Some(message))
  }

  async fn get_message(&self, room_id: Uuid, message_id: i64) -> Result<Option<Message>, Infallible> {
    Ok(
      self
        .lock()
        .messages
        .iter()
        .find(|m| m.room_id == room_id && m.message_id == message_id)
        .cloned(),
    )
  }

  async fn list_messages(
    &self,
    room_id: Uuid,
    before: Option<MessageCursor>,
    limit: usize,
  ) -> Result<Vec<Message>, Infallible> {
    let state = self.lock();
    let mut page: Vec<Message> = state
      .messages
      .iter()
      .filter(|m| m.room_id == room_id)
      .filter(|m| before.is_none_or(|b| MessageCursor::from(*m) < b))
      .cloned()
      .collect();
    page.sort_by_key(|m| MessageCursor::from(m));
    let skip = page.len().saturating_sub(limit);
    Ok(page.split_off(skip))
  }

  async fn insert_notification(
    &self,
    notification: Notification,
    recipients: Vec<Uuid>,
  ) -> Result<(), Infallible> {
    let mut state = self.lock();
    for user_id in recipients {
      state.recipients.push(NotificationRecipient {
        recipient_id: Uuid::new_v4(),
        notification_id: notification.notification_id,
        user_id,
        is_read: false,
        read_at: None,
      });
    }
    state.notifications.push(notification);
    Ok(())
  }

  async fn mark_read(
    &self,
    notification_id: Uuid,
    user_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Option<NotificationRecipient>, Infallible> {
    let mut state = self.lock();
    Ok(
      state
        .recipients
        .iter_mut()
        .find(|r| r.notification_id == notification_id && r.user_id == user_id)
        .map(|r| {
          r.is_read = true;
          if r.read_at.is_none() {
            r.read_at = Some(at);
          }
          r.clone()
        }),
    )
  }

  async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<u64, Infallible> {
    let mut state = self.lock();
    let mut changed = 0;
    for r in state.recipients.iter_mut().filter(|r| r.user_id == user_id && !r.is_read) {
      r.is_read = true;
      r.read_at = Some(at);
      changed += 1;
    }
    Ok(changed)
  }

  async fn unread_count(&self, user_id: Uuid) -> Result<u64, Infallible> {
    Ok(
      self
        .lock()
        .recipients
        .iter()
        .filter(|r| r.user_id == user_id && !r.is_read)
        .count() as u64,
    )
  }

  async fn list_inbox(&self, user_id: Uuid, limit: usize) -> Result<Vec<InboxEntry>, Infallible> {
    let state = self.lock();
    let mut entries: Vec<InboxEntry> = state
      .recipients
      .iter()
      .filter(|r| r.user_id == user_id)
      .filter_map(|r| {
        state
          .notifications
          .iter()
          .find(|n| n.notification_id == r.notification_id)
          .map(|n| InboxEntry {
            notification: n.clone(),
            is_read:      r.is_read,
            read_at:      r.read_at,
          })
      })
      .collect();
    entries.sort_by_key(|e| std::cmp::Reverse(e.notification.created_at));
    entries.truncate(limit);
    Ok(entries)
  }

  async fn list_recipients(
    &self,
    notification_id: Uuid,
  ) -> Result<Vec<NotificationRecipient>, Infallible> {
    Ok(
      self
        .lock()
        .recipients
        .iter()
        .filter(|r| r.notification_id == notification_id)
        .cloned()
        .collect(),
    )
  }
}
