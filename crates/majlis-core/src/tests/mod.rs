//! Service-level tests against the in-memory fake store.

mod fake;

use std::{collections::BTreeSet, sync::Arc, sync::atomic::Ordering};

use uuid::Uuid;

use crate::{
  Entity, Error, Messaging,
  group::GroupInput,
  message::MessageQuery,
  notification::{NewNotification, NotificationKind, Target},
};

use fake::FakeStore;

fn messaging() -> (Messaging<FakeStore>, Arc<FakeStore>) {
  let store = Arc::new(FakeStore::default());
  (Messaging::new(Arc::clone(&store)), store)
}

fn notice(target: Target) -> NewNotification {
  NewNotification {
    title: "Jumu'ah reminder".into(),
    body: "Khutbah starts at 1:15pm.".into(),
    kind: NotificationKind::Info,
    target,
  }
}

// ─── Direct rooms ────────────────────────────────────────────────────────────

#[tokio::test]
async fn direct_room_is_shared_by_both_orderings() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");
  let u2 = store.add_user("Bilal");

  let first = m.get_or_create_direct_room(u1, u2).await.unwrap();
  let second = m.get_or_create_direct_room(u2, u1).await.unwrap();
  let third = m.get_or_create_direct_room(u1, u2).await.unwrap();

  assert_eq!(first.room_id, second.room_id);
  assert_eq!(first.room_id, third.room_id);
  assert!(!first.is_group);
  assert_eq!(store.direct_room_count(), 1);
  assert_eq!(store.direct_inserts.load(Ordering::SeqCst), 1);

  let detail = m.get_room(first.room_id, u1).await.unwrap();
  assert_eq!(detail.members.len(), 2);
}

#[tokio::test]
async fn direct_room_with_self_is_invalid() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");
  let err = m.get_or_create_direct_room(u1, u1).await.unwrap_err();
  assert!(matches!(err, Error::InvalidInput { .. }));
  assert_eq!(store.direct_room_count(), 0);
}

#[tokio::test]
async fn direct_room_with_unknown_user_is_not_found() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");
  let ghost = Uuid::new_v4();
  let err = m.get_or_create_direct_room(u1, ghost).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::User(id)) if id == ghost));
}

#[tokio::test]
async fn losing_the_creation_race_returns_the_winners_room() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");
  let u2 = store.add_user("Bilal");

  store.lose_next_direct_race();
  let room = m.get_or_create_direct_room(u1, u2).await.unwrap();

  assert_eq!(store.direct_room_count(), 1);
  let again = m.get_or_create_direct_room(u2, u1).await.unwrap();
  assert_eq!(room.room_id, again.room_id);
}

#[tokio::test]
async fn direct_room_name_follows_counterpart_rename() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");
  let u2 = store.add_user("Bilal");
  let room = m.get_or_create_direct_room(u1, u2).await.unwrap();

  store.rename_user(u2, "Bilal ibn Rabah");

  let for_u1 = m.list_rooms_for_user(u1).await.unwrap();
  assert_eq!(for_u1[0].display_name, "Bilal ibn Rabah");
  let for_u2 = m.get_room(room.room_id, u2).await.unwrap();
  assert_eq!(for_u2.display_name, "Aisha");
}

// ─── Group rooms ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn group_room_name_bounds() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");

  assert!(matches!(
    m.create_group_room(u1, "   ").await,
    Err(Error::InvalidInput { field: "name", .. })
  ));
  assert!(matches!(
    m.create_group_room(u1, &"x".repeat(121)).await,
    Err(Error::InvalidInput { field: "name", .. })
  ));

  let room = m.create_group_room(u1, &"x".repeat(120)).await.unwrap();
  let detail = m.get_room(room.room_id, u1).await.unwrap();
  assert_eq!(detail.members.len(), 1);
  assert_eq!(detail.members[0].role, crate::room::MemberRole::Owner);
}

#[tokio::test]
async fn direct_rooms_reject_membership_changes() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");
  let u2 = store.add_user("Bilal");
  let u3 = store.add_user("Khadija");
  let room = m.get_or_create_direct_room(u1, u2).await.unwrap();

  let add = m.add_member(room.room_id, u1, u3).await.unwrap_err();
  assert!(matches!(add, Error::InvalidInput { .. }));
  let remove = m.remove_member(room.room_id, u1, u2).await.unwrap_err();
  assert!(matches!(remove, Error::InvalidInput { .. }));
}

#[tokio::test]
async fn only_the_owner_removes_others() {
  let (m, store) = messaging();
  let owner = store.add_user("Aisha");
  let u2 = store.add_user("Bilal");
  let u3 = store.add_user("Khadija");
  let room = m.create_group_room(owner, "Tafsir circle").await.unwrap();
  m.add_member(room.room_id, owner, u2).await.unwrap();
  m.add_member(room.room_id, u2, u3).await.unwrap();

  let err = m.remove_member(room.room_id, u2, u3).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden));

  m.remove_member(room.room_id, u3, u3).await.unwrap();
  m.remove_member(room.room_id, owner, u2).await.unwrap();

  let err = m.remove_member(room.room_id, owner, owner).await.unwrap_err();
  assert!(matches!(err, Error::InvalidInput { .. }));
}

#[tokio::test]
async fn adding_an_existing_member_is_a_no_op() {
  let (m, store) = messaging();
  let owner = store.add_user("Aisha");
  let u2 = store.add_user("Bilal");
  let room = m.create_group_room(owner, "Tafsir circle").await.unwrap();

  let first = m.add_member(room.room_id, owner, u2).await.unwrap();
  let second = m.add_member(room.room_id, owner, u2).await.unwrap();
  assert_eq!(first, second);
  assert_eq!(m.get_room(room.room_id, owner).await.unwrap().members.len(), 2);
}

// ─── Messages ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn non_member_cannot_post_or_read() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");
  let u2 = store.add_user("Bilal");
  let u4 = store.add_user("Outsider");
  let room = m.get_or_create_direct_room(u1, u2).await.unwrap();

  let err = m.post_message(room.room_id, u4, "hi").await.unwrap_err();
  assert!(matches!(err, Error::Forbidden));
  assert_eq!(store.message_count(), 0);

  let err = m
    .list_messages(room.room_id, u4, MessageQuery::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden));

  let visible = m
    .list_messages(room.room_id, u1, MessageQuery::default())
    .await
    .unwrap();
  assert!(visible.is_empty());
}

#[tokio::test]
async fn post_to_missing_room_is_not_found() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");
  let err = m.post_message(Uuid::new_v4(), u1, "hello").await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::Room(_))));
}

#[tokio::test]
async fn message_content_is_trimmed_and_bounded() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");
  let room = m.create_group_room(u1, "Notes").await.unwrap();

  let err = m.post_message(room.room_id, u1, "  \n ").await.unwrap_err();
  assert!(matches!(err, Error::InvalidInput { field: "content", .. }));
  let err = m
    .post_message(room.room_id, u1, &"a".repeat(1_001))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidInput { field: "content", .. }));

  let msg = m.post_message(room.room_id, u1, "  salaam  ").await.unwrap();
  assert_eq!(msg.content, "salaam");
}

#[tokio::test]
async fn messages_page_backwards_oldest_first() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");
  let room = m.create_group_room(u1, "Notes").await.unwrap();

  let mut ids = Vec::new();
  for i in 0..5 {
    ids.push(m.post_message(room.room_id, u1, &format!("m{i}")).await.unwrap().message_id);
  }

  let latest = m
    .list_messages(room.room_id, u1, MessageQuery { limit: Some(2), before: None })
    .await
    .unwrap();
  let got: Vec<_> = latest.iter().map(|msg| msg.message_id).collect();
  assert_eq!(got, &ids[3..]);

  let older = m
    .list_messages(room.room_id, u1, MessageQuery { limit: Some(2), before: Some(got[0]) })
    .await
    .unwrap();
  let got: Vec<_> = older.iter().map(|msg| msg.message_id).collect();
  assert_eq!(got, &ids[1..3]);
}

#[tokio::test]
async fn before_must_name_a_message_in_the_room() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");
  let room = m.create_group_room(u1, "Notes").await.unwrap();
  let other = m.create_group_room(u1, "Elsewhere").await.unwrap();
  let foreign = m.post_message(other.room_id, u1, "hi").await.unwrap();

  let err = m
    .list_messages(room.room_id, u1, MessageQuery { limit: None, before: Some(foreign.message_id) })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::Message(_))));
}

#[tokio::test]
async fn room_list_puts_most_recent_activity_first() {
  let (m, store) = messaging();
  let u1 = store.add_user("Aisha");
  let u2 = store.add_user("Bilal");
  let quiet = m.create_group_room(u1, "Quiet").await.unwrap();
  tokio::time::sleep(std::time::Duration::from_millis(2)).await;
  let busy = m.get_or_create_direct_room(u1, u2).await.unwrap();
  m.post_message(busy.room_id, u2, "assalamu alaikum").await.unwrap();

  let rooms = m.list_rooms_for_user(u1).await.unwrap();
  assert_eq!(rooms.len(), 2);
  assert_eq!(rooms[0].room.room_id, busy.room_id);
  assert_eq!(rooms[1].room.room_id, quiet.room_id);

  let preview = rooms[0].last_message.as_ref().unwrap();
  assert_eq!(preview.content, "assalamu alaikum");
  assert_eq!(preview.sender_name.as_deref(), Some("Bilal"));
  assert!(rooms[1].last_message.is_none());
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn publish_to_all_reaches_every_user_unread() {
  let (m, store) = messaging();
  let users: Vec<_> = ["A", "B", "C", "D"].iter().map(|n| store.add_user(n)).collect();

  let published = m.publish(notice(Target::All)).await.unwrap();
  assert_eq!(published.recipient_count, users.len());

  let rows = m.recipients(published.notification.notification_id).await.unwrap();
  assert_eq!(rows.len(), users.len());
  assert!(rows.iter().all(|r| !r.is_read && r.read_at.is_none()));
}

#[tokio::test]
async fn publish_with_no_recipients_persists_nothing() {
  let (m, store) = messaging();
  let group = m
    .create_group(GroupInput { name: "Empty".into(), ..Default::default() })
    .await
    .unwrap();

  let err = m
    .publish(notice(Target::Group { group_id: group.group.group_id }))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidInput { field: "target", .. }));
  assert_eq!(store.notification_count(), 0);
}

#[tokio::test]
async fn publish_to_missing_group_is_not_found() {
  let (m, store) = messaging();
  store.add_user("A");
  let err = m
    .publish(notice(Target::Group { group_id: Uuid::new_v4() }))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::Group(_))));
}

#[tokio::test]
async fn publish_to_unknown_individual_is_not_found() {
  let (m, store) = messaging();
  let u1 = store.add_user("A");
  let target = Target::Individual { user_ids: BTreeSet::from([u1, Uuid::new_v4()]) };
  let err = m.publish(notice(target)).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::User(_))));
  assert_eq!(store.notification_count(), 0);
}

#[tokio::test]
async fn group_fan_out_and_single_read() {
  let (m, store) = messaging();
  let u1 = store.add_user("U1");
  let u2 = store.add_user("U2");
  let u3 = store.add_user("U3");
  let group = m
    .create_group(GroupInput {
      name: "Volunteers".into(),
      description: None,
      member_ids: vec![u1, u2, u3],
    })
    .await
    .unwrap();

  let published = m
    .publish(notice(Target::Group { group_id: group.group.group_id }))
    .await
    .unwrap();
  let id = published.notification.notification_id;
  assert_eq!(published.recipient_count, 3);

  m.mark_read(id, u1).await.unwrap();

  let rows = m.recipients(id).await.unwrap();
  for row in rows {
    assert_eq!(row.is_read, row.user_id == u1, "row for {}", row.user_id);
  }
  assert_eq!(m.unread_count(u1).await.unwrap(), 0);
  assert_eq!(m.unread_count(u2).await.unwrap(), 1);
}

#[tokio::test]
async fn recipients_are_fixed_at_publish_time() {
  let (m, store) = messaging();
  let u1 = store.add_user("U1");
  let u2 = store.add_user("U2");
  let group = m
    .create_group(GroupInput { name: "Board".into(), description: None, member_ids: vec![u1] })
    .await
    .unwrap();
  let published = m
    .publish(notice(Target::Group { group_id: group.group.group_id }))
    .await
    .unwrap();

  m.update_group(
    group.group.group_id,
    GroupInput { name: "Board".into(), description: None, member_ids: vec![u2] },
  )
  .await
  .unwrap();

  let rows = m.recipients(published.notification.notification_id).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].user_id, u1);
  assert!(m.list_for_user(u2, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn mark_read_keeps_the_first_timestamp() {
  let (m, store) = messaging();
  let u1 = store.add_user("U1");
  let published = m.publish(notice(Target::All)).await.unwrap();
  let id = published.notification.notification_id;

  let first = m.mark_read(id, u1).await.unwrap();
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  let second = m.mark_read(id, u1).await.unwrap();

  assert!(first.is_read && second.is_read);
  assert!(first.read_at.is_some());
  assert_eq!(first.read_at, second.read_at);
}

#[tokio::test]
async fn mark_read_without_a_row_is_not_found() {
  let (m, store) = messaging();
  let u1 = store.add_user("U1");
  let published = m
    .publish(notice(Target::Individual { user_ids: BTreeSet::from([u1]) }))
    .await
    .unwrap();
  let outsider = store.add_user("U2");

  let err = m
    .mark_read(published.notification.notification_id, outsider)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::Notification(_))));

  let err = m.mark_read(Uuid::new_v4(), u1).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::Notification(_))));
}

#[tokio::test]
async fn mark_all_read_flips_only_unread_rows() {
  let (m, store) = messaging();
  let u1 = store.add_user("U1");
  let first = m.publish(notice(Target::All)).await.unwrap();
  m.publish(notice(Target::All)).await.unwrap();
  m.publish(notice(Target::All)).await.unwrap();

  let early = m.mark_read(first.notification.notification_id, u1).await.unwrap();
  assert_eq!(m.mark_all_read(u1).await.unwrap(), 2);
  assert_eq!(m.unread_count(u1).await.unwrap(), 0);

  let inbox = m.list_for_user(u1, None).await.unwrap();
  assert_eq!(inbox.len(), 3);
  let kept = inbox
    .iter()
    .find(|e| e.notification.notification_id == first.notification.notification_id)
    .unwrap();
  assert_eq!(kept.read_at, early.read_at);
}

#[tokio::test]
async fn publish_validates_title_and_body() {
  let (m, store) = messaging();
  store.add_user("U1");

  let mut input = notice(Target::All);
  input.title = " ".into();
  assert!(matches!(
    m.publish(input).await,
    Err(Error::InvalidInput { field: "title", .. })
  ));

  let mut input = notice(Target::All);
  input.body = "b".repeat(2_001);
  assert!(matches!(
    m.publish(input).await,
    Err(Error::InvalidInput { field: "body", .. })
  ));
  assert_eq!(store.notification_count(), 0);
}

// ─── Groups ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn group_members_are_deduplicated_and_must_exist() {
  let (m, store) = messaging();
  let u1 = store.add_user("U1");

  let detail = m
    .create_group(GroupInput { name: "Dup".into(), description: None, member_ids: vec![u1, u1] })
    .await
    .unwrap();
  assert_eq!(detail.member_ids, vec![u1]);

  let err = m
    .create_group(GroupInput {
      name: "Ghosts".into(),
      description: None,
      member_ids: vec![Uuid::new_v4()],
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::User(_))));
}

#[tokio::test]
async fn deleting_a_missing_group_is_not_found() {
  let (m, _store) = messaging();
  let err = m.delete_group(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::Group(_))));
}
