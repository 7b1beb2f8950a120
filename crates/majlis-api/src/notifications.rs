//! Handlers for `/notifications` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/notifications` | The caller's inbox, newest first; optional `?limit=<n>` |
//! | `POST` | `/notifications` | Admin. Body: [`NewNotification`]; returns 201 + recipient count |
//! | `GET`  | `/notifications/unread-count` | `{"unread": n}` |
//! | `POST` | `/notifications/:id/read` | 204; idempotent |
//! | `POST` | `/notifications/read-all` | `{"updated": n}` |
//! | `GET`  | `/notifications/:id/recipients` | Admin. Delivery rows for audit |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use majlis_core::{
  Messaging,
  notification::{InboxEntry, NewNotification, NotificationRecipient},
  store::MessagingStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  caller::{Admin, Caller},
  error::ApiError,
};

// ─── Inbox ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InboxParams {
  pub limit: Option<usize>,
}

/// `GET /notifications[?limit=<n>]`
pub async fn list<S>(
  State(messaging): State<Messaging<S>>,
  caller: Caller,
  Query(params): Query<InboxParams>,
) -> Result<Json<Vec<InboxEntry>>, ApiError>
where
  S: MessagingStore + 'static,
{
  let entries = messaging.list_for_user(caller.user_id, params.limit).await?;
  Ok(Json(entries))
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
  pub unread: u64,
}

/// `GET /notifications/unread-count`
pub async fn unread_count<S>(
  State(messaging): State<Messaging<S>>,
  caller: Caller,
) -> Result<Json<UnreadCount>, ApiError>
where
  S: MessagingStore + 'static,
{
  let unread = messaging.unread_count(caller.user_id).await?;
  Ok(Json(UnreadCount { unread }))
}

// ─── Publish ──────────────────────────────────────────────────────────────────

/// `POST /notifications`
pub async fn publish<S>(
  State(messaging): State<Messaging<S>>,
  _admin: Admin,
  Json(input): Json<NewNotification>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MessagingStore + 'static,
{
  let published = messaging.publish(input).await?;
  Ok((StatusCode::CREATED, Json(published)))
}

// ─── Read state ───────────────────────────────────────────────────────────────

/// `POST /notifications/:id/read`
pub async fn mark_read<S>(
  State(messaging): State<Messaging<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: MessagingStore + 'static,
{
  messaging.mark_read(id, caller.user_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct ReadAll {
  pub updated: u64,
}

/// `POST /notifications/read-all`
pub async fn read_all<S>(
  State(messaging): State<Messaging<S>>,
  caller: Caller,
) -> Result<Json<ReadAll>, ApiError>
where
  S: MessagingStore + 'static,
{
  let updated = messaging.mark_all_read(caller.user_id).await?;
  Ok(Json(ReadAll { updated }))
}

// ─── Audit ────────────────────────────────────────────────────────────────────

/// `GET /notifications/:id/recipients`
pub async fn recipients<S>(
  State(messaging): State<Messaging<S>>,
  _admin: Admin,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<NotificationRecipient>>, ApiError>
where
  S: MessagingStore + 'static,
{
  Ok(Json(messaging.recipients(id).await?))
}
