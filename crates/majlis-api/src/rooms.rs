//! Handlers for `/rooms` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/rooms` | The caller's rooms, most recently active first |
//! | `POST`   | `/rooms` | Body: `{"name":"..."}`; returns 201 + group room |
//! | `POST`   | `/rooms/direct` | Body: `{"user_id":"..."}`; idempotent per pair |
//! | `GET`    | `/rooms/:id` | Room with members; caller must be a member |
//! | `POST`   | `/rooms/:id/members` | Body: `{"user_id":"..."}`; returns 201 |
//! | `DELETE` | `/rooms/:id/members/:user_id` | 204; owners remove others, anyone leaves |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use majlis_core::{
  Messaging,
  room::{ChatRoom, RoomDetail, RoomSummary},
  store::MessagingStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{caller::Caller, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /rooms`
pub async fn list<S>(
  State(messaging): State<Messaging<S>>,
  caller: Caller,
) -> Result<Json<Vec<RoomSummary>>, ApiError>
where
  S: MessagingStore + 'static,
{
  let rooms = messaging.list_rooms_for_user(caller.user_id).await?;
  Ok(Json(rooms))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// `POST /rooms`, body: `{"name":"Study circle"}`
pub async fn create<S>(
  State(messaging): State<Messaging<S>>,
  caller: Caller,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MessagingStore + 'static,
{
  let room = messaging.create_group_room(caller.user_id, &body.name).await?;
  Ok((StatusCode::CREATED, Json(room)))
}

// ─── Direct ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserBody {
  pub user_id: Uuid,
}

/// `POST /rooms/direct`, body: `{"user_id":"<uuid>"}`
pub async fn direct<S>(
  State(messaging): State<Messaging<S>>,
  caller: Caller,
  Json(body): Json<UserBody>,
) -> Result<Json<ChatRoom>, ApiError>
where
  S: MessagingStore + 'static,
{
  let room = messaging
    .get_or_create_direct_room(caller.user_id, body.user_id)
    .await?;
  Ok(Json(room))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /rooms/:id`
pub async fn get_one<S>(
  State(messaging): State<Messaging<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<RoomDetail>, ApiError>
where
  S: MessagingStore + 'static,
{
  let detail = messaging.get_room(id, caller.user_id).await?;
  Ok(Json(detail))
}

// ─── Membership ───────────────────────────────────────────────────────────────

/// `POST /rooms/:id/members`, body: `{"user_id":"<uuid>"}`
pub async fn add_member<S>(
  State(messaging): State<Messaging<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<UserBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MessagingStore + 'static,
{
  let member = messaging
    .add_member(id, caller.user_id, body.user_id)
    .await?;
  Ok((StatusCode::CREATED, Json(member)))
}

/// `DELETE /rooms/:id/members/:user_id`
pub async fn remove_member<S>(
  State(messaging): State<Messaging<S>>,
  caller: Caller,
  Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: MessagingStore + 'static,
{
  messaging.remove_member(id, caller.user_id, user_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
