//! Handlers for `/rooms/:id/messages`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rooms/:id/messages` | Optional `?limit=<n>&before=<message_id>`; oldest first |
//! | `POST` | `/rooms/:id/messages` | Body: `{"content":"..."}`; returns 201 |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use majlis_core::{
  Messaging,
  message::{Message, MessageQuery},
  store::MessagingStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{caller::Caller, error::ApiError};

/// `GET /rooms/:id/messages[?limit=<n>][&before=<message_id>]`
pub async fn list<S>(
  State(messaging): State<Messaging<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Query(query): Query<MessageQuery>,
) -> Result<Json<Vec<Message>>, ApiError>
where
  S: MessagingStore + 'static,
{
  let messages = messaging.list_messages(id, caller.user_id, query).await?;
  Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct PostBody {
  pub content: String,
}

/// `POST /rooms/:id/messages`
pub async fn post<S>(
  State(messaging): State<Messaging<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<PostBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MessagingStore + 'static,
{
  let message = messaging
    .post_message(id, caller.user_id, &body.content)
    .await?;
  Ok((StatusCode::CREATED, Json(message)))
}
