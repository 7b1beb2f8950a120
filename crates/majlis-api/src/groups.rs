//! Handlers for `/groups` endpoints.
//!
//! Any authenticated caller may read groups; changing them needs the admin
//! role.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/groups` | All groups, by name |
//! | `POST`   | `/groups` | Admin. Body: [`GroupInput`]; returns 201 |
//! | `GET`    | `/groups/:id` | Group with member ids |
//! | `PUT`    | `/groups/:id` | Admin. Body: [`GroupInput`]; replaces members |
//! | `DELETE` | `/groups/:id` | Admin. 204 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use majlis_core::{
  Messaging,
  group::{GroupDetail, GroupInput, UserGroup},
  store::MessagingStore,
};
use uuid::Uuid;

use crate::{
  caller::{Admin, Caller},
  error::ApiError,
};

/// `GET /groups`
pub async fn list<S>(
  State(messaging): State<Messaging<S>>,
  _caller: Caller,
) -> Result<Json<Vec<UserGroup>>, ApiError>
where
  S: MessagingStore + 'static,
{
  Ok(Json(messaging.list_groups().await?))
}

/// `POST /groups`
pub async fn create<S>(
  State(messaging): State<Messaging<S>>,
  _admin: Admin,
  Json(input): Json<GroupInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MessagingStore + 'static,
{
  let group = messaging.create_group(input).await?;
  Ok((StatusCode::CREATED, Json(group)))
}

/// `GET /groups/:id`
pub async fn get_one<S>(
  State(messaging): State<Messaging<S>>,
  _caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<GroupDetail>, ApiError>
where
  S: MessagingStore + 'static,
{
  Ok(Json(messaging.get_group(id).await?))
}

/// `PUT /groups/:id`
pub async fn update<S>(
  State(messaging): State<Messaging<S>>,
  _admin: Admin,
  Path(id): Path<Uuid>,
  Json(input): Json<GroupInput>,
) -> Result<Json<GroupDetail>, ApiError>
where
  S: MessagingStore + 'static,
{
  Ok(Json(messaging.update_group(id, input).await?))
}

/// `DELETE /groups/:id`
pub async fn delete<S>(
  State(messaging): State<Messaging<S>>,
  _admin: Admin,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: MessagingStore + 'static,
{
  messaging.delete_group(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
