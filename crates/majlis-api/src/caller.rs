//! The [`Caller`] extractor.
//!
//! Authentication happens upstream of this router. The authenticating layer
//! forwards the resolved identity in two headers:
//!
//! - `x-user-id`: the caller's UUID (required)
//! - `x-user-role`: `user` or `admin` (optional, defaults to `user`)
//!
//! A missing or malformed value rejects the request with 401. Handlers that
//! need the admin role take [`Admin`] instead of [`Caller`], which rejects
//! with 403 before any request body is read.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  User,
  Admin,
}

impl Role {
  fn parse(s: &str) -> Option<Self> {
    match s.trim() {
      "user" => Some(Role::User),
      "admin" => Some(Role::Admin),
      _ => None,
    }
  }
}

/// The authenticated user making the request.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Caller {
  /// `Forbidden` unless the caller holds [`Role::Admin`].
  pub fn require_admin(&self) -> Result<(), ApiError> {
    match self.role {
      Role::Admin => Ok(()),
      Role::User => Err(ApiError::Core(majlis_core::Error::Forbidden)),
    }
  }
}

impl<S> FromRequestParts<S> for Caller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let user_id = parts
      .headers
      .get(USER_ID_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|s| Uuid::parse_str(s.trim()).ok())
      .ok_or(ApiError::Unauthorized)?;

    let role = match parts.headers.get(USER_ROLE_HEADER) {
      None => Role::User,
      Some(v) => v
        .to_str()
        .ok()
        .and_then(Role::parse)
        .ok_or(ApiError::Unauthorized)?,
    };

    Ok(Caller { user_id, role })
  }
}

/// A [`Caller`] holding [`Role::Admin`].
#[derive(Debug, Clone, Copy)]
pub struct Admin(pub Caller);

impl<S> FromRequestParts<S> for Admin
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let caller = Caller::from_request_parts(parts, state).await?;
    caller.require_admin()?;
    Ok(Admin(caller))
  }
}
