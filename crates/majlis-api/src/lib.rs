//! JSON REST API for Majlis.
//!
//! Exposes an axum [`Router`] backed by a [`Messaging`] service over any
//! [`MessagingStore`]. Authentication, TLS, and transport concerns are the
//! caller's responsibility; see [`caller`] for how identity reaches handlers.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", majlis_api::api_router(messaging.clone()))
//! ```

pub mod caller;
pub mod error;
pub mod groups;
pub mod messages;
pub mod notifications;
pub mod rooms;

use axum::{
  Router,
  routing::{delete, get, post},
};
use majlis_core::{Messaging, store::MessagingStore};

pub use caller::{Admin, Caller, Role};
pub use error::ApiError;

/// Build a fully-materialised API router for `messaging`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(messaging: Messaging<S>) -> Router<()>
where
  S: MessagingStore + 'static,
{
  Router::new()
    // Rooms
    .route("/rooms", get(rooms::list::<S>).post(rooms::create::<S>))
    .route("/rooms/direct", post(rooms::direct::<S>))
    .route("/rooms/{id}", get(rooms::get_one::<S>))
    .route("/rooms/{id}/members", post(rooms::add_member::<S>))
    .route("/rooms/{id}/members/{user_id}", delete(rooms::remove_member::<S>))
    .route(
      "/rooms/{id}/messages",
      get(messages::list::<S>).post(messages::post::<S>),
    )
    // Groups
    .route("/groups", get(groups::list::<S>).post(groups::create::<S>))
    .route(
      "/groups/{id}",
      get(groups::get_one::<S>)
        .put(groups::update::<S>)
        .delete(groups::delete::<S>),
    )
    // Notifications
    .route(
      "/notifications",
      get(notifications::list::<S>).post(notifications::publish::<S>),
    )
    .route("/notifications/unread-count", get(notifications::unread_count::<S>))
    .route("/notifications/read-all", post(notifications::read_all::<S>))
    .route("/notifications/{id}/read", post(notifications::mark_read::<S>))
    .route("/notifications/{id}/recipients", get(notifications::recipients::<S>))
    .with_state(messaging)
}
