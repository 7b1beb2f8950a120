//! Core types, storage port, and service logic for the Majlis messaging and
//! notification subsystem.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::MessagingStore`]; transports drive
//! [`service::Messaging`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod group;
pub mod message;
pub mod notification;
pub mod room;
pub mod service;
pub mod store;
pub mod user;

mod validate;

pub use error::{Entity, Error, Result};
pub use service::Messaging;

use chrono::{DateTime, SubsecRound as _, Utc};

/// The current time, truncated to the microsecond precision every store
/// persists, so values handed back from a write compare equal to a re-read.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

#[cfg(test)]
mod tests;
