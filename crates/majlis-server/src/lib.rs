//! Runtime wiring for the Majlis server: configuration, user seeding, and the
//! top-level router.
//!
//! # Configuration
//!
//! ```toml
//! host       = "0.0.0.0"
//! port       = 8080
//! store_path = "~/.local/share/majlis/majlis.db"
//! seed_path  = "users.toml"   # optional
//! ```
//!
//! Every key can be overridden from the environment with a `MAJLIS_` prefix,
//! e.g. `MAJLIS_PORT=9000`.
//!
//! # Seed file
//!
//! ```toml
//! [[users]]
//! id    = "6f1c0b7e-2f0e-4d7a-9b55-1f1d2a3c4b5d"
//! name  = "Aisha"
//! email = "aisha@example.org"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use axum::Router;
use majlis_core::{Messaging, user::User};
use majlis_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub seed_path:  Option<PathBuf>,
}

impl ServerConfig {
  /// Layer defaults, the TOML file at `path` (if it exists), and `MAJLIS_*`
  /// environment variables, in increasing precedence.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080)?
      .set_default("store_path", "~/.local/share/majlis/majlis.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("MAJLIS"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Seeding ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SeedFile {
  #[serde(default)]
  users: Vec<SeedUser>,
}

#[derive(Debug, Deserialize)]
struct SeedUser {
  id:    Uuid,
  name:  String,
  email: String,
}

/// Upsert every user listed in the seed file at `path`. Returns how many
/// entries were applied.
pub async fn seed_users(store: &SqliteStore, path: &Path) -> anyhow::Result<usize> {
  let seed: SeedFile = config::Config::builder()
    .add_source(config::File::from(path))
    .build()
    .and_then(config::Config::try_deserialize)
    .with_context(|| format!("failed to read seed file {path:?}"))?;

  for entry in &seed.users {
    let user = User {
      user_id: entry.id,
      name:    entry.name.clone(),
      email:   entry.email.clone(),
    };
    store
      .upsert_user(&user)
      .await
      .with_context(|| format!("failed to seed user {}", entry.id))?;
  }
  Ok(seed.users.len())
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The complete HTTP application: the JSON API under `/api`, with request
/// tracing.
pub fn app(messaging: Messaging<SqliteStore>) -> Router {
  Router::new()
    .nest("/api", majlis_api::api_router(messaging))
    .layer(TraceLayer::new_for_http())
}
