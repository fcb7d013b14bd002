//! Database access for the marketplace `PostgreSQL`.
//!
//! ## Tables
//!
//! - `identities` - Sign-in identities (email, password hash, disabled flag)
//! - `profiles` - Role and contact details per identity
//! - `listings` - Listing titles referenced by leads
//! - `leads` - Inquiries and callback requests
//! - `team_sessions` - Team presence sessions
//! - `audit_log` - Administrative audit trail
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! Each table group sits behind a repository trait with a `PostgreSQL`
//! implementation and an in-memory one ([`memory`]) used by tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p hrtaj-cli -- migrate
//! ```

pub mod audit_log;
pub mod leads;
pub mod memory;
pub mod profiles;
pub mod team_sessions;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use audit_log::{AuditLogRepository, PgAuditLogRepository};
pub use leads::{LeadRepository, PgLeadRepository};
pub use profiles::{PgProfileRepository, ProfileRepository};
pub use team_sessions::{PgTeamSessionRepository, TeamSessionRepository};

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The backing store cannot serve requests.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Map unique-constraint violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_insert(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_owned())
            }
            _ => Self::Database(err),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// The repositories the server talks to.
#[derive(Clone)]
pub struct Repositories {
    pub profiles: Arc<dyn ProfileRepository>,
    pub leads: Arc<dyn LeadRepository>,
    pub team_sessions: Arc<dyn TeamSessionRepository>,
    pub audit_log: Arc<dyn AuditLogRepository>,
}

impl Repositories {
    /// `PostgreSQL`-backed repositories sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            profiles: Arc::new(PgProfileRepository::new(pool.clone())),
            leads: Arc::new(PgLeadRepository::new(pool.clone())),
            team_sessions: Arc::new(PgTeamSessionRepository::new(pool.clone())),
            audit_log: Arc::new(PgAuditLogRepository::new(pool.clone())),
        }
    }

    /// In-memory repositories, returned alongside the concrete store so
    /// tests can seed and inspect it.
    #[must_use]
    pub fn in_memory() -> (Self, Arc<memory::MemoryStore>) {
        let store = Arc::new(memory::MemoryStore::default());
        let repos = Self {
            profiles: store.clone(),
            leads: store.clone(),
            team_sessions: store.clone(),
            audit_log: store.clone(),
        };
        (repos, store)
    }
}
