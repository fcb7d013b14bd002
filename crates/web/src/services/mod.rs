//! Business logic services for the web server.
//!
//! # Services
//!
//! - `auth` - Password login and account creation
//! - `audit` - Non-blocking audit trail writer
//! - `import` - Proxy to the listing import API
//! - `rate_limit` - Fixed-window request counters

pub mod audit;
pub mod auth;
pub mod import;
pub mod rate_limit;

pub use audit::AuditSink;
pub use auth::{AuthError, AuthService};
pub use import::{ImportClient, ImportError, ImportKind, ImportPart, ImportResponse};
pub use rate_limit::{FixedWindowLimiter, RateDecision};
