//! Domain models for the web server.
//!
//! These are validated domain objects, separate from database row types.

pub mod audit;
pub mod lead;
pub mod profile;
pub mod session;
pub mod team;

pub use audit::{AuditAction, AuditEntry};
pub use lead::{AssignedFilter, LeadExportRow, LeadFilter, NewLead};
pub use profile::{AccountAccess, AccountCredentials, InviteProfile, NewAccount, Profile};
pub use session::CurrentUser;
pub use team::ClientFingerprint;
