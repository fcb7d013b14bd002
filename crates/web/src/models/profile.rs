//! Profile and account types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use hrtaj_core::{Email, ProfileId, Role};

/// A team or customer profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    pub email: Email,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// What login needs to know about an account.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub id: ProfileId,
    pub email: Email,
    /// `None` for invited accounts that never set a password.
    pub password_hash: Option<String>,
    pub disabled: bool,
}

/// What the request guards need about a signed-in identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountAccess {
    /// `None` when the identity has no profile row.
    pub role: Option<Role>,
    pub disabled: bool,
}

/// Profile fields written by an invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteProfile {
    pub email: Email,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// A new account with a password, created from the CLI or tests.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Email,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    /// `None` creates an identity without a profile row.
    pub role: Option<Role>,
}
