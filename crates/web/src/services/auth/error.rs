//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] hrtaj_core::EmailError),

    /// Invalid credentials (wrong password, unknown email, or no password set).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but has been disabled by an admin.
    #[error("account disabled")]
    AccountDisabled,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Query value used when redirecting back to a login form.
    #[must_use]
    pub const fn login_error_code(&self) -> &'static str {
        match self {
            Self::AccountDisabled => "account_disabled",
            Self::Repository(_) | Self::PasswordHash => "unavailable",
            _ => "invalid_credentials",
        }
    }
}
