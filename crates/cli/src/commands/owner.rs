//! Owner account bootstrap.
//!
//! Owners cannot be created through the web interface: invitations only
//! hand out team roles and admins cannot touch owner accounts. The first
//! owner is created here.
//!
//! # Usage
//!
//! ```bash
//! HRTAJ_OWNER_PASSWORD='...' hrtaj-cli owner create -e owner@example.com -n "Owner Name"
//! ```

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use hrtaj_core::Role;
use hrtaj_web::db::{PgProfileRepository, create_pool};
use hrtaj_web::services::{AuthError, AuthService};

/// Errors that can occur during owner operations.
#[derive(Debug, Error)]
pub enum OwnerError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Owner account already exists with email: {0}")]
    UserExists(String),

    #[error("{0}")]
    Auth(AuthError),
}

/// Create an owner account with a password.
///
/// # Errors
///
/// Returns an error if the email is invalid or taken, the password is too
/// weak, or the database cannot be reached.
pub async fn create(
    email: &str,
    password: &SecretString,
    name: Option<String>,
) -> Result<(), OwnerError> {
    let database_url = super::database_url().map_err(OwnerError::MissingEnvVar)?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;
    let auth = AuthService::new(Arc::new(PgProfileRepository::new(pool)));

    let user = auth
        .register(email, password.expose_secret(), name, Some(Role::Owner))
        .await
        .map_err(|e| match e {
            AuthError::UserAlreadyExists => OwnerError::UserExists(email.to_owned()),
            other => OwnerError::Auth(other),
        })?;

    tracing::info!(user_id = %user.id, email = %user.email, "Owner account created");
    tracing::info!("Set OWNER_SECRET on the web server to enable the owner console.");
    Ok(())
}
