//! CLI command implementations.

pub mod migrate;
pub mod owner;

use secrecy::SecretString;

/// Database URL from `HRTAJ_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns the name of the missing variable.
pub fn database_url() -> Result<SecretString, &'static str> {
    dotenvy::dotenv().ok();
    std::env::var("HRTAJ_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "HRTAJ_DATABASE_URL")
}
