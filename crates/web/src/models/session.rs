//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use hrtaj_core::{Email, ProfileId};

/// Session-stored user identity.
///
/// Only the identity lives in the session. Roles are looked up per request
/// so a demotion takes effect immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Profile ID.
    pub id: ProfileId,
    /// Sign-in email address.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
