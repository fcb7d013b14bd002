//! Core types for the Hrtaj marketplace.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod locale;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use locale::{Locale, Theme};
pub use role::{
    ADMIN_ROLES, ALL_ROLES, IMPORT_ROLES, INVITABLE_ROLES, Role, RoleChange, RoleChangeDenied,
    RoleParseError, TEAM_ROLES, authorize_role_change,
};
