//! Hrtaj Core - Shared domain library.
//!
//! This crate provides the types and rules shared by the Hrtaj components:
//! - `web` - Public marketplace site, team workspace and owner console
//! - `cli` - Command-line tools for migrations and account seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no network, no
//! database access, no HTTP clients. Preference stores talk to storage
//! through the [`prefs::KeyValueStorage`] trait so the embedding client
//! decides where bytes live.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, roles and the role-change policy, locale/theme
//! - [`paths`] - Safe return paths for login redirects
//! - [`phone`] - Egyptian phone normalization
//! - [`whatsapp`] - WhatsApp message templates and deep links
//! - [`prefs`] - Favorites, compare, recently viewed and saved searches

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod paths;
pub mod phone;
pub mod prefs;
pub mod types;
pub mod whatsapp;

pub use paths::safe_next_path;
pub use phone::normalize_egypt_phone;
pub use types::*;
