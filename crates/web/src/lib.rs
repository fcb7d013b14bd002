//! Hrtaj marketplace web library.
//!
//! The server is built as a library so router tests can drive it with
//! in-memory repositories and session storage.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod messages;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
