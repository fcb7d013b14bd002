//! Deployment metadata endpoints.

use axum::{Json, extract::State};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub commit_sha: String,
    pub build_timestamp: String,
    pub version: &'static str,
}

/// Which optional integrations are configured. Never exposes values.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct EnvCheckResponse {
    pub has_database: bool,
    pub has_owner_secret: bool,
    pub has_import: bool,
    pub has_whats_app: bool,
}

/// Build and release information.
pub async fn version(State(state): State<AppState>) -> Json<VersionResponse> {
    let build = &state.config().build;
    Json(VersionResponse {
        commit_sha: build.commit_sha.clone(),
        build_timestamp: build.build_timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Configuration presence check.
pub async fn env_check(State(state): State<AppState>) -> Json<EnvCheckResponse> {
    let config = state.config();
    Json(EnvCheckResponse {
        has_database: !config.database_url.expose_secret().is_empty(),
        has_owner_secret: config.owner_console_enabled(),
        has_import: config.import.is_some(),
        has_whats_app: config
            .whatsapp
            .number
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty()),
    })
}
