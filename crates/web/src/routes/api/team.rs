//! Team presence and invitation precheck.
//!
//! The team workspace pings every minute or so while open. A ping refreshes
//! the caller's open session when it names one, and otherwise closes all of
//! the caller's open sessions and starts a new one.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use hrtaj_core::{Email, TEAM_ROLES, TeamSessionId, normalize_egypt_phone};

use super::{ApiJson, RequestMeta, clean, ok};
use crate::db::RepositoryError;
use crate::error::ApiError;
use crate::middleware::{Authorized, SignedIn, TeamAccess};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub session_id: Option<String>,
}

impl SessionRequest {
    /// The named session, if it is a well-formed id.
    fn session(&self) -> Option<TeamSessionId> {
        clean(self.session_id.as_deref()).and_then(|id| TeamSessionId::parse(id).ok())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PrecheckRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
}

fn unavailable(e: &RepositoryError) -> ApiError {
    ApiError::from_failure(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", e)
}

/// Phones match when both normalize to the same number, or, failing
/// normalization, when their trimmed text is identical.
fn phones_match(stored: &str, given: &str) -> bool {
    match (normalize_egypt_phone(stored), normalize_egypt_phone(given)) {
        (Some(a), Some(b)) => a == b,
        _ => stored.trim() == given.trim(),
    }
}

/// Heartbeat from the team workspace.
#[instrument(skip(state, auth, meta, body), fields(user_id = %auth.user.id))]
pub async fn ping(
    State(state): State<AppState>,
    auth: Authorized<TeamAccess>,
    meta: RequestMeta,
    body: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let fingerprint = meta.fingerprint();
    let now = Utc::now();
    let sessions = state.team_sessions();

    if let Some(session) = body.session()
        && sessions
            .touch(session, auth.user.id, &fingerprint, now)
            .await
            .map_err(|e| unavailable(&e))?
    {
        return Ok(Json(json!({ "ok": true, "sessionId": session })));
    }

    let session = sessions
        .restart(auth.user.id, &fingerprint, now)
        .await
        .map_err(|e| unavailable(&e))?;
    tracing::debug!(session_id = %session, "Team session started");

    Ok(Json(json!({ "ok": true, "sessionId": session })))
}

/// Close a presence session. A missing id is not an error.
#[instrument(skip(state, auth, body), fields(user_id = %auth.user.id))]
pub async fn end(
    State(state): State<AppState>,
    auth: Authorized<SignedIn>,
    body: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    if let Some(session) = body.session() {
        state
            .team_sessions()
            .end(session, auth.user.id, Utc::now())
            .await
            .map_err(|e| unavailable(&e))?;
    }
    Ok(ok())
}

/// Check that an email was invited to the team and the phone matches the
/// invitation, before the account is activated.
#[instrument(skip(state, req))]
pub async fn precheck(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PrecheckRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req
        .email
        .as_deref()
        .and_then(|e| Email::parse(e).ok())
        .ok_or_else(ApiError::invalid_input)?;
    let phone = clean(req.phone.as_deref()).ok_or_else(ApiError::invalid_input)?;

    let profile = state
        .profiles()
        .find_profile_by_email(&email)
        .await
        .map_err(|e| unavailable(&e))?
        .filter(|p| p.is_active && p.role.is_member_of(TEAM_ROLES))
        .ok_or(ApiError::new(StatusCode::NOT_FOUND, "not_invited"))?;

    let stored = clean(profile.phone.as_deref());
    if !stored.is_some_and(|stored| phones_match(stored, phone)) {
        return Err(ApiError::new(StatusCode::FORBIDDEN, "mismatch"));
    }

    Ok(ok())
}
