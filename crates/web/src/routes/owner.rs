//! Owner console pages.
//!
//! The console needs the owner role plus an `owner_token` cookie holding the
//! `OWNER_SECRET`. `GET /owner` shows the unlock form until the cookie is
//! valid; unlocking and locking only set or clear that cookie.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use hrtaj_core::safe_next_path;

use super::page::PageContext;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::cookies::{
    OWNER_TOKEN_COOKIE, owner_token_cookie, owner_token_removal, read_cookie, set_cookie_value,
};
use crate::middleware::rate_limit::{forwarded_ip, user_agent};
use crate::middleware::{AccessPolicy, Authorized, OwnerRoleAccess};
use crate::models::{AuditAction, AuditEntry};
use crate::state::AppState;

/// Query parameters of the owner page.
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub next: Option<String>,
    pub error: Option<String>,
}

/// Unlock form data.
#[derive(Debug, Deserialize)]
pub struct UnlockForm {
    pub secret: String,
    pub next: Option<String>,
}

/// Owner console template.
#[derive(Template, WebTemplate)]
#[template(path = "owner.html")]
pub struct OwnerTemplate {
    pub page: PageContext,
    pub unlocked: bool,
    pub invalid_secret: bool,
    pub next: String,
}

fn disabled() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

fn with_cookie(mut response: Response, cookie: &tower_sessions::cookie::Cookie<'_>) -> Response {
    if let Some(value) = set_cookie_value(cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

/// Display the owner console, or its unlock form.
pub async fn show(
    State(state): State<AppState>,
    _auth: Authorized<OwnerRoleAccess>,
    page: PageContext,
    headers: HeaderMap,
    Query(query): Query<OwnerQuery>,
) -> Response {
    if !state.config().owner_console_enabled() {
        return disabled();
    }

    let unlocked = read_cookie(&headers, OWNER_TOKEN_COOKIE)
        .is_some_and(|token| state.owner_token_matches(&token));

    OwnerTemplate {
        page,
        unlocked,
        invalid_secret: query.error.as_deref() == Some("invalid_secret"),
        next: safe_next_path(query.next.as_deref(), OwnerRoleAccess::FALLBACK_NEXT),
    }
    .into_response()
}

/// Check the owner secret and set the `owner_token` cookie.
#[instrument(skip(state, auth, headers, form), fields(user_id = %auth.user.id))]
pub async fn unlock(
    State(state): State<AppState>,
    auth: Authorized<OwnerRoleAccess>,
    headers: HeaderMap,
    Form(form): Form<UnlockForm>,
) -> Response {
    if !state.config().owner_console_enabled() {
        return disabled();
    }

    let next = safe_next_path(form.next.as_deref(), OwnerRoleAccess::FALLBACK_NEXT);
    if !state.owner_token_matches(&form.secret) {
        tracing::warn!("Owner console unlock rejected");
        return Redirect::to(&format!(
            "/owner?error=invalid_secret&unlock=1&next={}",
            urlencoding::encode(&next)
        ))
        .into_response();
    }

    state.audit().emit(
        AuditEntry::new(auth.user.id, AuditAction::OwnerUnlocked, "owner_console")
            .request(forwarded_ip(&headers), user_agent(&headers)),
    );
    add_breadcrumb("owner", "Owner console unlocked", None);

    let cookie = owner_token_cookie(form.secret, state.config().secure_cookies());
    with_cookie(Redirect::to(&next).into_response(), &cookie)
}

/// Clear the `owner_token` cookie.
pub async fn lock(State(state): State<AppState>, _auth: Authorized<OwnerRoleAccess>) -> Response {
    let cookie = owner_token_removal(state.config().secure_cookies());
    with_cookie(Redirect::to("/owner").into_response(), &cookie)
}
