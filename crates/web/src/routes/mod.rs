//! HTTP route handlers for the marketplace.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Home page
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Readiness check (database)
//!
//! # Auth
//! GET  /auth                     - Customer login page
//! GET  /team/login               - Team login page
//! POST /auth/login               - Login action (rate limited)
//! POST /auth/logout              - Logout action
//!
//! # Signed-in pages
//! GET  /dashboard                - Any signed-in user
//! GET  /team                     - Team workspace (team roles)
//! GET  /owner                    - Owner console / unlock form (owner)
//! POST /owner/unlock             - Set the owner token cookie
//! POST /owner/lock               - Clear the owner token cookie
//!
//! # JSON API
//! POST /api/admin/users/update-role
//! POST /api/admin/users/disable
//! POST /api/admin/users/invite
//! POST /api/owner/invite-admin   - Owner console
//! POST /api/owner/leads/delete   - Owner console
//! GET  /api/crm-export           - CSV (admin roles)
//! POST /api/import/{kind}        - Import proxy (import roles)
//! POST /api/team/ping            - Presence heartbeat
//! POST /api/team/end             - Close presence session
//! POST /api/team/precheck        - Invitation check (rate limited)
//! POST /api/callback             - Callback request form
//! GET  /api/version
//! GET  /api/env-check
//! ```

pub mod api;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod home;
pub mod owner;
pub mod page;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::{
    csp_nonce_middleware, locale_middleware, login_rate_limiter, precheck_rate_limiter,
    request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth", get(auth::login_page))
        .route("/team/login", get(auth::team_login_page))
        .route("/auth/logout", post(auth::logout))
        .merge(
            Router::new()
                .route("/auth/login", post(auth::login))
                .layer(login_rate_limiter()),
        )
}

/// Create the signed-in page routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/team", get(dashboard::team))
        .route("/owner", get(owner::show))
        .route("/owner/unlock", post(owner::unlock))
        .route("/owner/lock", post(owner::lock))
}

/// Create the JSON API router (mounted at `/api`).
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users/update-role", post(api::admin::update_role))
        .route("/admin/users/disable", post(api::admin::disable))
        .route("/admin/users/invite", post(api::admin::invite))
        .route("/owner/invite-admin", post(api::owner::invite_admin))
        .route("/owner/leads/delete", post(api::owner::delete_lead))
        .route("/crm-export", get(api::crm::export))
        .route("/import/{kind}", post(api::import::run))
        .route("/team/ping", post(api::team::ping))
        .route("/team/end", post(api::team::end))
        .route("/callback", post(api::callback::submit))
        .route("/version", get(api::meta::version))
        .route("/env-check", get(api::meta::env_check))
        .merge(
            Router::new()
                .route("/team/precheck", post(api::team::precheck))
                .layer(precheck_rate_limiter()),
        )
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(page_routes())
        .merge(auth_routes())
        .nest("/api", api_routes())
}

/// Build the application with its middleware stack.
///
/// Sentry layers are added by the binary on top of this.
pub fn app<Store>(state: AppState, session_layer: SessionManagerLayer<Store>) -> Router
where
    Store: SessionStore + Clone,
{
    routes()
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            locale_middleware,
        ))
        .layer(session_layer)
        .layer(axum_middleware::from_fn(csp_nonce_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
