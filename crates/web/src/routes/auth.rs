//! Authentication route handlers.
//!
//! Password login for customers (`/auth`) and the team (`/team/login`).
//! Both forms post to `/auth/login`; failures go back to the page they came
//! from with an `error` code and the original `next`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use hrtaj_core::safe_next_path;

use super::page::PageContext;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    AccessPolicy, LoginSurface, SignedIn, TeamAccess, clear_current_user, set_current_user,
};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
    /// `"team"` when posted from the team login page.
    pub surface: Option<String>,
}

/// Query parameters of the login pages.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template, shared by both surfaces.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub title: &'static str,
    pub surface: &'static str,
    pub error: Option<&'static str>,
    pub next: String,
}

const fn surface_name(surface: LoginSurface) -> &'static str {
    match surface {
        LoginSurface::Public => "public",
        LoginSurface::Team => "team",
    }
}

const fn fallback_next(surface: LoginSurface) -> &'static str {
    match surface {
        LoginSurface::Public => SignedIn::FALLBACK_NEXT,
        LoginSurface::Team => TeamAccess::FALLBACK_NEXT,
    }
}

fn render_login(page: PageContext, surface: LoginSurface, query: &LoginQuery) -> LoginTemplate {
    let title = match surface {
        LoginSurface::Public => page.t.login_title,
        LoginSurface::Team => page.t.team_login_title,
    };
    let error = query.error.as_deref().map(|code| page.t.login_error(code));
    LoginTemplate {
        title,
        surface: surface_name(surface),
        error,
        next: safe_next_path(query.next.as_deref(), fallback_next(surface)),
        page,
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the customer login page.
pub async fn login_page(page: PageContext, Query(query): Query<LoginQuery>) -> impl IntoResponse {
    render_login(page, LoginSurface::Public, &query)
}

/// Display the team login page.
pub async fn team_login_page(
    page: PageContext,
    Query(query): Query<LoginQuery>,
) -> impl IntoResponse {
    render_login(page, LoginSurface::Team, &query)
}

/// Handle login form submission.
///
/// On success the session id is cycled and the user is sent to the
/// sanitized `next`.
#[instrument(skip(state, session, form), fields(surface = form.surface.as_deref()))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let surface = if form.surface.as_deref() == Some("team") {
        LoginSurface::Team
    } else {
        LoginSurface::Public
    };
    let next = safe_next_path(form.next.as_deref(), fallback_next(surface));
    let back = |code: &str| {
        Redirect::to(&format!(
            "{}?error={code}&next={}",
            surface.login_path(),
            urlencoding::encode(&next)
        ))
        .into_response()
    };

    match state.auth().login(&form.email, &form.password).await {
        Ok(user) => {
            if let Err(e) = set_current_user(&session, &user).await {
                tracing::error!("Failed to set session: {}", e);
                return back("unavailable");
            }
            set_sentry_user(&user.id, Some(user.email.as_str()));
            tracing::info!(user_id = %user.id, "User logged in");
            Redirect::to(&next).into_response()
        }
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            back(e.login_error_code())
        }
    }
}

/// Handle logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();
    Redirect::to("/").into_response()
}
