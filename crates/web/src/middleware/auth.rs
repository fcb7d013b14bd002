//! Authentication and role guards.
//!
//! Every protected page and `/api/*` route takes one of these extractors:
//!
//! - [`Authorized<P>`] - signed in and holding a role allowed by policy `P`
//! - [`OwnerConsole`] - owner role plus the `owner_token` second factor
//! - [`OptionalUser`] - the session user, if any
//!
//! Roles are read from the profile store on every request, so a demotion
//! takes effect on the next request and a disabled account loses its
//! session. A user without a profile row gets the least privileged role.
//!
//! Page requests are redirected (login, `/dashboard?unauthorized=1`, owner
//! unlock); `/api/*` requests get a JSON error envelope instead.

use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use hrtaj_core::{ADMIN_ROLES, ALL_ROLES, IMPORT_ROLES, Role, TEAM_ROLES, safe_next_path};

use super::cookies::{OWNER_TOKEN_COOKIE, read_cookie};
use crate::error::ApiError;
use crate::models::{CurrentUser, session::keys};
use crate::state::AppState;

/// Where signed-out users are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginSurface {
    /// Customer login at `/auth`.
    Public,
    /// Team login at `/team/login`.
    Team,
}

impl LoginSurface {
    #[must_use]
    pub const fn login_path(self) -> &'static str {
        match self {
            Self::Public => "/auth",
            Self::Team => "/team/login",
        }
    }
}

/// Which roles may pass a guard and where rejected users go.
pub trait AccessPolicy: Send + Sync + 'static {
    /// Roles allowed through.
    const ALLOWED: &'static [Role];
    /// Login page for signed-out users.
    const SURFACE: LoginSurface;
    /// `next` used when the request path is not a safe redirect target.
    const FALLBACK_NEXT: &'static str;
}

/// Any signed-in user.
pub struct SignedIn;

impl AccessPolicy for SignedIn {
    const ALLOWED: &'static [Role] = ALL_ROLES;
    const SURFACE: LoginSurface = LoginSurface::Public;
    const FALLBACK_NEXT: &'static str = "/dashboard";
}

/// Owners and admins: user management and CRM export.
pub struct AdminAccess;

impl AccessPolicy for AdminAccess {
    const ALLOWED: &'static [Role] = ADMIN_ROLES;
    const SURFACE: LoginSurface = LoginSurface::Team;
    const FALLBACK_NEXT: &'static str = "/team";
}

/// Roles that may run listing imports.
pub struct ImportAccess;

impl AccessPolicy for ImportAccess {
    const ALLOWED: &'static [Role] = IMPORT_ROLES;
    const SURFACE: LoginSurface = LoginSurface::Team;
    const FALLBACK_NEXT: &'static str = "/team";
}

/// Any team member.
pub struct TeamAccess;

impl AccessPolicy for TeamAccess {
    const ALLOWED: &'static [Role] = TEAM_ROLES;
    const SURFACE: LoginSurface = LoginSurface::Team;
    const FALLBACK_NEXT: &'static str = "/team";
}

/// Owner role, without the console second factor.
pub struct OwnerRoleAccess;

impl AccessPolicy for OwnerRoleAccess {
    const ALLOWED: &'static [Role] = &[Role::Owner];
    const SURFACE: LoginSurface = LoginSurface::Team;
    const FALLBACK_NEXT: &'static str = "/owner";
}

/// Why a guard refused the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// Signed out, page request: redirect to the login page.
    RedirectToLogin(String),
    /// Signed out, API request.
    Unauthorized,
    /// Role not allowed, page request.
    RedirectUnauthorized,
    /// Role not allowed, API request.
    Forbidden,
    /// The profile store could not be reached.
    Unavailable { api: bool },
    /// No owner secret is configured.
    OwnerConsoleDisabled { api: bool },
    /// Owner token missing or wrong, page request: redirect to unlock.
    RedirectToUnlock(String),
    /// Owner token missing or wrong, API request.
    OwnerLocked,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(target) | Self::RedirectToUnlock(target) => {
                Redirect::to(&target).into_response()
            }
            Self::Unauthorized => ApiError::unauthorized().into_response(),
            Self::RedirectUnauthorized => Redirect::to("/dashboard?unauthorized=1").into_response(),
            Self::Forbidden => ApiError::forbidden().into_response(),
            Self::Unavailable { api: true } => ApiError::service_unavailable().into_response(),
            Self::Unavailable { api: false } => {
                (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable").into_response()
            }
            Self::OwnerConsoleDisabled { api: true } | Self::OwnerLocked => {
                ApiError::owner_locked().into_response()
            }
            Self::OwnerConsoleDisabled { api: false } => {
                (StatusCode::NOT_FOUND, "Not found").into_response()
            }
        }
    }
}

/// The URI as the client sent it. Nested routers strip their prefix from
/// `parts.uri`, so `/api/*` is only visible on [`OriginalUri`].
fn request_uri(parts: &Parts) -> &Uri {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0)
}

fn is_api(parts: &Parts) -> bool {
    request_uri(parts).path().starts_with("/api/")
}

/// The sanitized path and query of the current request.
fn next_path(parts: &Parts, fallback: &str) -> String {
    let requested = request_uri(parts)
        .path_and_query()
        .map(axum::http::uri::PathAndQuery::as_str);
    safe_next_path(requested, fallback)
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

fn signed_out(
    parts: &Parts,
    api: bool,
    surface: LoginSurface,
    fallback_next: &str,
) -> AuthRejection {
    if api {
        return AuthRejection::Unauthorized;
    }
    let next = next_path(parts, fallback_next);
    AuthRejection::RedirectToLogin(format!(
        "{}?next={}",
        surface.login_path(),
        urlencoding::encode(&next)
    ))
}

/// Drop the session of an account that was disabled or removed.
async fn end_session(parts: &Parts, user: &CurrentUser) {
    let Some(session) = parts.extensions.get::<Session>() else {
        return;
    };
    if let Err(e) = session.flush().await {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to flush revoked session");
    }
}

/// Shared guard logic: session user, then account lookup, then role check.
///
/// A disabled or deleted account is treated as signed out and its session
/// is flushed.
async fn authorize(
    parts: &Parts,
    state: &AppState,
    allowed: &[Role],
    surface: LoginSurface,
    fallback_next: &str,
) -> Result<(CurrentUser, Role), AuthRejection> {
    let api = is_api(parts);

    let Some(user) = session_user(parts).await else {
        return Err(signed_out(parts, api, surface, fallback_next));
    };

    let access = match state.profiles().find_access(user.id).await {
        Ok(access) => access,
        Err(e) => {
            tracing::error!(user_id = %user.id, error = %e, "Account lookup failed");
            return Err(AuthRejection::Unavailable { api });
        }
    };
    let role = match access {
        Some(access) if !access.disabled => Role::or_least_privileged(access.role),
        _ => {
            tracing::info!(user_id = %user.id, "Session of disabled or missing account revoked");
            end_session(parts, &user).await;
            return Err(signed_out(parts, api, surface, fallback_next));
        }
    };

    if !role.is_member_of(allowed) {
        tracing::debug!(
            user_id = %user.id,
            role = %role,
            path = request_uri(parts).path(),
            "Role not allowed"
        );
        return Err(if api {
            AuthRejection::Forbidden
        } else {
            AuthRejection::RedirectUnauthorized
        });
    }

    Ok((user, role))
}

/// Extractor requiring a signed-in user whose role `P` allows.
///
/// # Example
///
/// ```rust,ignore
/// async fn export(auth: Authorized<AdminAccess>) -> impl IntoResponse {
///     format!("{} ({})", auth.user.email, auth.role)
/// }
/// ```
pub struct Authorized<P> {
    pub user: CurrentUser,
    pub role: Role,
    _policy: PhantomData<P>,
}

impl<P: AccessPolicy> FromRequestParts<AppState> for Authorized<P> {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (user, role) =
            authorize(parts, state, P::ALLOWED, P::SURFACE, P::FALLBACK_NEXT).await?;
        Ok(Self {
            user,
            role,
            _policy: PhantomData,
        })
    }
}

/// Extractor for the owner console: owner role and a valid `owner_token`
/// cookie.
pub struct OwnerConsole {
    pub user: CurrentUser,
}

impl FromRequestParts<AppState> for OwnerConsole {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let api = is_api(parts);
        if !state.config().owner_console_enabled() {
            return Err(AuthRejection::OwnerConsoleDisabled { api });
        }

        let (user, _) = authorize(
            parts,
            state,
            OwnerRoleAccess::ALLOWED,
            OwnerRoleAccess::SURFACE,
            OwnerRoleAccess::FALLBACK_NEXT,
        )
        .await?;

        let unlocked = read_cookie(&parts.headers, OWNER_TOKEN_COOKIE)
            .is_some_and(|token| state.owner_token_matches(&token));
        if !unlocked {
            if api {
                return Err(AuthRejection::OwnerLocked);
            }
            let next = next_path(parts, OwnerRoleAccess::FALLBACK_NEXT);
            return Err(AuthRejection::RedirectToUnlock(format!(
                "/owner?next={}&unlock=1",
                urlencoding::encode(&next)
            )));
        }

        Ok(Self { user })
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike the guards, this never rejects and does not look up the role.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Store the signed-in user in the session, cycling the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Remove the signed-in user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_paths() {
        assert_eq!(LoginSurface::Public.login_path(), "/auth");
        assert_eq!(LoginSurface::Team.login_path(), "/team/login");
    }

    #[test]
    fn test_policies_role_sets() {
        assert!(Role::Partner.is_member_of(SignedIn::ALLOWED));
        assert!(!Role::Ops.is_member_of(AdminAccess::ALLOWED));
        assert!(Role::Staff.is_member_of(ImportAccess::ALLOWED));
        assert!(!Role::Agent.is_member_of(ImportAccess::ALLOWED));
        assert!(Role::Developer.is_member_of(TeamAccess::ALLOWED));
        assert!(!Role::Partner.is_member_of(TeamAccess::ALLOWED));
        assert!(!Role::Admin.is_member_of(OwnerRoleAccess::ALLOWED));
    }

    #[test]
    fn test_next_path_sanitized() {
        let (parts, ()) = axum::http::Request::builder()
            .uri("/team?tab=leads")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(next_path(&parts, "/fallback"), "/team?tab=leads");

        let (parts, ()) = axum::http::Request::builder()
            .uri("//evil.example/path")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(next_path(&parts, "/fallback"), "/fallback");
    }

    #[test]
    fn test_api_detected_from_original_uri() {
        let (mut parts, ()) = axum::http::Request::builder()
            .uri("/crm-export?status=new")
            .body(())
            .unwrap()
            .into_parts();
        assert!(!is_api(&parts));

        parts
            .extensions
            .insert(OriginalUri("/api/crm-export?status=new".parse().unwrap()));
        assert!(is_api(&parts));
        assert_eq!(next_path(&parts, "/team"), "/api/crm-export?status=new");
    }

    #[test]
    fn test_api_rejections_are_json_codes() {
        assert_eq!(
            AuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::Unavailable { api: true }
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AuthRejection::OwnerConsoleDisabled { api: false }
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_page_rejections_redirect() {
        let response = AuthRejection::RedirectUnauthorized.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "/dashboard?unauthorized=1"
        );
    }
}
