//! Signed-in landing pages: the user dashboard and the team workspace.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::Query, response::IntoResponse};
use serde::Deserialize;

use hrtaj_core::{Role, TEAM_ROLES};

use super::page::PageContext;
use crate::filters;
use crate::middleware::{Authorized, SignedIn, TeamAccess};

/// Query parameters of the dashboard.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Set by guards that turned the user away from another page.
    pub unauthorized: Option<String>,
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub email: String,
    pub role: Role,
    pub unauthorized: bool,
    pub is_team: bool,
    pub is_owner: bool,
}

/// Team workspace template.
#[derive(Template, WebTemplate)]
#[template(path = "team.html")]
pub struct TeamTemplate {
    pub page: PageContext,
    pub email: String,
    pub role: Role,
}

/// Display the dashboard of any signed-in user.
pub async fn dashboard(
    auth: Authorized<SignedIn>,
    page: PageContext,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    DashboardTemplate {
        page,
        email: auth.user.email.into_inner(),
        role: auth.role,
        unauthorized: query.unauthorized.as_deref() == Some("1"),
        is_team: auth.role.is_member_of(TEAM_ROLES),
        is_owner: auth.role == Role::Owner,
    }
}

/// Display the team workspace.
pub async fn team(auth: Authorized<TeamAccess>, page: PageContext) -> impl IntoResponse {
    TeamTemplate {
        page,
        email: auth.user.email.into_inner(),
        role: auth.role,
    }
}
