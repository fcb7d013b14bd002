//! User management for admins and owners.
//!
//! ```text
//! POST /api/admin/users/update-role  {targetUserId, newRole}
//! POST /api/admin/users/disable      {targetUserId, disabled}
//! POST /api/admin/users/invite       {fullName, email, phone?, role}
//! ```
//!
//! Every change goes through [`authorize_role_change`], so only owners can
//! touch owner accounts and no owner can change their own.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use hrtaj_core::{
    Email, INVITABLE_ROLES, ProfileId, Role, RoleChange, RoleChangeDenied, authorize_role_change,
};

use super::{ApiJson, RequestMeta, clean, ok};
use crate::db::RepositoryError;
use crate::error::ApiError;
use crate::middleware::{AdminAccess, Authorized};
use crate::models::{AuditAction, AuditEntry, InviteProfile};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub target_user_id: String,
    pub new_role: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisableRequest {
    pub target_user_id: String,
    #[serde(default)]
    pub disabled: bool,
}

/// Invitation form. Also accepts `full_name`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    #[serde(alias = "full_name")]
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

// =============================================================================
// Validation
// =============================================================================

/// Validated contact details of an invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InviteContact {
    pub email: Email,
    pub full_name: String,
    pub phone: Option<String>,
}

impl InviteContact {
    pub(crate) fn into_profile(self, role: Role) -> InviteProfile {
        InviteProfile {
            email: self.email,
            full_name: self.full_name,
            phone: self.phone,
            role,
        }
    }
}

/// Name 2..=80 characters, phone 7..=30 when given, email with an `@` and
/// at most 120 characters.
pub(crate) fn validate_contact(req: &InviteRequest) -> Result<InviteContact, ApiError> {
    let full_name = clean(req.full_name.as_deref()).ok_or_else(ApiError::invalid_input)?;
    if !(2..=80).contains(&full_name.chars().count()) {
        return Err(ApiError::invalid_input());
    }

    let phone = clean(req.phone.as_deref());
    if let Some(phone) = phone
        && !(7..=30).contains(&phone.chars().count())
    {
        return Err(ApiError::invalid_input());
    }

    let email = req
        .email
        .as_deref()
        .and_then(|e| Email::parse(e).ok())
        .ok_or_else(ApiError::invalid_input)?;

    Ok(InviteContact {
        email,
        full_name: full_name.to_owned(),
        phone: phone.map(str::to_owned),
    })
}

fn invitable_role(raw: Option<&str>) -> Result<Role, ApiError> {
    raw.and_then(|r| r.parse::<Role>().ok())
        .filter(|role| role.is_member_of(INVITABLE_ROLES))
        .ok_or_else(invalid_role)
}

fn parse_target(raw: &str) -> Result<ProfileId, ApiError> {
    ProfileId::parse(raw.trim()).map_err(|_| ApiError::invalid_input())
}

const fn invalid_role() -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "invalid_role")
}

fn denied(actor: ProfileId, reason: RoleChangeDenied) -> ApiError {
    tracing::warn!(actor_id = %actor, reason = %reason, "Role change denied");
    ApiError::forbidden()
}

fn lookup_failed(e: &RepositoryError) -> ApiError {
    ApiError::from_failure(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", e)
}

// =============================================================================
// Handlers
// =============================================================================

/// Change another user's role.
#[instrument(skip(state, auth, meta, req), fields(actor_id = %auth.user.id))]
pub async fn update_role(
    State(state): State<AppState>,
    auth: Authorized<AdminAccess>,
    meta: RequestMeta,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target_id = parse_target(&req.target_user_id)?;
    let new_role: Role = req
        .new_role
        .parse()
        .map_err(|_| ApiError::invalid_input())?;

    let target = state
        .profiles()
        .find_profile(target_id)
        .await
        .map_err(|e| lookup_failed(&e))?
        .ok_or_else(ApiError::not_found)?;

    authorize_role_change(&RoleChange {
        actor_id: auth.user.id,
        actor_role: auth.role,
        target_id,
        target_role: Some(target.role),
        new_role: Some(new_role),
    })
    .map_err(|reason| denied(auth.user.id, reason))?;

    state
        .profiles()
        .update_role(target_id, new_role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => ApiError::not_found(),
            other => ApiError::from_failure(StatusCode::BAD_REQUEST, "update_failed", &other),
        })?;

    tracing::info!(target_id = %target_id, from = %target.role, to = %new_role, "Role updated");
    state.audit().emit(
        AuditEntry::new(auth.user.id, AuditAction::UserRoleUpdated, "profile")
            .entity_id(target_id)
            .metadata(json!({ "from": target.role, "to": new_role }))
            .request(meta.ip, meta.user_agent),
    );

    Ok(ok())
}

/// Disable or re-enable another user's account.
#[instrument(skip(state, auth, meta, req), fields(actor_id = %auth.user.id))]
pub async fn disable(
    State(state): State<AppState>,
    auth: Authorized<AdminAccess>,
    meta: RequestMeta,
    ApiJson(req): ApiJson<DisableRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target_id = parse_target(&req.target_user_id)?;

    let target_role = state
        .profiles()
        .find_role(target_id)
        .await
        .map_err(|e| lookup_failed(&e))?;

    authorize_role_change(&RoleChange {
        actor_id: auth.user.id,
        actor_role: auth.role,
        target_id,
        target_role,
        new_role: None,
    })
    .map_err(|reason| denied(auth.user.id, reason))?;

    state
        .profiles()
        .set_disabled(target_id, req.disabled)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => ApiError::not_found(),
            other => ApiError::from_failure(StatusCode::BAD_REQUEST, "update_failed", &other),
        })?;

    let action = if req.disabled {
        AuditAction::UserDisabled
    } else {
        AuditAction::UserEnabled
    };
    tracing::info!(target_id = %target_id, disabled = req.disabled, "Account state updated");
    state.audit().emit(
        AuditEntry::new(auth.user.id, action, "profile")
            .entity_id(target_id)
            .request(meta.ip, meta.user_agent),
    );

    Ok(ok())
}

/// Invite a team member, or refresh an existing account's invitation.
#[instrument(skip(state, auth, meta, req), fields(actor_id = %auth.user.id))]
pub async fn invite(
    State(state): State<AppState>,
    auth: Authorized<AdminAccess>,
    meta: RequestMeta,
    ApiJson(req): ApiJson<InviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let contact = validate_contact(&req)?;
    let role = invitable_role(req.role.as_deref())?;

    let existing = state
        .profiles()
        .find_profile_by_email(&contact.email)
        .await
        .map_err(|e| lookup_failed(&e))?;
    if let Some(existing) = &existing {
        authorize_role_change(&RoleChange {
            actor_id: auth.user.id,
            actor_role: auth.role,
            target_id: existing.id,
            target_role: Some(existing.role),
            new_role: Some(role),
        })
        .map_err(|reason| denied(auth.user.id, reason))?;
    }

    let email = contact.email.clone();
    let user_id = state
        .profiles()
        .upsert_invited(&contact.into_profile(role))
        .await
        .map_err(|e| ApiError::from_failure(StatusCode::BAD_REQUEST, "invite_failed", &e))?;

    tracing::info!(user_id = %user_id, role = %role, "User invited");
    state.audit().emit(
        AuditEntry::new(auth.user.id, AuditAction::UserInvited, "profile")
            .entity_id(user_id)
            .metadata(json!({ "email": email, "role": role }))
            .request(meta.ip, meta.user_agent),
    );

    Ok(Json(json!({ "ok": true, "userId": user_id, "inviteLink": null })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, phone: Option<&str>) -> InviteRequest {
        InviteRequest {
            full_name: Some(name.to_owned()),
            email: Some(email.to_owned()),
            phone: phone.map(str::to_owned),
            role: Some("staff".to_owned()),
        }
    }

    #[test]
    fn test_validate_contact_accepts_and_normalizes() {
        let contact = validate_contact(&request("  Mona Ali ", " Mona@Example.com ", None)).unwrap();
        assert_eq!(contact.full_name, "Mona Ali");
        assert_eq!(contact.email.as_str(), "mona@example.com");
        assert_eq!(contact.phone, None);
    }

    #[test]
    fn test_validate_contact_bounds() {
        assert!(validate_contact(&request("M", "a@b.c", None)).is_err());
        assert!(validate_contact(&request(&"x".repeat(81), "a@b.c", None)).is_err());
        assert!(validate_contact(&request("Mona", "no-at", None)).is_err());
        assert!(validate_contact(&request("Mona", "a@b.c", Some("123"))).is_err());
        assert!(validate_contact(&request("Mona", "a@b.c", Some(&"1".repeat(31)))).is_err());
        assert!(validate_contact(&request("Mona", "a@b.c", Some("  "))).is_ok());
        assert!(validate_contact(&InviteRequest::default()).is_err());
    }

    #[test]
    fn test_invitable_role() {
        assert_eq!(invitable_role(Some("ops")).unwrap(), Role::Ops);
        assert_eq!(invitable_role(Some("owner")).unwrap_err().code(), "invalid_role");
        assert_eq!(invitable_role(Some("user")).unwrap_err().code(), "invalid_role");
        assert_eq!(invitable_role(None).unwrap_err().code(), "invalid_role");
    }

    #[test]
    fn test_invite_request_accepts_snake_case_name() {
        let req: InviteRequest =
            serde_json::from_str(r#"{"full_name":"Mona","email":"a@b.c","role":"ops"}"#).unwrap();
        assert_eq!(req.full_name.as_deref(), Some("Mona"));
    }
}
