//! Owner console actions. Both need the owner role and a valid
//! `owner_token` cookie.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use hrtaj_core::{LeadId, Role, RoleChange, authorize_role_change};

use super::admin::{InviteRequest, validate_contact};
use super::{ApiJson, RequestMeta, clean, ok};
use crate::db::RepositoryError;
use crate::error::ApiError;
use crate::middleware::OwnerConsole;
use crate::models::{AuditAction, AuditEntry};
use crate::state::AppState;

/// Typed confirmation required to delete a lead.
const DELETE_CONFIRMATION: &str = "DELETE";

#[derive(Debug, Default, Deserialize)]
pub struct DeleteLeadRequest {
    pub id: Option<String>,
    pub confirm: Option<String>,
}

/// Invite an admin, or make an existing account an admin. Goes through
/// [`authorize_role_change`] like every other role change, so an owner
/// cannot invite their own address.
#[instrument(skip(state, owner, meta, req), fields(actor_id = %owner.user.id))]
pub async fn invite_admin(
    State(state): State<AppState>,
    owner: OwnerConsole,
    meta: RequestMeta,
    ApiJson(req): ApiJson<InviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let contact = validate_contact(&req)?;

    let existing = state
        .profiles()
        .find_profile_by_email(&contact.email)
        .await
        .map_err(|e| {
            ApiError::from_failure(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", &e)
        })?;
    if let Some(existing) = &existing {
        authorize_role_change(&RoleChange {
            actor_id: owner.user.id,
            actor_role: Role::Owner,
            target_id: existing.id,
            target_role: Some(existing.role),
            new_role: Some(Role::Admin),
        })
        .map_err(|reason| {
            tracing::warn!(reason = %reason, "Admin invitation denied");
            ApiError::forbidden()
        })?;
    }

    let email = contact.email.clone();
    let user_id = state
        .profiles()
        .upsert_invited(&contact.into_profile(Role::Admin))
        .await
        .map_err(|e| ApiError::from_failure(StatusCode::BAD_REQUEST, "invite_failed", &e))?;

    tracing::info!(user_id = %user_id, "Admin invited from owner console");
    state.audit().emit(
        AuditEntry::new(owner.user.id, AuditAction::UserInvited, "profile")
            .entity_id(user_id)
            .metadata(json!({ "email": email, "role": Role::Admin, "via": "owner_console" }))
            .request(meta.ip, meta.user_agent),
    );

    Ok(Json(json!({ "ok": true, "userId": user_id, "inviteLink": null })))
}

/// Permanently delete a lead.
#[instrument(skip(state, owner, meta, req), fields(actor_id = %owner.user.id))]
pub async fn delete_lead(
    State(state): State<AppState>,
    owner: OwnerConsole,
    meta: RequestMeta,
    ApiJson(req): ApiJson<DeleteLeadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = clean(req.id.as_deref())
        .and_then(|id| LeadId::parse(id).ok())
        .ok_or_else(ApiError::invalid_input)?;
    if clean(req.confirm.as_deref()) != Some(DELETE_CONFIRMATION) {
        return Err(ApiError::invalid_input());
    }

    state.leads().delete(id).await.map_err(|e| match e {
        RepositoryError::NotFound => ApiError::not_found(),
        other => ApiError::from_failure(StatusCode::BAD_REQUEST, "delete_failed", &other),
    })?;

    tracing::info!(lead_id = %id, "Lead deleted");
    state.audit().emit(
        AuditEntry::new(owner.user.id, AuditAction::LeadDeleted, "lead")
            .entity_id(id)
            .request(meta.ip, meta.user_agent),
    );

    Ok(ok())
}
