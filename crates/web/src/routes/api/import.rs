//! Listing import proxy.
//!
//! The uploaded form is forwarded to the import API and its JSON answer is
//! passed back with the upstream status.

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::instrument;

use super::RequestMeta;
use crate::error::ApiError;
use crate::middleware::{Authorized, ImportAccess};
use crate::models::{AuditAction, AuditEntry};
use crate::services::{ImportKind, ImportPart};
use crate::state::AppState;

/// Read every field except `type`, which the client sets from the path.
async fn collect_parts(mut multipart: Multipart) -> Result<Vec<ImportPart>, ApiError> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!(error = %e, "Unreadable multipart field");
        ApiError::invalid_input()
    })? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if name == "type" {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await.map_err(|e| {
            tracing::debug!(error = %e, field = %name, "Unreadable multipart body");
            ApiError::invalid_input()
        })?;
        parts.push(ImportPart {
            name,
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }
    Ok(parts)
}

/// Forward an import upload for `kind` (`resale` or `projects`).
#[instrument(skip(state, auth, meta, multipart), fields(actor_id = %auth.user.id))]
pub async fn run(
    State(state): State<AppState>,
    auth: Authorized<ImportAccess>,
    meta: RequestMeta,
    Path(kind): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let kind: ImportKind = kind.parse().map_err(|()| ApiError::not_found())?;
    let Some(client) = state.import() else {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "import_unavailable",
        ));
    };
    let multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Import body is not multipart");
        ApiError::invalid_input()
    })?;

    let parts = collect_parts(multipart).await?;
    let response = client
        .forward(kind, parts)
        .await
        .map_err(|e| ApiError::from_failure(StatusCode::BAD_GATEWAY, "import_failed", &e))?;

    let mut summary = response.summary();
    summary["type"] = json!(kind.as_str());
    tracing::info!(kind = %kind, status = response.status, "Import forwarded");
    state.audit().emit(
        AuditEntry::new(auth.user.id, AuditAction::ImportRun, "import")
            .metadata(summary)
            .request(meta.ip, meta.user_agent),
    );

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(response.body)).into_response())
}
