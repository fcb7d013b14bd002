//! Lead CRM export as CSV.

use axum::{
    extract::{Query, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::IntoResponse,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use hrtaj_core::ProfileId;

use super::{RequestMeta, clean};
use crate::error::ApiError;
use crate::middleware::{AdminAccess, Authorized};
use crate::models::{AssignedFilter, AuditAction, AuditEntry, LeadExportRow, LeadFilter};
use crate::state::AppState;

const HEADER: [&str; 10] = [
    "id",
    "name",
    "phone",
    "phone_e164",
    "status",
    "source",
    "lost_reason",
    "assigned_to",
    "listing_title",
    "created_at",
];

/// Export filters; blank values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub status: Option<String>,
    pub source: Option<String>,
    /// `unassigned`, or a profile id.
    pub assigned: Option<String>,
    pub lost_reason: Option<String>,
    /// `1` keeps leads whose next action is overdue.
    pub overdue: Option<String>,
    pub q: Option<String>,
}

impl ExportQuery {
    fn to_filter(&self) -> Result<LeadFilter, ApiError> {
        let owned = |value: &Option<String>| clean(value.as_deref()).map(str::to_owned);
        let assigned = match clean(self.assigned.as_deref()) {
            None => None,
            Some("unassigned") => Some(AssignedFilter::Unassigned),
            Some(id) => Some(AssignedFilter::To(
                ProfileId::parse(id).map_err(|_| ApiError::invalid_input())?,
            )),
        };

        Ok(LeadFilter {
            status: owned(&self.status),
            source: owned(&self.source),
            assigned,
            lost_reason: owned(&self.lost_reason),
            overdue_before: (clean(self.overdue.as_deref()) == Some("1")).then(Utc::now),
            search: owned(&self.q),
        })
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn csv_line<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields.into_iter().map(quote).collect::<Vec<_>>().join(",")
}

/// Render rows as CSV: every field quoted, lines separated by `\n`.
fn to_csv(rows: &[LeadExportRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(csv_line(HEADER));
    for row in rows {
        let id = row.id.to_string();
        let assigned = row.assigned_to.map(|a| a.to_string()).unwrap_or_default();
        let created = row.created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        lines.push(csv_line([
            id.as_str(),
            row.name.as_str(),
            row.phone.as_str(),
            row.phone_e164.as_deref().unwrap_or(""),
            row.status.as_str(),
            row.source.as_str(),
            row.lost_reason.as_deref().unwrap_or(""),
            assigned.as_str(),
            row.listing_title.as_deref().unwrap_or(""),
            created.as_str(),
        ]));
    }
    lines.join("\n")
}

/// Download the filtered lead list.
#[instrument(skip(state, auth, meta, query), fields(actor_id = %auth.user.id))]
pub async fn export(
    State(state): State<AppState>,
    auth: Authorized<AdminAccess>,
    meta: RequestMeta,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.config().flags.lead_crm {
        return Err(ApiError::not_found());
    }

    let filter = query.to_filter()?;
    let rows = state.leads().list(&filter).await.map_err(|e| {
        ApiError::from_failure(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", &e)
    })?;

    tracing::info!(count = rows.len(), "CRM export");
    state.audit().emit(
        AuditEntry::new(auth.user.id, AuditAction::CrmExport, "lead")
            .metadata(json!({
                "count": rows.len(),
                "filters": {
                    "status": query.status,
                    "source": query.source,
                    "assigned": query.assigned,
                    "lost_reason": query.lost_reason,
                    "overdue": query.overdue,
                    "q": query.q,
                },
            }))
            .request(meta.ip, meta.user_agent),
    );

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=leads-export.csv"),
        ],
        to_csv(&rows),
    ))
}
