//! Lead repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use hrtaj_core::{LeadId, ProfileId};

use super::RepositoryError;
use crate::models::{AssignedFilter, LeadExportRow, LeadFilter, NewLead};

/// Leads captured from the site and worked in the CRM.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn insert(&self, lead: &NewLead) -> Result<LeadId, RepositoryError>;

    /// Leads matching `filter`, newest first.
    async fn list(&self, filter: &LeadFilter) -> Result<Vec<LeadExportRow>, RepositoryError>;

    /// Delete a lead.
    ///
    /// Returns `RepositoryError::NotFound` when `id` does not exist.
    async fn delete(&self, id: LeadId) -> Result<(), RepositoryError>;
}

/// `%term%` for `ILIKE`, with the user's wildcards escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(sqlx::FromRow)]
struct LeadRow {
    id: LeadId,
    name: String,
    phone: String,
    phone_e164: Option<String>,
    status: String,
    source: String,
    lost_reason: Option<String>,
    assigned_to: Option<ProfileId>,
    listing_title: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<LeadRow> for LeadExportRow {
    fn from(row: LeadRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            phone: row.phone,
            phone_e164: row.phone_e164,
            status: row.status,
            source: row.source,
            lost_reason: row.lost_reason,
            assigned_to: row.assigned_to,
            listing_title: row.listing_title,
            created_at: row.created_at,
        }
    }
}

/// `PostgreSQL` implementation of [`LeadRepository`].
pub struct PgLeadRepository {
    pool: PgPool,
}

impl PgLeadRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadRepository for PgLeadRepository {
    #[instrument(skip(self, lead), fields(lead_id = %lead.id, source = %lead.source))]
    async fn insert(&self, lead: &NewLead) -> Result<LeadId, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO leads (
                id, name, phone, phone_e164, message,
                preferred_contact_time, notes, source, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'new')
            ",
        )
        .bind(lead.id)
        .bind(&lead.name)
        .bind(&lead.phone)
        .bind(lead.phone_e164.as_deref())
        .bind(lead.message.as_deref())
        .bind(lead.preferred_contact_time.as_deref())
        .bind(lead.notes.as_deref())
        .bind(&lead.source)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_insert)?;

        Ok(lead.id)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &LeadFilter) -> Result<Vec<LeadExportRow>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(
            r"
            SELECT l.id, l.name, l.phone, l.phone_e164, l.status, l.source,
                   l.lost_reason, l.assigned_to, li.title AS listing_title, l.created_at
            FROM leads l
            LEFT JOIN listings li ON li.id = l.listing_id
            WHERE TRUE
            ",
        );

        if let Some(status) = &filter.status {
            query.push(" AND l.status = ").push_bind(status.clone());
        }
        if let Some(source) = &filter.source {
            query.push(" AND l.source = ").push_bind(source.clone());
        }
        match filter.assigned {
            Some(AssignedFilter::Unassigned) => {
                query.push(" AND l.assigned_to IS NULL");
            }
            Some(AssignedFilter::To(profile)) => {
                query.push(" AND l.assigned_to = ").push_bind(profile);
            }
            None => {}
        }
        if let Some(reason) = &filter.lost_reason {
            query.push(" AND l.lost_reason = ").push_bind(reason.clone());
        }
        if let Some(now) = filter.overdue_before {
            query.push(" AND l.next_action_at < ").push_bind(now);
        }
        if let Some(term) = &filter.search {
            let pattern = like_pattern(term);
            query
                .push(" AND (l.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR l.phone ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR l.phone_e164 ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(" ORDER BY l.created_at DESC");

        let rows = query
            .build_query_as::<LeadRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(LeadExportRow::from).collect())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: LeadId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
