//! Audit log repository.

use async_trait::async_trait;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::AuditEntry;

/// Append-only audit trail.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<(), RepositoryError>;
}

/// `PostgreSQL` implementation of [`AuditLogRepository`].
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PgAuditLogRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO audit_log (
                actor_user_id, action, entity_type, entity_id, metadata, ip, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(entry.actor)
        .bind(entry.action.as_str())
        .bind(entry.entity_type)
        .bind(entry.entity_id.as_deref())
        .bind(sqlx::types::Json(&entry.metadata))
        .bind(entry.ip.as_deref())
        .bind(entry.user_agent.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
