//! Team presence session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use hrtaj_core::{ProfileId, TeamSessionId};

use super::RepositoryError;
use crate::models::ClientFingerprint;

/// Presence sessions of team members, refreshed by heartbeats.
#[async_trait]
pub trait TeamSessionRepository: Send + Sync {
    /// Refresh `session` if it is still open and belongs to `user`.
    ///
    /// Returns `false` when there is no such open session.
    async fn touch(
        &self,
        session: TeamSessionId,
        user: ProfileId,
        fingerprint: &ClientFingerprint,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Close every open session of `user` and open a new one.
    async fn restart(
        &self,
        user: ProfileId,
        fingerprint: &ClientFingerprint,
        now: DateTime<Utc>,
    ) -> Result<TeamSessionId, RepositoryError>;

    /// Close `session` if it belongs to `user`. Closing twice is a no-op.
    async fn end(
        &self,
        session: TeamSessionId,
        user: ProfileId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

/// `PostgreSQL` implementation of [`TeamSessionRepository`].
pub struct PgTeamSessionRepository {
    pool: PgPool,
}

impl PgTeamSessionRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamSessionRepository for PgTeamSessionRepository {
    #[instrument(skip(self, fingerprint))]
    async fn touch(
        &self,
        session: TeamSessionId,
        user: ProfileId,
        fingerprint: &ClientFingerprint,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE team_sessions
            SET last_seen_at = $3, ip_hash = $4, user_agent = $5
            WHERE id = $1 AND user_id = $2 AND ended_at IS NULL
            ",
        )
        .bind(session)
        .bind(user)
        .bind(now)
        .bind(fingerprint.ip_hash.as_deref())
        .bind(fingerprint.user_agent.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, fingerprint))]
    async fn restart(
        &self,
        user: ProfileId,
        fingerprint: &ClientFingerprint,
        now: DateTime<Utc>,
    ) -> Result<TeamSessionId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE team_sessions SET ended_at = $2 WHERE user_id = $1 AND ended_at IS NULL")
            .bind(user)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let id = TeamSessionId::generate();
        sqlx::query(
            r"
            INSERT INTO team_sessions (id, user_id, started_at, last_seen_at, ip_hash, user_agent)
            VALUES ($1, $2, $3, $3, $4, $5)
            ",
        )
        .bind(id)
        .bind(user)
        .bind(now)
        .bind(fingerprint.ip_hash.as_deref())
        .bind(fingerprint.user_agent.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn end(
        &self,
        session: TeamSessionId,
        user: ProfileId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE team_sessions SET ended_at = $3 WHERE id = $1 AND user_id = $2 AND ended_at IS NULL",
        )
        .bind(session)
        .bind(user)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
