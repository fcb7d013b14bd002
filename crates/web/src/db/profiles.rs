//! Identity and profile repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use hrtaj_core::{Email, ProfileId, Role};

use super::RepositoryError;
use crate::models::{AccountAccess, AccountCredentials, InviteProfile, NewAccount, Profile};

/// Identities, roles and contact details.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Check that the store answers queries.
    async fn health_check(&self) -> Result<(), RepositoryError>;

    /// Look up login data by email.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<AccountCredentials>, RepositoryError>;

    /// Stored role of `id`; `None` when the identity has no profile row.
    async fn find_role(&self, id: ProfileId) -> Result<Option<Role>, RepositoryError>;

    /// Role and disabled flag of `id`, read on every guarded request;
    /// `None` when the identity no longer exists.
    async fn find_access(&self, id: ProfileId) -> Result<Option<AccountAccess>, RepositoryError>;

    async fn find_profile(&self, id: ProfileId) -> Result<Option<Profile>, RepositoryError>;

    async fn find_profile_by_email(&self, email: &Email)
    -> Result<Option<Profile>, RepositoryError>;

    /// Set the role of an existing profile.
    ///
    /// Returns `RepositoryError::NotFound` when `id` has no profile.
    async fn update_role(&self, id: ProfileId, role: Role) -> Result<(), RepositoryError>;

    /// Disable or re-enable an account. Disabling also marks the profile
    /// inactive.
    ///
    /// Returns `RepositoryError::NotFound` when `id` does not exist.
    async fn set_disabled(&self, id: ProfileId, disabled: bool) -> Result<(), RepositoryError>;

    /// Create or refresh the identity and profile for an invited address.
    async fn upsert_invited(&self, invite: &InviteProfile) -> Result<ProfileId, RepositoryError>;

    /// Create an account with a password.
    ///
    /// Returns `RepositoryError::Conflict` when the email is taken.
    async fn create_account(&self, account: &NewAccount) -> Result<ProfileId, RepositoryError>;
}

/// Decode a stored role string. Unknown values get the least privileges.
pub(crate) fn decode_role(id: ProfileId, raw: &str) -> Role {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(%id, role = raw, "Unknown role stored for profile, treating as least privileged");
        Role::LEAST_PRIVILEGED
    })
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: ProfileId,
    email: String,
    password_hash: Option<String>,
    disabled: bool,
}

impl TryFrom<CredentialsRow> for AccountCredentials {
    type Error = RepositoryError;

    fn try_from(row: CredentialsRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            email,
            password_hash: row.password_hash,
            disabled: row.disabled,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: ProfileId,
    email: String,
    full_name: Option<String>,
    phone: Option<String>,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            email,
            full_name: row.full_name,
            phone: row.phone,
            role: decode_role(row.id, &row.role),
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

const PROFILE_COLUMNS: &str = r"
    p.id, i.email, p.full_name, p.phone, p.role, p.is_active, p.created_at
    FROM profiles p
    JOIN identities i ON i.id = p.id
";

/// `PostgreSQL` implementation of [`ProfileRepository`].
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<AccountCredentials>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, email, password_hash, disabled FROM identities WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccountCredentials::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_role(&self, id: ProfileId) -> Result<Option<Role>, RepositoryError> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role.map(|raw| decode_role(id, &raw)))
    }

    #[instrument(skip(self))]
    async fn find_access(&self, id: ProfileId) -> Result<Option<AccountAccess>, RepositoryError> {
        let row: Option<(bool, Option<String>)> = sqlx::query_as(
            r"
            SELECT i.disabled, p.role
            FROM identities i
            LEFT JOIN profiles p ON p.id = i.id
            WHERE i.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(disabled, role)| AccountAccess {
            role: role.map(|raw| decode_role(id, &raw)),
            disabled,
        }))
    }

    #[instrument(skip(self))]
    async fn find_profile(&self, id: ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn find_profile_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} WHERE i.email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn update_role(&self, id: ProfileId, role: Role) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE profiles SET role = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_disabled(&self, id: ProfileId, disabled: bool) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE identities SET disabled = $2 WHERE id = $1")
            .bind(id)
            .bind(disabled)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("UPDATE profiles SET is_active = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(!disabled)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, invite), fields(email = %invite.email, role = %invite.role))]
    async fn upsert_invited(&self, invite: &InviteProfile) -> Result<ProfileId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ProfileId = sqlx::query_scalar(
            r"
            INSERT INTO identities (id, email)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id
            ",
        )
        .bind(ProfileId::generate())
        .bind(invite.email.as_str())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO profiles (id, full_name, phone, role, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                phone = EXCLUDED.phone,
                role = EXCLUDED.role,
                is_active = TRUE,
                updated_at = now()
            ",
        )
        .bind(id)
        .bind(&invite.full_name)
        .bind(invite.phone.as_deref())
        .bind(invite.role.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    #[instrument(skip(self, account), fields(email = %account.email))]
    async fn create_account(&self, account: &NewAccount) -> Result<ProfileId, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let id = ProfileId::generate();

        sqlx::query("INSERT INTO identities (id, email, password_hash) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(account.email.as_str())
            .bind(&account.password_hash)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from_insert)?;

        if let Some(role) = account.role {
            sqlx::query(
                "INSERT INTO profiles (id, full_name, phone, role) VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(account.full_name.as_deref())
            .bind(account.phone.as_deref())
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_role_known() {
        assert_eq!(decode_role(ProfileId::generate(), "owner"), Role::Owner);
    }

    #[test]
    fn test_decode_role_unknown_is_least_privileged() {
        assert_eq!(decode_role(ProfileId::generate(), "root"), Role::User);
        assert_eq!(decode_role(ProfileId::generate(), ""), Role::User);
    }
}
