//! In-memory repository implementations.
//!
//! Backs the router tests and local runs without `PostgreSQL`. Every
//! repository trait is implemented on the one [`MemoryStore`] so a test can
//! hand the same store to all of them and inspect the result afterwards.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use hrtaj_core::{Email, LeadId, ProfileId, Role, TeamSessionId};

use super::{
    AuditLogRepository, LeadRepository, ProfileRepository, RepositoryError,
    TeamSessionRepository,
};
use crate::models::{
    AccountAccess, AccountCredentials, AssignedFilter, AuditEntry, ClientFingerprint,
    InviteProfile, LeadExportRow, LeadFilter, NewAccount, NewLead, Profile,
};

#[derive(Debug, Clone)]
struct StoredProfile {
    full_name: Option<String>,
    phone: Option<String>,
    role: Role,
    is_active: bool,
}

#[derive(Debug, Clone)]
struct StoredAccount {
    id: ProfileId,
    email: Email,
    password_hash: Option<String>,
    disabled: bool,
    created_at: DateTime<Utc>,
    profile: Option<StoredProfile>,
}

impl StoredAccount {
    fn to_profile(&self) -> Option<Profile> {
        self.profile.as_ref().map(|p| Profile {
            id: self.id,
            email: self.email.clone(),
            full_name: p.full_name.clone(),
            phone: p.phone.clone(),
            role: p.role,
            is_active: p.is_active,
            created_at: self.created_at,
        })
    }
}

/// A lead as kept by the memory store.
#[derive(Debug, Clone)]
pub struct StoredLead {
    pub row: LeadExportRow,
    pub message: Option<String>,
    pub notes: Option<String>,
    pub preferred_contact_time: Option<String>,
    pub next_action_at: Option<DateTime<Utc>>,
}

impl StoredLead {
    fn matches(&self, filter: &LeadFilter) -> bool {
        let row = &self.row;
        if filter.status.as_ref().is_some_and(|s| *s != row.status) {
            return false;
        }
        if filter.source.as_ref().is_some_and(|s| *s != row.source) {
            return false;
        }
        match filter.assigned {
            Some(AssignedFilter::Unassigned) if row.assigned_to.is_some() => return false,
            Some(AssignedFilter::To(id)) if row.assigned_to != Some(id) => return false,
            _ => {}
        }
        if filter
            .lost_reason
            .as_ref()
            .is_some_and(|r| row.lost_reason.as_ref() != Some(r))
        {
            return false;
        }
        if let Some(now) = filter.overdue_before
            && !self.next_action_at.is_some_and(|due| due < now)
        {
            return false;
        }
        if let Some(term) = &filter.search {
            let term = term.to_lowercase();
            let hit = row.name.to_lowercase().contains(&term)
                || row.phone.to_lowercase().contains(&term)
                || row
                    .phone_e164
                    .as_ref()
                    .is_some_and(|p| p.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// A team presence session as kept by the memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSessionRecord {
    pub id: TeamSessionId,
    pub user_id: ProfileId,
    pub started_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub fingerprint: ClientFingerprint,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: Vec<StoredAccount>,
    leads: Vec<StoredLead>,
    team_sessions: Vec<TeamSessionRecord>,
    audit_log: Vec<AuditEntry>,
}

/// Process-local store implementing every repository trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, RepositoryError> {
        self.tables
            .read()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_owned()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, RepositoryError> {
        self.tables
            .write()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_owned()))
    }

    /// Add an account, with a profile row when `role` is set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when the email is taken.
    pub fn seed_account(
        &self,
        email: &Email,
        password_hash: Option<&str>,
        role: Option<Role>,
    ) -> Result<ProfileId, RepositoryError> {
        let mut tables = self.write()?;
        if tables.accounts.iter().any(|a| a.email == *email) {
            return Err(RepositoryError::Conflict(format!("{email} already exists")));
        }
        let id = ProfileId::generate();
        tables.accounts.push(StoredAccount {
            id,
            email: email.clone(),
            password_hash: password_hash.map(str::to_owned),
            disabled: false,
            created_at: Utc::now(),
            profile: role.map(|role| StoredProfile {
                full_name: None,
                phone: None,
                role,
                is_active: true,
            }),
        });
        Ok(id)
    }

    /// Add a lead with CRM fields already filled in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Unavailable` if the store lock is poisoned.
    pub fn seed_lead(&self, lead: StoredLead) -> Result<(), RepositoryError> {
        self.write()?.leads.push(lead);
        Ok(())
    }

    /// Whether the account is disabled; `None` for unknown ids.
    #[must_use]
    pub fn is_disabled(&self, id: ProfileId) -> Option<bool> {
        let tables = self.read().ok()?;
        tables.accounts.iter().find(|a| a.id == id).map(|a| a.disabled)
    }

    /// Snapshot of all leads in insertion order.
    #[must_use]
    pub fn leads(&self) -> Vec<StoredLead> {
        self.read().map(|t| t.leads.clone()).unwrap_or_default()
    }

    /// Snapshot of all team sessions in creation order.
    #[must_use]
    pub fn team_sessions(&self) -> Vec<TeamSessionRecord> {
        self.read()
            .map(|t| t.team_sessions.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the audit log in write order.
    #[must_use]
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.read().map(|t| t.audit_log.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn health_check(&self) -> Result<(), RepositoryError> {
        self.read().map(|_| ())
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<AccountCredentials>, RepositoryError> {
        let tables = self.read()?;
        Ok(tables
            .accounts
            .iter()
            .find(|a| a.email == *email)
            .map(|a| AccountCredentials {
                id: a.id,
                email: a.email.clone(),
                password_hash: a.password_hash.clone(),
                disabled: a.disabled,
            }))
    }

    async fn find_role(&self, id: ProfileId) -> Result<Option<Role>, RepositoryError> {
        let tables = self.read()?;
        Ok(tables
            .accounts
            .iter()
            .find(|a| a.id == id)
            .and_then(|a| a.profile.as_ref())
            .map(|p| p.role))
    }

    async fn find_access(&self, id: ProfileId) -> Result<Option<AccountAccess>, RepositoryError> {
        let tables = self.read()?;
        Ok(tables
            .accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| AccountAccess {
                role: a.profile.as_ref().map(|p| p.role),
                disabled: a.disabled,
            }))
    }

    async fn find_profile(&self, id: ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let tables = self.read()?;
        Ok(tables
            .accounts
            .iter()
            .find(|a| a.id == id)
            .and_then(StoredAccount::to_profile))
    }

    async fn find_profile_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Profile>, RepositoryError> {
        let tables = self.read()?;
        Ok(tables
            .accounts
            .iter()
            .find(|a| a.email == *email)
            .and_then(StoredAccount::to_profile))
    }

    async fn update_role(&self, id: ProfileId, role: Role) -> Result<(), RepositoryError> {
        let mut tables = self.write()?;
        let profile = tables
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .and_then(|a| a.profile.as_mut())
            .ok_or(RepositoryError::NotFound)?;
        profile.role = role;
        Ok(())
    }

    async fn set_disabled(&self, id: ProfileId, disabled: bool) -> Result<(), RepositoryError> {
        let mut tables = self.write()?;
        let account = tables
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;
        account.disabled = disabled;
        if let Some(profile) = account.profile.as_mut() {
            profile.is_active = !disabled;
        }
        Ok(())
    }

    async fn upsert_invited(&self, invite: &InviteProfile) -> Result<ProfileId, RepositoryError> {
        let mut tables = self.write()?;
        let profile = StoredProfile {
            full_name: Some(invite.full_name.clone()),
            phone: invite.phone.clone(),
            role: invite.role,
            is_active: true,
        };

        if let Some(account) = tables.accounts.iter_mut().find(|a| a.email == invite.email) {
            account.profile = Some(profile);
            return Ok(account.id);
        }

        let id = ProfileId::generate();
        tables.accounts.push(StoredAccount {
            id,
            email: invite.email.clone(),
            password_hash: None,
            disabled: false,
            created_at: Utc::now(),
            profile: Some(profile),
        });
        Ok(id)
    }

    async fn create_account(&self, account: &NewAccount) -> Result<ProfileId, RepositoryError> {
        let mut tables = self.write()?;
        if tables.accounts.iter().any(|a| a.email == account.email) {
            return Err(RepositoryError::Conflict(format!(
                "{} already exists",
                account.email
            )));
        }
        let id = ProfileId::generate();
        tables.accounts.push(StoredAccount {
            id,
            email: account.email.clone(),
            password_hash: Some(account.password_hash.clone()),
            disabled: false,
            created_at: Utc::now(),
            profile: account.role.map(|role| StoredProfile {
                full_name: account.full_name.clone(),
                phone: account.phone.clone(),
                role,
                is_active: true,
            }),
        });
        Ok(id)
    }
}

#[async_trait]
impl LeadRepository for MemoryStore {
    async fn insert(&self, lead: &NewLead) -> Result<LeadId, RepositoryError> {
        let mut tables = self.write()?;
        if tables.leads.iter().any(|l| l.row.id == lead.id) {
            return Err(RepositoryError::Conflict(format!("lead {} exists", lead.id)));
        }
        tables.leads.push(StoredLead {
            row: LeadExportRow {
                id: lead.id,
                name: lead.name.clone(),
                phone: lead.phone.clone(),
                phone_e164: lead.phone_e164.clone(),
                status: "new".to_owned(),
                source: lead.source.clone(),
                lost_reason: None,
                assigned_to: None,
                listing_title: None,
                created_at: Utc::now(),
            },
            message: lead.message.clone(),
            notes: lead.notes.clone(),
            preferred_contact_time: lead.preferred_contact_time.clone(),
            next_action_at: None,
        });
        Ok(lead.id)
    }

    async fn list(&self, filter: &LeadFilter) -> Result<Vec<LeadExportRow>, RepositoryError> {
        let tables = self.read()?;
        let mut rows: Vec<LeadExportRow> = tables
            .leads
            .iter()
            .filter(|l| l.matches(filter))
            .map(|l| l.row.clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn delete(&self, id: LeadId) -> Result<(), RepositoryError> {
        let mut tables = self.write()?;
        let before = tables.leads.len();
        tables.leads.retain(|l| l.row.id != id);
        if tables.leads.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl TeamSessionRepository for MemoryStore {
    async fn touch(
        &self,
        session: TeamSessionId,
        user: ProfileId,
        fingerprint: &ClientFingerprint,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.write()?;
        let Some(record) = tables
            .team_sessions
            .iter_mut()
            .find(|s| s.id == session && s.user_id == user && s.ended_at.is_none())
        else {
            return Ok(false);
        };
        record.last_seen_at = now;
        record.fingerprint = fingerprint.clone();
        Ok(true)
    }

    async fn restart(
        &self,
        user: ProfileId,
        fingerprint: &ClientFingerprint,
        now: DateTime<Utc>,
    ) -> Result<TeamSessionId, RepositoryError> {
        let mut tables = self.write()?;
        for record in tables
            .team_sessions
            .iter_mut()
            .filter(|s| s.user_id == user && s.ended_at.is_none())
        {
            record.ended_at = Some(now);
        }
        let id = TeamSessionId::generate();
        tables.team_sessions.push(TeamSessionRecord {
            id,
            user_id: user,
            started_at: now,
            last_seen_at: now,
            ended_at: None,
            fingerprint: fingerprint.clone(),
        });
        Ok(id)
    }

    async fn end(
        &self,
        session: TeamSessionId,
        user: ProfileId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.write()?;
        if let Some(record) = tables
            .team_sessions
            .iter_mut()
            .find(|s| s.id == session && s.user_id == user && s.ended_at.is_none())
        {
            record.ended_at = Some(now);
        }
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for MemoryStore {
    async fn append(&self, entry: &AuditEntry) -> Result<(), RepositoryError> {
        self.write()?.audit_log.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::AuditAction;

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    fn lead_row(name: &str, phone: &str, status: &str) -> LeadExportRow {
        LeadExportRow {
            id: LeadId::generate(),
            name: name.to_owned(),
            phone: phone.to_owned(),
            phone_e164: None,
            status: status.to_owned(),
            source: "listing".to_owned(),
            lost_reason: None,
            assigned_to: None,
            listing_title: None,
            created_at: Utc::now(),
        }
    }

    fn stored(row: LeadExportRow) -> StoredLead {
        StoredLead {
            row,
            message: None,
            notes: None,
            preferred_contact_time: None,
            next_action_at: None,
        }
    }

    #[tokio::test]
    async fn test_missing_profile_has_no_role() {
        let store = MemoryStore::default();
        let id = store.seed_account(&email("a@b.com"), None, None).unwrap();
        assert_eq!(store.find_role(id).await.unwrap(), None);
        assert_eq!(store.find_role(ProfileId::generate()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_role_requires_profile() {
        let store = MemoryStore::default();
        let id = store
            .seed_account(&email("a@b.com"), None, Some(Role::Staff))
            .unwrap();
        store.update_role(id, Role::Admin).await.unwrap();
        assert_eq!(store.find_role(id).await.unwrap(), Some(Role::Admin));

        let err = store
            .update_role(ProfileId::generate(), Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_set_disabled_marks_profile_inactive() {
        let store = MemoryStore::default();
        let id = store
            .seed_account(&email("a@b.com"), None, Some(Role::Agent))
            .unwrap();
        store.set_disabled(id, true).await.unwrap();
        assert_eq!(store.is_disabled(id), Some(true));
        assert!(!store.find_profile(id).await.unwrap().unwrap().is_active);
        assert_eq!(
            store.find_access(id).await.unwrap(),
            Some(AccountAccess {
                role: Some(Role::Agent),
                disabled: true,
            })
        );
    }

    #[tokio::test]
    async fn test_find_access_without_profile() {
        let store = MemoryStore::default();
        let id = store.seed_account(&email("a@b.com"), None, None).unwrap();
        assert_eq!(
            store.find_access(id).await.unwrap(),
            Some(AccountAccess {
                role: None,
                disabled: false,
            })
        );
        assert_eq!(store.find_access(ProfileId::generate()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_invited_reuses_existing_identity() {
        let store = MemoryStore::default();
        let existing = store.seed_account(&email("x@y.com"), None, None).unwrap();
        let invite = InviteProfile {
            email: email("x@y.com"),
            full_name: "Mona".to_owned(),
            phone: None,
            role: Role::Ops,
        };
        let id = store.upsert_invited(&invite).await.unwrap();
        assert_eq!(id, existing);
        assert_eq!(store.find_role(id).await.unwrap(), Some(Role::Ops));
    }

    #[tokio::test]
    async fn test_create_account_conflict() {
        let store = MemoryStore::default();
        let account = NewAccount {
            email: email("dup@b.com"),
            password_hash: "hash".to_owned(),
            full_name: None,
            phone: None,
            role: Some(Role::Owner),
        };
        store.create_account(&account).await.unwrap();
        let err = store.create_account(&account).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_lead_filters() {
        let store = MemoryStore::default();
        let agent = ProfileId::generate();
        let mut assigned = lead_row("Ali Hassan", "01012345678", "contacted");
        assigned.assigned_to = Some(agent);
        store.seed_lead(stored(assigned)).unwrap();
        store
            .seed_lead(stored(lead_row("Sara", "01198765432", "new")))
            .unwrap();

        let all = store.list(&LeadFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let unassigned = LeadFilter {
            assigned: Some(AssignedFilter::Unassigned),
            ..LeadFilter::default()
        };
        let rows = store.list(&unassigned).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Sara");

        let search = LeadFilter {
            search: Some("ali".to_owned()),
            ..LeadFilter::default()
        };
        let rows = store.list(&search).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].assigned_to, Some(agent));

        let status = LeadFilter {
            status: Some("new".to_owned()),
            ..LeadFilter::default()
        };
        assert_eq!(store.list(&status).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overdue_filter() {
        let store = MemoryStore::default();
        let now = Utc::now();
        let mut due = stored(lead_row("Due", "0100", "new"));
        due.next_action_at = Some(now - chrono::Duration::hours(1));
        let mut later = stored(lead_row("Later", "0101", "new"));
        later.next_action_at = Some(now + chrono::Duration::hours(1));
        store.seed_lead(due).unwrap();
        store.seed_lead(later).unwrap();
        store.seed_lead(stored(lead_row("None", "0102", "new"))).unwrap();

        let filter = LeadFilter {
            overdue_before: Some(now),
            ..LeadFilter::default()
        };
        let rows = store.list(&filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Due");
    }

    #[tokio::test]
    async fn test_delete_lead() {
        let store = MemoryStore::default();
        let row = lead_row("Ali", "0100", "new");
        let id = row.id;
        store.seed_lead(stored(row)).unwrap();

        store.delete(id).await.unwrap();
        assert!(store.leads().is_empty());
        assert!(matches!(
            store.delete(id).await.unwrap_err(),
            RepositoryError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_restart_closes_open_sessions() {
        let store = MemoryStore::default();
        let user = ProfileId::generate();
        let fp = ClientFingerprint::default();
        let now = Utc::now();

        let first = store.restart(user, &fp, now).await.unwrap();
        let second = store.restart(user, &fp, now).await.unwrap();
        assert_ne!(first, second);

        assert!(!store.touch(first, user, &fp, now).await.unwrap());
        assert!(store.touch(second, user, &fp, now).await.unwrap());

        let sessions = store.team_sessions();
        assert_eq!(sessions.len(), 2);
        assert!(sessions[0].ended_at.is_some());
        assert!(sessions[1].ended_at.is_none());
    }

    #[tokio::test]
    async fn test_touch_rejects_other_users_session() {
        let store = MemoryStore::default();
        let owner = ProfileId::generate();
        let fp = ClientFingerprint::default();
        let now = Utc::now();
        let id = store.restart(owner, &fp, now).await.unwrap();

        assert!(
            !store
                .touch(id, ProfileId::generate(), &fp, now)
                .await
                .unwrap()
        );
        store.end(id, owner, now).await.unwrap();
        assert!(!store.touch(id, owner, &fp, now).await.unwrap());
    }

    #[tokio::test]
    async fn test_audit_append() {
        let store = MemoryStore::default();
        let entry = AuditEntry::new(ProfileId::generate(), AuditAction::CrmExport, "leads");
        store.append(&entry).await.unwrap();
        assert_eq!(store.audit_entries(), vec![entry]);
    }
}
