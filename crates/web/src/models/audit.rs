//! Audit and activity log entries.

use hrtaj_core::ProfileId;

/// Actions recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserRoleUpdated,
    UserDisabled,
    UserEnabled,
    UserInvited,
    LeadDeleted,
    CrmExport,
    ImportRun,
    OwnerUnlocked,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserRoleUpdated => "user_role_updated",
            Self::UserDisabled => "user_disabled",
            Self::UserEnabled => "user_enabled",
            Self::UserInvited => "user_invited",
            Self::LeadDeleted => "lead_deleted",
            Self::CrmExport => "crm_export",
            Self::ImportRun => "import_run",
            Self::OwnerUnlocked => "owner_unlocked",
        }
    }
}

/// One audit log record.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub actor: Option<ProfileId>,
    pub action: AuditAction,
    pub entity_type: &'static str,
    pub entity_id: Option<String>,
    pub metadata: serde_json::Value,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditEntry {
    /// Entry with empty metadata and no request details.
    #[must_use]
    pub fn new(actor: ProfileId, action: AuditAction, entity_type: &'static str) -> Self {
        Self {
            actor: Some(actor),
            action,
            entity_type,
            entity_id: None,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
            ip: None,
            user_agent: None,
        }
    }

    #[must_use]
    pub fn entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn request(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip = ip;
        self.user_agent = user_agent;
        self
    }
}
