//! Lead capture and CRM export types.

use chrono::{DateTime, Utc};

use hrtaj_core::{LeadId, ProfileId};

/// A lead to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    pub id: LeadId,
    pub name: String,
    /// Phone as typed.
    pub phone: String,
    /// Normalized `+20…` form.
    pub phone_e164: Option<String>,
    pub message: Option<String>,
    pub preferred_contact_time: Option<String>,
    pub notes: Option<String>,
    pub source: String,
}

/// Assignment filter for CRM queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignedFilter {
    /// Leads nobody owns.
    Unassigned,
    /// Leads owned by this profile.
    To(ProfileId),
}

/// CRM list filters. `None` fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub status: Option<String>,
    pub source: Option<String>,
    pub assigned: Option<AssignedFilter>,
    pub lost_reason: Option<String>,
    /// Only leads whose next action is due before `now`.
    pub overdue_before: Option<DateTime<Utc>>,
    /// Case-insensitive match on name, phone or normalized phone.
    pub search: Option<String>,
}

/// One row of the CRM export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadExportRow {
    pub id: LeadId,
    pub name: String,
    pub phone: String,
    pub phone_e164: Option<String>,
    pub status: String,
    pub source: String,
    pub lost_reason: Option<String>,
    pub assigned_to: Option<ProfileId>,
    pub listing_title: Option<String>,
    pub created_at: DateTime<Utc>,
}
