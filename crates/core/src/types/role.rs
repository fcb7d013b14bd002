//! Profile roles and the role-mutation policy.
//!
//! Every role check in the application goes through [`Role`]: membership in
//! a fixed set ([`Role::is_member_of`]), ordering ([`Role::is_at_least`]) and
//! the single policy deciding who may change whose role
//! ([`authorize_role_change`]).

use serde::{Deserialize, Serialize};

use super::id::ProfileId;

/// A role attached to a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Holder of the owner console. Only another owner may modify an owner.
    Owner,
    /// Full administrative access, including user management.
    Admin,
    /// Operations team member.
    Ops,
    /// Sales / CRM staff.
    Staff,
    /// Field agent.
    Agent,
    /// Developer partner submitting projects.
    Developer,
    /// External partner.
    Partner,
    /// Regular marketplace user.
    User,
}

/// Roles that can sign in to the team workspace.
pub const TEAM_ROLES: &[Role] = &[
    Role::Owner,
    Role::Admin,
    Role::Ops,
    Role::Staff,
    Role::Agent,
    Role::Developer,
];

/// Roles allowed to manage users and export the CRM.
pub const ADMIN_ROLES: &[Role] = &[Role::Owner, Role::Admin];

/// Roles allowed to run listing imports.
pub const IMPORT_ROLES: &[Role] = &[Role::Owner, Role::Admin, Role::Ops, Role::Staff];

/// Roles an admin may hand out through an invitation.
pub const INVITABLE_ROLES: &[Role] = &[
    Role::Admin,
    Role::Staff,
    Role::Ops,
    Role::Agent,
    Role::Developer,
];

/// Every role, most privileged first.
pub const ALL_ROLES: &[Role] = &[
    Role::Owner,
    Role::Admin,
    Role::Ops,
    Role::Staff,
    Role::Agent,
    Role::Developer,
    Role::Partner,
    Role::User,
];

impl Role {
    /// Role assumed when a profile has no role record.
    pub const LEAST_PRIVILEGED: Self = Self::User;

    /// Resolve an optional stored role, defaulting to [`Role::LEAST_PRIVILEGED`].
    #[must_use]
    pub fn or_least_privileged(role: Option<Self>) -> Self {
        role.unwrap_or(Self::LEAST_PRIVILEGED)
    }

    /// Privilege tier: owner > admin > ops/staff/agent/developer > partner/user.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Owner => 3,
            Self::Admin => 2,
            Self::Ops | Self::Staff | Self::Agent | Self::Developer => 1,
            Self::Partner | Self::User => 0,
        }
    }

    /// Whether this role's tier is at or above `other`'s.
    #[must_use]
    pub const fn is_at_least(self, other: Self) -> bool {
        self.rank() >= other.rank()
    }

    /// Whether this role is one of `allowed`.
    #[must_use]
    pub fn is_member_of(self, allowed: &[Self]) -> bool {
        allowed.contains(&self)
    }

    /// Owner or admin.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// The stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Ops => "ops",
            Self::Staff => "staff",
            Self::Agent => "agent",
            Self::Developer => "developer",
            Self::Partner => "partner",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known role.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ALL_ROLES
            .iter()
            .copied()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| RoleParseError(s.to_owned()))
    }
}

/// A requested change to another profile's role or account state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleChange {
    /// Profile performing the change.
    pub actor_id: ProfileId,
    /// Role of the acting profile.
    pub actor_role: Role,
    /// Profile being changed.
    pub target_id: ProfileId,
    /// Target's current role; `None` when the target has no profile yet.
    pub target_role: Option<Role>,
    /// Role being assigned; `None` when only the account state changes.
    pub new_role: Option<Role>,
}

/// Why a [`RoleChange`] was refused.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChangeDenied {
    /// The actor does not manage users at all.
    #[error("actor is not allowed to manage users")]
    NotPermitted,
    /// The change touches the owner role and the actor is not an owner.
    #[error("only an owner may grant, change, or revoke the owner role")]
    OwnerProtected,
    /// An owner tried to change or disable their own account.
    #[error("owners cannot modify their own role or account state")]
    SelfModification,
}

/// Decide whether `change` may proceed.
///
/// Rules, in order:
/// 1. the actor must be an admin or owner;
/// 2. a target currently holding `owner` can only be changed by an owner,
///    whatever the requested role (including `owner` again);
/// 3. only an owner can assign `owner`;
/// 4. an owner cannot change or disable their own account.
///
/// # Errors
///
/// Returns the first rule the change violates.
pub fn authorize_role_change(change: &RoleChange) -> Result<(), RoleChangeDenied> {
    if !change.actor_role.is_at_least(Role::Admin) {
        return Err(RoleChangeDenied::NotPermitted);
    }

    let actor_is_owner = change.actor_role == Role::Owner;
    if change.target_role == Some(Role::Owner) && !actor_is_owner {
        return Err(RoleChangeDenied::OwnerProtected);
    }
    if change.new_role == Some(Role::Owner) && !actor_is_owner {
        return Err(RoleChangeDenied::OwnerProtected);
    }
    if actor_is_owner && change.actor_id == change.target_id {
        return Err(RoleChangeDenied::SelfModification);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn change(actor_role: Role, target_role: Option<Role>, new_role: Option<Role>) -> RoleChange {
        RoleChange {
            actor_id: ProfileId::generate(),
            actor_role,
            target_id: ProfileId::generate(),
            target_role,
            new_role,
        }
    }

    #[test]
    fn test_parse_roundtrip_all_roles() {
        for role in ALL_ROLES {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
        assert_eq!(" Admin ".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn test_parse_unknown_role() {
        assert_eq!(
            "superuser".parse::<Role>(),
            Err(RoleParseError("superuser".to_owned()))
        );
    }

    #[test]
    fn test_rank_ordering() {
        assert!(Role::Owner.is_at_least(Role::Admin));
        assert!(Role::Admin.is_at_least(Role::Staff));
        assert!(Role::Ops.is_at_least(Role::Developer));
        assert!(Role::Developer.is_at_least(Role::Ops));
        assert!(!Role::Staff.is_at_least(Role::Admin));
        assert!(!Role::User.is_at_least(Role::Agent));
    }

    #[test]
    fn test_missing_role_is_least_privileged() {
        assert_eq!(Role::or_least_privileged(None), Role::User);
        assert!(!Role::or_least_privileged(None).is_member_of(TEAM_ROLES));
    }

    #[test]
    fn test_admin_cannot_touch_owner_for_any_new_role() {
        for new_role in ALL_ROLES {
            let result = authorize_role_change(&change(
                Role::Admin,
                Some(Role::Owner),
                Some(*new_role),
            ));
            assert_eq!(result, Err(RoleChangeDenied::OwnerProtected), "{new_role}");
        }
        assert_eq!(
            authorize_role_change(&change(Role::Admin, Some(Role::Owner), None)),
            Err(RoleChangeDenied::OwnerProtected)
        );
    }

    #[test]
    fn test_admin_cannot_promote_to_owner() {
        assert_eq!(
            authorize_role_change(&change(Role::Admin, Some(Role::Staff), Some(Role::Owner))),
            Err(RoleChangeDenied::OwnerProtected)
        );
    }

    #[test]
    fn test_owner_can_promote_and_demote_others() {
        assert!(authorize_role_change(&change(Role::Owner, Some(Role::Admin), Some(Role::Owner))).is_ok());
        assert!(authorize_role_change(&change(Role::Owner, Some(Role::Owner), Some(Role::Admin))).is_ok());
    }

    #[test]
    fn test_owner_cannot_modify_self() {
        let id = ProfileId::generate();
        let result = authorize_role_change(&RoleChange {
            actor_id: id,
            actor_role: Role::Owner,
            target_id: id,
            target_role: Some(Role::Owner),
            new_role: Some(Role::Admin),
        });
        assert_eq!(result, Err(RoleChangeDenied::SelfModification));
    }

    #[test]
    fn test_non_admin_actor_not_permitted() {
        for actor in [Role::Ops, Role::Staff, Role::Agent, Role::Developer, Role::User] {
            assert_eq!(
                authorize_role_change(&change(actor, Some(Role::User), Some(Role::Staff))),
                Err(RoleChangeDenied::NotPermitted)
            );
        }
    }

    #[test]
    fn test_admin_manages_regular_roles() {
        assert!(authorize_role_change(&change(Role::Admin, Some(Role::User), Some(Role::Agent))).is_ok());
        assert!(authorize_role_change(&change(Role::Admin, None, Some(Role::Staff))).is_ok());
    }
}
