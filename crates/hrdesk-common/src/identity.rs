//! Identity & Capability
//!
//! The session layer hands the core an [`Actor`]. Everything the core
//! decides about that actor goes through the *effective* role, which folds
//! in the optional view-as override without ever mutating the actual role.

use crate::value_objects::{OrgId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Portal roles, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular employee, submits tickets
    Employee,
    /// Recruiter inside an organization
    Recruiter,
    /// Administrator of a vendor or client organization
    OrgAdmin,
    /// HR administrator
    HrAdmin,
    /// Platform superuser
    SuperAdmin,
}

impl Role {
    /// Privilege rank, higher is more privileged
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Employee => 0,
            Self::Recruiter => 1,
            Self::OrgAdmin => 2,
            Self::HrAdmin => 3,
            Self::SuperAdmin => 4,
        }
    }

    /// Roles that may act on tickets routed to their own organization
    pub const fn is_admin_like(&self) -> bool {
        matches!(self, Self::OrgAdmin | Self::HrAdmin)
    }

    /// Roles that may route and act on tickets of any organization
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Self::HrAdmin | Self::SuperAdmin)
    }

    /// Platform superuser capability
    pub const fn is_superuser(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Employee => "EMPLOYEE",
            Self::Recruiter => "RECRUITER",
            Self::OrgAdmin => "ORG_ADMIN",
            Self::HrAdmin => "HR_ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        };
        f.write_str(name)
    }
}

/// Resolve the role the capability checks should see.
///
/// The override can only lower privilege. An override that would raise it
/// is ignored and the actual role is returned.
pub fn effective_role(actual: Role, override_role: Option<Role>) -> Role {
    match override_role {
        Some(view_as) if view_as.rank() <= actual.rank() => view_as,
        _ => actual,
    }
}

/// The authenticated principal performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    id: UserId,
    role: Role,
    org_id: OrgId,
    view_as: Option<Role>,
}

impl Actor {
    /// Create an actor as issued by the session layer
    pub fn new(id: UserId, role: Role, org_id: OrgId) -> Self {
        Self {
            id,
            role,
            org_id,
            view_as: None,
        }
    }

    /// Same identity viewing the portal as another role
    pub fn viewing_as(&self, role: Option<Role>) -> Self {
        Self {
            view_as: role,
            ..self.clone()
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Role granted by the session. Never changes for the session's lifetime.
    pub fn actual_role(&self) -> Role {
        self.role
    }

    pub fn org_id(&self) -> &OrgId {
        &self.org_id
    }

    pub fn view_as(&self) -> Option<Role> {
        self.view_as
    }

    /// Role used for every capability decision
    pub fn effective_role(&self) -> Role {
        effective_role(self.role, self.view_as)
    }
}

/// Pure capability checks over the effective role and tenant membership
pub struct CapabilityPolicy;

impl CapabilityPolicy {
    /// Superuser capability
    pub fn is_superuser(actor: &Actor) -> bool {
        actor.effective_role().is_superuser()
    }

    /// Platform and HR admins act across every organization
    pub fn manages_all(actor: &Actor) -> bool {
        actor.effective_role().is_privileged()
    }

    /// May the actor move tickets of `target_org` through their lifecycle
    pub fn can_manage(actor: &Actor, target_org: &OrgId) -> bool {
        let role = actor.effective_role();
        role.is_privileged() || (role.is_admin_like() && actor.org_id() == target_org)
    }

    /// May the actor route a new ticket to `target_org`
    pub fn can_target(actor: &Actor, target_org: &OrgId) -> bool {
        actor.effective_role().is_privileged() || actor.org_id() == target_org
    }

    /// May the actor pre-assign a ticket to a specific member
    pub fn can_preassign(actor: &Actor) -> bool {
        actor.effective_role().is_privileged()
    }

    /// May the actor read the admin-scoped ticket queue
    pub fn can_list_all(actor: &Actor) -> bool {
        let role = actor.effective_role();
        role.is_privileged() || role.is_admin_like()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, org: &str) -> Actor {
        Actor::new(UserId::new("u1").unwrap(), role, OrgId::new(org).unwrap())
    }

    #[test]
    fn test_effective_role_without_override() {
        assert_eq!(effective_role(Role::HrAdmin, None), Role::HrAdmin);
    }

    #[test]
    fn test_effective_role_downgrade_applies() {
        assert_eq!(effective_role(Role::HrAdmin, Some(Role::Employee)), Role::Employee);
    }

    #[test]
    fn test_effective_role_elevation_ignored() {
        assert_eq!(effective_role(Role::Employee, Some(Role::SuperAdmin)), Role::Employee);
    }

    #[test]
    fn test_view_as_keeps_actual_role() {
        let admin = actor(Role::OrgAdmin, "o1");
        let viewing = admin.viewing_as(Some(Role::Employee));
        assert_eq!(viewing.actual_role(), Role::OrgAdmin);
        assert_eq!(viewing.effective_role(), Role::Employee);
        assert_eq!(admin.effective_role(), Role::OrgAdmin);
    }

    #[test]
    fn test_can_manage_requires_same_org() {
        let o1 = OrgId::new("o1").unwrap();
        let o2 = OrgId::new("o2").unwrap();
        let admin = actor(Role::OrgAdmin, "o1");
        assert!(CapabilityPolicy::can_manage(&admin, &o1));
        assert!(!CapabilityPolicy::can_manage(&admin, &o2));
    }

    #[test]
    fn test_superuser_manages_everything() {
        let root = actor(Role::SuperAdmin, "platform");
        assert!(CapabilityPolicy::can_manage(&root, &OrgId::new("o9").unwrap()));
    }

    #[test]
    fn test_hr_admin_manages_foreign_orgs() {
        let hr = actor(Role::HrAdmin, "platform");
        assert!(CapabilityPolicy::can_manage(&hr, &OrgId::new("o2").unwrap()));
        assert!(CapabilityPolicy::manages_all(&hr));
        assert!(!CapabilityPolicy::manages_all(&actor(Role::OrgAdmin, "o1")));

        let downgraded = hr.viewing_as(Some(Role::OrgAdmin));
        assert!(!CapabilityPolicy::can_manage(&downgraded, &OrgId::new("o2").unwrap()));
    }

    #[test]
    fn test_employee_cannot_manage_own_org() {
        let emp = actor(Role::Employee, "o1");
        assert!(!CapabilityPolicy::can_manage(&emp, &OrgId::new("o1").unwrap()));
        assert!(!CapabilityPolicy::can_list_all(&emp));
    }

    #[test]
    fn test_view_as_removes_manage_capability() {
        let admin = actor(Role::OrgAdmin, "o1").viewing_as(Some(Role::Employee));
        assert!(!CapabilityPolicy::can_manage(&admin, &OrgId::new("o1").unwrap()));
    }

    #[test]
    fn test_targeting() {
        let emp = actor(Role::Employee, "o1");
        let hr = actor(Role::HrAdmin, "platform");
        let foreign = OrgId::new("o2").unwrap();
        assert!(CapabilityPolicy::can_target(&emp, &OrgId::new("o1").unwrap()));
        assert!(!CapabilityPolicy::can_target(&emp, &foreign));
        assert!(CapabilityPolicy::can_target(&hr, &foreign));
        assert!(CapabilityPolicy::can_preassign(&hr));
        assert!(!CapabilityPolicy::can_preassign(&emp));
    }
}
