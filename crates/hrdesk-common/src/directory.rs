//! Organization Directory
//!
//! Resolves organization summaries and membership. The real directory is
//! an external service; [`InMemoryDirectory`] backs tests and the scenario
//! runner.

use crate::identity::Role;
use crate::value_objects::{OrgId, UserId};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationType {
    /// The platform operator
    Platform,
    /// Staffing vendor
    Vendor,
    /// Client organization
    Client,
    /// Internal department
    Internal,
}

/// Organization summary as shown in routing dropdowns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    pub id: OrgId,
    pub name: String,
    #[serde(rename = "type")]
    pub org_type: OrganizationType,
}

/// A member of an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: UserId,
    pub display_name: String,
    pub role: Role,
}

/// Directory errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    /// Organization does not exist
    #[error("organization not found: {0}")]
    OrganizationNotFound(String),

    /// Directory backend failure
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Directory port consumed by the ticket core
#[async_trait]
pub trait Directory: Send + Sync {
    /// Organization summary
    async fn organization(&self, org: &OrgId) -> Result<Option<OrganizationSummary>, DirectoryError>;

    /// All members of an organization
    async fn members(&self, org: &OrgId) -> Result<Vec<Member>, DirectoryError>;

    /// Members holding an admin-like role in the organization
    async fn admins(&self, org: &OrgId) -> Result<Vec<UserId>, DirectoryError> {
        Ok(self
            .members(org)
            .await?
            .into_iter()
            .filter(|m| m.role.is_admin_like())
            .map(|m| m.user_id)
            .collect())
    }

    /// Is the user a member of the organization
    async fn is_member(&self, org: &OrgId, user: &UserId) -> Result<bool, DirectoryError> {
        Ok(self.members(org).await?.iter().any(|m| &m.user_id == user))
    }
}

struct OrgEntry {
    summary: OrganizationSummary,
    members: Vec<Member>,
}

/// In-memory directory
#[derive(Default)]
pub struct InMemoryDirectory {
    orgs: RwLock<HashMap<OrgId, OrgEntry>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an organization, replacing any previous entry
    pub fn add_organization(&self, summary: OrganizationSummary) {
        tracing::debug!(org = %summary.id, name = %summary.name, "Registering organization");
        self.orgs.write().insert(
            summary.id.clone(),
            OrgEntry {
                summary,
                members: Vec::new(),
            },
        );
    }

    /// Add a member to a registered organization
    pub fn add_member(&self, org: &OrgId, member: Member) -> Result<(), DirectoryError> {
        let mut orgs = self.orgs.write();
        let entry = orgs
            .get_mut(org)
            .ok_or_else(|| DirectoryError::OrganizationNotFound(org.to_string()))?;
        entry.members.retain(|m| m.user_id != member.user_id);
        entry.members.push(member);
        Ok(())
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn organization(&self, org: &OrgId) -> Result<Option<OrganizationSummary>, DirectoryError> {
        Ok(self.orgs.read().get(org).map(|e| e.summary.clone()))
    }

    async fn members(&self, org: &OrgId) -> Result<Vec<Member>, DirectoryError> {
        self.orgs
            .read()
            .get(org)
            .map(|e| e.members.clone())
            .ok_or_else(|| DirectoryError::OrganizationNotFound(org.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(id: &str) -> OrgId {
        OrgId::new(id).unwrap()
    }

    fn member(id: &str, role: Role) -> Member {
        Member {
            user_id: UserId::new(id).unwrap(),
            display_name: id.to_uppercase(),
            role,
        }
    }

    fn directory() -> InMemoryDirectory {
        let dir = InMemoryDirectory::new();
        dir.add_organization(OrganizationSummary {
            id: org("o1"),
            name: "Acme Vendor".into(),
            org_type: OrganizationType::Vendor,
        });
        dir.add_member(&org("o1"), member("a1", Role::OrgAdmin)).unwrap();
        dir.add_member(&org("o1"), member("e1", Role::Employee)).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_admins_filters_by_role() {
        let dir = directory();
        let admins = dir.admins(&org("o1")).await.unwrap();
        assert_eq!(admins, vec![UserId::new("a1").unwrap()]);
    }

    #[tokio::test]
    async fn test_membership() {
        let dir = directory();
        assert!(dir.is_member(&org("o1"), &UserId::new("e1").unwrap()).await.unwrap());
        assert!(!dir.is_member(&org("o1"), &UserId::new("x").unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_org() {
        let dir = directory();
        assert!(dir.organization(&org("nope")).await.unwrap().is_none());
        assert!(matches!(
            dir.members(&org("nope")).await,
            Err(DirectoryError::OrganizationNotFound(_))
        ));
        assert!(dir.add_member(&org("nope"), member("z", Role::Employee)).is_err());
    }

    #[test]
    fn test_re_adding_member_replaces() {
        let dir = directory();
        dir.add_member(&org("o1"), member("e1", Role::OrgAdmin)).unwrap();
        let admins = tokio_test::block_on(dir.admins(&org("o1"))).unwrap();
        assert_eq!(admins.len(), 2);
    }
}
