//! Shared fixture for service tests
//!
//! `o1` (vendor): admins `a1`, `a2`; employees `e1`, `e2`.
//! `o2` (client): admin `b1`.
//! `platform`: HR admin `hr1`, superuser `root`.

use std::sync::Arc;

use hrdesk_common::{
    Actor, InMemoryDirectory, Member, OrgId, OrganizationSummary, OrganizationType, Role, UserId,
};

use crate::application::{NotificationService, PortalServices, TicketService, UnreadTracker};
use crate::infrastructure::persistence::InMemoryPortalStore;

pub(crate) struct Portal {
    pub store: Arc<InMemoryPortalStore>,
    pub tickets: Arc<TicketService>,
    pub notifications: Arc<NotificationService>,
    pub tracker: Arc<UnreadTracker>,
}

fn org(id: &str) -> OrgId {
    OrgId::new(id).unwrap()
}

fn seed(dir: &InMemoryDirectory, id: &str, org_type: OrganizationType, members: &[(&str, Role)]) {
    dir.add_organization(OrganizationSummary {
        id: org(id),
        name: id.to_uppercase(),
        org_type,
    });
    for (user, role) in members {
        dir.add_member(
            &org(id),
            Member {
                user_id: UserId::new(*user).unwrap(),
                display_name: user.to_string(),
                role: *role,
            },
        )
        .unwrap();
    }
}

impl Portal {
    pub fn new() -> Self {
        let dir = InMemoryDirectory::new();
        seed(
            &dir,
            "o1",
            OrganizationType::Vendor,
            &[
                ("a1", Role::OrgAdmin),
                ("a2", Role::OrgAdmin),
                ("e1", Role::Employee),
                ("e2", Role::Employee),
            ],
        );
        seed(&dir, "o2", OrganizationType::Client, &[("b1", Role::OrgAdmin)]);
        seed(
            &dir,
            "platform",
            OrganizationType::Platform,
            &[("hr1", Role::HrAdmin), ("root", Role::SuperAdmin)],
        );

        let (services, store) = PortalServices::in_memory(Arc::new(dir));
        Self {
            store,
            tickets: services.tickets,
            notifications: services.notifications,
            tracker: services.tracker,
        }
    }

    fn actor(id: &str, role: Role, org_id: &str) -> Actor {
        Actor::new(UserId::new(id).unwrap(), role, org(org_id))
    }

    pub fn employee(&self, id: &str) -> Actor {
        Self::actor(id, Role::Employee, "o1")
    }

    pub fn admin(&self, id: &str) -> Actor {
        Self::actor(id, Role::OrgAdmin, "o1")
    }

    pub fn admin_of(&self, id: &str, org_id: &str) -> Actor {
        Self::actor(id, Role::OrgAdmin, org_id)
    }

    pub fn hr_admin(&self, id: &str) -> Actor {
        Self::actor(id, Role::HrAdmin, "platform")
    }

    pub fn super_admin(&self, id: &str) -> Actor {
        Self::actor(id, Role::SuperAdmin, "platform")
    }
}
