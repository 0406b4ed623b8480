//! Seeded portal for client tests
//!
//! `o1`: admins `a1`, `a2`, employees `e1`, `e2`. `o2`: admin `b1`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hrdesk_common::{
    Actor, InMemoryDirectory, Member, OrgId, OrganizationSummary, OrganizationType, Role, UserId,
};
use hrdesk_tickets::PortalServices;
use parking_lot::Mutex;

use crate::api::ApiError;
use crate::local::LocalPortalApi;
use crate::sources::SnapshotSource;

pub(crate) struct Fixture {
    pub services: PortalServices,
}

fn org(id: &str) -> OrgId {
    OrgId::new(id).unwrap()
}

impl Fixture {
    pub fn new() -> Self {
        let dir = InMemoryDirectory::new();
        let orgs: [(&str, OrganizationType, &[(&str, Role)]); 2] = [
            (
                "o1",
                OrganizationType::Vendor,
                &[
                    ("a1", Role::OrgAdmin),
                    ("a2", Role::OrgAdmin),
                    ("e1", Role::Employee),
                    ("e2", Role::Employee),
                ],
            ),
            ("o2", OrganizationType::Client, &[("b1", Role::OrgAdmin)]),
        ];
        for (id, org_type, members) in orgs {
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
        let (services, _store) = PortalServices::in_memory(Arc::new(dir));
        Self { services }
    }

    pub fn employee(&self, id: &str) -> Actor {
        Actor::new(UserId::new(id).unwrap(), Role::Employee, org("o1"))
    }

    pub fn admin(&self, id: &str) -> Actor {
        Actor::new(UserId::new(id).unwrap(), Role::OrgAdmin, org("o1"))
    }

    pub fn api(&self, actor: Actor) -> LocalPortalApi {
        LocalPortalApi::new(self.services.clone(), actor)
    }
}

/// Source that replays scripted snapshots and counts concurrent fetches.
/// Once the script runs out it repeats the last good snapshot.
pub(crate) struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<u32>, ApiError>>>,
    fallback: Mutex<Vec<u32>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// Simulated round-trip time
    delay: Duration,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<u32>, ApiError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    type Item = u32;

    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self) -> Result<Vec<u32>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        // The answer is fixed when the request is issued
        let next = self.script.lock().pop_front();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match next {
            Some(Ok(items)) => {
                *self.fallback.lock() = items.clone();
                Ok(items)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.fallback.lock().clone()),
        }
    }
}

/// Decrements the in-flight count even when the fetch is dropped mid-way
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
