//! Snapshot sources
//!
//! A source returns the complete authoritative list for one view scope.
//! Never a delta.

use std::sync::Arc;

use async_trait::async_trait;
use hrdesk_tickets::{Notification, Ticket};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, PortalApi};

#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    /// Used in logs
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<Self::Item>, ApiError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketScope {
    /// Tickets the actor submitted
    Mine,
    /// Admin queue
    All,
}

pub struct TicketListSource {
    api: Arc<dyn PortalApi>,
    scope: TicketScope,
}

impl TicketListSource {
    pub fn new(api: Arc<dyn PortalApi>, scope: TicketScope) -> Self {
        Self { api, scope }
    }
}

#[async_trait]
impl SnapshotSource for TicketListSource {
    type Item = Ticket;

    fn name(&self) -> &str {
        match self.scope {
            TicketScope::Mine => "tickets/mine",
            TicketScope::All => "tickets/all",
        }
    }

    async fn fetch(&self) -> Result<Vec<Ticket>, ApiError> {
        match self.scope {
            TicketScope::Mine => self.api.list_mine().await,
            TicketScope::All => self.api.list_all().await,
        }
    }
}

/// Every notification of the actor, fetched in a single request
pub struct NotificationSource {
    api: Arc<dyn PortalApi>,
}

impl NotificationSource {
    pub fn new(api: Arc<dyn PortalApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SnapshotSource for NotificationSource {
    type Item = Notification;

    fn name(&self) -> &str {
        "notifications"
    }

    async fn fetch(&self) -> Result<Vec<Notification>, ApiError> {
        self.api.notification_snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use hrdesk_common::UserId;
    use hrdesk_tickets::{
        Category, CreateTicketCommand, NewNotification, NotificationUseCases, PortalServices, TicketType,
    };
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_ticket_scopes() {
        let fx = Fixture::new();
        let employee: Arc<dyn PortalApi> = Arc::new(fx.api(fx.employee("e1")));
        employee
            .create_ticket(CreateTicketCommand::new("Onboarding", "laptop + badge", TicketType::Onboarding))
            .await
            .unwrap();

        let mine = TicketListSource::new(employee, TicketScope::Mine);
        assert_eq!(mine.fetch().await.unwrap().len(), 1);

        let queue = TicketListSource::new(Arc::new(fx.api(fx.admin("a1"))), TicketScope::All);
        assert_eq!(queue.name(), "tickets/all");
        assert_eq!(queue.fetch().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_notification_snapshot_is_whole_ledger() {
        let fx = Fixture::new();
        let e1 = UserId::new("e1").unwrap();
        for i in 0..7 {
            fx.services
                .notifications
                .publish(NewNotification::new(e1.clone(), Category::Leave, format!("leave {}", i), "approved"))
                .await
                .unwrap();
        }

        let source = NotificationSource::new(Arc::new(fx.api(fx.employee("e1"))));
        let all = source.fetch().await.unwrap();
        assert_eq!(all.len(), 7);
        assert_eq!(all[0].title(), "leave 6");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_snapshot_consistent_while_ledger_grows() {
        let fx = Fixture::new();
        let e1 = UserId::new("e1").unwrap();
        let publish = move |services: PortalServices, i: usize| {
            let recipient = e1.clone();
            async move {
                services
                    .notifications
                    .publish(NewNotification::new(recipient, Category::General, format!("n{}", i), "body"))
                    .await
                    .unwrap();
            }
        };
        for i in 0..4 {
            publish(fx.services.clone(), i).await;
        }

        let writer = {
            let services = fx.services.clone();
            let publish = publish.clone();
            tokio::spawn(async move {
                for i in 4..40 {
                    publish(services.clone(), i).await;
                    tokio::task::yield_now().await;
                }
            })
        };

        let source = NotificationSource::new(Arc::new(fx.api(fx.employee("e1"))));
        let mut seen = 0;
        for _ in 0..20 {
            let snapshot = source.fetch().await.unwrap();
            let ids: HashSet<_> = snapshot.iter().map(|n| n.id().clone()).collect();
            assert_eq!(ids.len(), snapshot.len(), "a row appeared twice");
            assert!(snapshot.len() >= seen, "a row went missing");
            assert!(snapshot.windows(2).all(|w| w[0].created_at() >= w[1].created_at()));
            seen = snapshot.len();
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();

        let last = source.fetch().await.unwrap();
        assert_eq!(last.len(), 40);
        assert_eq!(last[0].title(), "n39");
    }
}
