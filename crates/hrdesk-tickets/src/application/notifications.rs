//! Notification center service
//!
//! Every aggregation here is recomputed from the ledger on each call.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hrdesk_common::Actor;

use crate::application::dto::{Page, PageRequest};
use crate::domain::aggregates::{NewNotification, Notification};
use crate::domain::events::{DomainEvent, NotificationEvent};
use crate::domain::value_objects::{Category, NotificationId};
use crate::ports::inbound::{NotificationUseCases, UseCaseError};
use crate::ports::outbound::{EventPublisher, NotificationLedgerStore};

pub struct NotificationService {
    ledger: Arc<dyn NotificationLedgerStore>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl NotificationService {
    pub fn new(
        ledger: Arc<dyn NotificationLedgerStore>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            ledger,
            event_publisher,
        }
    }

    /// Rows owned by someone else are reported as missing
    async fn owned(&self, actor: &Actor, id: &NotificationId) -> Result<Notification, UseCaseError> {
        self.ledger
            .find(id)
            .await?
            .filter(|n| n.recipient_id() == actor.id())
            .ok_or_else(|| UseCaseError::NotFound(format!("notification {}", id)))
    }

    async fn unread_rows(&self, actor: &Actor) -> Result<Vec<Notification>, UseCaseError> {
        let mut rows = self.ledger.for_recipient(actor.id()).await?;
        rows.retain(|n| !n.is_read());
        Ok(rows)
    }

    async fn publish_event(&self, event: NotificationEvent) {
        if let Err(e) = self.event_publisher.publish(vec![DomainEvent::Notification(event)]).await {
            tracing::warn!(error = %e, "Failed to publish notification event");
        }
    }
}

#[async_trait]
impl NotificationUseCases for NotificationService {
    async fn list_notifications(&self, actor: &Actor, request: PageRequest) -> Result<Page<Notification>, UseCaseError> {
        let mut rows = self.ledger.for_recipient(actor.id()).await?;
        if request.unread_only {
            rows.retain(|n| !n.is_read());
        }
        Ok(Page::slice(rows, &request))
    }

    async fn notification_snapshot(&self, actor: &Actor) -> Result<Vec<Notification>, UseCaseError> {
        Ok(self.ledger.for_recipient(actor.id()).await?)
    }

    async fn count_by_category(&self, actor: &Actor) -> Result<BTreeMap<Category, u64>, UseCaseError> {
        let mut counts = BTreeMap::new();
        for row in self.unread_rows(actor).await? {
            *counts.entry(row.category()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn unread_entity_ids(&self, actor: &Actor, category: Category) -> Result<Vec<String>, UseCaseError> {
        let mut seen = HashSet::new();
        Ok(self
            .unread_rows(actor)
            .await?
            .into_iter()
            .filter(|n| n.category() == category)
            .filter_map(|n| n.ref_entity())
            .map(|entity| entity.entity_id)
            .filter(|id| seen.insert(id.clone()))
            .collect())
    }

    async fn mark_notification_read(&self, actor: &Actor, id: &NotificationId) -> Result<(), UseCaseError> {
        self.owned(actor, id).await?;
        if self.ledger.mark_read(id, Utc::now()).await? {
            self.publish_event(NotificationEvent::MarkedRead {
                recipient_id: actor.id().clone(),
                count: 1,
            })
            .await;
        }
        Ok(())
    }

    async fn mark_all_read(&self, actor: &Actor) -> Result<usize, UseCaseError> {
        let count = self.ledger.mark_all_read(actor.id(), Utc::now()).await?;
        tracing::info!(recipient = %actor.id(), count, "Marked all notifications read");
        if count > 0 {
            self.publish_event(NotificationEvent::MarkedRead {
                recipient_id: actor.id().clone(),
                count,
            })
            .await;
        }
        Ok(count)
    }

    async fn delete_notification(&self, actor: &Actor, id: &NotificationId) -> Result<(), UseCaseError> {
        self.owned(actor, id).await?;
        self.ledger.delete(id).await?;
        self.publish_event(NotificationEvent::Deleted {
            recipient_id: actor.id().clone(),
            count: 1,
        })
        .await;
        Ok(())
    }

    async fn delete_all_read(&self, actor: &Actor) -> Result<usize, UseCaseError> {
        let count = self.ledger.delete_all_read(actor.id()).await?;
        tracing::info!(recipient = %actor.id(), count, "Pruned read notifications");
        if count > 0 {
            self.publish_event(NotificationEvent::Deleted {
                recipient_id: actor.id().clone(),
                count,
            })
            .await;
        }
        Ok(count)
    }

    async fn publish(&self, notification: NewNotification) -> Result<Notification, UseCaseError> {
        if notification.title.trim().is_empty() {
            return Err(UseCaseError::Validation("notification title is required".into()));
        }
        let row = Notification::create(notification, Utc::now());
        self.ledger.append(vec![row.clone()]).await?;

        tracing::info!(
            notification_id = %row.id(),
            recipient = %row.recipient_id(),
            category = %row.category(),
            "Notification published"
        );
        self.publish_event(NotificationEvent::Published {
            notification_id: row.id().clone(),
            recipient_id: row.recipient_id().clone(),
            category: row.category(),
        })
        .await;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::Portal;
    use crate::domain::value_objects::{EntityType, RefEntity};
    use hrdesk_common::UserId;

    fn leave_request(recipient: &str, id: &str) -> NewNotification {
        NewNotification::new(
            UserId::new(recipient).unwrap(),
            Category::Leave,
            "Leave approved",
            "Enjoy",
        )
        .about(RefEntity::new(EntityType::LeaveRequest, id))
    }

    #[tokio::test]
    async fn test_count_by_category_omits_zero() {
        let portal = Portal::new();
        let e = portal.employee("e1");
        portal.notifications.publish(leave_request("e1", "l1")).await.unwrap();
        portal.notifications.publish(leave_request("e1", "l2")).await.unwrap();

        let counts = portal.notifications.count_by_category(&e).await.unwrap();
        assert_eq!(counts.get(&Category::Leave), Some(&2));
        assert!(!counts.contains_key(&Category::Ticket));

        portal.notifications.mark_all_read(&e).await.unwrap();
        assert!(portal.notifications.count_by_category(&e).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unread_entity_ids_are_distinct() {
        let portal = Portal::new();
        let e = portal.employee("e1");
        for id in ["l1", "l2", "l1"] {
            portal.notifications.publish(leave_request("e1", id)).await.unwrap();
        }
        let ids = portal.notifications.unread_entity_ids(&e, Category::Leave).await.unwrap();
        assert_eq!(ids, vec!["l1".to_string(), "l2".to_string()]);
        assert!(portal
            .notifications
            .unread_entity_ids(&e, Category::Asset)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_foreign_row_is_not_found() {
        let portal = Portal::new();
        let row = portal.notifications.publish(leave_request("e1", "l1")).await.unwrap();
        let other = portal.employee("e2");
        assert!(matches!(
            portal.notifications.mark_notification_read(&other, row.id()).await,
            Err(UseCaseError::NotFound(_))
        ));
        assert!(matches!(
            portal.notifications.delete_notification(&other, row.id()).await,
            Err(UseCaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mark_read_and_prune() {
        let portal = Portal::new();
        let e = portal.employee("e1");
        let first = portal.notifications.publish(leave_request("e1", "l1")).await.unwrap();
        portal.notifications.publish(leave_request("e1", "l2")).await.unwrap();

        portal.notifications.mark_notification_read(&e, first.id()).await.unwrap();
        let page = portal
            .notifications
            .list_notifications(&e, PageRequest::default())
            .await
            .unwrap();
        let read = page.items.iter().find(|n| n.id() == first.id()).unwrap();
        assert!(read.is_read());
        assert!(read.read_at().is_some());

        assert_eq!(portal.notifications.delete_all_read(&e).await.unwrap(), 1);
        let page = portal
            .notifications
            .list_notifications(&e, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_items, 1);
        assert!(page.items.iter().all(|n| !n.is_read()));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paged() {
        let portal = Portal::new();
        let e = portal.employee("e1");
        for i in 0..5 {
            portal
                .notifications
                .publish(leave_request("e1", &format!("l{}", i)))
                .await
                .unwrap();
        }
        let page = portal
            .notifications
            .list_notifications(&e, PageRequest::new(0, 2))
            .await
            .unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items[0].ref_entity().unwrap().entity_id, "l4");
        assert_eq!(page.items[1].ref_entity().unwrap().entity_id, "l3");
    }

    #[tokio::test]
    async fn test_blank_title_rejected() {
        let portal = Portal::new();
        let mut new = leave_request("e1", "l1");
        new.title = "  ".into();
        assert!(matches!(
            portal.notifications.publish(new).await,
            Err(UseCaseError::Validation(_))
        ));
    }
}
