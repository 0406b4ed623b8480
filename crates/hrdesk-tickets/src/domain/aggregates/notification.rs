//! Notification Ledger rows

use chrono::{DateTime, Utc};
use hrdesk_common::UserId;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Category, EntityType, NotificationId, Priority, RefEntity};

/// A row to be appended to the ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub recipient_id: UserId,
    pub title: String,
    pub body: String,
    pub category: Category,
    pub priority: Priority,
    pub ref_entity: Option<RefEntity>,
}

impl NewNotification {
    pub fn new(
        recipient_id: UserId,
        category: Category,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id,
            title: title.into(),
            body: body.into(),
            category,
            priority: Priority::Medium,
            ref_entity: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn about(mut self, entity: RefEntity) -> Self {
        self.ref_entity = Some(entity);
        self
    }
}

/// One ledger row per (recipient, triggering event)
///
/// # Invariants
/// - `read_at` is set if and only if `read`
/// - Only the read marker ever changes after creation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    id: NotificationId,
    recipient_id: UserId,
    title: String,
    body: String,
    category: Category,
    priority: Priority,
    ref_entity_type: Option<EntityType>,
    ref_entity_id: Option<String>,
    read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Notification {
    pub fn create(new: NewNotification, now: DateTime<Utc>) -> Self {
        let (ref_entity_type, ref_entity_id) = match new.ref_entity {
            Some(entity) => (Some(entity.entity_type), Some(entity.entity_id)),
            None => (None, None),
        };
        Self {
            id: NotificationId::new(),
            recipient_id: new.recipient_id,
            title: new.title,
            body: new.body,
            category: new.category,
            priority: new.priority,
            ref_entity_type,
            ref_entity_id,
            read: false,
            read_at: None,
            created_at: now,
        }
    }

    pub fn id(&self) -> &NotificationId { &self.id }
    pub fn recipient_id(&self) -> &UserId { &self.recipient_id }
    pub fn title(&self) -> &str { &self.title }
    pub fn body(&self) -> &str { &self.body }
    pub fn category(&self) -> Category { self.category }
    pub fn priority(&self) -> Priority { self.priority }
    pub fn is_read(&self) -> bool { self.read }
    pub fn read_at(&self) -> Option<DateTime<Utc>> { self.read_at }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub fn ref_entity(&self) -> Option<RefEntity> {
        match (self.ref_entity_type, &self.ref_entity_id) {
            (Some(entity_type), Some(id)) => Some(RefEntity::new(entity_type, id.clone())),
            _ => None,
        }
    }

    pub fn refers_to(&self, entity: &RefEntity) -> bool {
        self.ref_entity_type == Some(entity.entity_type)
            && self.ref_entity_id.as_deref() == Some(entity.entity_id.as_str())
    }

    /// Mark read. Returns `false` when the row was already read, in which
    /// case the original `read_at` is kept.
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if self.read {
            return false;
        }
        self.read = true;
        self.read_at = Some(now);
        true
    }
}
