//! Application layer
//!
//! Orchestrates use cases and coordinates domain objects.

pub mod dto;
pub mod notifications;
pub mod tickets;
pub mod unread;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use hrdesk_common::Directory;

pub use dto::*;
pub use notifications::NotificationService;
pub use tickets::{viewer_side, TicketService, MAX_COMMIT_ATTEMPTS};
pub use unread::{ReconcileReport, UnreadSummary, UnreadTracker};

use crate::infrastructure::persistence::{InMemoryPortalStore, TracingEventPublisher};
use crate::ports::outbound::{EventPublisher, NotificationLedgerStore, TicketStore};

/// The three services wired over one set of stores
#[derive(Clone)]
pub struct PortalServices {
    pub tickets: Arc<TicketService>,
    pub notifications: Arc<NotificationService>,
    pub tracker: Arc<UnreadTracker>,
}

impl PortalServices {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        ledger: Arc<dyn NotificationLedgerStore>,
        directory: Arc<dyn Directory>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            tickets: Arc::new(TicketService::new(
                tickets.clone(),
                directory,
                event_publisher.clone(),
            )),
            notifications: Arc::new(NotificationService::new(ledger.clone(), event_publisher)),
            tracker: Arc::new(UnreadTracker::new(tickets, ledger)),
        }
    }

    /// Services over a fresh [`InMemoryPortalStore`], events logged via tracing
    pub fn in_memory(directory: Arc<dyn Directory>) -> (Self, Arc<InMemoryPortalStore>) {
        let store = Arc::new(InMemoryPortalStore::new());
        let services = Self::new(
            store.clone(),
            store.clone(),
            directory,
            Arc::new(TracingEventPublisher),
        );
        (services, store)
    }
}
