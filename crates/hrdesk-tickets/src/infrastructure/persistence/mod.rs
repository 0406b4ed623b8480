//! In-memory store implementations
//!
//! [`InMemoryPortalStore`] keeps tickets, the audit log, comments and the
//! ledger behind a single lock so a [`TicketMutation`] lands as one unit.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hrdesk_common::{OrgId, UserId};
use parking_lot::RwLock;

use crate::domain::aggregates::{Notification, Ticket, TicketComment, TicketHistory};
use crate::domain::value_objects::{NotificationId, RefEntity, TicketId, TicketNumber};
use crate::domain::DomainEvent;
use crate::ports::outbound::{
    EventPublisher, NotificationLedgerStore, ReadReceipt, RepositoryError, TicketMutation,
    TicketStore,
};

#[derive(Default)]
struct PortalState {
    tickets: HashMap<TicketId, Ticket>,
    numbers: HashSet<TicketNumber>,
    history: HashMap<TicketId, Vec<TicketHistory>>,
    comments: HashMap<TicketId, Vec<TicketComment>>,
    /// Append order, oldest first
    ledger: Vec<Notification>,
}

impl PortalState {
    fn check(&self, mutation: &TicketMutation) -> Result<(), RepositoryError> {
        let ticket = &mutation.ticket;
        match mutation.expected_revision {
            None => {
                if self.tickets.contains_key(ticket.id()) {
                    return Err(RepositoryError::DuplicateKey(ticket.id().to_string()));
                }
                if self.numbers.contains(ticket.ticket_number()) {
                    return Err(RepositoryError::DuplicateKey(ticket.ticket_number().to_string()));
                }
            }
            Some(expected) => {
                let stored = self
                    .tickets
                    .get(ticket.id())
                    .ok_or_else(|| RepositoryError::NotFound(format!("ticket {}", ticket.id())))?;
                if stored.revision() != expected {
                    return Err(RepositoryError::Conflict {
                        expected,
                        actual: stored.revision(),
                    });
                }
            }
        }
        Ok(())
    }

    fn mark_entity_read(&mut self, receipt: &ReadReceipt) {
        for row in self
            .ledger
            .iter_mut()
            .filter(|n| n.recipient_id() == &receipt.reader && n.refers_to(&receipt.entity))
        {
            row.mark_read(receipt.read_at);
        }
    }
}

/// In-memory ticket store and notification ledger
pub struct InMemoryPortalStore {
    state: RwLock<PortalState>,
    sequence: AtomicU64,
}

impl Default for InMemoryPortalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPortalStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(PortalState::default()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn ticket_count(&self) -> usize {
        self.state.read().tickets.len()
    }

    fn collect_tickets(&self, keep: impl Fn(&Ticket) -> bool) -> Vec<Ticket> {
        self.state
            .read()
            .tickets
            .values()
            .filter(|t| keep(t))
            .cloned()
            .collect()
    }

    fn collect_rows(&self, keep: impl Fn(&Notification) -> bool) -> Vec<Notification> {
        self.state
            .read()
            .ledger
            .iter()
            .rev()
            .filter(|n| keep(n))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TicketStore for InMemoryPortalStore {
    async fn next_ticket_number(&self) -> Result<TicketNumber, RepositoryError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TicketNumber::from_sequence(sequence))
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, RepositoryError> {
        Ok(self.state.read().tickets.get(id).cloned())
    }

    async fn find_by_employee(&self, employee: &UserId) -> Result<Vec<Ticket>, RepositoryError> {
        Ok(self.collect_tickets(|t| t.employee() == employee))
    }

    async fn find_by_target_org(&self, org: &OrgId) -> Result<Vec<Ticket>, RepositoryError> {
        Ok(self.collect_tickets(|t| t.target_organization() == org))
    }

    async fn find_all(&self) -> Result<Vec<Ticket>, RepositoryError> {
        Ok(self.collect_tickets(|_| true))
    }

    async fn history(&self, id: &TicketId) -> Result<Vec<TicketHistory>, RepositoryError> {
        Ok(self.state.read().history.get(id).cloned().unwrap_or_default())
    }

    async fn comments(&self, id: &TicketId) -> Result<Vec<TicketComment>, RepositoryError> {
        Ok(self.state.read().comments.get(id).cloned().unwrap_or_default())
    }

    async fn commit(&self, mutation: TicketMutation) -> Result<Ticket, RepositoryError> {
        let mut state = self.state.write();
        state.check(&mutation)?;

        let TicketMutation {
            mut ticket,
            history,
            comment,
            notifications,
            read_receipt,
            ..
        } = mutation;
        ticket.advance_revision();
        let id = ticket.id().clone();

        state.numbers.insert(ticket.ticket_number().clone());
        if !history.is_empty() {
            state.history.entry(id.clone()).or_default().extend(history);
        }
        if let Some(comment) = comment {
            state.comments.entry(id.clone()).or_default().push(comment);
        }
        state.ledger.extend(notifications);
        if let Some(receipt) = read_receipt {
            state.mark_entity_read(&receipt);
        }
        state.tickets.insert(id, ticket.clone());

        tracing::debug!(ticket_id = %ticket.id(), revision = ticket.revision(), "Ticket committed");
        Ok(ticket)
    }
}

#[async_trait]
impl NotificationLedgerStore for InMemoryPortalStore {
    async fn append(&self, rows: Vec<Notification>) -> Result<(), RepositoryError> {
        self.state.write().ledger.extend(rows);
        Ok(())
    }

    async fn for_recipient(&self, recipient: &UserId) -> Result<Vec<Notification>, RepositoryError> {
        Ok(self.collect_rows(|n| n.recipient_id() == recipient))
    }

    async fn for_entity(&self, entity: &RefEntity) -> Result<Vec<Notification>, RepositoryError> {
        Ok(self.collect_rows(|n| n.refers_to(entity)))
    }

    async fn find(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError> {
        Ok(self.state.read().ledger.iter().find(|n| n.id() == id).cloned())
    }

    async fn mark_read(&self, id: &NotificationId, now: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let mut state = self.state.write();
        let row = state
            .ledger
            .iter_mut()
            .find(|n| n.id() == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("notification {}", id)))?;
        Ok(row.mark_read(now))
    }

    async fn mark_all_read(&self, recipient: &UserId, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let mut state = self.state.write();
        Ok(state
            .ledger
            .iter_mut()
            .filter(|n| n.recipient_id() == recipient)
            .map(|n| n.mark_read(now))
            .filter(|changed| *changed)
            .count())
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), RepositoryError> {
        let mut state = self.state.write();
        let before = state.ledger.len();
        state.ledger.retain(|n| n.id() != id);
        if state.ledger.len() == before {
            return Err(RepositoryError::NotFound(format!("notification {}", id)));
        }
        Ok(())
    }

    async fn delete_all_read(&self, recipient: &UserId) -> Result<usize, RepositoryError> {
        let mut state = self.state.write();
        let before = state.ledger.len();
        state
            .ledger
            .retain(|n| !(n.recipient_id() == recipient && n.is_read()));
        Ok(before - state.ledger.len())
    }
}

/// Publishes domain events as structured log lines
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError> {
        for event in events {
            tracing::info!(
                event_type = event.event_type(),
                aggregate_id = event.aggregate_id(),
                "Domain event"
            );
        }
        Ok(())
    }
}
