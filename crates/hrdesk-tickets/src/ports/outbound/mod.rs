//! Outbound ports (Store traits)
//!
//! Hexagonal architecture: these are the interfaces that infrastructure must implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hrdesk_common::{OrgId, UserId};

use crate::domain::aggregates::{Notification, Ticket, TicketComment, TicketHistory};
use crate::domain::value_objects::{NotificationId, RefEntity, TicketId, TicketNumber};
use crate::domain::DomainEvent;

/// Marks a reader's ledger rows for one entity read as part of a commit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadReceipt {
    pub reader: UserId,
    pub entity: RefEntity,
    pub read_at: DateTime<Utc>,
}

/// Everything one ticket operation writes. A store applies all of it or
/// none of it.
#[derive(Clone, Debug)]
pub struct TicketMutation {
    pub ticket: Ticket,
    /// `None` inserts a new ticket, `Some(r)` updates one whose stored
    /// revision is still `r`
    pub expected_revision: Option<u64>,
    pub history: Vec<TicketHistory>,
    pub comment: Option<TicketComment>,
    pub notifications: Vec<Notification>,
    pub read_receipt: Option<ReadReceipt>,
}

impl TicketMutation {
    pub fn insert(ticket: Ticket) -> Self {
        Self::with_revision(ticket, None)
    }

    /// Update guarded by the revision the ticket was loaded at
    pub fn update(ticket: Ticket) -> Self {
        let revision = ticket.revision();
        Self::with_revision(ticket, Some(revision))
    }

    fn with_revision(ticket: Ticket, expected_revision: Option<u64>) -> Self {
        Self {
            ticket,
            expected_revision,
            history: Vec::new(),
            comment: None,
            notifications: Vec::new(),
            read_receipt: None,
        }
    }

    pub fn with_history(mut self, row: TicketHistory) -> Self {
        self.history.push(row);
        self
    }

    pub fn with_comment(mut self, comment: TicketComment) -> Self {
        self.comment = Some(comment);
        self
    }

    pub fn with_notifications(mut self, rows: Vec<Notification>) -> Self {
        self.notifications.extend(rows);
        self
    }

    pub fn with_read_receipt(mut self, receipt: ReadReceipt) -> Self {
        self.read_receipt = Some(receipt);
        self
    }
}

/// Ticket store port
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Issue the next unique ticket number
    async fn next_ticket_number(&self) -> Result<TicketNumber, RepositoryError>;

    /// Find ticket by ID
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, RepositoryError>;

    /// Tickets submitted by an employee
    async fn find_by_employee(&self, employee: &UserId) -> Result<Vec<Ticket>, RepositoryError>;

    /// Tickets routed to an organization
    async fn find_by_target_org(&self, org: &OrgId) -> Result<Vec<Ticket>, RepositoryError>;

    /// Every ticket
    async fn find_all(&self) -> Result<Vec<Ticket>, RepositoryError>;

    /// Audit trail of a ticket, oldest first
    async fn history(&self, id: &TicketId) -> Result<Vec<TicketHistory>, RepositoryError>;

    /// Comments of a ticket, oldest first
    async fn comments(&self, id: &TicketId) -> Result<Vec<TicketComment>, RepositoryError>;

    /// Apply a mutation atomically and return the stored ticket
    async fn commit(&self, mutation: TicketMutation) -> Result<Ticket, RepositoryError>;
}

/// Notification ledger port
#[async_trait]
pub trait NotificationLedgerStore: Send + Sync {
    /// Append rows outside of a ticket commit
    async fn append(&self, rows: Vec<Notification>) -> Result<(), RepositoryError>;

    /// A recipient's rows, newest first
    async fn for_recipient(&self, recipient: &UserId) -> Result<Vec<Notification>, RepositoryError>;

    /// Rows of every recipient that refer to an entity
    async fn for_entity(&self, entity: &RefEntity) -> Result<Vec<Notification>, RepositoryError>;

    async fn find(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError>;

    /// Returns `false` when the row was already read
    async fn mark_read(&self, id: &NotificationId, now: DateTime<Utc>) -> Result<bool, RepositoryError>;

    /// Returns the number of rows that changed
    async fn mark_all_read(&self, recipient: &UserId, now: DateTime<Utc>) -> Result<usize, RepositoryError>;

    async fn delete(&self, id: &NotificationId) -> Result<(), RepositoryError>;

    /// Prune a recipient's read rows, returning how many were removed
    async fn delete_all_read(&self, recipient: &UserId) -> Result<usize, RepositoryError>;
}

/// Event publisher port
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish domain events
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError>;
}

/// Repository error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Revision conflict: expected {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },

    #[error("Storage error: {0}")]
    StorageError(String),
}
