//! Domain Events
//!
//! Events raised by the ticket aggregate and the ledger to communicate
//! state changes to the rest of the platform.

use chrono::{DateTime, Utc};
use hrdesk_common::{OrgId, UserId};

use crate::domain::value_objects::{
    Category, CommentId, NotificationId, Side, TicketId, TicketNumber, TicketStatus,
};

/// All domain events in the ticket desk bounded context
#[derive(Clone, Debug)]
pub enum DomainEvent {
    Ticket(TicketEvent),
    Notification(NotificationEvent),
}

/// Ticket lifecycle events
#[derive(Clone, Debug)]
pub enum TicketEvent {
    Created {
        ticket_id: TicketId,
        ticket_number: TicketNumber,
        employee: UserId,
        target_organization: OrgId,
        created_at: DateTime<Utc>,
    },

    StatusChanged {
        ticket_id: TicketId,
        from: TicketStatus,
        to: TicketStatus,
        changed_by: UserId,
        changed_at: DateTime<Utc>,
    },

    Escalated {
        ticket_id: TicketId,
        escalated_by: UserId,
        escalated_at: DateTime<Utc>,
    },

    Assigned {
        ticket_id: TicketId,
        assignee: UserId,
        assigned_by: UserId,
    },

    CommentAdded {
        ticket_id: TicketId,
        comment_id: CommentId,
        sender: UserId,
        sent_at: DateTime<Utc>,
    },

    Read {
        ticket_id: TicketId,
        side: Side,
    },
}

/// Ledger events
#[derive(Clone, Debug)]
pub enum NotificationEvent {
    Published {
        notification_id: NotificationId,
        recipient_id: UserId,
        category: Category,
    },

    MarkedRead {
        recipient_id: UserId,
        count: usize,
    },

    Deleted {
        recipient_id: UserId,
        count: usize,
    },
}

impl DomainEvent {
    /// Identifier of the aggregate or recipient this event belongs to
    pub fn aggregate_id(&self) -> &str {
        match self {
            DomainEvent::Ticket(e) => match e {
                TicketEvent::Created { ticket_id, .. }
                | TicketEvent::StatusChanged { ticket_id, .. }
                | TicketEvent::Escalated { ticket_id, .. }
                | TicketEvent::Assigned { ticket_id, .. }
                | TicketEvent::CommentAdded { ticket_id, .. }
                | TicketEvent::Read { ticket_id, .. } => ticket_id.as_str(),
            },
            DomainEvent::Notification(e) => match e {
                NotificationEvent::Published { recipient_id, .. }
                | NotificationEvent::MarkedRead { recipient_id, .. }
                | NotificationEvent::Deleted { recipient_id, .. } => recipient_id.as_str(),
            },
        }
    }

    /// Get event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::Ticket(e) => match e {
                TicketEvent::Created { .. } => "ticket.created",
                TicketEvent::StatusChanged { .. } => "ticket.status_changed",
                TicketEvent::Escalated { .. } => "ticket.escalated",
                TicketEvent::Assigned { .. } => "ticket.assigned",
                TicketEvent::CommentAdded { .. } => "ticket.comment_added",
                TicketEvent::Read { .. } => "ticket.read",
            },
            DomainEvent::Notification(e) => match e {
                NotificationEvent::Published { .. } => "notification.published",
                NotificationEvent::MarkedRead { .. } => "notification.marked_read",
                NotificationEvent::Deleted { .. } => "notification.deleted",
            },
        }
    }
}
