//! Ticket Aggregate
//!
//! Aggregate root of the support desk. Status only moves along the
//! [`TicketStatus`] graph, and every change that another party should
//! notice bumps that party's unread counter on the ticket itself.

use chrono::{DateTime, Utc};
use hrdesk_common::{OrgId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::history::{AuditNote, TicketComment, TicketHistory};
use crate::domain::events::{DomainEvent, TicketEvent};
use crate::domain::value_objects::{
    CommentId, HistoryId, Priority, Side, TicketId, TicketNumber, TicketStatus, TicketType,
};

/// Validated input for opening a ticket
#[derive(Clone, Debug)]
pub struct TicketDraft {
    pub subject: String,
    pub description: String,
    pub ticket_type: TicketType,
    pub priority: Priority,
    pub employee: UserId,
    pub created_by: UserId,
    pub target_organization: OrgId,
    pub assigned_to: Option<UserId>,
}

/// Ticket aggregate root
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    id: TicketId,
    ticket_number: TicketNumber,
    subject: String,
    description: String,
    #[serde(rename = "type")]
    ticket_type: TicketType,
    status: TicketStatus,
    priority: Priority,
    employee: UserId,
    created_by: UserId,
    assigned_to: Option<UserId>,
    target_organization: OrgId,
    is_escalated: bool,
    unread_count_for_employee: u32,
    unread_count_for_admin: u32,
    version: u64,
    revision: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Ticket {
    /// Open a new ticket in `OPEN`
    pub fn open(draft: TicketDraft, ticket_number: TicketNumber, now: DateTime<Utc>) -> Self {
        let id = TicketId::new();
        let on_behalf = draft.created_by != draft.employee;

        let mut ticket = Self {
            id: id.clone(),
            ticket_number: ticket_number.clone(),
            subject: draft.subject,
            description: draft.description,
            ticket_type: draft.ticket_type,
            status: TicketStatus::Open,
            priority: draft.priority,
            employee: draft.employee.clone(),
            created_by: draft.created_by,
            assigned_to: draft.assigned_to,
            target_organization: draft.target_organization.clone(),
            is_escalated: false,
            unread_count_for_employee: if on_behalf { 1 } else { 0 },
            unread_count_for_admin: 1,
            version: 1,
            revision: 0,
            created_at: now,
            updated_at: now,
            events: vec![],
        };

        ticket.raise_event(DomainEvent::Ticket(TicketEvent::Created {
            ticket_id: id,
            ticket_number,
            employee: draft.employee,
            target_organization: draft.target_organization,
            created_at: now,
        }));

        ticket
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> &TicketId { &self.id }
    pub fn ticket_number(&self) -> &TicketNumber { &self.ticket_number }
    pub fn subject(&self) -> &str { &self.subject }
    pub fn description(&self) -> &str { &self.description }
    pub fn ticket_type(&self) -> TicketType { self.ticket_type }
    pub fn status(&self) -> TicketStatus { self.status }
    pub fn priority(&self) -> Priority { self.priority }
    pub fn employee(&self) -> &UserId { &self.employee }
    pub fn created_by(&self) -> &UserId { &self.created_by }
    pub fn assigned_to(&self) -> Option<&UserId> { self.assigned_to.as_ref() }
    pub fn target_organization(&self) -> &OrgId { &self.target_organization }
    pub fn is_escalated(&self) -> bool { self.is_escalated }
    pub fn unread_count_for_employee(&self) -> u32 { self.unread_count_for_employee }
    pub fn unread_count_for_admin(&self) -> u32 { self.unread_count_for_admin }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_terminal(&self) -> bool { self.status.is_terminal() }

    /// Workflow ETag. Bumped by transitions, escalation and assignment.
    pub fn version(&self) -> u64 { self.version }

    /// Storage revision, bumped by the store on every commit
    pub fn revision(&self) -> u64 { self.revision }

    /// Unread counter for one side
    pub fn unread_for(&self, side: Side) -> u32 {
        match side {
            Side::Employee => self.unread_count_for_employee,
            Side::Admin => self.unread_count_for_admin,
        }
    }

    /// The submitter always writes from the employee side, everyone else
    /// from the admin side.
    pub fn author_side(&self, user: &UserId) -> Side {
        if user == &self.employee {
            Side::Employee
        } else {
            Side::Admin
        }
    }

    // =========================================================================
    // Business Operations
    // =========================================================================

    /// Move to `to` if the caller saw the current version and the edge is
    /// in the transition table.
    pub fn transition(
        &mut self,
        to: TicketStatus,
        changed_by: &UserId,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> Result<TicketHistory, TicketError> {
        if expected_version != self.version {
            return Err(TicketError::VersionMismatch {
                expected: expected_version,
                actual: self.version,
            });
        }

        let from = self.status;
        if !from.can_transition_to(to) {
            return Err(TicketError::IllegalTransition { from, to });
        }

        self.status = to;
        self.version += 1;
        if changed_by != &self.employee {
            self.bump(Side::Employee);
        }
        self.touch(now);

        self.raise_event(DomainEvent::Ticket(TicketEvent::StatusChanged {
            ticket_id: self.id.clone(),
            from,
            to,
            changed_by: changed_by.clone(),
            changed_at: now,
        }));

        Ok(self.audit_row(from, to, changed_by, now, None))
    }

    /// Escalate. Returns `None` when the ticket was already escalated.
    pub fn escalate(
        &mut self,
        escalated_by: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<TicketHistory>, TicketError> {
        if self.is_terminal() {
            return Err(TicketError::Terminal(self.status));
        }
        if self.is_escalated {
            return Ok(None);
        }

        self.priority = Priority::Critical;
        self.is_escalated = true;
        self.version += 1;
        self.bump(Side::Admin);
        self.touch(now);

        self.raise_event(DomainEvent::Ticket(TicketEvent::Escalated {
            ticket_id: self.id.clone(),
            escalated_by: escalated_by.clone(),
            escalated_at: now,
        }));

        Ok(Some(self.audit_row(
            self.status,
            self.status,
            escalated_by,
            now,
            Some(AuditNote::Escalated),
        )))
    }

    /// Hand the ticket to a member of the target organization
    pub fn assign(
        &mut self,
        assignee: UserId,
        assigned_by: &UserId,
        now: DateTime<Utc>,
    ) -> Result<TicketHistory, TicketError> {
        if self.is_terminal() {
            return Err(TicketError::Terminal(self.status));
        }
        if self.assigned_to.as_ref() == Some(&assignee) {
            return Err(TicketError::AlreadyAssigned(assignee));
        }

        self.assigned_to = Some(assignee.clone());
        self.version += 1;
        self.bump(Side::Admin);
        self.touch(now);

        self.raise_event(DomainEvent::Ticket(TicketEvent::Assigned {
            ticket_id: self.id.clone(),
            assignee: assignee.clone(),
            assigned_by: assigned_by.clone(),
        }));

        Ok(self.audit_row(
            self.status,
            self.status,
            assigned_by,
            now,
            Some(AuditNote::Assigned { assignee }),
        ))
    }

    /// Append a comment and bump the side that did not write it
    pub fn add_comment(
        &mut self,
        message: &str,
        sender: &UserId,
        now: DateTime<Utc>,
    ) -> Result<TicketComment, TicketError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(TicketError::EmptyComment);
        }

        let comment = TicketComment {
            id: CommentId::new(),
            ticket_id: self.id.clone(),
            message: message.to_string(),
            sender: sender.clone(),
            sent_at: now,
        };

        self.bump(self.author_side(sender).opposite());
        self.touch(now);

        self.raise_event(DomainEvent::Ticket(TicketEvent::CommentAdded {
            ticket_id: self.id.clone(),
            comment_id: comment.id.clone(),
            sender: sender.clone(),
            sent_at: now,
        }));

        Ok(comment)
    }

    /// Zero one side's counter. The other side is never touched.
    pub fn mark_read(&mut self, side: Side) {
        match side {
            Side::Employee => self.unread_count_for_employee = 0,
            Side::Admin => self.unread_count_for_admin = 0,
        }
        self.raise_event(DomainEvent::Ticket(TicketEvent::Read {
            ticket_id: self.id.clone(),
            side,
        }));
    }

    /// Called by stores when a commit of this ticket succeeds
    pub fn advance_revision(&mut self) {
        self.revision += 1;
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Private
    // =========================================================================

    fn audit_row(
        &self,
        old_status: TicketStatus,
        new_status: TicketStatus,
        changed_by: &UserId,
        now: DateTime<Utc>,
        note: Option<AuditNote>,
    ) -> TicketHistory {
        TicketHistory {
            id: HistoryId::new(),
            ticket_id: self.id.clone(),
            old_status,
            new_status,
            changed_by: changed_by.clone(),
            changed_at: now,
            note,
        }
    }

    fn bump(&mut self, side: Side) {
        match side {
            Side::Employee => {
                self.unread_count_for_employee = self.unread_count_for_employee.saturating_add(1)
            }
            Side::Admin => {
                self.unread_count_for_admin = self.unread_count_for_admin.saturating_add(1)
            }
        }
    }

    fn raise_event(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition { from: TicketStatus, to: TicketStatus },

    #[error("ticket is {0} and accepts no further changes")]
    Terminal(TicketStatus),

    #[error("ticket changed since version {expected} (now {actual})")]
    VersionMismatch { expected: u64, actual: u64 },

    #[error("comment message is empty")]
    EmptyComment,

    #[error("ticket is already assigned to {0}")]
    AlreadyAssigned(UserId),
}
