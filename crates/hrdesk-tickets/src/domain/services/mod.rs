//! Domain services module
//!
//! Who hears about a ticket change, and what the ledger row says.

use hrdesk_common::UserId;

use crate::domain::aggregates::{NewNotification, Ticket, TicketComment, TicketHistory};
use crate::domain::value_objects::{Category, Priority, RefEntity};

/// Resolves ledger recipients for ticket changes
///
/// The submitter is only ever addressed on the employee side, so their
/// ledger rows for a ticket always mirror `unreadCountForEmployee`.
pub struct RecipientResolver;

impl RecipientResolver {
    /// Admins of the target organization plus the assignee, minus the actor
    pub fn admin_side(ticket: &Ticket, admins: &[UserId], actor: &UserId) -> Vec<UserId> {
        Self::broadcast(ticket, admins)
            .into_iter()
            .filter(|u| u != actor)
            .collect()
    }

    /// The submitter, unless the submitter is the actor
    pub fn employee_side(ticket: &Ticket, actor: &UserId) -> Option<UserId> {
        (ticket.employee() != actor).then(|| ticket.employee().clone())
    }

    /// Escalation broadcast: every admin and the assignee, actor included
    pub fn escalation(ticket: &Ticket, admins: &[UserId]) -> Vec<UserId> {
        Self::broadcast(ticket, admins)
    }

    fn broadcast(ticket: &Ticket, admins: &[UserId]) -> Vec<UserId> {
        let mut recipients: Vec<UserId> = Vec::with_capacity(admins.len() + 1);
        for user in admins.iter().chain(ticket.assigned_to()) {
            if user != ticket.employee() && !recipients.contains(user) {
                recipients.push(user.clone());
            }
        }
        recipients
    }
}

/// Composes ledger rows for ticket changes
pub struct TicketNotifier;

impl TicketNotifier {
    pub fn created(ticket: &Ticket, recipients: &[UserId]) -> Vec<NewNotification> {
        Self::fan_out(
            ticket,
            recipients,
            Priority::Medium,
            format!("New ticket {}", ticket.ticket_number()),
            format!("{} ({})", ticket.subject(), ticket.ticket_type()),
        )
    }

    pub fn status_changed(ticket: &Ticket, row: &TicketHistory, recipient: UserId) -> NewNotification {
        NewNotification::new(
            recipient,
            Category::Ticket,
            format!("Ticket {} is now {}", ticket.ticket_number(), row.new_status),
            format!(
                "{}: {} -> {} by {}",
                ticket.subject(),
                row.old_status,
                row.new_status,
                row.changed_by
            ),
        )
        .about(RefEntity::ticket(ticket.id()))
    }

    pub fn escalated(ticket: &Ticket, recipients: &[UserId], by: &UserId) -> Vec<NewNotification> {
        Self::fan_out(
            ticket,
            recipients,
            Priority::High,
            format!("Ticket {} escalated", ticket.ticket_number()),
            format!("{} was escalated by {}", ticket.subject(), by),
        )
    }

    pub fn assigned(ticket: &Ticket, assignee: UserId) -> NewNotification {
        NewNotification::new(
            assignee,
            Category::Ticket,
            format!("Ticket {} assigned to you", ticket.ticket_number()),
            ticket.subject().to_string(),
        )
        .about(RefEntity::ticket(ticket.id()))
    }

    pub fn commented(
        ticket: &Ticket,
        comment: &TicketComment,
        recipients: &[UserId],
    ) -> Vec<NewNotification> {
        Self::fan_out(
            ticket,
            recipients,
            Priority::Low,
            format!("New comment on {}", ticket.ticket_number()),
            preview(&comment.message),
        )
    }

    fn fan_out(
        ticket: &Ticket,
        recipients: &[UserId],
        priority: Priority,
        title: String,
        body: String,
    ) -> Vec<NewNotification> {
        recipients
            .iter()
            .map(|r| {
                NewNotification::new(r.clone(), Category::Ticket, title.clone(), body.clone())
                    .with_priority(priority)
                    .about(RefEntity::ticket(ticket.id()))
            })
            .collect()
    }
}

const PREVIEW_CHARS: usize = 120;

fn preview(message: &str) -> String {
    if message.chars().count() <= PREVIEW_CHARS {
        return message.to_string();
    }
    let mut cut: String = message.chars().take(PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}
