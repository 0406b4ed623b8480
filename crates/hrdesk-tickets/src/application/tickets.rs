//! Ticket application service
//!
//! Orchestrates the ticket aggregate, the directory and the store. Each
//! operation loads the ticket, plans one [`TicketMutation`] from it and
//! commits that. When another writer committed first the plan is rebuilt
//! from fresh state; nothing from the failed attempt was written.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hrdesk_common::{Actor, CapabilityPolicy, Directory, OrgId, UserId};

use crate::application::dto::*;
use crate::domain::aggregates::{
    Notification, NewNotification, Ticket, TicketComment, TicketDraft, TicketHistory,
};
use crate::domain::services::{RecipientResolver, TicketNotifier};
use crate::domain::value_objects::{RefEntity, Side, TicketId};
use crate::domain::DomainEvent;
use crate::ports::inbound::{TicketUseCases, UseCaseError};
use crate::ports::outbound::{
    EventPublisher, ReadReceipt, RepositoryError, TicketMutation, TicketStore,
};

/// Commit attempts per operation before a revision conflict is surfaced
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Side of the ticket the actor looks at, or `None` when the ticket is
/// invisible to them.
pub fn viewer_side(ticket: &Ticket, actor: &Actor) -> Option<Side> {
    if actor.id() == ticket.employee() {
        Some(Side::Employee)
    } else if CapabilityPolicy::can_manage(actor, ticket.target_organization())
        || ticket.assigned_to() == Some(actor.id())
    {
        Some(Side::Admin)
    } else {
        None
    }
}

/// Result of planning an operation against a freshly loaded ticket
struct Planned<R> {
    mutation: Option<TicketMutation>,
    output: R,
}

impl<R> Planned<R> {
    fn commit(mutation: TicketMutation, output: R) -> Self {
        Self {
            mutation: Some(mutation),
            output,
        }
    }

    fn nothing(output: R) -> Self {
        Self {
            mutation: None,
            output,
        }
    }
}

/// Ticket application service
pub struct TicketService {
    tickets: Arc<dyn TicketStore>,
    directory: Arc<dyn Directory>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        directory: Arc<dyn Directory>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            tickets,
            directory,
            event_publisher,
        }
    }

    async fn load(&self, id: &TicketId) -> Result<Ticket, UseCaseError> {
        self.tickets
            .find_by_id(id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("ticket {}", id)))
    }

    async fn load_visible(&self, actor: &Actor, id: &TicketId) -> Result<Ticket, UseCaseError> {
        let ticket = self.load(id).await?;
        ensure_visible(actor, &ticket)?;
        Ok(ticket)
    }

    /// Load, plan, commit. Retries only on a storage revision conflict.
    async fn apply<R, F>(&self, id: &TicketId, mut plan: F) -> Result<(Ticket, R), UseCaseError>
    where
        R: Send,
        F: FnMut(Ticket) -> Result<Planned<R>, UseCaseError> + Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self.load(id).await?;
            let Planned { mutation, output } = plan(current.clone())?;
            let Some(mut mutation) = mutation else {
                return Ok((current, output));
            };

            let events = mutation.ticket.take_events();
            match self.tickets.commit(mutation).await {
                Ok(stored) => {
                    self.publish(events).await;
                    return Ok((stored, output));
                }
                Err(RepositoryError::Conflict { expected, actual }) if attempt < MAX_COMMIT_ATTEMPTS => {
                    tracing::warn!(
                        ticket_id = %id,
                        attempt,
                        expected,
                        actual,
                        "Concurrent ticket commit, replanning"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn publish(&self, events: Vec<DomainEvent>) {
        if events.is_empty() {
            return;
        }
        if let Err(e) = self.event_publisher.publish(events).await {
            tracing::warn!(error = %e, "Failed to publish ticket events");
        }
    }

    async fn admins_of(&self, org: &OrgId) -> Result<Vec<UserId>, UseCaseError> {
        Ok(self.directory.admins(org).await?)
    }
}

fn ensure_visible(actor: &Actor, ticket: &Ticket) -> Result<Side, UseCaseError> {
    viewer_side(ticket, actor).ok_or_else(|| UseCaseError::NotFound(format!("ticket {}", ticket.id())))
}

fn ensure_manager(actor: &Actor, ticket: &Ticket) -> Result<(), UseCaseError> {
    ensure_visible(actor, ticket)?;
    if CapabilityPolicy::can_manage(actor, ticket.target_organization()) {
        return Ok(());
    }
    tracing::warn!(
        actor = %actor.id(),
        role = %actor.effective_role(),
        ticket_id = %ticket.id(),
        "Actor cannot manage ticket"
    );
    Err(UseCaseError::Authorization(format!(
        "{} cannot manage tickets of {}",
        actor.id(),
        ticket.target_organization()
    )))
}

fn parse_user(field: &str, raw: &str) -> Result<UserId, UseCaseError> {
    UserId::new(raw).map_err(|e| UseCaseError::Validation(format!("{}: {}", field, e)))
}

fn materialize(rows: Vec<NewNotification>, now: chrono::DateTime<Utc>) -> Vec<Notification> {
    rows.into_iter().map(|n| Notification::create(n, now)).collect()
}

fn newest_first(mut tickets: Vec<Ticket>) -> Vec<Ticket> {
    tickets.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    tickets
}

#[async_trait]
impl TicketUseCases for TicketService {
    async fn create_ticket(&self, actor: &Actor, command: CreateTicketCommand) -> Result<Ticket, UseCaseError> {
        command
            .validate()
            .map_err(|problems| UseCaseError::Validation(problems.join("; ")))?;

        let target = match command.target_org_id.as_deref() {
            Some(raw) => OrgId::new(raw).map_err(|e| UseCaseError::Validation(e.to_string()))?,
            None => actor.org_id().clone(),
        };

        if !CapabilityPolicy::can_target(actor, &target) {
            tracing::warn!(actor = %actor.id(), target = %target, "Foreign organization targeted");
            return Err(UseCaseError::Authorization(format!(
                "{} cannot open tickets for {}",
                actor.id(),
                target
            )));
        }

        if self.directory.organization(&target).await?.is_none() {
            return Err(UseCaseError::NotFound(format!("organization {}", target)));
        }

        let employee = match command.on_behalf_of.as_deref() {
            Some(raw) => {
                let employee = parse_user("onBehalfOf", raw)?;
                if &employee != actor.id() {
                    let allowed = CapabilityPolicy::can_manage(actor, &target)
                        || CapabilityPolicy::can_preassign(actor);
                    if !allowed {
                        return Err(UseCaseError::Authorization(
                            "only admins may open tickets on behalf of an employee".into(),
                        ));
                    }
                    // Org admins file only for their own members
                    if !CapabilityPolicy::manages_all(actor)
                        && !self.directory.is_member(actor.org_id(), &employee).await?
                    {
                        tracing::warn!(actor = %actor.id(), employee = %employee, "On-behalf filing outside own organization");
                        return Err(UseCaseError::Authorization(format!(
                            "{} is not a member of {}",
                            employee,
                            actor.org_id()
                        )));
                    }
                }
                employee
            }
            None => actor.id().clone(),
        };

        let assigned_to = match command.assigned_to_user_id.as_deref() {
            Some(raw) => {
                if !CapabilityPolicy::can_preassign(actor) {
                    return Err(UseCaseError::Authorization(
                        "only privileged actors may pre-assign tickets".into(),
                    ));
                }
                let assignee = parse_user("assignedToUserId", raw)?;
                if !self.directory.is_member(&target, &assignee).await? {
                    return Err(UseCaseError::Validation(format!(
                        "{} is not a member of {}",
                        assignee, target
                    )));
                }
                Some(assignee)
            }
            None => None,
        };

        let ticket_type = command
            .ticket_type
            .ok_or_else(|| UseCaseError::Validation("type is required".into()))?;
        let admins = self.admins_of(&target).await?;
        let number = self.tickets.next_ticket_number().await?;
        let now = Utc::now();

        let draft = TicketDraft {
            subject: command.subject.trim().to_string(),
            description: command.description.trim().to_string(),
            ticket_type,
            priority: command.priority.unwrap_or_default(),
            employee,
            created_by: actor.id().clone(),
            target_organization: target,
            assigned_to,
        };
        let mut ticket = Ticket::open(draft, number, now);

        let mut recipients = RecipientResolver::admin_side(&ticket, &admins, actor.id());
        recipients.extend(RecipientResolver::employee_side(&ticket, actor.id()));
        let notifications = materialize(TicketNotifier::created(&ticket, &recipients), now);

        let events = ticket.take_events();
        let stored = self
            .tickets
            .commit(TicketMutation::insert(ticket).with_notifications(notifications))
            .await?;
        self.publish(events).await;

        tracing::info!(
            ticket_id = %stored.id(),
            ticket_number = %stored.ticket_number(),
            employee = %stored.employee(),
            target = %stored.target_organization(),
            "Ticket created"
        );
        Ok(stored)
    }

    async fn get_ticket(&self, actor: &Actor, id: &TicketId) -> Result<Ticket, UseCaseError> {
        self.load_visible(actor, id).await
    }

    async fn list_mine(&self, actor: &Actor) -> Result<Vec<Ticket>, UseCaseError> {
        Ok(newest_first(self.tickets.find_by_employee(actor.id()).await?))
    }

    async fn list_all(&self, actor: &Actor) -> Result<Vec<Ticket>, UseCaseError> {
        if !CapabilityPolicy::can_list_all(actor) {
            return Err(UseCaseError::Authorization(format!(
                "{} cannot read the admin queue",
                actor.effective_role()
            )));
        }
        let tickets = if CapabilityPolicy::manages_all(actor) {
            self.tickets.find_all().await?
        } else {
            self.tickets.find_by_target_org(actor.org_id()).await?
        };
        Ok(newest_first(tickets))
    }

    async fn transition(&self, actor: &Actor, command: TransitionCommand) -> Result<Ticket, UseCaseError> {
        let (ticket, row) = self
            .apply(&command.ticket_id, |mut ticket| {
                ensure_manager(actor, &ticket)?;
                let now = Utc::now();
                let row = ticket.transition(command.new_status, actor.id(), command.expected_version, now)?;
                let notifications: Vec<NewNotification> =
                    RecipientResolver::employee_side(&ticket, actor.id())
                        .map(|submitter| TicketNotifier::status_changed(&ticket, &row, submitter))
                        .into_iter()
                        .collect();
                let mutation = TicketMutation::update(ticket)
                    .with_history(row.clone())
                    .with_notifications(materialize(notifications, now));
                Ok(Planned::commit(mutation, row))
            })
            .await?;

        tracing::info!(
            ticket_id = %ticket.id(),
            from = %row.old_status,
            to = %row.new_status,
            changed_by = %row.changed_by,
            version = ticket.version(),
            "Ticket transitioned"
        );
        Ok(ticket)
    }

    async fn escalate(&self, actor: &Actor, id: &TicketId) -> Result<Ticket, UseCaseError> {
        let ticket = self.load_visible(actor, id).await?;
        let admins = self.admins_of(ticket.target_organization()).await?;

        let (ticket, escalated) = self
            .apply(id, |mut ticket| {
                ensure_visible(actor, &ticket)?;
                if actor.id() != ticket.employee() {
                    ensure_manager(actor, &ticket)?;
                }
                let now = Utc::now();
                let Some(row) = ticket.escalate(actor.id(), now)? else {
                    return Ok(Planned::nothing(false));
                };
                let recipients = RecipientResolver::escalation(&ticket, &admins);
                let notifications = TicketNotifier::escalated(&ticket, &recipients, actor.id());
                let mutation = TicketMutation::update(ticket)
                    .with_history(row)
                    .with_notifications(materialize(notifications, now));
                Ok(Planned::commit(mutation, true))
            })
            .await?;

        if escalated {
            tracing::info!(ticket_id = %ticket.id(), escalated_by = %actor.id(), "Ticket escalated");
        } else {
            tracing::debug!(ticket_id = %ticket.id(), "Ticket already escalated");
        }
        Ok(ticket)
    }

    async fn assign(&self, actor: &Actor, id: &TicketId, assignee: UserId) -> Result<Ticket, UseCaseError> {
        let ticket = self.load_visible(actor, id).await?;
        ensure_manager(actor, &ticket)?;
        if !self.directory.is_member(ticket.target_organization(), &assignee).await? {
            return Err(UseCaseError::Validation(format!(
                "{} is not a member of {}",
                assignee,
                ticket.target_organization()
            )));
        }

        let (ticket, _) = self
            .apply(id, |mut ticket| {
                ensure_manager(actor, &ticket)?;
                let now = Utc::now();
                let row = ticket.assign(assignee.clone(), actor.id(), now)?;
                let notifications = if &assignee != actor.id() && &assignee != ticket.employee() {
                    vec![TicketNotifier::assigned(&ticket, assignee.clone())]
                } else {
                    vec![]
                };
                let mutation = TicketMutation::update(ticket)
                    .with_history(row)
                    .with_notifications(materialize(notifications, now));
                Ok(Planned::commit(mutation, ()))
            })
            .await?;

        tracing::info!(ticket_id = %ticket.id(), assignee = %assignee, "Ticket assigned");
        Ok(ticket)
    }

    async fn add_comment(&self, actor: &Actor, id: &TicketId, message: String) -> Result<TicketComment, UseCaseError> {
        let ticket = self.load_visible(actor, id).await?;
        let admins = self.admins_of(ticket.target_organization()).await?;

        let (_, comment) = self
            .apply(id, |mut ticket| {
                ensure_visible(actor, &ticket)?;
                let now = Utc::now();
                let comment = ticket.add_comment(&message, actor.id(), now)?;
                let recipients = match ticket.author_side(actor.id()) {
                    Side::Employee => RecipientResolver::admin_side(&ticket, &admins, actor.id()),
                    Side::Admin => RecipientResolver::employee_side(&ticket, actor.id())
                        .into_iter()
                        .collect(),
                };
                let notifications = TicketNotifier::commented(&ticket, &comment, &recipients);
                let mutation = TicketMutation::update(ticket)
                    .with_comment(comment.clone())
                    .with_notifications(materialize(notifications, now));
                Ok(Planned::commit(mutation, comment))
            })
            .await?;

        tracing::info!(ticket_id = %id, comment_id = %comment.id, sender = %actor.id(), "Comment added");
        Ok(comment)
    }

    async fn list_comments(&self, actor: &Actor, id: &TicketId) -> Result<Vec<TicketComment>, UseCaseError> {
        self.load_visible(actor, id).await?;
        Ok(self.tickets.comments(id).await?)
    }

    async fn get_history(&self, actor: &Actor, id: &TicketId) -> Result<Vec<TicketHistory>, UseCaseError> {
        self.load_visible(actor, id).await?;
        Ok(self.tickets.history(id).await?)
    }

    async fn mark_read(&self, actor: &Actor, id: &TicketId) -> Result<(), UseCaseError> {
        let (_, side) = self
            .apply(id, |mut ticket| {
                let side = ensure_visible(actor, &ticket)?;
                ticket.mark_read(side);
                let receipt = ReadReceipt {
                    reader: actor.id().clone(),
                    entity: RefEntity::ticket(ticket.id()),
                    read_at: Utc::now(),
                };
                Ok(Planned::commit(TicketMutation::update(ticket).with_read_receipt(receipt), side))
            })
            .await?;

        tracing::debug!(ticket_id = %id, reader = %actor.id(), side = ?side, "Ticket marked read");
        Ok(())
    }
}

/// Tickets an actor can see in any queue, deduplicated
pub(crate) async fn visible_tickets(
    tickets: &dyn TicketStore,
    actor: &Actor,
) -> Result<Vec<Ticket>, UseCaseError> {
    let mut all = tickets.find_by_employee(actor.id()).await?;
    if CapabilityPolicy::can_list_all(actor) {
        let queue = if CapabilityPolicy::manages_all(actor) {
            tickets.find_all().await?
        } else {
            tickets.find_by_target_org(actor.org_id()).await?
        };
        all.extend(queue);
    }
    let mut seen = HashSet::new();
    all.retain(|t| seen.insert(t.id().clone()));
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::Portal;
    use crate::domain::aggregates::AuditNote;
    use crate::domain::value_objects::{Category, Priority, TicketStatus, TicketType};
    use crate::ports::inbound::NotificationUseCases;
    use crate::ports::outbound::NotificationLedgerStore;
    use crate::TicketError;

    fn laptop() -> CreateTicketCommand {
        CreateTicketCommand::new("Laptop broken", "Screen flickers", TicketType::Asset)
            .priority(Priority::Medium)
            .target("o1")
    }

    async fn transition(portal: &Portal, actor: &Actor, ticket: &Ticket, to: TicketStatus) -> Result<Ticket, UseCaseError> {
        portal
            .tickets
            .transition(
                actor,
                TransitionCommand {
                    ticket_id: ticket.id().clone(),
                    new_status: to,
                    expected_version: ticket.version(),
                },
            )
            .await
    }

    #[tokio::test]
    async fn test_laptop_scenario() {
        let portal = Portal::new();
        let (e, a) = (portal.employee("e1"), portal.admin("a1"));

        let t1 = portal.tickets.create_ticket(&e, laptop()).await.unwrap();
        assert_eq!(t1.status(), TicketStatus::Open);
        assert_eq!(t1.ticket_type(), TicketType::Asset);

        let queue = portal.tickets.list_all(&a).await.unwrap();
        assert!(queue.iter().any(|t| t.id() == t1.id()));

        let t1 = transition(&portal, &a, &t1, TicketStatus::InProgress).await.unwrap();
        let history = portal.tickets.get_history(&e, t1.id()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_status, TicketStatus::Open);
        assert_eq!(history[0].new_status, TicketStatus::InProgress);
        assert_eq!(history[0].changed_by, *a.id());

        let mine = portal.tickets.list_mine(&e).await.unwrap();
        assert_eq!(mine[0].unread_count_for_employee(), 1);
        let admin_before = mine[0].unread_count_for_admin();

        portal.tickets.mark_read(&e, t1.id()).await.unwrap();
        let t1 = portal.tickets.get_ticket(&e, t1.id()).await.unwrap();
        assert_eq!(t1.unread_count_for_employee(), 0);
        assert_eq!(t1.unread_count_for_admin(), admin_before);

        let t1 = portal.tickets.escalate(&a, t1.id()).await.unwrap();
        assert_eq!(t1.priority(), Priority::Critical);
        assert!(t1.is_escalated());

        for admin in ["a1", "a2"] {
            let viewer = portal.admin(admin);
            let page = portal
                .notifications
                .list_notifications(&viewer, PageRequest::default().unread_only())
                .await
                .unwrap();
            assert!(page.items.iter().any(|n| n.category() == Category::Ticket
                && n.priority() == Priority::High
                && n.refers_to(&RefEntity::ticket(t1.id()))));
        }
    }

    #[tokio::test]
    async fn test_foreign_target_rejected_for_employee() {
        let portal = Portal::new();
        let err = portal
            .tickets
            .create_ticket(&portal.employee("e1"), laptop().target("o2"))
            .await
            .unwrap_err();
        assert!(matches!(err, UseCaseError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_hr_admin_targets_any_org_and_preassigns() {
        let portal = Portal::new();
        let hr = portal.hr_admin("hr1");
        let ticket = portal
            .tickets
            .create_ticket(&hr, laptop().target("o2").assign_to("b1"))
            .await
            .unwrap();
        assert_eq!(ticket.assigned_to(), Some(&UserId::new("b1").unwrap()));

        let err = portal
            .tickets
            .create_ticket(&hr, laptop().target("o2").assign_to("a1"))
            .await
            .unwrap_err();
        assert!(matches!(err, UseCaseError::Validation(_)));
    }

    #[tokio::test]
    async fn test_employee_cannot_preassign() {
        let portal = Portal::new();
        let err = portal
            .tickets
            .create_ticket(&portal.employee("e1"), laptop().assign_to("a1"))
            .await
            .unwrap_err();
        assert!(matches!(err, UseCaseError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_missing_fields_are_validation_errors() {
        let portal = Portal::new();
        let err = portal
            .tickets
            .create_ticket(&portal.employee("e1"), CreateTicketCommand::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UseCaseError::Validation(_)));
        assert!(portal.store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submitter_cannot_transition() {
        let portal = Portal::new();
        let e = portal.employee("e1");
        let t = portal.tickets.create_ticket(&e, laptop()).await.unwrap();
        let err = transition(&portal, &e, &t, TicketStatus::InProgress).await.unwrap_err();
        assert!(matches!(err, UseCaseError::Authorization(_)));
        assert!(portal.tickets.get_history(&e, t.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outsider_sees_not_found() {
        let portal = Portal::new();
        let t = portal.tickets.create_ticket(&portal.employee("e1"), laptop()).await.unwrap();
        let err = portal.tickets.get_ticket(&portal.admin_of("b1", "o2"), t.id()).await.unwrap_err();
        assert!(matches!(err, UseCaseError::NotFound(_)));
        let err = portal.tickets.get_ticket(&portal.employee("e2"), t.id()).await.unwrap_err();
        assert!(matches!(err, UseCaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stale_version_is_conflict() {
        let portal = Portal::new();
        let (e, a1, a2) = (portal.employee("e1"), portal.admin("a1"), portal.admin("a2"));
        let t = portal.tickets.create_ticket(&e, laptop()).await.unwrap();

        transition(&portal, &a1, &t, TicketStatus::InProgress).await.unwrap();
        let err = transition(&portal, &a2, &t, TicketStatus::Rejected).await.unwrap_err();
        assert!(matches!(err, UseCaseError::Conflict(_)));

        let current = portal.tickets.get_ticket(&e, t.id()).await.unwrap();
        assert_eq!(current.status(), TicketStatus::InProgress);
        assert_eq!(portal.tickets.get_history(&e, t.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_illegal_edge_is_domain_error() {
        let portal = Portal::new();
        let t = portal.tickets.create_ticket(&portal.employee("e1"), laptop()).await.unwrap();
        let err = transition(&portal, &portal.admin("a1"), &t, TicketStatus::Closed).await.unwrap_err();
        assert!(matches!(
            err,
            UseCaseError::Domain(TicketError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_each_transition_appends_one_row() {
        let portal = Portal::new();
        let (e, a) = (portal.employee("e1"), portal.admin("a1"));
        let mut t = portal.tickets.create_ticket(&e, laptop()).await.unwrap();
        let path = [
            TicketStatus::InProgress,
            TicketStatus::PendingVendor,
            TicketStatus::Resolved,
            TicketStatus::Closed,
        ];
        for (i, to) in path.iter().enumerate() {
            let before = portal.tickets.get_history(&e, t.id()).await.unwrap();
            t = transition(&portal, &a, &t, *to).await.unwrap();
            let after = portal.tickets.get_history(&e, t.id()).await.unwrap();
            assert_eq!(after.len(), i + 1);
            assert_eq!(&after[..i], &before[..]);
            assert_eq!(after[i].new_status, *to);
        }
        assert_eq!(t.unread_count_for_employee(), 4);
    }

    #[tokio::test]
    async fn test_second_escalation_is_noop() {
        let portal = Portal::new();
        let e = portal.employee("e1");
        let t = portal.tickets.create_ticket(&e, laptop()).await.unwrap();

        let first = portal.tickets.escalate(&e, t.id()).await.unwrap();
        let rows_after_first = portal.store.for_entity(&RefEntity::ticket(t.id())).await.unwrap().len();
        let second = portal.tickets.escalate(&portal.admin("a1"), t.id()).await.unwrap();

        assert_eq!(first.version(), second.version());
        assert_eq!(second.priority(), Priority::Critical);
        let history = portal.tickets.get_history(&e, t.id()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].note, Some(AuditNote::Escalated));
        assert_eq!(
            portal.store.for_entity(&RefEntity::ticket(t.id())).await.unwrap().len(),
            rows_after_first
        );
    }

    #[tokio::test]
    async fn test_escalate_terminal_rejected() {
        let portal = Portal::new();
        let (e, a) = (portal.employee("e1"), portal.admin("a1"));
        let t = portal.tickets.create_ticket(&e, laptop()).await.unwrap();
        transition(&portal, &a, &t, TicketStatus::Rejected).await.unwrap();
        let err = portal.tickets.escalate(&e, t.id()).await.unwrap_err();
        assert!(matches!(err, UseCaseError::Domain(TicketError::Terminal(_))));
    }

    #[tokio::test]
    async fn test_comment_notifies_other_side() {
        let portal = Portal::new();
        let (e, a) = (portal.employee("e1"), portal.admin("a1"));
        let t = portal.tickets.create_ticket(&e, laptop()).await.unwrap();
        portal.tickets.mark_read(&a, t.id()).await.unwrap();

        portal.tickets.add_comment(&a, t.id(), "Bring it to IT".into()).await.unwrap();
        let t = portal.tickets.get_ticket(&e, t.id()).await.unwrap();
        assert_eq!(t.unread_count_for_employee(), 1);
        assert_eq!(t.unread_count_for_admin(), 0);

        portal.tickets.add_comment(&e, t.id(), "Thanks".into()).await.unwrap();
        let t = portal.tickets.get_ticket(&e, t.id()).await.unwrap();
        assert_eq!(t.unread_count_for_admin(), 1);

        let comments = portal.tickets.list_comments(&e, t.id()).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].message, "Bring it to IT");
    }

    #[tokio::test]
    async fn test_assign_requires_membership() {
        let portal = Portal::new();
        let (e, a) = (portal.employee("e1"), portal.admin("a1"));
        let t = portal.tickets.create_ticket(&e, laptop()).await.unwrap();

        let err = portal.tickets.assign(&a, t.id(), UserId::new("b1").unwrap()).await.unwrap_err();
        assert!(matches!(err, UseCaseError::Validation(_)));

        let t = portal.tickets.assign(&a, t.id(), UserId::new("a2").unwrap()).await.unwrap();
        assert_eq!(t.assigned_to(), Some(&UserId::new("a2").unwrap()));
        let history = portal.tickets.get_history(&a, t.id()).await.unwrap();
        assert!(matches!(history[0].note, Some(AuditNote::Assigned { .. })));
    }

    #[tokio::test]
    async fn test_create_on_behalf_notifies_employee() {
        let portal = Portal::new();
        let a = portal.admin("a1");
        let t = portal
            .tickets
            .create_ticket(&a, laptop().on_behalf_of("e1"))
            .await
            .unwrap();
        assert_eq!(t.employee(), &UserId::new("e1").unwrap());
        assert_eq!(t.unread_count_for_employee(), 1);
        let mine = portal.tickets.list_mine(&portal.employee("e1")).await.unwrap();
        assert_eq!(mine.len(), 1);

        let err = portal
            .tickets
            .create_ticket(&portal.employee("e2"), laptop().on_behalf_of("e1"))
            .await
            .unwrap_err();
        assert!(matches!(err, UseCaseError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_on_behalf_limited_to_own_members() {
        let portal = Portal::new();
        let err = portal
            .tickets
            .create_ticket(&portal.admin("a1"), laptop().on_behalf_of("b1"))
            .await
            .unwrap_err();
        assert!(matches!(err, UseCaseError::Authorization(_)));
        assert!(portal.tickets.list_mine(&portal.admin_of("b1", "o2")).await.unwrap().is_empty());
        assert!(portal.store.for_recipient(&UserId::new("b1").unwrap()).await.unwrap().is_empty());

        let t = portal
            .tickets
            .create_ticket(&portal.hr_admin("hr1"), laptop().target("o2").on_behalf_of("b1"))
            .await
            .unwrap();
        assert_eq!(t.employee(), &UserId::new("b1").unwrap());
    }

    #[tokio::test]
    async fn test_hr_admin_acts_on_foreign_org_ticket() {
        let portal = Portal::new();
        let hr = portal.hr_admin("hr1");
        let t = portal
            .tickets
            .create_ticket(&hr, laptop().target("o2"))
            .await
            .unwrap();

        let queue = portal.tickets.list_all(&hr).await.unwrap();
        assert!(queue.iter().any(|q| q.id() == t.id()));

        let other = portal.tickets.create_ticket(&portal.employee("e1"), laptop()).await.unwrap();
        let other = transition(&portal, &hr, &other, TicketStatus::InProgress).await.unwrap();
        assert_eq!(other.status(), TicketStatus::InProgress);

        let t = portal.tickets.assign(&hr, t.id(), UserId::new("b1").unwrap()).await.unwrap();
        assert_eq!(t.assigned_to(), Some(&UserId::new("b1").unwrap()));
        let t = portal.tickets.escalate(&hr, t.id()).await.unwrap();
        assert!(t.is_escalated());
        portal.tickets.mark_read(&hr, other.id()).await.unwrap();
    }

    #[tokio::test]
    async fn test_outsider_cannot_mark_read() {
        let portal = Portal::new();
        let t = portal.tickets.create_ticket(&portal.employee("e1"), laptop()).await.unwrap();
        let err = portal.tickets.mark_read(&portal.employee("e2"), t.id()).await.unwrap_err();
        assert!(matches!(err, UseCaseError::NotFound(_)));
        let t = portal.tickets.get_ticket(&portal.admin("a1"), t.id()).await.unwrap();
        assert_eq!(t.unread_count_for_admin(), 1);
    }

    #[tokio::test]
    async fn test_list_all_is_org_filtered() {
        let portal = Portal::new();
        portal.tickets.create_ticket(&portal.employee("e1"), laptop()).await.unwrap();
        portal
            .tickets
            .create_ticket(&portal.hr_admin("hr1"), laptop().target("o2"))
            .await
            .unwrap();

        assert_eq!(portal.tickets.list_all(&portal.admin("a1")).await.unwrap().len(), 1);
        assert_eq!(portal.tickets.list_all(&portal.admin_of("b1", "o2")).await.unwrap().len(), 1);
        assert_eq!(portal.tickets.list_all(&portal.super_admin("root")).await.unwrap().len(), 2);
        assert_eq!(portal.tickets.list_all(&portal.hr_admin("hr1")).await.unwrap().len(), 2);
        assert!(matches!(
            portal.tickets.list_all(&portal.employee("e1")).await,
            Err(UseCaseError::Authorization(_))
        ));
    }

    #[tokio::test]
    async fn test_view_as_employee_loses_admin_queue() {
        let portal = Portal::new();
        let a = portal.admin("a1").viewing_as(Some(hrdesk_common::Role::Employee));
        assert!(matches!(portal.tickets.list_all(&a).await, Err(UseCaseError::Authorization(_))));
    }
}
