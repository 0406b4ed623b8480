//! Unread Tracker
//!
//! Two projections of unseen work exist side by side: the per-ticket
//! counters and the ledger rows. This module reads both and reports how
//! they relate.
//!
//! For the submitter the projections are kept equal by every ticket
//! operation. Ledger-only operations can only make rows *more* read, so
//! `submitter_unread_rows <= unread_count_for_employee` always holds. The
//! admin counter is shared by all admins of the organization while rows are
//! per admin, so no equality is asserted on that side.

use std::collections::BTreeMap;
use std::sync::Arc;

use hrdesk_common::{Actor, UserId};
use serde::{Deserialize, Serialize};

use crate::application::tickets::{viewer_side, visible_tickets};
use crate::domain::aggregates::Ticket;
use crate::domain::value_objects::{Category, RefEntity, TicketId};
use crate::ports::inbound::UseCaseError;
use crate::ports::outbound::{NotificationLedgerStore, TicketStore};

/// Badge counts for one actor
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadSummary {
    /// Visible tickets whose counter for the actor's side is non-zero
    pub tickets_with_unread: usize,
    pub by_category: BTreeMap<Category, u64>,
    pub total_notifications: u64,
}

/// Both projections for one ticket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub ticket_id: TicketId,
    pub employee_counter: u32,
    pub submitter_unread_rows: u32,
    pub admin_counter: u32,
    pub admin_unread_rows: BTreeMap<UserId, u32>,
}

impl ReconcileReport {
    pub fn is_consistent(&self) -> bool {
        self.submitter_unread_rows <= self.employee_counter
    }

    /// Rows the counter does not account for
    pub fn drift(&self) -> u32 {
        self.submitter_unread_rows.saturating_sub(self.employee_counter)
    }
}

pub struct UnreadTracker {
    tickets: Arc<dyn TicketStore>,
    ledger: Arc<dyn NotificationLedgerStore>,
}

impl UnreadTracker {
    pub fn new(tickets: Arc<dyn TicketStore>, ledger: Arc<dyn NotificationLedgerStore>) -> Self {
        Self { tickets, ledger }
    }

    /// Counter shown on a ticket row for this viewer
    pub fn ticket_badge(ticket: &Ticket, actor: &Actor) -> u32 {
        viewer_side(ticket, actor)
            .map(|side| ticket.unread_for(side))
            .unwrap_or(0)
    }

    pub async fn summary(&self, actor: &Actor) -> Result<UnreadSummary, UseCaseError> {
        let tickets_with_unread = visible_tickets(self.tickets.as_ref(), actor)
            .await?
            .iter()
            .filter(|t| Self::ticket_badge(t, actor) > 0)
            .count();

        let mut by_category = BTreeMap::new();
        for row in self.ledger.for_recipient(actor.id()).await? {
            if !row.is_read() {
                *by_category.entry(row.category()).or_insert(0u64) += 1;
            }
        }
        let total_notifications = by_category.values().sum();

        Ok(UnreadSummary {
            tickets_with_unread,
            by_category,
            total_notifications,
        })
    }

    pub async fn reconcile(&self, id: &TicketId) -> Result<ReconcileReport, UseCaseError> {
        let ticket = self
            .tickets
            .find_by_id(id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("ticket {}", id)))?;

        let mut submitter_unread_rows = 0;
        let mut admin_unread_rows = BTreeMap::new();
        for row in self.ledger.for_entity(&RefEntity::ticket(id)).await? {
            if row.is_read() {
                continue;
            }
            if row.recipient_id() == ticket.employee() {
                submitter_unread_rows += 1;
            } else {
                *admin_unread_rows.entry(row.recipient_id().clone()).or_insert(0) += 1;
            }
        }

        let report = ReconcileReport {
            ticket_id: id.clone(),
            employee_counter: ticket.unread_count_for_employee(),
            submitter_unread_rows,
            admin_counter: ticket.unread_count_for_admin(),
            admin_unread_rows,
        };
        if !report.is_consistent() {
            tracing::warn!(
                ticket_id = %id,
                counter = report.employee_counter,
                rows = report.submitter_unread_rows,
                "Unread projections drifted"
            );
        }
        Ok(report)
    }
}
