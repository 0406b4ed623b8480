//! View filter, sort and rebuild
//!
//! A view never patches its list. Each snapshot is filtered and sorted
//! from scratch by [`rebuild`].

use std::cmp::Ordering;
use std::collections::BTreeSet;

use hrdesk_tickets::{Category, Notification, Priority, Side, Ticket, TicketStatus, TicketType};
use serde::{Deserialize, Serialize};

/// Filter and ordering applied to a snapshot
pub trait ViewSpec: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    fn matches(&self, item: &Self::Item) -> bool;

    fn compare(&self, a: &Self::Item, b: &Self::Item) -> Ordering;
}

/// The displayed list for `snapshot` under `spec`
pub fn rebuild<S: ViewSpec>(snapshot: &[S::Item], spec: &S) -> Vec<S::Item> {
    let mut items: Vec<S::Item> = snapshot.iter().filter(|i| spec.matches(i)).cloned().collect();
    items.sort_by(|a, b| spec.compare(a, b));
    items
}

// =============================================================================
// Tickets
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilter {
    /// Empty means any status
    pub statuses: BTreeSet<TicketStatus>,
    pub ticket_type: Option<TicketType>,
    pub priority: Option<Priority>,
    pub escalated_only: bool,
    /// Case-insensitive match on subject or ticket number
    pub search: Option<String>,
}

impl TicketFilter {
    /// Tickets still in the workflow
    pub fn active() -> Self {
        Self {
            statuses: TicketStatus::ALL.iter().copied().filter(|s| !s.is_terminal()).collect(),
            ..Default::default()
        }
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&ticket.status()) {
            return false;
        }
        if self.ticket_type.is_some_and(|t| t != ticket.ticket_type()) {
            return false;
        }
        if self.priority.is_some_and(|p| p != ticket.priority()) {
            return false;
        }
        if self.escalated_only && !ticket.is_escalated() {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                ticket.subject().to_lowercase().contains(&needle)
                    || ticket.ticket_number().as_str().to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketSort {
    /// Tickets with unread activity for this side first, then newest created
    UnreadFirstNewest(Side),
    /// Newest created first
    Newest,
}

impl TicketSort {
    pub fn compare(&self, a: &Ticket, b: &Ticket) -> Ordering {
        let newest = b
            .created_at()
            .cmp(&a.created_at())
            .then_with(|| b.ticket_number().cmp(a.ticket_number()));
        match self {
            Self::UnreadFirstNewest(side) => {
                let unread_a = a.unread_for(*side) > 0;
                let unread_b = b.unread_for(*side) > 0;
                unread_b.cmp(&unread_a).then(newest)
            }
            Self::Newest => newest,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketView {
    pub filter: TicketFilter,
    pub sort: TicketSort,
}

impl TicketView {
    /// An employee's own tickets
    pub fn my_tickets() -> Self {
        Self {
            filter: TicketFilter::default(),
            sort: TicketSort::UnreadFirstNewest(Side::Employee),
        }
    }

    /// Admin queue of open work
    pub fn admin_queue() -> Self {
        Self {
            filter: TicketFilter::active(),
            sort: TicketSort::UnreadFirstNewest(Side::Admin),
        }
    }

    pub fn with_filter(mut self, filter: TicketFilter) -> Self {
        self.filter = filter;
        self
    }
}

impl ViewSpec for TicketView {
    type Item = Ticket;

    fn matches(&self, item: &Ticket) -> bool {
        self.filter.matches(item)
    }

    fn compare(&self, a: &Ticket, b: &Ticket) -> Ordering {
        self.sort.compare(a, b)
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// Bell and inbox view, always newest first
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationView {
    pub category: Option<Category>,
    pub unread_only: bool,
}

impl NotificationView {
    pub fn bell() -> Self {
        Self {
            category: None,
            unread_only: true,
        }
    }
}

impl ViewSpec for NotificationView {
    type Item = Notification;

    fn matches(&self, item: &Notification) -> bool {
        self.category.map_or(true, |c| c == item.category()) && !(self.unread_only && item.is_read())
    }

    fn compare(&self, a: &Notification, b: &Notification) -> Ordering {
        b.created_at().cmp(&a.created_at())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hrdesk_common::{OrgId, UserId};
    use hrdesk_tickets::{TicketDraft, TicketNumber};
    use proptest::prelude::*;

    fn ticket(seq: u64, subject: &str, minutes: i64) -> Ticket {
        let employee = UserId::new("e1").unwrap();
        let draft = TicketDraft {
            subject: subject.into(),
            description: "d".into(),
            ticket_type: TicketType::Asset,
            priority: Priority::Medium,
            employee: employee.clone(),
            created_by: employee,
            target_organization: OrgId::new("o1").unwrap(),
            assigned_to: None,
        };
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes);
        Ticket::open(draft, TicketNumber::from_sequence(seq), at)
    }

    fn numbers(items: &[Ticket]) -> Vec<String> {
        items.iter().map(|t| t.ticket_number().to_string()).collect()
    }

    #[test]
    fn test_unread_partition_then_newest() {
        let old_unread = ticket(1, "old", 0);
        let mut new_read = ticket(2, "new", 10);
        new_read.mark_read(Side::Admin);
        let mut mid_read = ticket(3, "mid", 5);
        mid_read.mark_read(Side::Admin);

        let view = TicketView {
            filter: TicketFilter::default(),
            sort: TicketSort::UnreadFirstNewest(Side::Admin),
        };
        let items = rebuild(&[new_read, old_unread, mid_read], &view);
        assert_eq!(numbers(&items), vec!["TKT-000001", "TKT-000002", "TKT-000003"]);
    }

    #[test]
    fn test_employee_side_sort_ignores_admin_counter() {
        // Fresh tickets carry an admin-side unread only
        let a = ticket(1, "a", 0);
        let b = ticket(2, "b", 1);
        let items = rebuild(&[a, b], &TicketView::my_tickets());
        assert_eq!(numbers(&items), vec!["TKT-000002", "TKT-000001"]);
    }

    #[test]
    fn test_search_subject_and_number() {
        let filter = TicketFilter {
            search: Some("LAPTOP".into()),
            ..Default::default()
        };
        assert!(filter.matches(&ticket(1, "Laptop broken", 0)));
        assert!(!filter.matches(&ticket(2, "Payslip", 0)));

        let by_number = TicketFilter {
            search: Some("tkt-000002".into()),
            ..Default::default()
        };
        assert!(by_number.matches(&ticket(2, "Payslip", 0)));
    }

    #[test]
    fn test_active_filter_excludes_terminal() {
        let filter = TicketFilter::active();
        assert!(filter.matches(&ticket(1, "x", 0)));
        assert!(!filter.statuses.contains(&TicketStatus::Closed));
        assert!(!filter.statuses.contains(&TicketStatus::Rejected));
    }

    proptest! {
        #[test]
        fn prop_rebuild_is_exactly_the_matching_snapshot(
            stale in prop::collection::vec((1u64..500, any::<bool>()), 0..30),
            fresh in prop::collection::vec((1u64..500, any::<bool>()), 0..30),
            narrowed in any::<bool>(),
        ) {
            let build = |rows: &[(u64, bool)]| -> Vec<Ticket> {
                rows.iter()
                    .map(|(seq, urgent)| {
                        let subject = if *urgent { "urgent" } else { "routine" };
                        ticket(*seq, subject, *seq as i64)
                    })
                    .collect()
            };
            let view = TicketView::my_tickets().with_filter(TicketFilter {
                search: narrowed.then(|| "urgent".to_string()),
                ..Default::default()
            });

            // The previous list has no influence on the next one
            let _previous = rebuild(&build(&stale), &view);
            let snapshot = build(&fresh);
            let shown = rebuild(&snapshot, &view);

            let mut expected: Vec<String> = snapshot
                .iter()
                .filter(|t| view.filter.matches(t))
                .map(|t| t.ticket_number().to_string())
                .collect();
            let mut got = numbers(&shown);
            expected.sort();
            got.sort();
            prop_assert_eq!(got, expected);
        }
    }
}
