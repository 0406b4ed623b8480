//! Synchronization configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest polling period any view may use
pub const MIN_POLL_PERIOD: Duration = Duration::from_secs(5);
/// Longest polling period any view may use
pub const MAX_POLL_PERIOD: Duration = Duration::from_secs(15);

/// Kinds of polling views, by criticality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// An employee's own tickets
    TicketList,
    /// Admin queue of an organization
    AdminQueue,
    /// Notification bell and inbox
    NotificationBell,
}

impl ViewKind {
    /// Default polling period
    pub fn default_period(&self) -> Duration {
        match self {
            Self::TicketList => Duration::from_secs(10),
            Self::AdminQueue => Duration::from_secs(5),
            Self::NotificationBell => Duration::from_secs(15),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TicketList => "ticket_list",
            Self::AdminQueue => "admin_queue",
            Self::NotificationBell => "notification_bell",
        }
    }
}

/// Client synchronization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Ticket list polling period in seconds
    pub ticket_list_period_secs: u64,
    /// Admin queue polling period in seconds
    pub admin_queue_period_secs: u64,
    /// Notification bell polling period in seconds
    pub notification_period_secs: u64,
    /// Attempts for naturally idempotent mutations (escalate)
    pub mutation_retry_attempts: u32,
    /// Fixed backoff between those attempts
    pub mutation_retry_backoff_ms: u64,
    /// Per-request timeout for the REST adapter
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ticket_list_period_secs: ViewKind::TicketList.default_period().as_secs(),
            admin_queue_period_secs: ViewKind::AdminQueue.default_period().as_secs(),
            notification_period_secs: ViewKind::NotificationBell.default_period().as_secs(),
            mutation_retry_attempts: 3,
            mutation_retry_backoff_ms: 500,
            request_timeout_secs: 10,
        }
    }
}

impl SyncConfig {
    /// Polling period for a view, clamped into 5..=15 seconds
    pub fn period(&self, kind: ViewKind) -> Duration {
        let secs = match kind {
            ViewKind::TicketList => self.ticket_list_period_secs,
            ViewKind::AdminQueue => self.admin_queue_period_secs,
            ViewKind::NotificationBell => self.notification_period_secs,
        };
        Duration::from_secs(secs).clamp(MIN_POLL_PERIOD, MAX_POLL_PERIOD)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.mutation_retry_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
