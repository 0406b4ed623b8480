//! Ticket status graph
//!
//! ```text
//! OPEN ──► IN_PROGRESS ──► PENDING_APPROVAL ─┐
//!   │          │  ▲  ──► PENDING_VENDOR   ───┤
//!   │          │  │  ──► PENDING_CLIENT   ───┼──► RESOLVED ──► CLOSED
//!   │          │  └──────────────────────────┘       │
//!   │          └─────────────────────────────────────┘ (reopen)
//!   └──► REJECTED  (from every non-terminal state)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    PendingApproval,
    PendingVendor,
    PendingClient,
    Resolved,
    Closed,
    Rejected,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 8] = [
        Self::Open,
        Self::InProgress,
        Self::PendingApproval,
        Self::PendingVendor,
        Self::PendingClient,
        Self::Resolved,
        Self::Closed,
        Self::Rejected,
    ];

    /// `CLOSED` and `REJECTED` accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Rejected)
    }

    /// Legal successors of this status
    pub fn allowed_next(&self) -> &'static [TicketStatus] {
        use TicketStatus::*;
        match self {
            Open => &[InProgress, Rejected],
            InProgress => &[PendingApproval, PendingVendor, PendingClient, Resolved, Rejected],
            PendingApproval | PendingVendor | PendingClient => &[InProgress, Resolved, Rejected],
            Resolved => &[Closed, InProgress, Rejected],
            Closed | Rejected => &[],
        }
    }

    /// Transition table lookup for `(self, next)`
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::PendingVendor => "PENDING_VENDOR",
            Self::PendingClient => "PENDING_CLIENT",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("unknown ticket status: {}", s))
    }
}
