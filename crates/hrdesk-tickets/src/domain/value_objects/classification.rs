//! Ticket and notification classifications

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a unit enum with its wire name, `ALL`, `Display` and `FromStr`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == normalized)
                    .ok_or_else(|| format!("unknown {}: {}", stringify!($name), s))
            }
        }
    };
}

wire_enum! {
    /// What the ticket is about
    pub enum TicketType {
        Onboarding => "ONBOARDING",
        Payroll => "PAYROLL",
        Timesheet => "TIMESHEET",
        Contract => "CONTRACT",
        Visa => "VISA",
        C2hConversion => "C2H_CONVERSION",
        ClientIssue => "CLIENT_ISSUE",
        VendorIssue => "VENDOR_ISSUE",
        Asset => "ASSET",
        Leave => "LEAVE",
        Document => "DOCUMENT",
        Feedback => "FEEDBACK",
        Complaint => "COMPLAINT",
        Other => "OTHER",
    }
}

wire_enum! {
    /// Urgency, ordered `LOW < MEDIUM < HIGH < CRITICAL`
    pub enum Priority {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Critical => "CRITICAL",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

wire_enum! {
    /// Ledger category used by the bell and inbox aggregations
    pub enum Category {
        Ticket => "TICKET",
        Leave => "LEAVE",
        Asset => "ASSET",
        Payroll => "PAYROLL",
        Timesheet => "TIMESHEET",
        Document => "DOCUMENT",
        Announcement => "ANNOUNCEMENT",
        General => "GENERAL",
    }
}

wire_enum! {
    /// Kind of entity a ledger row points at
    pub enum EntityType {
        Ticket => "TICKET",
        LeaveRequest => "LEAVE_REQUEST",
        Asset => "ASSET",
        Payslip => "PAYSLIP",
        Timesheet => "TIMESHEET",
        Document => "DOCUMENT",
        Announcement => "ANNOUNCEMENT",
    }
}

/// Reference from a ledger row to the entity it is about
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefEntity {
    pub entity_type: EntityType,
    pub entity_id: String,
}

impl RefEntity {
    pub fn new(entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.into(),
        }
    }

    pub fn ticket(id: &super::TicketId) -> Self {
        Self::new(EntityType::Ticket, id.as_str())
    }
}
