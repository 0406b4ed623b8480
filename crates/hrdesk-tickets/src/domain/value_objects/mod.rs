//! Value Objects module
//!
//! Identifiers, classifications and the ticket status graph.

pub mod classification;
pub mod status;

pub use classification::{Category, EntityType, Priority, RefEntity, TicketType};
pub use status::TicketStatus;

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

uuid_id!(
    /// Ticket identifier
    TicketId
);
uuid_id!(
    /// Comment identifier
    CommentId
);
uuid_id!(
    /// History row identifier
    HistoryId
);
uuid_id!(
    /// Ledger row identifier
    NotificationId
);

/// Human-readable ticket number, e.g. `TKT-000042`
///
/// # Invariants
/// - Immutable once issued
/// - Unique across the system (enforced by the store)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketNumber(String);

impl TicketNumber {
    pub const PREFIX: &'static str = "TKT-";

    /// Format a store-issued sequence value
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("{}{:06}", Self::PREFIX, sequence))
    }

    /// Parse a number received from the wire
    pub fn parse(value: &str) -> Option<Self> {
        let digits = value.strip_prefix(Self::PREFIX)?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Viewpoint on a ticket. Unread counters are kept per side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    /// The submitting employee
    Employee,
    /// Admins of the target organization (and the assignee)
    Admin,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Employee => Self::Admin,
            Self::Admin => Self::Employee,
        }
    }
}
