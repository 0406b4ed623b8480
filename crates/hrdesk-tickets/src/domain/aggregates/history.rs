//! Comment/History Log records
//!
//! Both record types are append-only. The store only ever inserts them and
//! hands out clones.

use chrono::{DateTime, Utc};
use hrdesk_common::UserId;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CommentId, HistoryId, TicketId, TicketStatus};

/// Marks a history row that records something other than a status change
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditNote {
    Escalated,
    Assigned { assignee: UserId },
}

/// One audit row. For plain transitions `note` is `None` and
/// `old_status != new_status`; audit notes keep the status unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketHistory {
    pub id: HistoryId,
    pub ticket_id: TicketId,
    pub old_status: TicketStatus,
    pub new_status: TicketStatus,
    pub changed_by: UserId,
    pub changed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<AuditNote>,
}

impl TicketHistory {
    pub fn is_status_change(&self) -> bool {
        self.note.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketComment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub message: String,
    pub sender: UserId,
    pub sent_at: DateTime<Utc>,
}
