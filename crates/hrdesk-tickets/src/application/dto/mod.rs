//! Data Transfer Objects (DTOs)
//!
//! Objects for transferring data across boundaries.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Priority, TicketId, TicketStatus, TicketType};

pub const MAX_SUBJECT_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 5_000;

// =============================================================================
// Ticket Commands
// =============================================================================

/// Ticket creation form
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketCommand {
    pub subject: String,
    pub description: String,
    #[serde(rename = "type")]
    pub ticket_type: Option<TicketType>,
    pub priority: Option<Priority>,
    pub target_org_id: Option<String>,
    pub assigned_to_user_id: Option<String>,
    /// Submit for another employee (admins only)
    pub on_behalf_of: Option<String>,
}

impl CreateTicketCommand {
    pub fn new(subject: impl Into<String>, description: impl Into<String>, ticket_type: TicketType) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
            ticket_type: Some(ticket_type),
            ..Default::default()
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn target(mut self, org_id: impl Into<String>) -> Self {
        self.target_org_id = Some(org_id.into());
        self
    }

    pub fn assign_to(mut self, user_id: impl Into<String>) -> Self {
        self.assigned_to_user_id = Some(user_id.into());
        self
    }

    pub fn on_behalf_of(mut self, user_id: impl Into<String>) -> Self {
        self.on_behalf_of = Some(user_id.into());
        self
    }

    /// Checks that need no network call. Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        let subject = self.subject.trim();
        if subject.is_empty() {
            problems.push("subject is required".to_string());
        } else if subject.chars().count() > MAX_SUBJECT_CHARS {
            problems.push(format!("subject exceeds {} characters", MAX_SUBJECT_CHARS));
        }

        let description = self.description.trim();
        if description.is_empty() {
            problems.push("description is required".to_string());
        } else if description.chars().count() > MAX_DESCRIPTION_CHARS {
            problems.push(format!("description exceeds {} characters", MAX_DESCRIPTION_CHARS));
        }

        if self.ticket_type.is_none() {
            problems.push("type is required".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCommand {
    pub ticket_id: TicketId,
    pub new_status: TicketStatus,
    /// Ticket version the caller last observed
    pub expected_version: u64,
}

// =============================================================================
// Paging
// =============================================================================

pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// 0-based page request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    #[serde(default)]
    pub unread_only: bool,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            unread_only: false,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            unread_only: false,
        }
    }

    pub fn unread_only(mut self) -> Self {
        self.unread_only = true;
        self
    }

    /// Effective page size, clamped into `1..=100`
    pub fn effective_size(&self) -> u32 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Cut one page out of an already ordered list
    pub fn slice(all: Vec<T>, request: &PageRequest) -> Self {
        let size = request.effective_size();
        let total_items = all.len() as u64;
        let total_pages = total_items.div_ceil(size as u64) as u32;
        let skip = (request.page as usize).saturating_mul(size as usize);
        let items = all.into_iter().skip(skip).take(size as usize).collect();
        Self {
            items,
            page: request.page,
            size,
            total_items,
            total_pages,
        }
    }

    pub fn is_last(&self) -> bool {
        self.page.saturating_add(1) >= self.total_pages
    }
}
