//! Portal API
//!
//! Transport-agnostic view of the portal for one authenticated actor.
//! [`crate::LocalPortalApi`] runs against in-process services,
//! [`crate::HttpPortalApi`] against the REST backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use hrdesk_common::UserId;
use hrdesk_tickets::{
    Category, CreateTicketCommand, Notification, NotificationId, Page, PageRequest, Ticket,
    TicketComment, TicketHistory, TicketId, TicketStatus, UseCaseError,
};
use thiserror::Error;

/// Client error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Rejected input. Never retried.
    #[error("validation error: {0}")]
    Validation(String),
    /// Actor lacks the role or organization capability
    #[error("not authorized: {0}")]
    Authorization(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Someone else changed the ticket first
    #[error("conflict: {0}")]
    Conflict(String),
    /// Illegal transition, terminal ticket and similar domain rejections
    #[error("rejected: {0}")]
    Domain(String),
    /// Connectivity, timeout or server-side failure
    #[error("network error: {0}")]
    TransientNetwork(String),
    /// The response could not be understood
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ApiError {
    /// Worth retrying for naturally idempotent operations
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }
}

impl From<UseCaseError> for ApiError {
    fn from(err: UseCaseError) -> Self {
        match err {
            UseCaseError::Validation(m) => Self::Validation(m),
            UseCaseError::Authorization(m) => Self::Authorization(m),
            UseCaseError::NotFound(m) => Self::NotFound(m),
            UseCaseError::Conflict(m) => Self::Conflict(m),
            UseCaseError::Domain(e) => Self::Domain(e.to_string()),
            UseCaseError::Repository(e) => Self::TransientNetwork(e.to_string()),
        }
    }
}

/// The portal as seen by one signed-in actor
#[async_trait]
pub trait PortalApi: Send + Sync {
    async fn create_ticket(&self, command: CreateTicketCommand) -> Result<Ticket, ApiError>;

    async fn get_ticket(&self, id: &TicketId) -> Result<Ticket, ApiError>;

    async fn list_mine(&self) -> Result<Vec<Ticket>, ApiError>;

    async fn list_all(&self) -> Result<Vec<Ticket>, ApiError>;

    /// Compare-and-swap against `expected_version`
    async fn transition(
        &self,
        id: &TicketId,
        new_status: TicketStatus,
        expected_version: u64,
    ) -> Result<Ticket, ApiError>;

    async fn escalate(&self, id: &TicketId) -> Result<Ticket, ApiError>;

    async fn assign(&self, id: &TicketId, assignee: &UserId) -> Result<Ticket, ApiError>;

    async fn add_comment(&self, id: &TicketId, message: &str) -> Result<TicketComment, ApiError>;

    async fn list_comments(&self, id: &TicketId) -> Result<Vec<TicketComment>, ApiError>;

    async fn get_history(&self, id: &TicketId) -> Result<Vec<TicketHistory>, ApiError>;

    async fn mark_read(&self, id: &TicketId) -> Result<(), ApiError>;

    async fn list_notifications(&self, request: PageRequest) -> Result<Page<Notification>, ApiError>;

    /// The actor's whole ledger in a single response
    async fn notification_snapshot(&self) -> Result<Vec<Notification>, ApiError>;

    async fn count_by_category(&self) -> Result<BTreeMap<Category, u64>, ApiError>;

    async fn unread_entity_ids(&self, category: Category) -> Result<Vec<String>, ApiError>;

    async fn mark_notification_read(&self, id: &NotificationId) -> Result<(), ApiError>;

    async fn mark_all_read(&self) -> Result<usize, ApiError>;

    async fn delete_notification(&self, id: &NotificationId) -> Result<(), ApiError>;

    async fn delete_all_read(&self) -> Result<usize, ApiError>;
}
