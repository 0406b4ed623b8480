//! Inbound ports (Use case traits)
//!
//! Hexagonal architecture: application service interfaces. Every call
//! carries the [`Actor`] issued by the session layer.

use std::collections::BTreeMap;

use async_trait::async_trait;
use hrdesk_common::{Actor, DirectoryError, UserId};

use crate::application::dto::*;
use crate::domain::aggregates::{
    NewNotification, Notification, Ticket, TicketComment, TicketError, TicketHistory,
};
use crate::domain::value_objects::{Category, NotificationId, TicketId};
use crate::ports::outbound::RepositoryError;

/// Ticket lifecycle use cases
#[async_trait]
pub trait TicketUseCases: Send + Sync {
    /// Open a ticket. Defaults to the actor's own organization.
    async fn create_ticket(&self, actor: &Actor, command: CreateTicketCommand) -> Result<Ticket, UseCaseError>;

    async fn get_ticket(&self, actor: &Actor, id: &TicketId) -> Result<Ticket, UseCaseError>;

    /// Tickets the actor submitted
    async fn list_mine(&self, actor: &Actor) -> Result<Vec<Ticket>, UseCaseError>;

    /// Admin queue, filtered to the organizations the actor manages
    async fn list_all(&self, actor: &Actor) -> Result<Vec<Ticket>, UseCaseError>;

    async fn transition(&self, actor: &Actor, command: TransitionCommand) -> Result<Ticket, UseCaseError>;

    async fn escalate(&self, actor: &Actor, id: &TicketId) -> Result<Ticket, UseCaseError>;

    async fn assign(&self, actor: &Actor, id: &TicketId, assignee: UserId) -> Result<Ticket, UseCaseError>;

    async fn add_comment(&self, actor: &Actor, id: &TicketId, message: String) -> Result<TicketComment, UseCaseError>;

    async fn list_comments(&self, actor: &Actor, id: &TicketId) -> Result<Vec<TicketComment>, UseCaseError>;

    async fn get_history(&self, actor: &Actor, id: &TicketId) -> Result<Vec<TicketHistory>, UseCaseError>;

    /// Clear the actor's side of the ticket
    async fn mark_read(&self, actor: &Actor, id: &TicketId) -> Result<(), UseCaseError>;
}

/// Notification center use cases
#[async_trait]
pub trait NotificationUseCases: Send + Sync {
    async fn list_notifications(&self, actor: &Actor, request: PageRequest) -> Result<Page<Notification>, UseCaseError>;

    /// Every row of the actor, newest first, read in one pass
    async fn notification_snapshot(&self, actor: &Actor) -> Result<Vec<Notification>, UseCaseError>;

    /// Unread rows per category. Categories with nothing unread are omitted.
    async fn count_by_category(&self, actor: &Actor) -> Result<BTreeMap<Category, u64>, UseCaseError>;

    /// Distinct entity ids with unread rows in a category, newest first
    async fn unread_entity_ids(&self, actor: &Actor, category: Category) -> Result<Vec<String>, UseCaseError>;

    async fn mark_notification_read(&self, actor: &Actor, id: &NotificationId) -> Result<(), UseCaseError>;

    async fn mark_all_read(&self, actor: &Actor) -> Result<usize, UseCaseError>;

    async fn delete_notification(&self, actor: &Actor, id: &NotificationId) -> Result<(), UseCaseError>;

    async fn delete_all_read(&self, actor: &Actor) -> Result<usize, UseCaseError>;

    /// Append a row on behalf of another subsystem (leave, asset, ...)
    async fn publish(&self, notification: NewNotification) -> Result<Notification, UseCaseError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UseCaseError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Domain error: {0}")]
    Domain(TicketError),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<TicketError> for UseCaseError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::VersionMismatch { .. } => Self::Conflict(err.to_string()),
            other => Self::Domain(other),
        }
    }
}

impl From<RepositoryError> for UseCaseError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => Self::NotFound(what),
            RepositoryError::Conflict { .. } => Self::Conflict(err.to_string()),
            other => Self::Repository(other),
        }
    }
}

impl From<DirectoryError> for UseCaseError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::OrganizationNotFound(org) => Self::NotFound(format!("organization {}", org)),
            DirectoryError::Unavailable(reason) => {
                Self::Repository(RepositoryError::StorageError(format!("directory: {}", reason)))
            }
        }
    }
}
