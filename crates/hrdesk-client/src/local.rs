//! In-process adapter over [`PortalServices`]

use std::collections::BTreeMap;

use async_trait::async_trait;
use hrdesk_common::{Actor, UserId};
use hrdesk_tickets::{
    Category, CreateTicketCommand, Notification, NotificationId, NotificationUseCases, Page,
    PageRequest, PortalServices, Ticket, TicketComment, TicketHistory, TicketId, TicketStatus,
    TicketUseCases, TransitionCommand,
};

use crate::api::{ApiError, PortalApi};

/// Calls the services directly on behalf of a fixed actor
#[derive(Clone)]
pub struct LocalPortalApi {
    services: PortalServices,
    actor: Actor,
}

impl LocalPortalApi {
    pub fn new(services: PortalServices, actor: Actor) -> Self {
        Self { services, actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Same services, different signed-in actor
    pub fn as_actor(&self, actor: Actor) -> Self {
        Self::new(self.services.clone(), actor)
    }
}

#[async_trait]
impl PortalApi for LocalPortalApi {
    async fn create_ticket(&self, command: CreateTicketCommand) -> Result<Ticket, ApiError> {
        Ok(self.services.tickets.create_ticket(&self.actor, command).await?)
    }

    async fn get_ticket(&self, id: &TicketId) -> Result<Ticket, ApiError> {
        Ok(self.services.tickets.get_ticket(&self.actor, id).await?)
    }

    async fn list_mine(&self) -> Result<Vec<Ticket>, ApiError> {
        Ok(self.services.tickets.list_mine(&self.actor).await?)
    }

    async fn list_all(&self) -> Result<Vec<Ticket>, ApiError> {
        Ok(self.services.tickets.list_all(&self.actor).await?)
    }

    async fn transition(
        &self,
        id: &TicketId,
        new_status: TicketStatus,
        expected_version: u64,
    ) -> Result<Ticket, ApiError> {
        let command = TransitionCommand {
            ticket_id: id.clone(),
            new_status,
            expected_version,
        };
        Ok(self.services.tickets.transition(&self.actor, command).await?)
    }

    async fn escalate(&self, id: &TicketId) -> Result<Ticket, ApiError> {
        Ok(self.services.tickets.escalate(&self.actor, id).await?)
    }

    async fn assign(&self, id: &TicketId, assignee: &UserId) -> Result<Ticket, ApiError> {
        Ok(self.services.tickets.assign(&self.actor, id, assignee.clone()).await?)
    }

    async fn add_comment(&self, id: &TicketId, message: &str) -> Result<TicketComment, ApiError> {
        Ok(self
            .services
            .tickets
            .add_comment(&self.actor, id, message.to_string())
            .await?)
    }

    async fn list_comments(&self, id: &TicketId) -> Result<Vec<TicketComment>, ApiError> {
        Ok(self.services.tickets.list_comments(&self.actor, id).await?)
    }

    async fn get_history(&self, id: &TicketId) -> Result<Vec<TicketHistory>, ApiError> {
        Ok(self.services.tickets.get_history(&self.actor, id).await?)
    }

    async fn mark_read(&self, id: &TicketId) -> Result<(), ApiError> {
        Ok(self.services.tickets.mark_read(&self.actor, id).await?)
    }

    async fn list_notifications(&self, request: PageRequest) -> Result<Page<Notification>, ApiError> {
        Ok(self
            .services
            .notifications
            .list_notifications(&self.actor, request)
            .await?)
    }

    async fn notification_snapshot(&self) -> Result<Vec<Notification>, ApiError> {
        Ok(self.services.notifications.notification_snapshot(&self.actor).await?)
    }

    async fn count_by_category(&self) -> Result<BTreeMap<Category, u64>, ApiError> {
        Ok(self.services.notifications.count_by_category(&self.actor).await?)
    }

    async fn unread_entity_ids(&self, category: Category) -> Result<Vec<String>, ApiError> {
        Ok(self
            .services
            .notifications
            .unread_entity_ids(&self.actor, category)
            .await?)
    }

    async fn mark_notification_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        Ok(self
            .services
            .notifications
            .mark_notification_read(&self.actor, id)
            .await?)
    }

    async fn mark_all_read(&self) -> Result<usize, ApiError> {
        Ok(self.services.notifications.mark_all_read(&self.actor).await?)
    }

    async fn delete_notification(&self, id: &NotificationId) -> Result<(), ApiError> {
        Ok(self
            .services
            .notifications
            .delete_notification(&self.actor, id)
            .await?)
    }

    async fn delete_all_read(&self) -> Result<usize, ApiError> {
        Ok(self.services.notifications.delete_all_read(&self.actor).await?)
    }
}
