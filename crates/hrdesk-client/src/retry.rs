//! Mutation discipline
//!
//! Writes go through [`MutationClient`]: input is checked locally before
//! any call, transitions carry the version the caller last saw, and only
//! naturally idempotent operations are retried.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use hrdesk_tickets::{CreateTicketCommand, Ticket, TicketComment, TicketId, TicketStatus};
use tracing::{debug, warn};

use crate::api::{ApiError, PortalApi};
use crate::config::SyncConfig;

/// Run `op` up to `attempts` times, sleeping `backoff` between transient failures.
pub async fn retry_transient<F, Fut, T>(attempts: u32, backoff: Duration, op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    // backon counts retries, not attempts
    let policy = ConstantBuilder::default()
        .with_delay(backoff)
        .with_max_times(attempts.saturating_sub(1) as usize);
    let retries = AtomicU32::new(0);

    let result = op
        .retry(policy)
        .sleep(tokio::time::sleep)
        .when(ApiError::is_transient)
        .notify(|err: &ApiError, dur: Duration| {
            let attempt = retries.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(attempt, backoff_ms = dur.as_millis() as u64, error = %err, "retrying after backoff");
        })
        .await;

    if let Err(e) = &result {
        if e.is_transient() {
            warn!(attempts = retries.load(Ordering::SeqCst) + 1, error = %e, "giving up");
        }
    }
    result
}

/// Client-side guard rails around [`PortalApi`] writes
pub struct MutationClient {
    api: Arc<dyn PortalApi>,
    attempts: u32,
    backoff: Duration,
}

impl MutationClient {
    pub fn new(api: Arc<dyn PortalApi>, config: &SyncConfig) -> Self {
        Self {
            api,
            attempts: config.mutation_retry_attempts,
            backoff: config.retry_backoff(),
        }
    }

    /// Rejects incomplete forms without a round trip. Not retried.
    pub async fn create_ticket(&self, command: CreateTicketCommand) -> Result<Ticket, ApiError> {
        command
            .validate()
            .map_err(|problems| ApiError::Validation(problems.join("; ")))?;
        self.api.create_ticket(command).await
    }

    /// Move `ticket` as last observed. A concurrent change surfaces as
    /// [`ApiError::Conflict`]; the caller refreshes and decides again.
    pub async fn transition(&self, ticket: &Ticket, to: TicketStatus) -> Result<Ticket, ApiError> {
        if !ticket.status().can_transition_to(to) {
            return Err(ApiError::Domain(format!(
                "cannot move {} from {} to {}",
                ticket.ticket_number(),
                ticket.status(),
                to
            )));
        }
        self.api.transition(ticket.id(), to, ticket.version()).await
    }

    /// Escalation is idempotent on the server, so transient failures are retried.
    pub async fn escalate(&self, id: &TicketId) -> Result<Ticket, ApiError> {
        retry_transient(self.attempts, self.backoff, || self.api.escalate(id)).await
    }

    /// Comments are not idempotent and are never retried.
    pub async fn add_comment(&self, id: &TicketId, message: &str) -> Result<TicketComment, ApiError> {
        if message.trim().is_empty() {
            return Err(ApiError::Validation("comment must not be empty".into()));
        }
        self.api.add_comment(id, message).await
    }

    pub async fn mark_read(&self, id: &TicketId) -> Result<(), ApiError> {
        self.api.mark_read(id).await
    }
}
