//! REST adapter
//!
//! Every response body is wrapped in a `{"data": ...}` envelope; error
//! responses carry `{"message": ...}`.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use hrdesk_common::UserId;
use hrdesk_tickets::{
    Category, CreateTicketCommand, Notification, NotificationId, Page, PageRequest, Ticket,
    TicketComment, TicketHistory, TicketId, TicketStatus,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::api::{ApiError, PortalApi};

/// Portal API over HTTP with a bearer token
pub struct HttpPortalApi {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpPortalApi {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Protocol(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            client,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "portal request");

        let mut req = self.client.request(method, &url).query(query);
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await.map_err(transport_error)?;
        let status = resp.status();
        let text = resp.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(classify_status(status, &error_message(&text)));
        }
        unwrap_envelope(&text)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::GET, path, &[], None).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Option<Value>) -> Result<T, ApiError> {
        self.send(Method::POST, path, &[], body).await
    }
}

/// Map a non-success status to the client error kind
pub fn classify_status(status: StatusCode, message: &str) -> ApiError {
    let message = if message.is_empty() {
        status.to_string()
    } else {
        message.to_string()
    };
    match status {
        StatusCode::BAD_REQUEST => ApiError::Validation(message),
        StatusCode::UNPROCESSABLE_ENTITY => ApiError::Domain(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Authorization(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::CONFLICT => ApiError::Conflict(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => ApiError::TransientNetwork(message),
        s if s.is_server_error() => ApiError::TransientNetwork(message),
        _ => ApiError::Protocol(message),
    }
}

/// Extract `data` from the response envelope. An empty body reads as `null`.
pub fn unwrap_envelope<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let value: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(text).map_err(|e| ApiError::Protocol(e.to_string()))?
    };
    let data = match value {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
        Value::Null => Value::Null,
        other => return Err(ApiError::Protocol(format!("unexpected response: {}", other))),
    };
    serde_json::from_value(data).map_err(|e| ApiError::Protocol(e.to_string()))
}

fn error_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| text.trim().to_string())
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Protocol(err.to_string())
    } else {
        ApiError::TransientNetwork(err.to_string())
    }
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn create_ticket(&self, command: CreateTicketCommand) -> Result<Ticket, ApiError> {
        let body = serde_json::to_value(&command).map_err(|e| ApiError::Protocol(e.to_string()))?;
        self.post("/tickets", Some(body)).await
    }

    async fn get_ticket(&self, id: &TicketId) -> Result<Ticket, ApiError> {
        self.get(&format!("/tickets/{}", id)).await
    }

    async fn list_mine(&self) -> Result<Vec<Ticket>, ApiError> {
        self.get("/tickets/mine").await
    }

    async fn list_all(&self) -> Result<Vec<Ticket>, ApiError> {
        self.get("/tickets").await
    }

    async fn transition(
        &self,
        id: &TicketId,
        new_status: TicketStatus,
        expected_version: u64,
    ) -> Result<Ticket, ApiError> {
        let body = json!({ "newStatus": new_status, "expectedVersion": expected_version });
        self.post(&format!("/tickets/{}/transition", id), Some(body)).await
    }

    async fn escalate(&self, id: &TicketId) -> Result<Ticket, ApiError> {
        self.post(&format!("/tickets/{}/escalate", id), None).await
    }

    async fn assign(&self, id: &TicketId, assignee: &UserId) -> Result<Ticket, ApiError> {
        let body = json!({ "assigneeId": assignee });
        self.post(&format!("/tickets/{}/assign", id), Some(body)).await
    }

    async fn add_comment(&self, id: &TicketId, message: &str) -> Result<TicketComment, ApiError> {
        let body = json!({ "message": message });
        self.post(&format!("/tickets/{}/comments", id), Some(body)).await
    }

    async fn list_comments(&self, id: &TicketId) -> Result<Vec<TicketComment>, ApiError> {
        self.get(&format!("/tickets/{}/comments", id)).await
    }

    async fn get_history(&self, id: &TicketId) -> Result<Vec<TicketHistory>, ApiError> {
        self.get(&format!("/tickets/{}/history", id)).await
    }

    async fn mark_read(&self, id: &TicketId) -> Result<(), ApiError> {
        self.post(&format!("/tickets/{}/read", id), None).await
    }

    async fn list_notifications(&self, request: PageRequest) -> Result<Page<Notification>, ApiError> {
        let query = [
            ("page", request.page.to_string()),
            ("size", request.effective_size().to_string()),
            ("unreadOnly", request.unread_only.to_string()),
        ];
        self.send(Method::GET, "/notifications", &query, None).await
    }

    async fn notification_snapshot(&self) -> Result<Vec<Notification>, ApiError> {
        let query = [("all", "true".to_string())];
        self.send(Method::GET, "/notifications", &query, None).await
    }

    async fn count_by_category(&self) -> Result<BTreeMap<Category, u64>, ApiError> {
        self.get("/notifications/count-by-category").await
    }

    async fn unread_entity_ids(&self, category: Category) -> Result<Vec<String>, ApiError> {
        let query = [("category", category.as_str().to_string())];
        self.send(Method::GET, "/notifications/unread-entity-ids", &query, None)
            .await
    }

    async fn mark_notification_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        self.send(Method::PATCH, &format!("/notifications/{}/read", id), &[], None)
            .await
    }

    async fn mark_all_read(&self) -> Result<usize, ApiError> {
        self.post("/notifications/read-all", None).await
    }

    async fn delete_notification(&self, id: &NotificationId) -> Result<(), ApiError> {
        self.send(Method::DELETE, &format!("/notifications/{}", id), &[], None)
            .await
    }

    async fn delete_all_read(&self) -> Result<usize, ApiError> {
        self.send(Method::DELETE, "/notifications/read", &[], None).await
    }
}
