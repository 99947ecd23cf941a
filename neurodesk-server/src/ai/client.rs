//! AiServiceClient — HTTP client for the NeuroDesk LLM wrapper service

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use super::response::{AiAssignment, decode_assignment};
use crate::db::models::Ticket;

/// Errors from the AI service call chain. These never surface to the
/// HTTP caller — the assignment resolver downgrades every one of them
/// to an audit entry.
#[derive(Debug, Error)]
pub enum AiServiceError {
    #[error("AI service request failed: {0}")]
    Transport(String),

    #[error("AI service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to read AI service response: {0}")]
    Decode(String),
}

/// Ticket fields shipped to the assignment endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentTicket {
    pub subject: String,
    pub description: String,
    pub requester_id: i64,
    pub priority: crate::db::models::Priority,
    pub impact: crate::db::models::Impact,
    pub urgency: crate::db::models::Urgency,
    pub complexity_level: &'static str,
    pub tags: Vec<String>,
}

impl From<&Ticket> for AssignmentTicket {
    fn from(ticket: &Ticket) -> Self {
        Self {
            subject: ticket.subject.clone(),
            description: ticket.description.clone(),
            requester_id: ticket.requester_id,
            priority: ticket.priority,
            impact: ticket.impact,
            urgency: ticket.urgency,
            // The wrapper service defaults missing complexity to level_1
            complexity_level: "level_1",
            tags: ticket.tags.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AssignmentRequest<'a> {
    ticket: &'a AssignmentTicket,
}

#[derive(Debug, Serialize)]
struct EvaluationRequest<'a> {
    ticket: &'a Value,
}

/// HTTP client for the AI assignment/evaluation service
pub struct AiServiceClient {
    client: Client,
    base_url: String,
}

impl AiServiceClient {
    /// Create a new client against `base_url` with a hard timeout.
    ///
    /// The timeout bounds how long ticket creation may block on the
    /// service before falling through to the fallback outcome.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, AiServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiServiceError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Ask the service to pick a technician for a new ticket.
    ///
    /// A 2xx body is always decoded tolerantly (see [`decode_assignment`]);
    /// everything else becomes an error for the resolver to downgrade.
    pub async fn request_assignment(
        &self,
        ticket: &AssignmentTicket,
    ) -> Result<AiAssignment, AiServiceError> {
        let url = format!("{}/api/ticket-assignment", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&AssignmentRequest { ticket })
            .send()
            .await
            .map_err(|e| AiServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiServiceError::Status { status, body });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| AiServiceError::Decode(e.to_string()))?;

        Ok(decode_assignment(raw))
    }

    /// Submit a closed ticket for resolution-quality evaluation.
    ///
    /// The evaluation engine itself is out of our hands; we pass the
    /// serialized ticket through and hand back whatever it returns.
    pub async fn evaluate_resolution(&self, ticket: &Value) -> Result<Value, AiServiceError> {
        let url = format!("{}/api/evaluate-skills", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&EvaluationRequest { ticket })
            .send()
            .await
            .map_err(|e| AiServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiServiceError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| AiServiceError::Decode(e.to_string()))
    }
}
