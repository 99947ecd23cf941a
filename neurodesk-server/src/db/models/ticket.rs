//! Ticket Model
//!
//! The central entity. Tasks, work logs and the audit trail are owned by
//! composition — they are JSON lists embedded in the row, never rows of
//! their own — so a ticket always reads and writes as one unit.

use super::serde_helpers;
use super::technician::TechnicianSummary;
use super::user::UserSummary;
use crate::tickets::audit::AuditEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticket status state machine:
/// new → assigned → in_progress → on_hold → resolved → closed,
/// with cancelled reachable from any non-terminal state and new
/// reachable again via reactivate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    New,
    Assigned,
    InProgress,
    OnHold,
    Resolved,
    Closed,
    Cancelled,
}

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Business impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Status of an embedded task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// One task on a ticket's checklist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// One work-log note (ordered, append-only by convention)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkLog {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub technician_id: Option<i64>,
    pub notes: String,
    /// Minutes spent
    #[serde(default)]
    pub time_spent: Option<i64>,
}

/// Ticket model matching the `ticket` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(with = "serde_helpers::record_key")]
    pub id: i64,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub impact: Impact,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub sla_violated: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Skill ids this ticket calls for (unordered set)
    #[serde(default)]
    pub required_skills: Vec<i64>,
    pub requester_id: i64,
    #[serde(default)]
    pub assigned_technician_id: Option<i64>,
    #[serde(default)]
    pub resolution_due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub escalation_count: i64,
    #[serde(default)]
    pub reopened_count: i64,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub work_logs: Vec<WorkLog>,
    /// Append-only event log; every lifecycle write adds entries here
    #[serde(default)]
    pub audit_trail: Vec<AuditEntry>,
    /// 1-5 star rating given by the requester
    #[serde(default)]
    pub satisfaction_rating: Option<i64>,
    /// 0.0-10.0 resolution quality score
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub first_response_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create ticket payload
#[derive(Debug, Clone, Deserialize)]
pub struct TicketCreate {
    pub subject: String,
    pub description: String,
    pub requester_id: i64,
    #[serde(default)]
    pub assigned_technician_id: Option<i64>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub required_skills: Option<Vec<i64>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub resolution_due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub justification: Option<String>,
}

/// Update ticket payload (all fields optional; double Option where an
/// explicit null must be distinguishable from "field absent")
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketUpdate {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default, with = "double_option")]
    pub assigned_technician_id: Option<Option<i64>>,
    #[serde(default)]
    pub required_skills: Option<Vec<i64>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, with = "double_option")]
    pub resolution_due: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
    #[serde(default)]
    pub work_logs: Option<Vec<WorkLog>>,
    #[serde(default)]
    pub satisfaction_rating: Option<i64>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub sla_violated: Option<bool>,
    /// Attribution for the audit entry; anonymous/system when absent
    #[serde(default)]
    pub acting_user_id: Option<i64>,
}

/// Deserialize `Option<Option<T>>`: absent → None, null → Some(None),
/// value → Some(Some(v))
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(d).map(Some)
    }
}

/// Ticket joined with requester and assigned-technician summaries
#[derive(Debug, Clone, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub requester: Option<UserSummary>,
    pub assigned_technician: Option<TechnicianSummary>,
}
