//! Assignment Resolver
//!
//! Decides whether the external AI service should be consulted for a
//! freshly created, unassigned ticket, interprets its answer
//! defensively, verifies the proposed technician against the
//! directory, and commits exactly one of four outcomes. Each outcome
//! maps to exactly one audit entry; no error ever propagates past this
//! boundary (fail-open by design — see the error-handling notes on
//! [`crate::ai::AiServiceError`]).

use serde_json::Value;

use crate::ai::{AiAssignment, AiServiceClient, AssignmentTicket};
use crate::db::models::Ticket;
use crate::db::repository::TechnicianRepository;
use crate::tickets::audit::{AuditAction, AuditEntry};

/// The resolver's committed outcome
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentOutcome {
    /// The service named a technician and the directory confirms it
    Assigned {
        technician_id: i64,
        justification: Option<String>,
    },
    /// The service named a technician the directory does not know
    InvalidTechnician { technician_id: i64 },
    /// The service declined or returned nothing usable
    NoAssignment { detail: String, raw: Value },
    /// The call itself failed (network, timeout, non-2xx)
    CallFailed { error: String },
}

impl AssignmentOutcome {
    /// The single audit entry this outcome contributes. System action —
    /// no acting user.
    pub fn audit_entry(&self) -> AuditEntry {
        match self {
            AssignmentOutcome::Assigned {
                technician_id,
                justification,
            } => {
                let mut entry = AuditEntry::new(
                    AuditAction::AiAssigned,
                    None,
                    "Technician assigned by AI service",
                )
                .with_field("technician_id", *technician_id);
                if let Some(justification) = justification {
                    entry = entry.with_field("justification", justification.clone());
                }
                entry
            }
            AssignmentOutcome::InvalidTechnician { technician_id } => AuditEntry::new(
                AuditAction::AiAssignmentFailed,
                None,
                "AI service selected an unknown technician",
            )
            .with_field("invalid_technician_id", *technician_id),
            AssignmentOutcome::NoAssignment { detail, raw } => AuditEntry::new(
                AuditAction::AiNoAssignment,
                None,
                detail.clone(),
            )
            .with_field("response", raw.clone()),
            AssignmentOutcome::CallFailed { error } => AuditEntry::new(
                AuditAction::AiAssignmentFailed,
                None,
                "AI assignment call failed",
            )
            .with_field("error", error.clone()),
        }
    }
}

/// Consult the AI service for an unassigned ticket and fold the answer
/// into one committed outcome. Infallible by contract.
pub async fn resolve(
    client: &AiServiceClient,
    directory: &TechnicianRepository,
    ticket: &Ticket,
) -> AssignmentOutcome {
    let request = AssignmentTicket::from(ticket);

    let assignment = match client.request_assignment(&request).await {
        Ok(assignment) => assignment,
        Err(e) => {
            tracing::warn!(ticket_id = ticket.id, error = %e, "AI assignment call failed");
            return AssignmentOutcome::CallFailed {
                error: e.to_string(),
            };
        }
    };

    match assignment {
        AiAssignment::Assigned {
            technician_id,
            justification,
        } => match directory.exists(technician_id).await {
            Ok(true) => AssignmentOutcome::Assigned {
                technician_id,
                justification,
            },
            Ok(false) => {
                tracing::warn!(
                    ticket_id = ticket.id,
                    technician_id,
                    "AI service selected a technician not present in the directory"
                );
                AssignmentOutcome::InvalidTechnician { technician_id }
            }
            Err(e) => AssignmentOutcome::CallFailed {
                error: format!("Technician verification failed: {e}"),
            },
        },
        AiAssignment::Declined { reason, raw } => AssignmentOutcome::NoAssignment {
            detail: format!("AI service declined assignment: {reason}"),
            raw,
        },
        AiAssignment::Unusable { raw } => AssignmentOutcome::NoAssignment {
            detail: "AI service response contained no usable technician id".to_string(),
            raw,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assigned_outcome_audit_entry_carries_justification() {
        let outcome = AssignmentOutcome::Assigned {
            technician_id: 4,
            justification: Some("Matches hardware skill".to_string()),
        };
        let entry = outcome.audit_entry();
        assert_eq!(entry.action, AuditAction::AiAssigned);
        assert_eq!(entry.user_id, None);
        assert_eq!(entry.payload["technician_id"], 4);
        assert_eq!(entry.payload["justification"], "Matches hardware skill");
    }

    #[test]
    fn invalid_technician_audit_entry_records_the_bad_id() {
        let entry = AssignmentOutcome::InvalidTechnician { technician_id: 99 }.audit_entry();
        assert_eq!(entry.action, AuditAction::AiAssignmentFailed);
        assert_eq!(entry.payload["invalid_technician_id"], 99);
    }

    #[test]
    fn no_assignment_audit_entry_embeds_raw_response() {
        let raw = json!({"success": false, "error_message": "nobody available"});
        let entry = AssignmentOutcome::NoAssignment {
            detail: "AI service declined assignment: nobody available".to_string(),
            raw: raw.clone(),
        }
        .audit_entry();
        assert_eq!(entry.action, AuditAction::AiNoAssignment);
        assert_eq!(entry.payload["response"], raw);
    }

    #[test]
    fn call_failure_audit_entry_embeds_error_text() {
        let entry = AssignmentOutcome::CallFailed {
            error: "connection refused".to_string(),
        }
        .audit_entry();
        assert_eq!(entry.action, AuditAction::AiAssignmentFailed);
        assert_eq!(entry.payload["error"], "connection refused");
    }
}
