//! Ticket Lifecycle Manager
//!
//! Owns the ticket state machine and is the only writer of ticket rows:
//! create, update, close, cancel, reactivate, permanent delete. Every
//! transition goes through the audit trail, and every read-modify-write
//! cycle runs under the ticket's per-id mutex so concurrent requests
//! cannot lose audit entries or assignments.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::ai::AiServiceClient;
use crate::db::models::{
    Ticket, TicketCreate, TicketDetail, TicketStatus, TicketUpdate, WorkLog,
};
use crate::db::repository::{TechnicianRepository, TicketRepository, UserRepository};
use crate::tickets::assignment::{self, AssignmentOutcome};
use crate::tickets::audit::{self, AuditAction, AuditEntry};
use crate::tickets::locks::TicketLocks;
use crate::utils::validation::{
    MAX_FEEDBACK_LEN, MAX_JUSTIFICATION_LEN, validate_description, validate_optional_text,
    validate_required_skills, validate_satisfaction_rating, validate_score, validate_subject,
};
use crate::utils::{AppError, AppResult};

/// Close payload: feedback fields merged into the ticket on close
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloseRequest {
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub satisfaction_rating: Option<i64>,
    /// Free-text resolution notes, recorded as a final work-log entry
    #[serde(default)]
    pub resolution_notes: Option<String>,
    #[serde(default)]
    pub acting_user_id: Option<i64>,
}

/// Ticket state machine + audit orchestration
#[derive(Clone)]
pub struct TicketLifecycle {
    tickets: TicketRepository,
    users: UserRepository,
    technicians: TechnicianRepository,
    ai: Option<Arc<AiServiceClient>>,
    locks: TicketLocks,
    /// When true, reactivate is only legal from the cancelled state.
    /// Default is permissive (any state), matching observed behavior.
    restrict_reactivate: bool,
}

impl TicketLifecycle {
    pub fn new(db: Surreal<Db>, ai: Option<Arc<AiServiceClient>>, restrict_reactivate: bool) -> Self {
        Self {
            tickets: TicketRepository::new(db.clone()),
            users: UserRepository::new(db.clone()),
            technicians: TechnicianRepository::new(db),
            ai,
            locks: TicketLocks::new(),
            restrict_reactivate,
        }
    }

    /// Create a ticket. Validation and existence checks short-circuit
    /// before any write; the AI assignment step runs after the row
    /// exists and can only add audit entries, never fail the request.
    pub async fn create(&self, data: TicketCreate) -> AppResult<TicketDetail> {
        validate_subject(&data.subject)?;
        validate_description(&data.description)?;
        validate_score(data.score)?;
        validate_optional_text(&data.justification, "justification", MAX_JUSTIFICATION_LEN)?;
        if let Some(skills) = &data.required_skills {
            validate_required_skills(skills)?;
        }

        if !self.users.exists(data.requester_id).await.map_err(AppError::from)? {
            return Err(AppError::not_found("Requester user not found"));
        }
        if let Some(technician_id) = data.assigned_technician_id
            && !self.technicians.exists(technician_id).await.map_err(AppError::from)?
        {
            return Err(AppError::not_found("Assigned technician not found"));
        }

        let id = self.tickets.next_id().await.map_err(AppError::from)?;
        let now = Utc::now();
        let status = if data.assigned_technician_id.is_some() {
            TicketStatus::Assigned
        } else {
            TicketStatus::New
        };
        let seed = AuditEntry::at(
            AuditAction::Created,
            Some(data.requester_id),
            "Ticket created",
            now,
        );

        let ticket = Ticket {
            id,
            subject: data.subject,
            description: data.description,
            status,
            priority: data.priority.unwrap_or_default(),
            impact: data.impact.unwrap_or_default(),
            urgency: data.urgency.unwrap_or_default(),
            sla_violated: false,
            tags: data.tags.unwrap_or_default(),
            required_skills: data.required_skills.unwrap_or_default(),
            requester_id: data.requester_id,
            assigned_technician_id: data.assigned_technician_id,
            resolution_due: data.resolution_due,
            escalation_count: 0,
            reopened_count: 0,
            tasks: Vec::new(),
            work_logs: Vec::new(),
            audit_trail: vec![seed],
            satisfaction_rating: None,
            score: data.score,
            justification: data.justification,
            feedback: None,
            first_response_at: None,
            resolved_at: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut ticket = self.tickets.insert(&ticket).await.map_err(AppError::from)?;

        // AI assignment: only when the caller supplied no technician and
        // a service endpoint is configured
        if ticket.assigned_technician_id.is_none()
            && let Some(ai) = &self.ai
        {
            ticket = self.run_ai_assignment(ai, ticket).await?;
        }

        self.detail(ticket).await
    }

    /// Fold the resolver's outcome back into the freshly created row.
    /// Exactly one audit entry per invocation.
    async fn run_ai_assignment(
        &self,
        ai: &AiServiceClient,
        mut ticket: Ticket,
    ) -> AppResult<Ticket> {
        let lock = self.locks.for_ticket(ticket.id);
        let _guard = lock.lock().await;

        let outcome = assignment::resolve(ai, &self.technicians, &ticket).await;
        let entry = outcome.audit_entry();

        if let AssignmentOutcome::Assigned {
            technician_id,
            justification,
        } = &outcome
        {
            ticket.assigned_technician_id = Some(*technician_id);
            ticket.status = TicketStatus::Assigned;
            if let Some(justification) = justification {
                ticket.justification = Some(justification.clone());
            }
            tracing::info!(
                ticket_id = ticket.id,
                technician_id,
                "Ticket assigned by AI service"
            );
        }

        ticket.audit_trail = audit::append(&ticket.audit_trail, entry);
        ticket.updated_at = Utc::now();
        self.tickets.save(&ticket).await.map_err(AppError::from)
    }

    /// Partial update. Appends exactly one `updated` audit entry whose
    /// payload lists the changed field names.
    pub async fn update(&self, id: i64, data: TicketUpdate) -> AppResult<TicketDetail> {
        if let Some(subject) = &data.subject {
            validate_subject(subject)?;
        }
        if let Some(description) = &data.description {
            validate_description(description)?;
        }
        validate_score(data.score)?;
        validate_satisfaction_rating(data.satisfaction_rating)?;
        validate_optional_text(&data.justification, "justification", MAX_JUSTIFICATION_LEN)?;
        validate_optional_text(&data.feedback, "feedback", MAX_FEEDBACK_LEN)?;
        if let Some(skills) = &data.required_skills {
            validate_required_skills(skills)?;
        }

        let lock = self.locks.for_ticket(id);
        let _guard = lock.lock().await;

        let mut ticket = self
            .tickets
            .find_by_id(id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Ticket {id} not found")))?;

        // A changed technician id must resolve in the directory
        if let Some(Some(technician_id)) = data.assigned_technician_id
            && Some(technician_id) != ticket.assigned_technician_id
            && !self.technicians.exists(technician_id).await.map_err(AppError::from)?
        {
            return Err(AppError::validation("Assigned technician not found"));
        }

        let now = Utc::now();
        let mut changes: Vec<&'static str> = Vec::new();

        if let Some(subject) = data.subject {
            ticket.subject = subject;
            changes.push("subject");
        }
        if let Some(description) = data.description {
            ticket.description = description;
            changes.push("description");
        }
        if let Some(status) = data.status {
            // Derived timestamps: set exactly once per transition into
            // the resolved / closed state
            if status == TicketStatus::Resolved && ticket.status != TicketStatus::Resolved {
                ticket.resolved_at = Some(now);
            }
            if status == TicketStatus::Closed && ticket.status != TicketStatus::Closed {
                ticket.closed_at = Some(now);
            }
            ticket.status = status;
            changes.push("status");
        }
        if let Some(priority) = data.priority {
            ticket.priority = priority;
            changes.push("priority");
        }
        if let Some(impact) = data.impact {
            ticket.impact = impact;
            changes.push("impact");
        }
        if let Some(urgency) = data.urgency {
            ticket.urgency = urgency;
            changes.push("urgency");
        }
        if let Some(technician_change) = data.assigned_technician_id {
            ticket.assigned_technician_id = technician_change;
            changes.push("assigned_technician_id");
        }
        if let Some(required_skills) = data.required_skills {
            ticket.required_skills = required_skills;
            changes.push("required_skills");
        }
        if let Some(tags) = data.tags {
            ticket.tags = tags;
            changes.push("tags");
        }
        if let Some(resolution_due) = data.resolution_due {
            ticket.resolution_due = resolution_due;
            changes.push("resolution_due");
        }
        if let Some(tasks) = data.tasks {
            ticket.tasks = tasks;
            changes.push("tasks");
        }
        if let Some(work_logs) = data.work_logs {
            ticket.work_logs = work_logs;
            changes.push("work_logs");
        }
        if let Some(satisfaction_rating) = data.satisfaction_rating {
            ticket.satisfaction_rating = Some(satisfaction_rating);
            changes.push("satisfaction_rating");
        }
        if let Some(score) = data.score {
            ticket.score = Some(score);
            changes.push("score");
        }
        if let Some(justification) = data.justification {
            ticket.justification = Some(justification);
            changes.push("justification");
        }
        if let Some(feedback) = data.feedback {
            ticket.feedback = Some(feedback);
            changes.push("feedback");
        }
        if let Some(sla_violated) = data.sla_violated {
            ticket.sla_violated = sla_violated;
            changes.push("sla_violated");
        }

        let entry = AuditEntry::at(AuditAction::Updated, data.acting_user_id, "Ticket updated", now)
            .with_field("changes", json!(changes));
        ticket.audit_trail = audit::append(&ticket.audit_trail, entry);
        ticket.updated_at = now;

        let ticket = self.tickets.save(&ticket).await.map_err(AppError::from)?;
        self.detail(ticket).await
    }

    /// Close a ticket: force status to closed, stamp `closed_at` once,
    /// merge the feedback fields, then hand the closed ticket to the
    /// evaluation endpoint (fail-open; its result rides along in the
    /// response and is never required).
    pub async fn close(
        &self,
        id: i64,
        req: CloseRequest,
    ) -> AppResult<(TicketDetail, Option<Value>)> {
        validate_satisfaction_rating(req.satisfaction_rating)?;
        validate_optional_text(&req.feedback, "feedback", MAX_FEEDBACK_LEN)?;
        validate_optional_text(&req.resolution_notes, "resolution_notes", MAX_FEEDBACK_LEN)?;

        let lock = self.locks.for_ticket(id);
        let _guard = lock.lock().await;

        let mut ticket = self
            .tickets
            .find_by_id(id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Ticket {id} not found")))?;

        let now = Utc::now();
        let mut changes: Vec<&'static str> = vec!["status"];

        if ticket.status != TicketStatus::Closed {
            ticket.closed_at = Some(now);
        }
        ticket.status = TicketStatus::Closed;

        if let Some(feedback) = req.feedback {
            ticket.feedback = Some(feedback);
            changes.push("feedback");
        }
        if let Some(satisfaction_rating) = req.satisfaction_rating {
            ticket.satisfaction_rating = Some(satisfaction_rating);
            changes.push("satisfaction_rating");
        }
        if let Some(notes) = req.resolution_notes {
            ticket.work_logs.push(WorkLog {
                timestamp: now,
                technician_id: ticket.assigned_technician_id,
                notes,
                time_spent: None,
            });
            changes.push("work_logs");
        }

        let entry = AuditEntry::at(AuditAction::Updated, req.acting_user_id, "Ticket closed", now)
            .with_field("changes", json!(changes));
        ticket.audit_trail = audit::append(&ticket.audit_trail, entry);
        ticket.updated_at = now;

        let ticket = self.tickets.save(&ticket).await.map_err(AppError::from)?;

        let evaluation = self.request_evaluation(&ticket).await;
        Ok((self.detail(ticket).await?, evaluation))
    }

    /// Evaluation trigger boundary. The engine is external; a failed or
    /// unconfigured call just yields no evaluation.
    async fn request_evaluation(&self, ticket: &Ticket) -> Option<Value> {
        let ai = self.ai.as_ref()?;
        let payload = serde_json::to_value(ticket).ok()?;
        match ai.evaluate_resolution(&payload).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(ticket_id = ticket.id, error = %e, "Resolution evaluation failed");
                None
            }
        }
    }

    /// Soft delete: mark the ticket cancelled, keep the row
    pub async fn cancel(&self, id: i64) -> AppResult<TicketDetail> {
        let lock = self.locks.for_ticket(id);
        let _guard = lock.lock().await;

        let mut ticket = self
            .tickets
            .find_by_id(id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Ticket {id} not found")))?;

        let now = Utc::now();
        ticket.status = TicketStatus::Cancelled;
        ticket.audit_trail = audit::append(
            &ticket.audit_trail,
            AuditEntry::at(AuditAction::Cancelled, None, "Ticket cancelled", now),
        );
        ticket.updated_at = now;

        let ticket = self.tickets.save(&ticket).await.map_err(AppError::from)?;
        self.detail(ticket).await
    }

    /// Reset a ticket back to `new`. Permissive by default; the
    /// cancelled-only guard is a policy knob.
    pub async fn reactivate(&self, id: i64) -> AppResult<TicketDetail> {
        let lock = self.locks.for_ticket(id);
        let _guard = lock.lock().await;

        let mut ticket = self
            .tickets
            .find_by_id(id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Ticket {id} not found")))?;

        if self.restrict_reactivate && ticket.status != TicketStatus::Cancelled {
            return Err(AppError::validation(
                "Only cancelled tickets can be reactivated",
            ));
        }

        let now = Utc::now();
        ticket.status = TicketStatus::New;
        ticket.reopened_count += 1;
        ticket.audit_trail = audit::append(
            &ticket.audit_trail,
            AuditEntry::at(AuditAction::Reactivated, None, "Ticket reactivated", now),
        );
        ticket.updated_at = now;

        let ticket = self.tickets.save(&ticket).await.map_err(AppError::from)?;
        self.detail(ticket).await
    }

    /// Hard delete. No audit entry is possible once the row is gone.
    pub async fn delete_permanent(&self, id: i64) -> AppResult<bool> {
        let lock = self.locks.for_ticket(id);
        let _guard = lock.lock().await;
        self.tickets.delete_permanent(id).await.map_err(AppError::from)
    }

    /// Fetch a ticket joined with requester/technician summaries
    pub async fn get(&self, id: i64) -> AppResult<TicketDetail> {
        let ticket = self
            .tickets
            .find_by_id(id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Ticket {id} not found")))?;
        self.detail(ticket).await
    }

    /// Join requester and assigned-technician summaries onto a ticket
    pub async fn detail(&self, ticket: Ticket) -> AppResult<TicketDetail> {
        let requester = self
            .users
            .find_by_id(ticket.requester_id)
            .await
            .map_err(AppError::from)?
            .map(|u| u.summary());

        let assigned_technician = match ticket.assigned_technician_id {
            Some(technician_id) => {
                match self
                    .technicians
                    .find_by_id(technician_id)
                    .await
                    .map_err(AppError::from)?
                {
                    Some(technician) => {
                        let user = self
                            .users
                            .find_by_id(technician.user_id)
                            .await
                            .map_err(AppError::from)?
                            .map(|u| u.summary());
                        Some(technician.summary(user))
                    }
                    None => None,
                }
            }
            None => None,
        };

        Ok(TicketDetail {
            ticket,
            requester,
            assigned_technician,
        })
    }
}
