//! Lifecycle tests against an in-memory database: state machine,
//! derived timestamps, audit trail growth, validation short-circuits.

mod common;

use common::{seed_technician, seed_user, test_state};
use neurodesk_server::AppError;
use neurodesk_server::db::models::{
    Priority, TicketCreate, TicketStatus, TicketUpdate,
};
use neurodesk_server::db::repository::{TicketFilter, TicketRepository};
use neurodesk_server::tickets::{AuditAction, CloseRequest, TicketLifecycle};

fn create_payload(requester_id: i64) -> TicketCreate {
    TicketCreate {
        subject: "Printer on 3rd floor not working".to_string(),
        description: "Printer model X jammed repeatedly since Monday".to_string(),
        requester_id,
        assigned_technician_id: None,
        priority: None,
        impact: None,
        urgency: None,
        required_skills: None,
        tags: None,
        resolution_due: None,
        score: None,
        justification: None,
    }
}

async fn ticket_count(state: &neurodesk_server::ServerState) -> i64 {
    let repo = TicketRepository::new(state.db.clone());
    let (_, total) = repo
        .search(&TicketFilter::default(), 1, 10, "created_at", "desc")
        .await
        .unwrap();
    total
}

#[tokio::test]
async fn create_without_technician_seeds_audit_and_defaults() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;

    let detail = state
        .lifecycle
        .create(create_payload(requester.id))
        .await
        .unwrap();
    let ticket = &detail.ticket;

    assert_eq!(ticket.status, TicketStatus::New);
    assert_eq!(ticket.priority, Priority::Normal);
    assert_eq!(ticket.requester_id, requester.id);
    assert!(ticket.assigned_technician_id.is_none());
    assert!(ticket.tasks.is_empty());
    assert!(ticket.work_logs.is_empty());

    // Single seed entry, attributed to the requester
    assert_eq!(ticket.audit_trail.len(), 1);
    assert_eq!(ticket.audit_trail[0].action, AuditAction::Created);
    assert_eq!(ticket.audit_trail[0].user_id, Some(requester.id));

    assert_eq!(detail.requester.as_ref().unwrap().id, requester.id);
    assert!(detail.assigned_technician.is_none());
}

#[tokio::test]
async fn create_with_supplied_technician_starts_assigned() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;
    let tech_user = seed_user(&state, "Bob", "bob@example.com").await;
    let technician = seed_technician(&state, "Bob", tech_user.id).await;

    let mut payload = create_payload(requester.id);
    payload.assigned_technician_id = Some(technician.id);

    let detail = state.lifecycle.create(payload).await.unwrap();

    assert_eq!(detail.ticket.status, TicketStatus::Assigned);
    assert_eq!(detail.ticket.assigned_technician_id, Some(technician.id));
    // No AI involvement: only the seed entry
    assert_eq!(detail.ticket.audit_trail.len(), 1);
    assert_eq!(
        detail.assigned_technician.as_ref().unwrap().id,
        technician.id
    );
}

#[tokio::test]
async fn create_with_unknown_requester_writes_nothing() {
    let state = test_state(None).await;

    let err = state.lifecycle.create(create_payload(999)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(ticket_count(&state).await, 0);
}

#[tokio::test]
async fn create_with_unknown_technician_writes_nothing() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;

    let mut payload = create_payload(requester.id);
    payload.assigned_technician_id = Some(42);

    let err = state.lifecycle.create(payload).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(ticket_count(&state).await, 0);
}

#[tokio::test]
async fn out_of_range_score_is_rejected_without_side_effects() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;

    let mut payload = create_payload(requester.id);
    payload.score = Some(10.5);

    let err = state.lifecycle.create(payload).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(ticket_count(&state).await, 0);
}

#[tokio::test]
async fn audit_trail_grows_monotonically_across_lifecycle() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;

    let id = state
        .lifecycle
        .create(create_payload(requester.id))
        .await
        .unwrap()
        .ticket
        .id;

    let seed_entry = state.lifecycle.get(id).await.unwrap().ticket.audit_trail[0].clone();

    state
        .lifecycle
        .update(
            id,
            TicketUpdate {
                status: Some(TicketStatus::InProgress),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    state
        .lifecycle
        .update(
            id,
            TicketUpdate {
                priority: Some(Priority::High),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    state.lifecycle.cancel(id).await.unwrap();
    let detail = state.lifecycle.reactivate(id).await.unwrap();

    let trail = &detail.ticket.audit_trail;
    // create + 2 updates + cancel + reactivate = 5 entries
    assert_eq!(trail.len(), 5);
    assert_eq!(
        trail.iter().map(|e| e.action).collect::<Vec<_>>(),
        vec![
            AuditAction::Created,
            AuditAction::Updated,
            AuditAction::Updated,
            AuditAction::Cancelled,
            AuditAction::Reactivated,
        ]
    );
    // The seed entry is untouched by later appends
    assert_eq!(trail[0], seed_entry);
}

#[tokio::test]
async fn resolved_timestamp_is_set_exactly_once_per_transition() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;
    let id = state
        .lifecycle
        .create(create_payload(requester.id))
        .await
        .unwrap()
        .ticket
        .id;

    let first = state
        .lifecycle
        .update(
            id,
            TicketUpdate {
                status: Some(TicketStatus::Resolved),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let resolved_at = first.ticket.resolved_at.expect("resolved_at must be set");

    // Setting resolved again must not move the timestamp
    let second = state
        .lifecycle
        .update(
            id,
            TicketUpdate {
                status: Some(TicketStatus::Resolved),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(second.ticket.resolved_at, Some(resolved_at));
}

#[tokio::test]
async fn update_appends_changed_field_names() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;
    let id = state
        .lifecycle
        .create(create_payload(requester.id))
        .await
        .unwrap()
        .ticket
        .id;

    let detail = state
        .lifecycle
        .update(
            id,
            TicketUpdate {
                subject: Some("Printer on 3rd floor still broken".to_string()),
                priority: Some(Priority::High),
                acting_user_id: Some(requester.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let last = detail.ticket.audit_trail.last().unwrap();
    assert_eq!(last.action, AuditAction::Updated);
    assert_eq!(last.user_id, Some(requester.id));
    let changes = last.payload["changes"].as_array().unwrap();
    assert!(changes.contains(&serde_json::json!("subject")));
    assert!(changes.contains(&serde_json::json!("priority")));
}

#[tokio::test]
async fn anonymous_update_has_null_attribution() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;
    let id = state
        .lifecycle
        .create(create_payload(requester.id))
        .await
        .unwrap()
        .ticket
        .id;

    let detail = state
        .lifecycle
        .update(
            id,
            TicketUpdate {
                sla_violated: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(detail.ticket.audit_trail.last().unwrap().user_id, None);
}

#[tokio::test]
async fn update_with_unknown_technician_is_a_validation_error() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;
    let id = state
        .lifecycle
        .create(create_payload(requester.id))
        .await
        .unwrap()
        .ticket
        .id;

    let err = state
        .lifecycle
        .update(
            id,
            TicketUpdate {
                assigned_technician_id: Some(Some(42)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn update_missing_ticket_is_not_found() {
    let state = test_state(None).await;

    let err = state
        .lifecycle
        .update(12345, TicketUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn close_merges_feedback_and_stamps_closed_at_once() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;
    let id = state
        .lifecycle
        .create(create_payload(requester.id))
        .await
        .unwrap()
        .ticket
        .id;

    let (detail, evaluation) = state
        .lifecycle
        .close(
            id,
            CloseRequest {
                feedback: Some("Solved quickly".to_string()),
                satisfaction_rating: Some(5),
                resolution_notes: Some("Replaced the fuser unit".to_string()),
                acting_user_id: Some(requester.id),
            },
        )
        .await
        .unwrap();

    let ticket = &detail.ticket;
    assert_eq!(ticket.status, TicketStatus::Closed);
    let closed_at = ticket.closed_at.expect("closed_at must be set");
    assert_eq!(ticket.feedback.as_deref(), Some("Solved quickly"));
    assert_eq!(ticket.satisfaction_rating, Some(5));
    assert_eq!(ticket.work_logs.len(), 1);
    assert_eq!(ticket.work_logs[0].notes, "Replaced the fuser unit");
    // No AI service configured: no evaluation result
    assert!(evaluation.is_none());

    // Closing again keeps the original timestamp
    let (again, _) = state
        .lifecycle
        .close(id, CloseRequest::default())
        .await
        .unwrap();
    assert_eq!(again.ticket.closed_at, Some(closed_at));
}

#[tokio::test]
async fn cancel_then_reactivate_resets_to_new() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;
    let id = state
        .lifecycle
        .create(create_payload(requester.id))
        .await
        .unwrap()
        .ticket
        .id;

    let cancelled = state.lifecycle.cancel(id).await.unwrap();
    assert_eq!(cancelled.ticket.status, TicketStatus::Cancelled);
    assert_eq!(
        cancelled.ticket.audit_trail.last().unwrap().action,
        AuditAction::Cancelled
    );

    let reactivated = state.lifecycle.reactivate(id).await.unwrap();
    assert_eq!(reactivated.ticket.status, TicketStatus::New);
    assert_eq!(reactivated.ticket.reopened_count, 1);
    assert_eq!(
        reactivated.ticket.audit_trail.last().unwrap().action,
        AuditAction::Reactivated
    );
}

#[tokio::test]
async fn restricted_policy_limits_reactivate_to_cancelled() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;

    // Same database, stricter policy
    let strict = TicketLifecycle::new(state.db.clone(), None, true);
    let id = strict
        .create(create_payload(requester.id))
        .await
        .unwrap()
        .ticket
        .id;

    let err = strict.reactivate(id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    strict.cancel(id).await.unwrap();
    let detail = strict.reactivate(id).await.unwrap();
    assert_eq!(detail.ticket.status, TicketStatus::New);
}

#[tokio::test]
async fn permanent_delete_removes_the_row() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;
    let id = state
        .lifecycle
        .create(create_payload(requester.id))
        .await
        .unwrap()
        .ticket
        .id;

    assert!(state.lifecycle.delete_permanent(id).await.unwrap());
    assert!(matches!(
        state.lifecycle.get(id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    // Second delete finds nothing
    assert!(!state.lifecycle.delete_permanent(id).await.unwrap());
}

#[tokio::test]
async fn ticket_ids_are_monotonically_increasing() {
    let state = test_state(None).await;
    let requester = seed_user(&state, "Alice", "alice@example.com").await;

    let first = state
        .lifecycle
        .create(create_payload(requester.id))
        .await
        .unwrap()
        .ticket
        .id;
    let second = state
        .lifecycle
        .create(create_payload(requester.id))
        .await
        .unwrap()
        .ticket
        .id;
    assert!(second > first);
}
