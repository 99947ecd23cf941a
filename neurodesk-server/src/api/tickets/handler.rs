//! Ticket API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::pagination::{Pagination, page_params};
use crate::api::convert::parse_id_list;
use crate::core::ServerState;
use crate::db::models::{Ticket, TicketCreate, TicketDetail, TicketUpdate};
use crate::db::repository::{TicketFilter, TicketRepository};
use crate::tickets::CloseRequest;
use crate::utils::{AppError, AppResult};

// Filter values are validated against the same enum vocabularies the
// models serialize to; anything else is rejected before the query runs.
const ALLOWED_STATUSES: &[&str] = &[
    "new",
    "assigned",
    "in_progress",
    "on_hold",
    "resolved",
    "closed",
    "cancelled",
];
const ALLOWED_PRIORITIES: &[&str] = &["low", "normal", "high", "critical"];
const ALLOWED_IMPACTS: &[&str] = &["low", "medium", "high", "critical"];
const ALLOWED_URGENCIES: &[&str] = &["low", "normal", "high", "critical"];

#[derive(Debug, Default, Deserialize)]
pub struct TicketListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    /// Single value or comma-separated list
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub sla_violated: Option<bool>,
    #[serde(default)]
    pub assigned_technician_id: Option<i64>,
    #[serde(default)]
    pub requester_id: Option<i64>,
    /// Comma-separated skill ids; matches tickets requiring ANY
    #[serde(default)]
    pub required_skills: Option<String>,
    /// Alias used by the by-skills endpoint
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub satisfaction_rating_min: Option<i64>,
    #[serde(default)]
    pub satisfaction_rating_max: Option<i64>,
    #[serde(default)]
    pub created_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub tickets: Vec<TicketDetail>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct TicketSimpleListResponse {
    pub tickets: Vec<TicketDetail>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct CloseTicketResponse {
    pub ticket: TicketDetail,
    /// Result of the external resolution-quality evaluation, when the
    /// AI service is configured and reachable
    pub evaluation: Option<Value>,
}

fn parse_enum_value(
    raw: &Option<String>,
    allowed: &[&str],
    field: &str,
) -> AppResult<Option<String>> {
    match raw {
        Some(value) if allowed.contains(&value.as_str()) => Ok(Some(value.clone())),
        Some(value) => Err(AppError::validation(format!(
            "{field} must be one of {allowed:?} (got '{value}')"
        ))),
        None => Ok(None),
    }
}

fn parse_enum_list(raw: &Option<String>, allowed: &[&str], field: &str) -> AppResult<Vec<String>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|value| {
            if allowed.contains(&value) {
                Ok(value.to_string())
            } else {
                Err(AppError::validation(format!(
                    "{field} must be one of {allowed:?} (got '{value}')"
                )))
            }
        })
        .collect()
}

fn build_filter(query: &TicketListQuery, omit_heavy: bool) -> AppResult<TicketFilter> {
    Ok(TicketFilter {
        status: parse_enum_list(&query.status, ALLOWED_STATUSES, "status")?,
        priority: parse_enum_value(&query.priority, ALLOWED_PRIORITIES, "priority")?,
        urgency: parse_enum_value(&query.urgency, ALLOWED_URGENCIES, "urgency")?,
        impact: parse_enum_value(&query.impact, ALLOWED_IMPACTS, "impact")?,
        sla_violated: query.sla_violated,
        assigned_technician_id: query.assigned_technician_id,
        requester_id: query.requester_id,
        required_skills: parse_id_list(&query.required_skills, "required_skills")?,
        subject: query.subject.clone(),
        description: query.description.clone(),
        search: query.search.clone(),
        satisfaction_rating_min: query.satisfaction_rating_min,
        satisfaction_rating_max: query.satisfaction_rating_max,
        created_from: query.created_from,
        created_to: query.created_to,
        omit_heavy,
    })
}

/// Join requester/technician summaries onto each row of a page
async fn join_details(state: &ServerState, tickets: Vec<Ticket>) -> AppResult<Vec<TicketDetail>> {
    let mut details = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        details.push(state.lifecycle.detail(ticket).await?);
    }
    Ok(details)
}

/// List tickets with the full filter set, sorting and pagination
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<TicketListResponse>> {
    let (page, limit) = page_params(query.page, query.limit);
    let filter = build_filter(&query, false)?;

    let repo = TicketRepository::new(state.db.clone());
    let (tickets, total) = repo
        .search(
            &filter,
            page,
            limit,
            query.sort_by.as_deref().unwrap_or("created_at"),
            query.sort_order.as_deref().unwrap_or("desc"),
        )
        .await?;

    Ok(Json(TicketListResponse {
        tickets: join_details(&state, tickets).await?,
        pagination: Pagination::new(total, page, limit),
    }))
}

/// Simple list: no pagination, heavy embedded lists omitted
pub async fn list_simple(
    State(state): State<ServerState>,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<TicketSimpleListResponse>> {
    let filter = build_filter(&query, true)?;

    let repo = TicketRepository::new(state.db.clone());
    let (tickets, total) = repo
        .search(
            &filter,
            1,
            i64::MAX,
            query.sort_by.as_deref().unwrap_or("created_at"),
            query.sort_order.as_deref().unwrap_or("desc"),
        )
        .await?;

    Ok(Json(TicketSimpleListResponse {
        tickets: join_details(&state, tickets).await?,
        total,
    }))
}

/// List tickets requiring any of the given skills (skills param required)
pub async fn list_by_skills(
    State(state): State<ServerState>,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<TicketListResponse>> {
    let skills = parse_id_list(&query.skills, "skills")?;
    if skills.is_empty() {
        return Err(AppError::validation("skills parameter is required"));
    }

    let (page, limit) = page_params(query.page, query.limit);
    let mut filter = build_filter(&query, true)?;
    filter.required_skills = skills;

    let repo = TicketRepository::new(state.db.clone());
    // High priority first, oldest first within a priority
    let (tickets, total) = repo.search(&filter, page, limit, "priority", "desc").await?;

    Ok(Json(TicketListResponse {
        tickets: join_details(&state, tickets).await?,
        pagination: Pagination::new(total, page, limit),
    }))
}

/// List tickets opened by a user
pub async fn list_by_user(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<TicketListResponse>> {
    let (page, limit) = page_params(query.page, query.limit);
    let mut filter = build_filter(&query, true)?;
    filter.requester_id = Some(user_id);

    let repo = TicketRepository::new(state.db.clone());
    let (tickets, total) = repo.search(&filter, page, limit, "created_at", "desc").await?;

    Ok(Json(TicketListResponse {
        tickets: join_details(&state, tickets).await?,
        pagination: Pagination::new(total, page, limit),
    }))
}

/// List tickets assigned to a technician
pub async fn list_by_technician(
    State(state): State<ServerState>,
    Path(technician_id): Path<i64>,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<TicketListResponse>> {
    let (page, limit) = page_params(query.page, query.limit);
    let mut filter = build_filter(&query, true)?;
    filter.assigned_technician_id = Some(technician_id);

    let repo = TicketRepository::new(state.db.clone());
    let (tickets, total) = repo.search(&filter, page, limit, "created_at", "desc").await?;

    Ok(Json(TicketListResponse {
        tickets: join_details(&state, tickets).await?,
        pagination: Pagination::new(total, page, limit),
    }))
}

/// Get ticket by id (full row, joined)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TicketDetail>> {
    Ok(Json(state.lifecycle.get(id).await?))
}

/// Create a ticket. Returns 201 with the joined row; AI assignment
/// outcomes (when triggered) are already folded into the audit trail.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TicketCreate>,
) -> AppResult<(StatusCode, Json<TicketDetail>)> {
    let detail = state.lifecycle.create(payload).await?;
    tracing::info!(ticket_id = detail.ticket.id, "Ticket created");
    Ok((StatusCode::CREATED, Json(detail)))
}

/// General partial update
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TicketUpdate>,
) -> AppResult<Json<TicketDetail>> {
    Ok(Json(state.lifecycle.update(id, payload).await?))
}

/// Close with feedback; the evaluation result (if any) rides along
pub async fn close(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CloseRequest>,
) -> AppResult<Json<CloseTicketResponse>> {
    let (ticket, evaluation) = state.lifecycle.close(id, payload).await?;
    Ok(Json(CloseTicketResponse { ticket, evaluation }))
}

/// Soft delete: cancel the ticket, keep the row
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TicketDetail>> {
    Ok(Json(state.lifecycle.cancel(id).await?))
}

/// Irreversible removal
pub async fn delete_permanent(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let deleted = state.lifecycle.delete_permanent(id).await?;
    if !deleted {
        return Err(AppError::not_found(format!("Ticket {id} not found")));
    }
    Ok(Json(true))
}

/// Reset a ticket back to `new`
pub async fn reactivate(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TicketDetail>> {
    Ok(Json(state.lifecycle.reactivate(id).await?))
}
