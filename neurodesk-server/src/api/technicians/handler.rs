//! Technician API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::api::pagination::{Pagination, page_params};
use crate::core::ServerState;
use crate::db::models::{
    AvailabilityStatus, SkillLevel, Technician, TechnicianCreate, TechnicianUpdate,
};
use crate::db::repository::{TechnicianRepository, UserRepository};
use crate::api::convert::parse_id_list;
use crate::utils::validation::{MAX_NAME_LEN, MIN_NAME_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct TechnicianListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub availability_status: Option<AvailabilityStatus>,
    #[serde(default)]
    pub skill_level: Option<SkillLevel>,
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Comma-separated skill ids; matches technicians holding ANY
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TechnicianListResponse {
    pub technicians: Vec<Technician>,
    pub pagination: Pagination,
}

/// List technicians with filters and pagination
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<TechnicianListQuery>,
) -> AppResult<Json<TechnicianListResponse>> {
    let (page, limit) = page_params(query.page, query.limit);
    let skill_ids = parse_id_list(&query.skills, "skills")?;

    let repo = TechnicianRepository::new(state.db.clone());
    let (technicians, total) = repo
        .find_page(
            query.availability_status,
            query.skill_level,
            query.is_active,
            skill_ids,
            page,
            limit,
            query.sort_by.as_deref().unwrap_or("name"),
            query.sort_order.as_deref().unwrap_or("asc"),
        )
        .await?;

    Ok(Json(TechnicianListResponse {
        technicians,
        pagination: Pagination::new(total, page, limit),
    }))
}

/// Get technician by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Technician>> {
    let repo = TechnicianRepository::new(state.db.clone());
    let technician = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Technician {id} not found")))?;
    Ok(Json(technician))
}

/// Create a new technician (must reference an existing user)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TechnicianCreate>,
) -> AppResult<(StatusCode, Json<Technician>)> {
    validate_required_text(&payload.name, "name", MIN_NAME_LEN, MAX_NAME_LEN)?;

    let users = UserRepository::new(state.db.clone());
    if !users.exists(payload.user_id).await? {
        return Err(AppError::not_found("Associated user not found"));
    }

    let repo = TechnicianRepository::new(state.db.clone());
    let technician = repo.create(payload).await?;
    Ok((StatusCode::CREATED, Json(technician)))
}

/// Update a technician
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TechnicianUpdate>,
) -> AppResult<Json<Technician>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MIN_NAME_LEN, MAX_NAME_LEN)?;
    }

    let repo = TechnicianRepository::new(state.db.clone());
    let technician = repo.update(id, payload).await?;
    Ok(Json(technician))
}

/// Soft delete (deactivate) a technician
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let repo = TechnicianRepository::new(state.db.clone());
    let deleted = repo.deactivate(id).await?;
    if !deleted {
        return Err(AppError::not_found(format!("Technician {id} not found")));
    }
    Ok(Json(true))
}
