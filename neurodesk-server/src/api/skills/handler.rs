//! Skill API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::{Skill, SkillCreate, SkillUpdate};
use crate::db::repository::SkillRepository;
use crate::utils::validation::{MAX_NAME_LEN, MIN_NAME_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct SkillListQuery {
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

/// List skills
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<SkillListQuery>,
) -> AppResult<Json<Vec<Skill>>> {
    let repo = SkillRepository::new(state.db.clone());
    let skills = repo
        .find_all(
            query.is_active,
            query.sort_by.as_deref().unwrap_or("name"),
            query.sort_order.as_deref().unwrap_or("asc"),
        )
        .await?;
    Ok(Json(skills))
}

/// Get skill by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Skill>> {
    let repo = SkillRepository::new(state.db.clone());
    let skill = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Skill {id} not found")))?;
    Ok(Json(skill))
}

/// Create a new skill
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<SkillCreate>,
) -> AppResult<(StatusCode, Json<Skill>)> {
    validate_required_text(&payload.name, "name", MIN_NAME_LEN, MAX_NAME_LEN)?;

    let repo = SkillRepository::new(state.db.clone());
    let skill = repo.create(payload).await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

/// Update a skill
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<SkillUpdate>,
) -> AppResult<Json<Skill>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MIN_NAME_LEN, MAX_NAME_LEN)?;
    }

    let repo = SkillRepository::new(state.db.clone());
    let skill = repo.update(id, payload).await?;
    Ok(Json(skill))
}

/// Soft delete (deactivate) a skill
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let repo = SkillRepository::new(state.db.clone());
    let deleted = repo.deactivate(id).await?;
    if !deleted {
        return Err(AppError::not_found(format!("Skill {id} not found")));
    }
    Ok(Json(true))
}
