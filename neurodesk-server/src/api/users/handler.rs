//! User API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::api::pagination::{Pagination, page_params};
use crate::core::ServerState;
use crate::db::models::{User, UserCreate, UserRole, UserUpdate};
use crate::db::repository::UserRepository;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PASSWORD_LEN, MIN_NAME_LEN, MIN_PASSWORD_LEN,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

/// List users with filters and pagination
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<UserListResponse>> {
    let (page, limit) = page_params(query.page, query.limit);
    let repo = UserRepository::new(state.db.clone());
    let (users, total) = repo
        .find_page(
            query.role,
            query.status,
            query.search,
            page,
            limit,
            query.sort_by.as_deref().unwrap_or("created_at"),
            query.sort_order.as_deref().unwrap_or("desc"),
        )
        .await?;

    Ok(Json(UserListResponse {
        users,
        pagination: Pagination::new(total, page, limit),
    }))
}

/// Get user by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
    Ok(Json(user))
}

/// Create a new user
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<UserCreate>,
) -> AppResult<(StatusCode, Json<User>)> {
    validate_required_text(&payload.name, "name", MIN_NAME_LEN, MAX_NAME_LEN)?;
    validate_required_text(&payload.email, "email", 3, MAX_EMAIL_LEN)?;
    if !payload.email.contains('@') {
        return Err(AppError::validation("email must be a valid address"));
    }
    validate_required_text(
        &payload.password,
        "password",
        MIN_PASSWORD_LEN,
        MAX_PASSWORD_LEN,
    )?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update a user
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MIN_NAME_LEN, MAX_NAME_LEN)?;
    }
    if let Some(password) = &payload.password {
        validate_required_text(password, "password", MIN_PASSWORD_LEN, MAX_PASSWORD_LEN)?;
    }

    let repo = UserRepository::new(state.db.clone());
    let user = repo.update(id, payload).await?;
    Ok(Json(user))
}

/// Soft delete (deactivate) a user
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let repo = UserRepository::new(state.db.clone());
    let deleted = repo.deactivate(id).await?;
    if !deleted {
        return Err(AppError::not_found(format!("User {id} not found")));
    }
    Ok(Json(true))
}
