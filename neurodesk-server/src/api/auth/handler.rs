//! Authentication Handlers
//!
//! Registration and credential verification only — no session or token
//! issuance happens here.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::{User, UserCreate};
use crate::db::repository::UserRepository;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PASSWORD_LEN, MIN_NAME_LEN, MIN_PASSWORD_LEN,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// Register a new user
pub async fn register(
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

    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login handler — verifies credentials and returns the user profile
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<User>> {
    let repo = UserRepository::new(state.db.clone());

    // Unified error message to prevent email enumeration
    let user = repo
        .find_by_email(&req.email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !user.status {
        return Err(AppError::forbidden("Account is deactivated"));
    }

    let password_valid = user
        .verify_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;

    if !password_valid {
        tracing::warn!(email = %req.email, "Login failed - invalid credentials");
        return Err(AppError::invalid_credentials());
    }

    Ok(Json(user))
}
