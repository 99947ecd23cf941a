//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Limits match the relational schema the dashboard was built against:
//! subject is a VARCHAR(500), justification and feedback are capped at
//! 1000 chars, satisfaction is a 1-5 star rating, score is a 0.0-10.0
//! quality metric.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Ticket subject: 5..=500 chars
pub const MIN_SUBJECT_LEN: usize = 5;
pub const MAX_SUBJECT_LEN: usize = 500;

/// Ticket description: at least 10 chars
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// Justification / feedback free text
pub const MAX_JUSTIFICATION_LEN: usize = 1000;
pub const MAX_FEEDBACK_LEN: usize = 1000;

/// Entity names: user, skill, technician
pub const MAX_NAME_LEN: usize = 255;
pub const MIN_NAME_LEN: usize = 2;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limits.
pub fn validate_required_text(
    value: &str,
    field: &str,
    min_len: usize,
    max_len: usize,
) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() < min_len {
        return Err(AppError::validation(format!(
            "{field} must be at least {min_len} characters"
        )));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate a ticket subject (required, 5-500 chars).
pub fn validate_subject(subject: &str) -> Result<(), AppError> {
    validate_required_text(subject, "subject", MIN_SUBJECT_LEN, MAX_SUBJECT_LEN)
}

/// Validate a ticket description (required, >= 10 chars).
pub fn validate_description(description: &str) -> Result<(), AppError> {
    validate_required_text(description, "description", MIN_DESCRIPTION_LEN, usize::MAX)
}

/// Validate an optional quality score (0.0-10.0).
pub fn validate_score(score: Option<f64>) -> Result<(), AppError> {
    if let Some(s) = score
        && !(0.0..=10.0).contains(&s)
    {
        return Err(AppError::validation(format!(
            "score must be between 0.0 and 10.0 (got {s})"
        )));
    }
    Ok(())
}

/// Validate an optional satisfaction rating (1-5).
pub fn validate_satisfaction_rating(rating: Option<i64>) -> Result<(), AppError> {
    if let Some(r) = rating
        && !(1..=5).contains(&r)
    {
        return Err(AppError::validation(format!(
            "satisfaction_rating must be between 1 and 5 (got {r})"
        )));
    }
    Ok(())
}

/// Validate a required-skill id list (each id must be a positive integer).
pub fn validate_required_skills(skills: &[i64]) -> Result<(), AppError> {
    for skill_id in skills {
        if *skill_id < 1 {
            return Err(AppError::validation(
                "required_skills must be an array of positive integers",
            ));
        }
    }
    Ok(())
}
