//! Shared query-parameter conversions

use crate::utils::{AppError, AppResult};

/// Parse a comma-separated positive-integer id list ("1,2,3")
pub fn parse_id_list(raw: &Option<String>, field: &str) -> AppResult<Vec<i64>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .ok()
                .filter(|id| *id >= 1)
                .ok_or_else(|| AppError::validation(format!("{field} must be positive integers")))
        })
        .collect()
}
