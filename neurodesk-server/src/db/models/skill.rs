//! Skill Model

use super::serde_helpers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Skill model matching the `skill` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    #[serde(with = "serde_helpers::record_key")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(
        default = "serde_helpers::default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create skill payload
#[derive(Debug, Clone, Deserialize)]
pub struct SkillCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Update skill payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}
