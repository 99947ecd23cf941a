//! Technician Model

use super::serde_helpers;
use super::user::UserSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Technician availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    #[default]
    Available,
    Busy,
    InMeeting,
    OnBreak,
    EndOfShift,
    FocusMode,
}

/// Technician seniority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    #[default]
    Junior,
    Mid,
    Senior,
    Expert,
}

/// One skill a technician holds, with proficiency 0-100
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicianSkill {
    pub skill_id: i64,
    pub percentage: i64,
}

/// Technician model matching the `technician` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    #[serde(with = "serde_helpers::record_key")]
    pub id: i64,
    pub name: String,
    pub user_id: i64,
    #[serde(default)]
    pub skills: Vec<TechnicianSkill>,
    /// Current workload, 0-100
    #[serde(default)]
    pub workload: i64,
    #[serde(default)]
    pub availability_status: AvailabilityStatus,
    #[serde(default)]
    pub skill_level: SkillLevel,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub assigned_tickets_total: i64,
    #[serde(default)]
    pub assigned_tickets: Vec<i64>,
    #[serde(
        default = "serde_helpers::default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create technician payload
#[derive(Debug, Clone, Deserialize)]
pub struct TechnicianCreate {
    pub name: String,
    pub user_id: i64,
    #[serde(default)]
    pub skills: Option<Vec<TechnicianSkill>>,
    #[serde(default)]
    pub availability_status: Option<AvailabilityStatus>,
    #[serde(default)]
    pub skill_level: Option<SkillLevel>,
    #[serde(default)]
    pub specialization: Option<String>,
}

/// Update technician payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TechnicianUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<TechnicianSkill>>,
    #[serde(default)]
    pub workload: Option<i64>,
    #[serde(default)]
    pub availability_status: Option<AvailabilityStatus>,
    #[serde(default)]
    pub skill_level: Option<SkillLevel>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Slim technician view joined into ticket responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicianSummary {
    pub id: i64,
    pub name: String,
    pub skill_level: SkillLevel,
    pub availability_status: AvailabilityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl Technician {
    /// Slim view for embedding in ticket responses
    pub fn summary(&self, user: Option<UserSummary>) -> TechnicianSummary {
        TechnicianSummary {
            id: self.id,
            name: self.name.clone(),
            skill_level: self.skill_level,
            availability_status: self.availability_status,
            user,
        }
    }
}
