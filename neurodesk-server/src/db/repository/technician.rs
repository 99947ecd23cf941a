//! Technician Repository

use super::{BaseRepository, CountRow, RepoError, RepoResult, sort_direction};
use crate::db::models::{
    AvailabilityStatus, SkillLevel, Technician, TechnicianCreate, TechnicianUpdate,
};
use chrono::Utc;
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "technician";

const ALLOWED_SORT_FIELDS: &[&str] = &[
    "id",
    "name",
    "workload",
    "skill_level",
    "availability_status",
    "assigned_tickets_total",
    "created_at",
    "updated_at",
];

#[derive(Clone)]
pub struct TechnicianRepository {
    base: BaseRepository,
}

impl TechnicianRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find technicians with optional filters and pagination
    pub async fn find_page(
        &self,
        availability: Option<AvailabilityStatus>,
        skill_level: Option<SkillLevel>,
        is_active: Option<bool>,
        skill_ids: Vec<i64>,
        page: i64,
        limit: i64,
        sort_by: &str,
        sort_order: &str,
    ) -> RepoResult<(Vec<Technician>, i64)> {
        let mut conditions: Vec<&str> = Vec::new();
        if availability.is_some() {
            conditions.push("availability_status = $availability");
        }
        if skill_level.is_some() {
            conditions.push("skill_level = $skill_level");
        }
        if is_active.is_some() {
            conditions.push("is_active = $is_active");
        }
        if !skill_ids.is_empty() {
            conditions.push("array::len(array::intersect(skills.skill_id, $skill_ids)) > 0");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sort_field = if ALLOWED_SORT_FIELDS.contains(&sort_by) {
            sort_by
        } else {
            "name"
        };
        let direction = sort_direction(sort_order);

        let count_sql = format!("SELECT count() AS count FROM {TABLE}{where_clause} GROUP ALL");
        let select_sql = format!(
            "SELECT * FROM {TABLE}{where_clause} ORDER BY {sort_field} {direction} \
             LIMIT $limit START $start"
        );

        let mut query = self
            .base
            .db()
            .query(count_sql)
            .query(select_sql)
            .bind(("limit", limit))
            .bind(("start", (page - 1).max(0) * limit));
        if let Some(a) = availability {
            query = query.bind(("availability", a));
        }
        if let Some(l) = skill_level {
            query = query.bind(("skill_level", l));
        }
        if let Some(active) = is_active {
            query = query.bind(("is_active", active));
        }
        if !skill_ids.is_empty() {
            query = query.bind(("skill_ids", skill_ids));
        }

        let mut result = query.await?;
        let total: Option<CountRow> = result.take(0)?;
        let technicians: Vec<Technician> = result.take(1)?;
        Ok((technicians, total.map(|c| c.count).unwrap_or(0)))
    }

    /// Find technician by id
    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Technician>> {
        let technician: Option<Technician> = self
            .base
            .db()
            .select(RecordId::from_table_key(TABLE, id))
            .await?;
        Ok(technician)
    }

    /// Directory check used by the assignment flow: active technicians only
    pub async fn exists(&self, id: i64) -> RepoResult<bool> {
        Ok(self.find_by_id(id).await?.is_some_and(|t| t.is_active))
    }

    /// Create a new technician
    pub async fn create(&self, data: TechnicianCreate) -> RepoResult<Technician> {
        let id = self.base.next_id(TABLE).await?;
        let now = Utc::now();

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE type::thing('technician', $id) SET
                    name = $name,
                    user_id = $user_id,
                    skills = $skills,
                    workload = 0,
                    availability_status = $availability_status,
                    skill_level = $skill_level,
                    specialization = $specialization,
                    assigned_tickets_total = 0,
                    assigned_tickets = [],
                    is_active = true,
                    created_at = $now,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("id", id))
            .bind(("name", data.name))
            .bind(("user_id", data.user_id))
            .bind(("skills", data.skills.unwrap_or_default()))
            .bind((
                "availability_status",
                data.availability_status.unwrap_or_default(),
            ))
            .bind(("skill_level", data.skill_level.unwrap_or_default()))
            .bind(("specialization", data.specialization))
            .bind(("now", now))
            .await?;

        let created: Option<Technician> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create technician".to_string()))
    }

    /// Update a technician
    pub async fn update(&self, id: i64, data: TechnicianUpdate) -> RepoResult<Technician> {
        let mut technician = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Technician {id} not found")))?;

        if let Some(name) = data.name {
            technician.name = name;
        }
        if let Some(skills) = data.skills {
            technician.skills = skills;
        }
        if let Some(workload) = data.workload {
            if !(0..=100).contains(&workload) {
                return Err(RepoError::Validation(
                    "workload must be between 0 and 100".to_string(),
                ));
            }
            technician.workload = workload;
        }
        if let Some(availability) = data.availability_status {
            technician.availability_status = availability;
        }
        if let Some(level) = data.skill_level {
            technician.skill_level = level;
        }
        if let Some(specialization) = data.specialization {
            technician.specialization = Some(specialization);
        }
        if let Some(is_active) = data.is_active {
            technician.is_active = is_active;
        }
        technician.updated_at = Utc::now();

        self.save(&technician).await
    }

    /// Soft delete: mark the technician inactive
    pub async fn deactivate(&self, id: i64) -> RepoResult<bool> {
        let mut technician = match self.find_by_id(id).await? {
            Some(t) => t,
            None => return Ok(false),
        };
        technician.is_active = false;
        technician.updated_at = Utc::now();
        self.save(&technician).await?;
        Ok(true)
    }

    async fn save(&self, technician: &Technician) -> RepoResult<Technician> {
        let mut content = serde_json::to_value(technician)
            .map_err(|e| RepoError::Database(format!("Failed to serialize technician: {e}")))?;
        if let Some(obj) = content.as_object_mut() {
            obj.remove("id");
        }

        let mut result = self
            .base
            .db()
            .query("UPDATE type::thing('technician', $id) CONTENT $data RETURN AFTER")
            .bind(("id", technician.id))
            .bind(("data", content))
            .await?;
        let updated: Option<Technician> = result.take(0)?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Technician {} not found", technician.id)))
    }
}
