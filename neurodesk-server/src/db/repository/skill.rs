//! Skill Repository

use super::{BaseRepository, RepoError, RepoResult, sort_direction};
use crate::db::models::{Skill, SkillCreate, SkillUpdate};
use chrono::Utc;
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "skill";

const ALLOWED_SORT_FIELDS: &[&str] = &["id", "name", "is_active", "created_at", "updated_at"];

#[derive(Clone)]
pub struct SkillRepository {
    base: BaseRepository,
}

impl SkillRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// List skills, optionally filtered by active flag
    pub async fn find_all(
        &self,
        is_active: Option<bool>,
        sort_by: &str,
        sort_order: &str,
    ) -> RepoResult<Vec<Skill>> {
        let where_clause = if is_active.is_some() {
            " WHERE is_active = $is_active"
        } else {
            ""
        };
        let sort_field = if ALLOWED_SORT_FIELDS.contains(&sort_by) {
            sort_by
        } else {
            "name"
        };
        let direction = sort_direction(sort_order);

        let sql = format!("SELECT * FROM {TABLE}{where_clause} ORDER BY {sort_field} {direction}");
        let mut query = self.base.db().query(sql);
        if let Some(active) = is_active {
            query = query.bind(("is_active", active));
        }

        let skills: Vec<Skill> = query.await?.take(0)?;
        Ok(skills)
    }

    /// Find skill by id
    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Skill>> {
        let skill: Option<Skill> = self
            .base
            .db()
            .select(RecordId::from_table_key(TABLE, id))
            .await?;
        Ok(skill)
    }

    /// Find skill by name (names are unique)
    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<Skill>> {
        let name_owned = name.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM skill WHERE name = $name LIMIT 1")
            .bind(("name", name_owned))
            .await?;
        let skills: Vec<Skill> = result.take(0)?;
        Ok(skills.into_iter().next())
    }

    /// Create a new skill
    pub async fn create(&self, data: SkillCreate) -> RepoResult<Skill> {
        if self.find_by_name(&data.name).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Skill '{}' already exists",
                data.name
            )));
        }

        let id = self.base.next_id(TABLE).await?;
        let now = Utc::now();

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE type::thing('skill', $id) SET
                    name = $name,
                    description = $description,
                    is_active = true,
                    created_at = $now,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("id", id))
            .bind(("name", data.name))
            .bind(("description", data.description))
            .bind(("now", now))
            .await?;

        let created: Option<Skill> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create skill".to_string()))
    }

    /// Update a skill
    pub async fn update(&self, id: i64, data: SkillUpdate) -> RepoResult<Skill> {
        let mut skill = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Skill {id} not found")))?;

        if let Some(name) = &data.name
            && *name != skill.name
            && self.find_by_name(name).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!("Skill '{name}' already exists")));
        }

        if let Some(name) = data.name {
            skill.name = name;
        }
        if let Some(description) = data.description {
            skill.description = Some(description);
        }
        if let Some(is_active) = data.is_active {
            skill.is_active = is_active;
        }
        skill.updated_at = Utc::now();

        let mut content = serde_json::to_value(&skill)
            .map_err(|e| RepoError::Database(format!("Failed to serialize skill: {e}")))?;
        if let Some(obj) = content.as_object_mut() {
            obj.remove("id");
        }

        let mut result = self
            .base
            .db()
            .query("UPDATE type::thing('skill', $id) CONTENT $data RETURN AFTER")
            .bind(("id", skill.id))
            .bind(("data", content))
            .await?;
        let updated: Option<Skill> = result.take(0)?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Skill {id} not found")))
    }

    /// Soft delete: mark the skill inactive
    pub async fn deactivate(&self, id: i64) -> RepoResult<bool> {
        match self.find_by_id(id).await? {
            Some(_) => {
                self.update(
                    id,
                    SkillUpdate {
                        is_active: Some(false),
                        ..Default::default()
                    },
                )
                .await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
