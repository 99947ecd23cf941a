//! User Repository

use super::{BaseRepository, CountRow, RepoError, RepoResult, sort_direction};
use crate::db::models::{User, UserCreate, UserRole, UserUpdate};
use chrono::Utc;
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "user";

/// Sortable columns for user listings
const ALLOWED_SORT_FIELDS: &[&str] = &["id", "name", "email", "role", "created_at", "updated_at"];

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find users with optional role/status filters and pagination
    pub async fn find_page(
        &self,
        role: Option<UserRole>,
        status: Option<bool>,
        search: Option<String>,
        page: i64,
        limit: i64,
        sort_by: &str,
        sort_order: &str,
    ) -> RepoResult<(Vec<User>, i64)> {
        let mut conditions: Vec<&str> = Vec::new();
        if role.is_some() {
            conditions.push("role = $role");
        }
        if status.is_some() {
            conditions.push("status = $status");
        }
        if search.is_some() {
            conditions.push(
                "(string::contains(string::lowercase(name), string::lowercase($search)) \
                 OR string::contains(string::lowercase(email), string::lowercase($search)))",
            );
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sort_field = if ALLOWED_SORT_FIELDS.contains(&sort_by) {
            sort_by
        } else {
            "created_at"
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
        if let Some(r) = role {
            query = query.bind(("role", r));
        }
        if let Some(s) = status {
            query = query.bind(("status", s));
        }
        if let Some(s) = search {
            query = query.bind(("search", s));
        }

        let mut result = query.await?;
        let total: Option<CountRow> = result.take(0)?;
        let users: Vec<User> = result.take(1)?;
        Ok((users, total.map(|c| c.count).unwrap_or(0)))
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        let user: Option<User> = self
            .base
            .db()
            .select(RecordId::from_table_key(TABLE, id))
            .await?;
        Ok(user)
    }

    /// Directory check: does this user exist and is it active?
    pub async fn exists(&self, id: i64) -> RepoResult<bool> {
        Ok(self.find_by_id(id).await?.is_some_and(|u| u.status))
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email_owned = email.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Create a new user
    pub async fn create(&self, data: UserCreate) -> RepoResult<User> {
        // Check duplicate email
        if self.find_by_email(&data.email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "User with email '{}' already exists",
                data.email
            )));
        }

        let password_hash = User::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?;

        let id = self.base.next_id(TABLE).await?;
        let now = Utc::now();

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE type::thing('user', $id) SET
                    name = $name,
                    email = $email,
                    password_hash = $password_hash,
                    contact_no = $contact_no,
                    role = $role,
                    department = $department,
                    status = true,
                    created_at = $now,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("id", id))
            .bind(("name", data.name))
            .bind(("email", data.email))
            .bind(("password_hash", password_hash))
            .bind(("contact_no", data.contact_no))
            .bind(("role", data.role.unwrap_or_default()))
            .bind(("department", data.department))
            .bind(("now", now))
            .await?;

        let created: Option<User> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Update a user
    pub async fn update(&self, id: i64, data: UserUpdate) -> RepoResult<User> {
        let mut user = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))?;

        if let Some(email) = &data.email
            && *email != user.email
            && self.find_by_email(email).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "User with email '{email}' already exists"
            )));
        }

        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(password) = data.password {
            user.password_hash = User::hash_password(&password)
                .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?;
        }
        if let Some(contact_no) = data.contact_no {
            user.contact_no = Some(contact_no);
        }
        if let Some(role) = data.role {
            user.role = role;
        }
        if let Some(department) = data.department {
            user.department = Some(department);
        }
        if let Some(status) = data.status {
            user.status = status;
        }
        user.updated_at = Utc::now();

        self.save(&user).await
    }

    /// Soft delete: mark the account inactive
    pub async fn deactivate(&self, id: i64) -> RepoResult<bool> {
        let mut user = match self.find_by_id(id).await? {
            Some(u) => u,
            None => return Ok(false),
        };
        user.status = false;
        user.updated_at = Utc::now();
        self.save(&user).await?;
        Ok(true)
    }

    /// Write the full row back (password hash included)
    async fn save(&self, user: &User) -> RepoResult<User> {
        // serde skips password_hash on serialize; bind it separately
        let mut content = serde_json::to_value(user)
            .map_err(|e| RepoError::Database(format!("Failed to serialize user: {e}")))?;
        if let Some(obj) = content.as_object_mut() {
            obj.remove("id");
            obj.insert(
                "password_hash".to_string(),
                serde_json::Value::String(user.password_hash.clone()),
            );
        }

        let mut result = self
            .base
            .db()
            .query("UPDATE type::thing('user', $id) CONTENT $data RETURN AFTER")
            .bind(("id", user.id))
            .bind(("data", content))
            .await?;
        let updated: Option<User> = result.take(0)?;
        updated.ok_or_else(|| RepoError::NotFound(format!("User {} not found", user.id)))
    }
}
