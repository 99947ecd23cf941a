//! Repository Module
//!
//! Provides CRUD and filtered-query operations over the embedded
//! SurrealDB tables. Handlers never touch the database directly.

pub mod skill;
pub mod technician;
pub mod ticket;
pub mod user;

// Re-exports
pub use skill::SkillRepository;
pub use technician::TechnicianRepository;
pub use ticket::{TicketFilter, TicketRepository};
pub use user::UserRepository;

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for crate::utils::AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => crate::utils::AppError::NotFound(msg),
            RepoError::Duplicate(msg) => crate::utils::AppError::Conflict(msg),
            RepoError::Validation(msg) => crate::utils::AppError::Validation(msg),
            RepoError::Database(msg) => crate::utils::AppError::Database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全表统一使用数字主键 "table:⟨i64⟩"
// =============================================================================
//
// 每个表在 seq 表里有一条计数记录，UPSERT .. SET n += 1 原子递增，
// 保证 id 单调且并发安全。模型侧只见 i64 (见 models::serde_helpers)。

/// Row shape of a `seq` counter record
#[derive(Debug, Deserialize)]
struct SeqRow {
    n: i64,
}

/// Row shape of a `count() GROUP ALL` aggregate
#[derive(Debug, Deserialize)]
pub(crate) struct CountRow {
    pub count: i64,
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }

    /// Allocate the next integer id for `table` (atomic increment)
    pub async fn next_id(&self, table: &str) -> RepoResult<i64> {
        let mut result = self
            .db
            .query("UPSERT type::thing('seq', $tb) SET n += 1 RETURN AFTER")
            .bind(("tb", table.to_string()))
            .await?;
        let seq: Option<SeqRow> = result.take(0)?;
        seq.map(|s| s.n)
            .ok_or_else(|| RepoError::Database(format!("Failed to allocate id for {table}")))
    }
}

/// Sanitize a sort direction (defaults to DESC)
pub(crate) fn sort_direction(sort_order: &str) -> &'static str {
    if sort_order.eq_ignore_ascii_case("asc") {
        "ASC"
    } else {
        "DESC"
    }
}
