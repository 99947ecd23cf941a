//! Database Module
//!
//! Handles the embedded SurrealDB instance and schema initialization.

pub mod models;
pub mod repository;
pub mod schema;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

/// Namespace / database names for the embedded store
const DB_NAMESPACE: &str = "neurodesk";
const DB_NAME: &str = "main";

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the on-disk database at `db_path` and apply the schema
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        Self::initialize(db).await
    }

    /// Open an in-memory database (tests, throwaway environments)
    pub async fn open_in_memory() -> Result<Self, AppError> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;

        Self::initialize(db).await
    }

    async fn initialize(db: Surreal<Db>) -> Result<Self, AppError> {
        db.use_ns(DB_NAMESPACE)
            .use_db(DB_NAME)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        schema::apply(&db)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;

        tracing::info!("Database ready (SurrealDB, ns={DB_NAMESPACE} db={DB_NAME})");

        Ok(Self { db })
    }
}
