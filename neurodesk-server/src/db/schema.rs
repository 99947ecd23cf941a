//! Schema definitions for the embedded SurrealDB store.
//!
//! Tables are SCHEMALESS — the Rust models own the row shape — with
//! indexes on the columns the filtered list endpoints hit. `seq` holds
//! one counter record per table for monotonically increasing integer
//! record ids.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const SCHEMA: &str = "\
DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
DEFINE INDEX IF NOT EXISTS idx_user_email ON TABLE user COLUMNS email UNIQUE;

DEFINE TABLE IF NOT EXISTS skill SCHEMALESS;
DEFINE INDEX IF NOT EXISTS idx_skill_name ON TABLE skill COLUMNS name UNIQUE;

DEFINE TABLE IF NOT EXISTS technician SCHEMALESS;
DEFINE INDEX IF NOT EXISTS idx_technician_user ON TABLE technician COLUMNS user_id;

DEFINE TABLE IF NOT EXISTS ticket SCHEMALESS;
DEFINE INDEX IF NOT EXISTS idx_ticket_status ON TABLE ticket COLUMNS status;
DEFINE INDEX IF NOT EXISTS idx_ticket_requester ON TABLE ticket COLUMNS requester_id;
DEFINE INDEX IF NOT EXISTS idx_ticket_technician ON TABLE ticket COLUMNS assigned_technician_id;
DEFINE INDEX IF NOT EXISTS idx_ticket_created ON TABLE ticket COLUMNS created_at;

DEFINE TABLE IF NOT EXISTS seq SCHEMALESS;
";

/// Apply the schema (idempotent — every statement is IF NOT EXISTS)
pub async fn apply(db: &Surreal<Db>) -> Result<(), surrealdb::Error> {
    db.query(SCHEMA).await?.check()?;
    Ok(())
}
