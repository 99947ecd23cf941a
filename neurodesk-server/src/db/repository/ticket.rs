//! Ticket Repository
//!
//! Whole-row reads and writes: the audit trail, tasks and work logs are
//! embedded in the row, so every persistence write carries them together
//! with the scalar fields (an audit entry commits atomically with the
//! state it describes). Serializing writes per ticket is the caller's
//! job — see `tickets::TicketLocks`.

use super::{BaseRepository, CountRow, RepoError, RepoResult, sort_direction};
use crate::db::models::Ticket;
use chrono::{DateTime, Utc};
use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "ticket";

/// Sortable columns, mirrored by the list endpoints' validation
pub const ALLOWED_SORT_FIELDS: &[&str] = &[
    "id",
    "subject",
    "status",
    "priority",
    "urgency",
    "impact",
    "sla_violated",
    "escalation_count",
    "satisfaction_rating",
    "score",
    "created_at",
    "updated_at",
    "resolution_due",
];

/// Filter set for ticket searches. All fields are optional and AND-ed;
/// `required_skills` matches tickets needing ANY of the given skills.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Vec<String>,
    pub priority: Option<String>,
    pub urgency: Option<String>,
    pub impact: Option<String>,
    pub sla_violated: Option<bool>,
    pub assigned_technician_id: Option<i64>,
    pub requester_id: Option<i64>,
    pub required_skills: Vec<i64>,
    pub subject: Option<String>,
    pub description: Option<String>,
    /// Global search across subject and description
    pub search: Option<String>,
    pub satisfaction_rating_min: Option<i64>,
    pub satisfaction_rating_max: Option<i64>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    /// Exclude the large embedded lists (simple list views)
    pub omit_heavy: bool,
}

#[derive(Clone)]
pub struct TicketRepository {
    base: BaseRepository,
}

impl TicketRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Allocate the next ticket id
    pub async fn next_id(&self) -> RepoResult<i64> {
        self.base.next_id(TABLE).await
    }

    /// Insert a fully built ticket row under its pre-allocated id
    pub async fn insert(&self, ticket: &Ticket) -> RepoResult<Ticket> {
        let content = Self::row_content(ticket)?;
        let mut result = self
            .base
            .db()
            .query("CREATE type::thing('ticket', $id) CONTENT $data RETURN AFTER")
            .bind(("id", ticket.id))
            .bind(("data", content))
            .await?;
        let created: Option<Ticket> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create ticket".to_string()))
    }

    /// Find ticket by id (full row)
    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Ticket>> {
        let ticket: Option<Ticket> = self
            .base
            .db()
            .select(RecordId::from_table_key(TABLE, id))
            .await?;
        Ok(ticket)
    }

    /// Write the full row back
    pub async fn save(&self, ticket: &Ticket) -> RepoResult<Ticket> {
        let content = Self::row_content(ticket)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE type::thing('ticket', $id) CONTENT $data RETURN AFTER")
            .bind(("id", ticket.id))
            .bind(("data", content))
            .await?;
        let updated: Option<Ticket> = result.take(0)?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Ticket {} not found", ticket.id)))
    }

    /// Irreversible row removal (bypasses the audit trail by nature —
    /// there is no row left to append to)
    pub async fn delete_permanent(&self, id: i64) -> RepoResult<bool> {
        let deleted: Option<Ticket> = self
            .base
            .db()
            .delete(RecordId::from_table_key(TABLE, id))
            .await?;
        Ok(deleted.is_some())
    }

    /// Filtered, sorted, paginated search. Returns (rows, total).
    pub async fn search(
        &self,
        filter: &TicketFilter,
        page: i64,
        limit: i64,
        sort_by: &str,
        sort_order: &str,
    ) -> RepoResult<(Vec<Ticket>, i64)> {
        let mut conditions: Vec<&str> = Vec::new();
        if !filter.status.is_empty() {
            conditions.push("status IN $status");
        }
        if filter.priority.is_some() {
            conditions.push("priority = $priority");
        }
        if filter.urgency.is_some() {
            conditions.push("urgency = $urgency");
        }
        if filter.impact.is_some() {
            conditions.push("impact = $impact");
        }
        if filter.sla_violated.is_some() {
            conditions.push("sla_violated = $sla_violated");
        }
        if filter.assigned_technician_id.is_some() {
            conditions.push("assigned_technician_id = $assigned_technician_id");
        }
        if filter.requester_id.is_some() {
            conditions.push("requester_id = $requester_id");
        }
        if !filter.required_skills.is_empty() {
            conditions.push("array::len(array::intersect(required_skills, $skills)) > 0");
        }
        if filter.subject.is_some() {
            conditions.push("string::contains(string::lowercase(subject), string::lowercase($subject))");
        }
        if filter.description.is_some() {
            conditions
                .push("string::contains(string::lowercase(description), string::lowercase($description))");
        }
        if filter.search.is_some() {
            conditions.push(
                "(string::contains(string::lowercase(subject), string::lowercase($search)) \
                 OR string::contains(string::lowercase(description), string::lowercase($search)))",
            );
        }
        if filter.satisfaction_rating_min.is_some() {
            conditions.push("satisfaction_rating >= $rating_min");
        }
        if filter.satisfaction_rating_max.is_some() {
            conditions.push("satisfaction_rating <= $rating_max");
        }
        if filter.created_from.is_some() {
            conditions.push("created_at >= $created_from");
        }
        if filter.created_to.is_some() {
            conditions.push("created_at <= $created_to");
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
        let omit = if filter.omit_heavy {
            " OMIT tasks, work_logs, audit_trail"
        } else {
            ""
        };

        let count_sql = format!("SELECT count() AS count FROM {TABLE}{where_clause} GROUP ALL");
        // Priority is an enum; sort it by severity rank, not lexically
        let select_sql = if sort_field == "priority" {
            format!(
                "SELECT *, array::find_index(['low','normal','high','critical'], priority) \
                 AS priority_rank{omit} FROM {TABLE}{where_clause} \
                 ORDER BY priority_rank {direction}, created_at ASC LIMIT $limit START $start"
            )
        } else {
            format!(
                "SELECT *{omit} FROM {TABLE}{where_clause} ORDER BY {sort_field} {direction} \
                 LIMIT $limit START $start"
            )
        };

        let mut query = self
            .base
            .db()
            .query(count_sql)
            .query(select_sql)
            .bind(("limit", limit))
            .bind(("start", (page - 1).max(0) * limit));

        if !filter.status.is_empty() {
            query = query.bind(("status", filter.status.clone()));
        }
        if let Some(p) = &filter.priority {
            query = query.bind(("priority", p.clone()));
        }
        if let Some(u) = &filter.urgency {
            query = query.bind(("urgency", u.clone()));
        }
        if let Some(i) = &filter.impact {
            query = query.bind(("impact", i.clone()));
        }
        if let Some(s) = filter.sla_violated {
            query = query.bind(("sla_violated", s));
        }
        if let Some(t) = filter.assigned_technician_id {
            query = query.bind(("assigned_technician_id", t));
        }
        if let Some(r) = filter.requester_id {
            query = query.bind(("requester_id", r));
        }
        if !filter.required_skills.is_empty() {
            query = query.bind(("skills", filter.required_skills.clone()));
        }
        if let Some(s) = &filter.subject {
            query = query.bind(("subject", s.clone()));
        }
        if let Some(d) = &filter.description {
            query = query.bind(("description", d.clone()));
        }
        if let Some(s) = &filter.search {
            query = query.bind(("search", s.clone()));
        }
        if let Some(min) = filter.satisfaction_rating_min {
            query = query.bind(("rating_min", min));
        }
        if let Some(max) = filter.satisfaction_rating_max {
            query = query.bind(("rating_max", max));
        }
        if let Some(from) = filter.created_from {
            query = query.bind(("created_from", from));
        }
        if let Some(to) = filter.created_to {
            query = query.bind(("created_to", to));
        }

        let mut result = query.await?;
        let total: Option<CountRow> = result.take(0)?;
        let tickets: Vec<Ticket> = result.take(1)?;
        Ok((tickets, total.map(|c| c.count).unwrap_or(0)))
    }

    /// Serialize a ticket to row content (record id lives in the key,
    /// not the row body)
    fn row_content(ticket: &Ticket) -> RepoResult<serde_json::Value> {
        let mut content = serde_json::to_value(ticket)
            .map_err(|e| RepoError::Database(format!("Failed to serialize ticket: {e}")))?;
        if let Some(obj) = content.as_object_mut() {
            obj.remove("id");
        }
        Ok(content)
    }
}
