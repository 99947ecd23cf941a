//! Ticket audit trail
//!
//! Every lifecycle-affecting write appends one (or more) entries to the
//! ticket's embedded `audit_trail` list and never mutates or removes
//! prior entries. Entries are value objects: created once at the moment
//! of the parent action, immutable thereafter, and always persisted in
//! the same row write as the state they describe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 审计操作类型（枚举，非自由文本）
///
/// 序列化后即为 audit_trail 里的 action 字符串。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// 工单创建（种子条目，归属于请求人）
    Created,
    /// 字段更新（payload 带变更字段名列表）
    Updated,
    /// AI 派单成功
    AiAssigned,
    /// AI 派单失败（技师不存在 / 调用出错）
    AiAssignmentFailed,
    /// AI 明确拒绝或响应不可用
    AiNoAssignment,
    /// 工单取消（软删除）
    Cancelled,
    /// 工单重新激活
    Reactivated,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::Created => "created",
            AuditAction::Updated => "updated",
            AuditAction::AiAssigned => "ai_assigned",
            AuditAction::AiAssignmentFailed => "ai_assignment_failed",
            AuditAction::AiNoAssignment => "ai_no_assignment",
            AuditAction::Cancelled => "cancelled",
            AuditAction::Reactivated => "reactivated",
        };
        f.write_str(s)
    }
}

/// 审计日志条目（不可变）
///
/// Serialized shape:
/// `{ action, timestamp, user_id, details, ...payload }`
/// — the payload map is flattened so action-specific fields sit next to
/// the fixed ones, and the whole entry round-trips as-is through the
/// ticket row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub timestamp: DateTime<Utc>,
    /// 操作人（系统动作为 None，序列化为 null）
    pub user_id: Option<i64>,
    pub details: String,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub payload: Map<String, Value>,
}

impl AuditEntry {
    /// Build an entry stamped with the server-side current time
    pub fn new(action: AuditAction, user_id: Option<i64>, details: impl Into<String>) -> Self {
        Self::at(action, user_id, details, Utc::now())
    }

    /// Build an entry with an explicit timestamp
    pub fn at(
        action: AuditAction,
        user_id: Option<i64>,
        details: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            action,
            timestamp,
            user_id,
            details: details.into(),
            payload: Map::new(),
        }
    }

    /// Attach an action-specific payload field
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }
}

/// Copy-append: returns a new list with `entry` at the end.
///
/// The existing list is never mutated in place — the caller swaps the
/// whole list in one persistence write, so an entry and the state it
/// describes commit atomically.
pub fn append(trail: &[AuditEntry], entry: AuditEntry) -> Vec<AuditEntry> {
    let mut next = Vec::with_capacity(trail.len() + 1);
    next.extend_from_slice(trail);
    next.push(entry);
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_grows_by_one_and_keeps_prior_entries() {
        let seed = AuditEntry::new(AuditAction::Created, Some(7), "Ticket created");
        let trail = append(&[], seed.clone());
        assert_eq!(trail.len(), 1);

        let updated = AuditEntry::new(AuditAction::Updated, None, "Ticket updated")
            .with_field("changes", serde_json::json!(["status"]));
        let trail2 = append(&trail, updated);

        assert_eq!(trail2.len(), 2);
        // Prior entry is byte-identical in the new list
        assert_eq!(trail2[0], seed);
        // Source list untouched
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn serialized_shape_has_flattened_payload() {
        let entry = AuditEntry::new(AuditAction::AiAssigned, None, "Assigned by AI service")
            .with_field("justification", "Matches hardware skill")
            .with_field("technician_id", 4);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["action"], "ai_assigned");
        assert_eq!(json["user_id"], serde_json::Value::Null);
        assert_eq!(json["justification"], "Matches hardware skill");
        assert_eq!(json["technician_id"], 4);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn entries_round_trip_through_json() {
        let entry = AuditEntry::new(AuditAction::AiAssignmentFailed, None, "AI call failed")
            .with_field("error", "connection refused");

        let json = serde_json::to_string(&entry).unwrap();
        let back: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn action_tags_serialize_to_snake_case() {
        for (action, tag) in [
            (AuditAction::Created, "created"),
            (AuditAction::Updated, "updated"),
            (AuditAction::AiAssigned, "ai_assigned"),
            (AuditAction::AiAssignmentFailed, "ai_assignment_failed"),
            (AuditAction::AiNoAssignment, "ai_no_assignment"),
            (AuditAction::Cancelled, "cancelled"),
            (AuditAction::Reactivated, "reactivated"),
        ] {
            assert_eq!(serde_json::to_value(action).unwrap(), tag);
            assert_eq!(action.to_string(), tag);
        }
    }
}
