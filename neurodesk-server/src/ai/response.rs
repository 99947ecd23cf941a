//! Tolerant decoding of the assignment service's response body
//!
//! The wire contract is loose: the success flag and the technician id
//! each appear under one of two field names depending on the service
//! version. The decoder tries the alternatives in a fixed priority
//! order and falls back to [`AiAssignment::Unusable`] instead of ever
//! raising on an unrecognized shape. An explicit success=false wins
//! over a technician id that may also be present.

use serde_json::Value;

/// Field-name alternatives, in priority order
const SUCCESS_FIELDS: &[&str] = &["success", "assigned"];
const TECHNICIAN_FIELDS: &[&str] = &["selected_technician_id", "technician_id"];
const REASON_FIELDS: &[&str] = &["error_message", "error", "message"];

/// Decoded assignment response
#[derive(Debug, Clone, PartialEq)]
pub enum AiAssignment {
    /// The service named a technician (existence still unverified)
    Assigned {
        technician_id: i64,
        justification: Option<String>,
    },
    /// The service explicitly signaled failure
    Declined { reason: String, raw: Value },
    /// No recognizable technician id in the response
    Unusable { raw: Value },
}

/// Decode a 2xx response body. Never fails.
pub fn decode_assignment(raw: Value) -> AiAssignment {
    if field_bool(&raw, SUCCESS_FIELDS) == Some(false) {
        let reason = field_str(&raw, REASON_FIELDS)
            .unwrap_or("assignment declined")
            .to_string();
        return AiAssignment::Declined { reason, raw };
    }

    match field_i64(&raw, TECHNICIAN_FIELDS) {
        Some(id) if id > 0 => AiAssignment::Assigned {
            technician_id: id,
            justification: field_str(&raw, &["justification"])
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
        },
        _ => AiAssignment::Unusable { raw },
    }
}

fn field_bool(raw: &Value, names: &[&str]) -> Option<bool> {
    names.iter().find_map(|n| raw.get(n)?.as_bool())
}

fn field_str<'a>(raw: &'a Value, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|n| raw.get(n)?.as_str())
}

/// Read an integer field, tolerating numbers encoded as strings or
/// integral floats
fn field_i64(raw: &Value, names: &[&str]) -> Option<i64> {
    names.iter().find_map(|n| {
        let v = raw.get(n)?;
        v.as_i64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
            .or_else(|| {
                v.as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            })
    })
}
