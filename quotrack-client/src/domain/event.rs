use serde::{Deserialize, Serialize};

/// An audit event row. `past` is a serialized key/value snapshot of the
/// fields a change replaced, stored as a JSON object string.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventRow {
    pub id: i64,
    pub quote_id: i64,
    pub description: String,
    #[serde(default)]
    pub past: Option<String>,
    pub created_at: Option<String>,
}

/// Body for `POST /api/events`.
#[derive(Debug, Clone, Serialize)]
pub struct NewEventPayload {
    pub quote_id: i64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub past: Option<serde_json::Value>,
}
