use serde::{Deserialize, Serialize};

/// A task row as served inside quote detail.
///
/// `sort_order` is absent on legacy rows, which are ordered by id.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskRow {
    pub id: i64,
    pub quote_id: i64,
    pub label: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub is_separator: bool,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

/// Partial update body for `PUT /api/tasks/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_separator: Option<bool>,
}

/// Body for `POST /api/quotes/{id}/tasks`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTaskPayload {
    pub label: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_separator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

/// Body for `PUT /api/quotes/{id}/tasks/reorder`.
#[derive(Debug, Clone, Serialize)]
pub struct ReorderPayload {
    pub ordered_ids: Vec<i64>,
}

/// Response of `POST /api/tasks/{id}/toggle`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleResponse {
    pub done: bool,
}
