use serde::{Deserialize, Serialize};

/// A note row, most recent first in quote detail.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NoteRow {
    pub id: i64,
    pub quote_id: i64,
    pub content: String,
    pub created_at: Option<String>,
}

/// Body for `POST /api/notes`.
#[derive(Debug, Clone, Serialize)]
pub struct NewNotePayload {
    pub quote_id: i64,
    pub content: String,
}
