use time::OffsetDateTime;

use super::NoteId;

/// A free-form note on a quote. Immutable once created, except deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    pub created_at: Option<OffsetDateTime>,
}

/// Payload for creating a note.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub content: String,
}

impl NewNote {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
