use time::OffsetDateTime;

use super::EventId;

/// An audit-trail entry on a quote. `past` holds a serialized key/value
/// snapshot of the fields a change replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub description: String,
    pub past: Option<String>,
    pub created_at: Option<OffsetDateTime>,
}

impl Event {
    /// The prior-state snapshot as displayable key/value pairs, sorted by
    /// key for a stable diff list. Empty when `past` is absent or not a
    /// JSON object.
    pub fn past_pairs(&self) -> Vec<(String, String)> {
        let Some(raw) = &self.past else {
            return Vec::new();
        };
        let Ok(serde_json::Value::Object(map)) = serde_json::from_str(raw) else {
            return Vec::new();
        };

        let mut pairs: Vec<(String, String)> = map
            .into_iter()
            .map(|(key, value)| {
                let rendered = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, rendered)
            })
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }
}

/// Payload for creating an event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub description: String,
    pub past: Option<serde_json::Value>,
}

impl NewEvent {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            past: None,
        }
    }

    pub fn with_past(mut self, past: serde_json::Value) -> Self {
        self.past = Some(past);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn past_pairs_renders_sorted_key_values() {
        let event = Event {
            id: EventId::new(1),
            description: "Quote updated".to_string(),
            past: Some(r#"{"sales_rep":"Dana","customer":"Acme","count":3}"#.to_string()),
            created_at: None,
        };
        assert_eq!(
            event.past_pairs(),
            vec![
                ("count".to_string(), "3".to_string()),
                ("customer".to_string(), "Acme".to_string()),
                ("sales_rep".to_string(), "Dana".to_string()),
            ]
        );
    }

    #[test]
    fn past_pairs_tolerates_missing_or_malformed_snapshots() {
        let mut event = Event {
            id: EventId::new(1),
            description: "Created".to_string(),
            past: None,
            created_at: None,
        };
        assert!(event.past_pairs().is_empty());

        event.past = Some("not json".to_string());
        assert!(event.past_pairs().is_empty());
    }
}
