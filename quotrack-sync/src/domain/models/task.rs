use super::TaskId;

/// Gap left between consecutive `sort_order` values so a task can be
/// inserted between two neighbors without renumbering the whole list.
pub const SORT_ORDER_GAP: i64 = 10;

/// A checklist task under a quote. Separator rows partition the list into
/// display groups and never count toward completion totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub label: String,
    pub done: bool,
    pub is_separator: bool,
    pub sort_order: i64,
}

impl Task {
    pub fn counts_toward_totals(&self) -> bool {
        !self.is_separator
    }

    /// Apply a shallow patch in place.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(label) = &patch.label {
            self.label = label.clone();
        }
        if let Some(done) = patch.done {
            self.done = done;
        }
        if let Some(is_separator) = patch.is_separator {
            self.is_separator = is_separator;
        }
    }

    /// Capture the patch that undoes `patch`: the prior values of exactly
    /// the fields `patch` would touch.
    pub fn inverse_of(&self, patch: &TaskPatch) -> TaskPatch {
        TaskPatch {
            label: patch.label.as_ref().map(|_| self.label.clone()),
            done: patch.done.map(|_| self.done),
            is_separator: patch.is_separator.map(|_| self.is_separator),
        }
    }
}

/// Shallow partial update for a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub label: Option<String>,
    pub done: Option<bool>,
    pub is_separator: Option<bool>,
}

impl TaskPatch {
    pub fn done(value: bool) -> Self {
        Self {
            done: Some(value),
            ..Default::default()
        }
    }

    pub fn label(value: impl Into<String>) -> Self {
        Self {
            label: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.done.is_none() && self.is_separator.is_none()
    }
}

/// Payload for creating a task. The id is assigned by the backend; the
/// sort order is chosen by the caller from the current list tail.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub label: String,
    pub is_separator: bool,
    pub sort_order: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task() -> Task {
        Task {
            id: TaskId::new(1),
            label: "Request freight quote".to_string(),
            done: false,
            is_separator: false,
            sort_order: 10,
        }
    }

    #[test]
    fn apply_patches_only_set_fields() {
        let mut task = make_task();
        task.apply(&TaskPatch::done(true));
        assert!(task.done);
        assert_eq!(task.label, "Request freight quote");
    }

    #[test]
    fn inverse_restores_pre_patch_state() {
        let mut task = make_task();
        let patch = TaskPatch {
            label: Some("Updated".to_string()),
            done: Some(true),
            is_separator: None,
        };
        let inverse = task.inverse_of(&patch);
        let before = task.clone();

        task.apply(&patch);
        task.apply(&inverse);
        assert_eq!(task, before);
    }

    #[test]
    fn inverse_only_covers_patched_fields() {
        let task = make_task();
        let inverse = task.inverse_of(&TaskPatch::done(true));
        assert_eq!(inverse.done, Some(false));
        assert!(inverse.label.is_none());
        assert!(inverse.is_separator.is_none());
    }

    #[test]
    fn separators_do_not_count() {
        let mut task = make_task();
        assert!(task.counts_toward_totals());
        task.is_separator = true;
        assert!(!task.counts_toward_totals());
    }
}
