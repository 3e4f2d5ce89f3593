use crate::domain::models::{Task, TaskId};

/// Locally cached task ordering for the loaded quote.
///
/// The backend is the durable store of order, but round-tripping through
/// it on every drag would make the list flicker back to the old order for
/// the duration of the request. Instead the first render of a quote's
/// task list captures the server order here, drags rewrite it, and fresh
/// fetches are rearranged to match until the quote is switched.
#[derive(Debug, Clone, Default)]
pub struct TaskOrderCache {
    order: Option<Vec<TaskId>>,
}

impl TaskOrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cached(&self) -> bool {
        self.order.is_some()
    }

    pub fn current(&self) -> Option<&[TaskId]> {
        self.order.as_deref()
    }

    /// Back to server-order rendering. Called on quote switch.
    pub fn clear(&mut self) {
        self.order = None;
    }

    /// Overwrite the cached sequence, e.g. after a drag.
    pub fn set(&mut self, order: Vec<TaskId>) {
        self.order = Some(order);
    }

    /// Arrange freshly fetched tasks for rendering.
    ///
    /// On the first call for a quote the incoming (server) order is
    /// captured as-is. Afterwards, tasks are rearranged to the cached id
    /// sequence; ids the cache has never seen (tasks created since the
    /// capture) are appended at the end, keeping their relative server
    /// order. Cached ids missing from the fresh data drop out.
    pub fn reconcile(&mut self, tasks: &mut Vec<Task>) {
        let Some(sequence) = &self.order else {
            self.order = Some(tasks.iter().map(|t| t.id).collect());
            return;
        };

        let mut arranged: Vec<Task> = Vec::with_capacity(tasks.len());
        for id in sequence {
            if let Some(pos) = tasks.iter().position(|t| t.id == *id) {
                arranged.push(tasks.remove(pos));
            }
        }
        // Whatever the sequence did not claim is new since the capture.
        arranged.append(tasks);
        *tasks = arranged;

        self.order = Some(tasks.iter().map(|t| t.id).collect());
    }

    /// Record a task appended at the end of the list.
    pub fn push(&mut self, id: TaskId) {
        if let Some(order) = &mut self.order {
            order.push(id);
        }
    }

    /// Drop a deleted task from the cached sequence.
    pub fn remove(&mut self, id: TaskId) {
        if let Some(order) = &mut self.order {
            order.retain(|t| *t != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tasks(ids: &[i64]) -> Vec<Task> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Task {
                id: TaskId::new(*id),
                label: format!("task {}", id),
                done: false,
                is_separator: false,
                sort_order: (i as i64 + 1) * 10,
            })
            .collect()
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id.as_i64()).collect()
    }

    #[test]
    fn first_reconcile_captures_server_order() {
        let mut cache = TaskOrderCache::new();
        let mut tasks = make_tasks(&[1, 2, 3]);

        cache.reconcile(&mut tasks);
        assert_eq!(ids(&tasks), vec![1, 2, 3]);
        assert_eq!(
            cache.current().unwrap(),
            &[TaskId::new(1), TaskId::new(2), TaskId::new(3)]
        );
    }

    #[test]
    fn cached_order_overrides_server_order_and_appends_newcomers() {
        let mut cache = TaskOrderCache::new();
        cache.set(vec![TaskId::new(3), TaskId::new(1), TaskId::new(2)]);

        let mut tasks = make_tasks(&[1, 2, 3, 4]);
        cache.reconcile(&mut tasks);

        assert_eq!(ids(&tasks), vec![3, 1, 2, 4]);
        // The newcomer becomes part of the cached sequence.
        assert_eq!(
            cache.current().unwrap(),
            &[
                TaskId::new(3),
                TaskId::new(1),
                TaskId::new(2),
                TaskId::new(4)
            ]
        );
    }

    #[test]
    fn multiple_newcomers_keep_relative_server_order() {
        let mut cache = TaskOrderCache::new();
        cache.set(vec![TaskId::new(2), TaskId::new(1)]);

        let mut tasks = make_tasks(&[1, 5, 2, 6]);
        cache.reconcile(&mut tasks);
        assert_eq!(ids(&tasks), vec![2, 1, 5, 6]);
    }

    #[test]
    fn ids_deleted_server_side_drop_out() {
        let mut cache = TaskOrderCache::new();
        cache.set(vec![TaskId::new(3), TaskId::new(1), TaskId::new(2)]);

        let mut tasks = make_tasks(&[1, 3]);
        cache.reconcile(&mut tasks);
        assert_eq!(ids(&tasks), vec![3, 1]);
        assert_eq!(cache.current().unwrap(), &[TaskId::new(3), TaskId::new(1)]);
    }

    #[test]
    fn clear_returns_to_server_order() {
        let mut cache = TaskOrderCache::new();
        cache.set(vec![TaskId::new(2), TaskId::new(1)]);
        cache.clear();
        assert!(!cache.is_cached());

        let mut tasks = make_tasks(&[1, 2]);
        cache.reconcile(&mut tasks);
        assert_eq!(ids(&tasks), vec![1, 2]);
    }

    #[test]
    fn push_and_remove_edit_the_cached_sequence() {
        let mut cache = TaskOrderCache::new();
        cache.set(vec![TaskId::new(1), TaskId::new(2)]);
        cache.push(TaskId::new(3));
        cache.remove(TaskId::new(2));
        assert_eq!(cache.current().unwrap(), &[TaskId::new(1), TaskId::new(3)]);
    }
}
