use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::domain::models::{
    Event, EventId, Note, NoteId, Quote, QuoteId, QuoteSummary, QuoteUpdate, Task, TaskId,
    TaskPatch, VendorQuote, VendorQuoteId, VendorQuotePatch,
};

use super::reorder::TaskOrderCache;

/// What changed in the store, at repaint granularity: renderers repaint
/// the named row or region, nothing else.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    /// The current quote was replaced wholesale (switch, reload, close).
    QuoteReplaced(Option<QuoteId>),
    QuoteFieldsChanged(QuoteId),
    TaskChanged(TaskId),
    TaskListChanged(QuoteId),
    TaskOrderChanged(QuoteId),
    VendorQuoteChanged(VendorQuoteId),
    VendorQuoteListChanged(QuoteId),
    NoteListChanged(QuoteId),
    EventListChanged(QuoteId),
    SummaryChanged(QuoteId),
    QuoteListReplaced,
    /// A remote call failed and the local state was restored. Feeds the
    /// notification layer; carries what was attempted and why it failed.
    MutationFailed {
        action: &'static str,
        reason: String,
    },
}

/// Single source of truth for rendering: the loaded quote, the quote-list
/// projection, and small per-quote caches.
///
/// Interior mutability keeps the store shareable behind `Arc`; callers are
/// a single cooperative event loop, so writes never contend. All child
/// mutation is keyed by id and silently absorbs ids that are no longer
/// present, the expected outcome of a slow request finishing after the
/// user switched quotes.
#[derive(Default)]
pub struct StateStore {
    current: RwLock<Option<Quote>>,
    summaries: RwLock<Vec<QuoteSummary>>,
    task_order: RwLock<TaskOrderCache>,
    frame_urls: RwLock<HashMap<QuoteId, String>>,
    subscribers: RwLock<Vec<UnboundedSender<StateChange>>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Register a renderer. Every store mutation produces at least one
    /// change notification on the returned channel.
    pub fn subscribe(&self) -> UnboundedReceiver<StateChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().unwrap().push(tx);
        rx
    }

    pub(crate) fn notify(&self, change: StateChange) {
        self.subscribers
            .write()
            .unwrap()
            .retain(|tx| tx.send(change.clone()).is_ok());
    }

    // ========================================================================
    // Current quote
    // ========================================================================

    pub fn current_quote(&self) -> Option<Quote> {
        self.current.read().unwrap().clone()
    }

    pub fn current_quote_id(&self) -> Option<QuoteId> {
        self.current.read().unwrap().as_ref().map(|q| q.id)
    }

    /// Read access to the live quote without cloning it out.
    pub fn with_current<R>(&self, f: impl FnOnce(&Quote) -> R) -> Option<R> {
        self.current.read().unwrap().as_ref().map(f)
    }

    /// Replace the current quote wholesale.
    ///
    /// Resources cached for the outgoing quote are dropped. The task-order
    /// cache survives a reload of the same quote (so a drag is not undone
    /// by a refresh) but is cleared on a switch; either way the incoming
    /// task list is arranged through it before becoming visible.
    pub fn set_current_quote(&self, quote: Option<Quote>) {
        let previous_id = self.current_quote_id();
        if let Some(previous_id) = previous_id {
            self.frame_urls.write().unwrap().remove(&previous_id);
        }

        let new_id = match quote {
            Some(mut quote) => {
                let mut order = self.task_order.write().unwrap();
                if previous_id != Some(quote.id) {
                    order.clear();
                }
                order.reconcile(&mut quote.tasks);
                let id = quote.id;
                *self.current.write().unwrap() = Some(quote);
                Some(id)
            }
            None => {
                self.task_order.write().unwrap().clear();
                *self.current.write().unwrap() = None;
                None
            }
        };

        self.notify(StateChange::QuoteReplaced(new_id));
    }

    // ========================================================================
    // Quote list
    // ========================================================================

    pub fn quote_list(&self) -> Vec<QuoteSummary> {
        self.summaries.read().unwrap().clone()
    }

    pub fn summary(&self, id: QuoteId) -> Option<QuoteSummary> {
        self.summaries
            .read()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn set_quote_list(&self, list: Vec<QuoteSummary>) {
        *self.summaries.write().unwrap() = list;
        self.notify(StateChange::QuoteListReplaced);
    }

    /// Mutate the matching summary row in place. Returns false (and does
    /// not notify) when the quote is not in the list.
    pub fn mutate_summary(&self, id: QuoteId, mutate: impl FnOnce(&mut QuoteSummary)) -> bool {
        let mut summaries = self.summaries.write().unwrap();
        let Some(summary) = summaries.iter_mut().find(|s| s.id == id) else {
            tracing::debug!("summary {} not in list, mutation absorbed", id);
            return false;
        };
        mutate(summary);
        drop(summaries);
        self.notify(StateChange::SummaryChanged(id));
        true
    }

    // ========================================================================
    // Child record patches
    // ========================================================================

    /// Patch a task by id. Returns the inverse patch (prior values of the
    /// touched fields), or `None` when the task is not in the current
    /// quote (a quote switch racing a slow request, absorbed silently).
    pub fn mutate_task(&self, id: TaskId, patch: &TaskPatch) -> Option<TaskPatch> {
        let mut current = self.current.write().unwrap();
        let Some(task) = current.as_mut().and_then(|q| q.task_mut(id)) else {
            tracing::debug!("task {} not in current quote, mutation absorbed", id);
            return None;
        };
        let inverse = task.inverse_of(patch);
        task.apply(patch);
        drop(current);
        self.notify(StateChange::TaskChanged(id));
        Some(inverse)
    }

    /// Patch a vendor quote by id; same contract as [`mutate_task`].
    ///
    /// [`mutate_task`]: Self::mutate_task
    pub fn mutate_vendor_quote(
        &self,
        id: VendorQuoteId,
        patch: &VendorQuotePatch,
    ) -> Option<VendorQuotePatch> {
        let mut current = self.current.write().unwrap();
        let Some(vendor_quote) = current.as_mut().and_then(|q| q.vendor_quote_mut(id)) else {
            tracing::debug!("vendor quote {} not in current quote, mutation absorbed", id);
            return None;
        };
        let inverse = vendor_quote.inverse_of(patch);
        vendor_quote.apply(patch);
        drop(current);
        self.notify(StateChange::VendorQuoteChanged(id));
        Some(inverse)
    }

    /// Replace the current quote's scalar fields. Returns the prior
    /// snapshot, or `None` when `id` is not the current quote.
    pub fn mutate_quote(&self, id: QuoteId, update: &QuoteUpdate) -> Option<QuoteUpdate> {
        let mut current = self.current.write().unwrap();
        let Some(quote) = current.as_mut().filter(|q| q.id == id) else {
            tracing::debug!("quote {} is not current, mutation absorbed", id);
            return None;
        };
        let inverse = quote.scalar_snapshot();
        quote.apply(update);
        drop(current);
        self.notify(StateChange::QuoteFieldsChanged(id));
        Some(inverse)
    }

    // ========================================================================
    // Child record inserts/removals (remote-confirmed records only)
    // ========================================================================

    /// Append a server-confirmed task. No-op when `quote_id` is no longer
    /// current.
    pub fn insert_task(&self, quote_id: QuoteId, task: Task) -> bool {
        let mut current = self.current.write().unwrap();
        let Some(quote) = current.as_mut().filter(|q| q.id == quote_id) else {
            return false;
        };
        let id = task.id;
        quote.tasks.push(task);
        drop(current);
        self.task_order.write().unwrap().push(id);
        self.notify(StateChange::TaskListChanged(quote_id));
        true
    }

    pub fn remove_task(&self, id: TaskId) -> Option<Task> {
        let mut current = self.current.write().unwrap();
        let quote = current.as_mut()?;
        let quote_id = quote.id;
        let pos = quote.tasks.iter().position(|t| t.id == id)?;
        let task = quote.tasks.remove(pos);
        drop(current);
        self.task_order.write().unwrap().remove(id);
        self.notify(StateChange::TaskListChanged(quote_id));
        Some(task)
    }

    pub fn insert_vendor_quote(&self, quote_id: QuoteId, vendor_quote: VendorQuote) -> bool {
        let mut current = self.current.write().unwrap();
        let Some(quote) = current.as_mut().filter(|q| q.id == quote_id) else {
            return false;
        };
        quote.vendor_quotes.push(vendor_quote);
        drop(current);
        self.notify(StateChange::VendorQuoteListChanged(quote_id));
        true
    }

    pub fn remove_vendor_quote(&self, id: VendorQuoteId) -> Option<VendorQuote> {
        let mut current = self.current.write().unwrap();
        let quote = current.as_mut()?;
        let quote_id = quote.id;
        let pos = quote.vendor_quotes.iter().position(|v| v.id == id)?;
        let vendor_quote = quote.vendor_quotes.remove(pos);
        drop(current);
        self.notify(StateChange::VendorQuoteListChanged(quote_id));
        Some(vendor_quote)
    }

    /// Notes render newest first; confirmed notes go to the front.
    pub fn insert_note(&self, quote_id: QuoteId, note: Note) -> bool {
        let mut current = self.current.write().unwrap();
        let Some(quote) = current.as_mut().filter(|q| q.id == quote_id) else {
            return false;
        };
        quote.notes.insert(0, note);
        drop(current);
        self.notify(StateChange::NoteListChanged(quote_id));
        true
    }

    pub fn remove_note(&self, id: NoteId) -> Option<Note> {
        let mut current = self.current.write().unwrap();
        let quote = current.as_mut()?;
        let quote_id = quote.id;
        let pos = quote.notes.iter().position(|n| n.id == id)?;
        let note = quote.notes.remove(pos);
        drop(current);
        self.notify(StateChange::NoteListChanged(quote_id));
        Some(note)
    }

    pub fn insert_event(&self, quote_id: QuoteId, event: Event) -> bool {
        let mut current = self.current.write().unwrap();
        let Some(quote) = current.as_mut().filter(|q| q.id == quote_id) else {
            return false;
        };
        quote.events.insert(0, event);
        drop(current);
        self.notify(StateChange::EventListChanged(quote_id));
        true
    }

    pub fn remove_event(&self, id: EventId) -> Option<Event> {
        let mut current = self.current.write().unwrap();
        let quote = current.as_mut()?;
        let quote_id = quote.id;
        let pos = quote.events.iter().position(|e| e.id == id)?;
        let event = quote.events.remove(pos);
        drop(current);
        self.notify(StateChange::EventListChanged(quote_id));
        Some(event)
    }

    // ========================================================================
    // Task ordering
    // ========================================================================

    pub fn task_order(&self) -> Option<Vec<TaskId>> {
        self.task_order.read().unwrap().current().map(<[_]>::to_vec)
    }

    pub fn current_task_ids(&self) -> Vec<TaskId> {
        self.with_current(|q| q.tasks.iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }

    /// Rearrange the current quote's tasks to the given id sequence and
    /// cache it as the rendering order. Returns false without side
    /// effects when no quote is loaded.
    pub fn apply_task_order(&self, ordered: &[TaskId]) -> bool {
        let mut current = self.current.write().unwrap();
        let Some(quote) = current.as_mut() else {
            return false;
        };
        let quote_id = quote.id;

        let mut arranged: Vec<Task> = Vec::with_capacity(quote.tasks.len());
        for id in ordered {
            if let Some(pos) = quote.tasks.iter().position(|t| t.id == *id) {
                arranged.push(quote.tasks.remove(pos));
            }
        }
        arranged.append(&mut quote.tasks);
        quote.tasks = arranged;
        let sequence: Vec<TaskId> = quote.tasks.iter().map(|t| t.id).collect();
        drop(current);

        self.task_order.write().unwrap().set(sequence);
        self.notify(StateChange::TaskOrderChanged(quote_id));
        true
    }

    // ========================================================================
    // Per-quote cached resources
    // ========================================================================

    /// Cache a resolved embedded-frame URL (project sheet and the like)
    /// for a quote. Evicted when that quote stops being current.
    pub fn cache_frame_url(&self, id: QuoteId, url: impl Into<String>) {
        self.frame_urls.write().unwrap().insert(id, url.into());
    }

    pub fn frame_url(&self, id: QuoteId) -> Option<String> {
        self.frame_urls.read().unwrap().get(&id).cloned()
    }
}
