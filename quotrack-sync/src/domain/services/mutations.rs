use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use itertools::Itertools;

use crate::domain::{
    models::{
        EventId, NewEvent, NewNote, NewTask, NewVendorQuote, NoteId, QuoteId, QuoteUpdate, TaskId,
        TaskPatch, VendorQuoteId, VendorQuotePatch,
    },
    ports::outbound::QuoteService,
    QuoteServiceError,
};

use super::rollups::{self, CompletionKind};
use super::store::{StateChange, StateStore};

/// How a mutation request ended, from the caller's point of view. None of
/// these are hard errors: the store is consistent in every case, and
/// user-facing failure reporting happens through the change channel.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// Applied locally and confirmed by the backend.
    Applied,
    /// Applied locally, rejected by the backend, local state restored.
    RolledBack,
    /// The remote call failed before anything was applied locally
    /// (creates and deletes, which are not optimistic).
    Failed,
    /// Rejected by validation before any state was touched.
    Rejected(String),
    /// A request for the same record is still outstanding.
    InFlight,
    /// The target record is not in the current quote, usually a quote
    /// switch racing the caller. Absorbed, nothing to do.
    NotFound,
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        *self == MutationOutcome::Applied
    }

    fn rejected(reason: impl Into<String>) -> Self {
        MutationOutcome::Rejected(reason.into())
    }
}

/// Key identifying the record an in-flight request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RecordKey {
    Quote(QuoteId),
    Task(TaskId),
    VendorQuote(VendorQuoteId),
    Note(NoteId),
    Event(EventId),
    TaskOrder(QuoteId),
}

/// Per-record guard against double submission: a second mutation for a
/// record whose request is still outstanding is rejected up front, so
/// rapid double-clicks cannot interleave apply/rollback pairs.
#[derive(Clone, Default)]
struct InFlight {
    keys: Arc<Mutex<HashSet<RecordKey>>>,
}

impl InFlight {
    fn begin(&self, key: RecordKey) -> Option<InFlightToken> {
        let mut keys = self.keys.lock().unwrap();
        if !keys.insert(key) {
            return None;
        }
        Some(InFlightToken {
            keys: Arc::clone(&self.keys),
            key,
        })
    }
}

struct InFlightToken {
    keys: Arc<Mutex<HashSet<RecordKey>>>,
    key: RecordKey,
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.keys.lock().unwrap().remove(&self.key);
    }
}

/// Wraps each (local mutation, remote call) pair into one operation that
/// is atomic as far as the UI can observe: the local change lands before
/// the request is sent, and a failed request restores the captured prior
/// state and re-derives the roll-up counters.
///
/// Rollback is keyed by record id, never by "whatever is on screen": if
/// the user switched quotes while the request was out, the restore hits
/// the store's absorbing no-op path instead of the new quote.
pub struct OptimisticMutator<S> {
    store: Arc<StateStore>,
    service: Arc<S>,
    in_flight: InFlight,
}

impl<S: QuoteService> OptimisticMutator<S> {
    pub fn new(store: Arc<StateStore>, service: Arc<S>) -> Self {
        Self {
            store,
            service,
            in_flight: InFlight::default(),
        }
    }

    // ========================================================================
    // Optimistic patches
    // ========================================================================

    pub async fn set_task_done(&self, id: TaskId, done: bool) -> MutationOutcome {
        self.update_task(id, TaskPatch::done(done)).await
    }

    pub async fn update_task(&self, id: TaskId, patch: TaskPatch) -> MutationOutcome {
        const ACTION: &str = "update task";
        if patch.is_empty() {
            return MutationOutcome::rejected("nothing to update");
        }
        if patch.label.as_deref().is_some_and(|l| l.trim().is_empty()) {
            return MutationOutcome::rejected("task label must not be empty");
        }
        let Some(_guard) = self.in_flight.begin(RecordKey::Task(id)) else {
            return MutationOutcome::InFlight;
        };
        let Some(quote_id) = self.store.current_quote_id() else {
            return MutationOutcome::NotFound;
        };
        let Some(prior) = self.store.with_current(|q| q.task(id).cloned()).flatten() else {
            return MutationOutcome::NotFound;
        };

        let inverse = prior.inverse_of(&patch);
        self.store.mutate_task(id, &patch);

        let separator_changed = patch.is_separator.is_some_and(|v| v != prior.is_separator);
        let done_delta = if prior.counts_toward_totals() {
            rollups::completion_delta(prior.done, patch.done.unwrap_or(prior.done))
        } else {
            0
        };
        if separator_changed {
            // Totals themselves move, so a delta is not enough.
            self.refresh_rollups(quote_id);
        } else if done_delta != 0 {
            rollups::apply_completion_delta(&self.store, quote_id, CompletionKind::Task, done_delta);
        }

        match self.service.update_task(id, &patch).await {
            Ok(()) => MutationOutcome::Applied,
            Err(err) => {
                tracing::warn!("update of task {} failed, rolling back: {}", id, err);
                self.store.mutate_task(id, &inverse);
                if separator_changed {
                    self.refresh_rollups(quote_id);
                } else if done_delta != 0 {
                    self.revert_completion(quote_id, CompletionKind::Task, done_delta);
                }
                self.report_failure(ACTION, &err);
                MutationOutcome::RolledBack
            }
        }
    }

    pub async fn update_vendor_quote(
        &self,
        id: VendorQuoteId,
        patch: VendorQuotePatch,
    ) -> MutationOutcome {
        const ACTION: &str = "update vendor quote";
        let Some(_guard) = self.in_flight.begin(RecordKey::VendorQuote(id)) else {
            return MutationOutcome::InFlight;
        };
        let Some(quote_id) = self.store.current_quote_id() else {
            return MutationOutcome::NotFound;
        };
        let Some(prior) = self
            .store
            .with_current(|q| q.vendor_quote(id).cloned())
            .flatten()
        else {
            return MutationOutcome::NotFound;
        };

        let inverse = prior.inverse_of(&patch);
        let mut after = prior.clone();
        after.apply(&patch);
        let delta =
            rollups::completion_delta(prior.is_fully_complete(), after.is_fully_complete());

        self.store.mutate_vendor_quote(id, &patch);
        if delta != 0 {
            rollups::apply_completion_delta(
                &self.store,
                quote_id,
                CompletionKind::VendorQuote,
                delta,
            );
        }

        match self.service.update_vendor_quote(id, &patch).await {
            Ok(()) => MutationOutcome::Applied,
            Err(err) => {
                tracing::warn!("update of vendor quote {} failed, rolling back: {}", id, err);
                self.store.mutate_vendor_quote(id, &inverse);
                if delta != 0 {
                    self.revert_completion(quote_id, CompletionKind::VendorQuote, delta);
                }
                self.report_failure(ACTION, &err);
                MutationOutcome::RolledBack
            }
        }
    }

    /// Replace the current quote's scalar fields, mirroring the edit form.
    pub async fn update_quote(&self, update: QuoteUpdate) -> MutationOutcome {
        const ACTION: &str = "update quote";
        if update.customer.trim().is_empty() || update.quote_no.trim().is_empty() {
            return MutationOutcome::rejected("customer and quote number are required");
        }
        let Some(quote_id) = self.store.current_quote_id() else {
            return MutationOutcome::NotFound;
        };
        let Some(_guard) = self.in_flight.begin(RecordKey::Quote(quote_id)) else {
            return MutationOutcome::InFlight;
        };
        let Some(inverse) = self.store.mutate_quote(quote_id, &update) else {
            return MutationOutcome::NotFound;
        };
        self.sync_summary_fields(quote_id, &update);

        match self.service.update_quote(quote_id, &update).await {
            Ok(()) => MutationOutcome::Applied,
            Err(err) => {
                tracing::warn!("update of quote {} failed, rolling back: {}", quote_id, err);
                self.store.mutate_quote(quote_id, &inverse);
                self.sync_summary_fields(quote_id, &inverse);
                self.report_failure(ACTION, &err);
                MutationOutcome::RolledBack
            }
        }
    }

    // ========================================================================
    // Task reordering
    // ========================================================================

    /// Persist a drag result. The new order is visible immediately; the
    /// persistence call carries the full id sequence, and failure reverts
    /// the whole order; there is no partial-failure state.
    pub async fn reorder_tasks(&self, ordered: Vec<TaskId>) -> MutationOutcome {
        const ACTION: &str = "reorder tasks";
        let Some(quote_id) = self.store.current_quote_id() else {
            return MutationOutcome::NotFound;
        };
        let current_ids = self.store.current_task_ids();
        let is_permutation = ordered.len() == current_ids.len()
            && ordered
                .iter()
                .sorted()
                .eq(current_ids.iter().sorted());
        if !is_permutation {
            return MutationOutcome::rejected("reordered ids do not match the task list");
        }
        let Some(_guard) = self.in_flight.begin(RecordKey::TaskOrder(quote_id)) else {
            return MutationOutcome::InFlight;
        };

        let prior = self.store.task_order().unwrap_or(current_ids);
        self.store.apply_task_order(&ordered);

        match self.service.persist_task_order(quote_id, &ordered).await {
            Ok(()) => MutationOutcome::Applied,
            Err(err) => {
                tracing::warn!(
                    "persisting task order for quote {} failed, reverting: {}",
                    quote_id,
                    err
                );
                if self.store.current_quote_id() == Some(quote_id) {
                    self.store.apply_task_order(&prior);
                }
                self.report_failure(ACTION, &err);
                MutationOutcome::RolledBack
            }
        }
    }

    // ========================================================================
    // Creates are remote-confirmed, never optimistic: the backend assigns
    // ids, so nothing is inserted until the response carries the record.
    // ========================================================================

    pub async fn add_task(&self, label: impl Into<String>, is_separator: bool) -> MutationOutcome {
        const ACTION: &str = "add task";
        let label = label.into();
        if label.trim().is_empty() {
            return MutationOutcome::rejected("task label is required");
        }
        let Some(quote_id) = self.store.current_quote_id() else {
            return MutationOutcome::NotFound;
        };
        let sort_order = self
            .store
            .with_current(|q| q.next_task_sort_order())
            .unwrap_or_default();
        let new_task = NewTask {
            label,
            is_separator,
            sort_order,
        };

        match self.service.create_task(quote_id, &new_task).await {
            Ok(task) => {
                self.store.insert_task(quote_id, task);
                self.refresh_rollups(quote_id);
                MutationOutcome::Applied
            }
            Err(err) => {
                tracing::warn!("creating task on quote {} failed: {}", quote_id, err);
                self.report_failure(ACTION, &err);
                MutationOutcome::Failed
            }
        }
    }

    pub async fn add_vendor_quote(&self, new_vendor_quote: NewVendorQuote) -> MutationOutcome {
        const ACTION: &str = "add vendor quote";
        if new_vendor_quote.vendor_name.trim().is_empty() {
            return MutationOutcome::rejected("vendor is required");
        }
        let Some(quote_id) = self.store.current_quote_id() else {
            return MutationOutcome::NotFound;
        };

        match self
            .service
            .create_vendor_quote(quote_id, &new_vendor_quote)
            .await
        {
            Ok(vendor_quote) => {
                self.store.insert_vendor_quote(quote_id, vendor_quote);
                self.refresh_rollups(quote_id);
                MutationOutcome::Applied
            }
            Err(err) => {
                tracing::warn!("creating vendor quote on quote {} failed: {}", quote_id, err);
                self.report_failure(ACTION, &err);
                MutationOutcome::Failed
            }
        }
    }

    pub async fn add_note(&self, content: impl Into<String>) -> MutationOutcome {
        const ACTION: &str = "add note";
        let content = content.into();
        if content.trim().is_empty() {
            return MutationOutcome::rejected("note content is required");
        }
        let Some(quote_id) = self.store.current_quote_id() else {
            return MutationOutcome::NotFound;
        };

        match self
            .service
            .create_note(quote_id, &NewNote { content })
            .await
        {
            Ok(note) => {
                self.store.insert_note(quote_id, note);
                self.refresh_rollups(quote_id);
                MutationOutcome::Applied
            }
            Err(err) => {
                tracing::warn!("creating note on quote {} failed: {}", quote_id, err);
                self.report_failure(ACTION, &err);
                MutationOutcome::Failed
            }
        }
    }

    pub async fn add_event(&self, new_event: NewEvent) -> MutationOutcome {
        const ACTION: &str = "add event";
        if new_event.description.trim().is_empty() {
            return MutationOutcome::rejected("event description is required");
        }
        let Some(quote_id) = self.store.current_quote_id() else {
            return MutationOutcome::NotFound;
        };

        match self.service.create_event(quote_id, &new_event).await {
            Ok(event) => {
                self.store.insert_event(quote_id, event);
                MutationOutcome::Applied
            }
            Err(err) => {
                tracing::warn!("creating event on quote {} failed: {}", quote_id, err);
                self.report_failure(ACTION, &err);
                MutationOutcome::Failed
            }
        }
    }

    // ========================================================================
    // Deletes are remote-confirmed. A NotFound from the backend means the
    // record is already gone there, so the local copy is dropped as well.
    // ========================================================================

    pub async fn remove_task(&self, id: TaskId) -> MutationOutcome {
        const ACTION: &str = "delete task";
        let Some(_guard) = self.in_flight.begin(RecordKey::Task(id)) else {
            return MutationOutcome::InFlight;
        };
        let Some(quote_id) = self.store.current_quote_id() else {
            return MutationOutcome::NotFound;
        };
        if !self
            .store
            .with_current(|q| q.task(id).is_some())
            .unwrap_or(false)
        {
            return MutationOutcome::NotFound;
        }

        match self.service.delete_task(id).await {
            Ok(()) | Err(QuoteServiceError::NotFound) => {
                self.store.remove_task(id);
                self.refresh_rollups(quote_id);
                MutationOutcome::Applied
            }
            Err(err) => {
                tracing::warn!("deleting task {} failed: {}", id, err);
                self.report_failure(ACTION, &err);
                MutationOutcome::Failed
            }
        }
    }

    pub async fn remove_vendor_quote(&self, id: VendorQuoteId) -> MutationOutcome {
        const ACTION: &str = "delete vendor quote";
        let Some(_guard) = self.in_flight.begin(RecordKey::VendorQuote(id)) else {
            return MutationOutcome::InFlight;
        };
        let Some(quote_id) = self.store.current_quote_id() else {
            return MutationOutcome::NotFound;
        };
        if !self
            .store
            .with_current(|q| q.vendor_quote(id).is_some())
            .unwrap_or(false)
        {
            return MutationOutcome::NotFound;
        }

        match self.service.delete_vendor_quote(id).await {
            Ok(()) | Err(QuoteServiceError::NotFound) => {
                self.store.remove_vendor_quote(id);
                self.refresh_rollups(quote_id);
                MutationOutcome::Applied
            }
            Err(err) => {
                tracing::warn!("deleting vendor quote {} failed: {}", id, err);
                self.report_failure(ACTION, &err);
                MutationOutcome::Failed
            }
        }
    }

    pub async fn remove_note(&self, id: NoteId) -> MutationOutcome {
        const ACTION: &str = "delete note";
        let Some(_guard) = self.in_flight.begin(RecordKey::Note(id)) else {
            return MutationOutcome::InFlight;
        };
        let Some(quote_id) = self.store.current_quote_id() else {
            return MutationOutcome::NotFound;
        };
        if !self
            .store
            .with_current(|q| q.note(id).is_some())
            .unwrap_or(false)
        {
            return MutationOutcome::NotFound;
        }

        match self.service.delete_note(id).await {
            Ok(()) | Err(QuoteServiceError::NotFound) => {
                self.store.remove_note(id);
                self.refresh_rollups(quote_id);
                MutationOutcome::Applied
            }
            Err(err) => {
                tracing::warn!("deleting note {} failed: {}", id, err);
                self.report_failure(ACTION, &err);
                MutationOutcome::Failed
            }
        }
    }

    pub async fn remove_event(&self, id: EventId) -> MutationOutcome {
        const ACTION: &str = "delete event";
        let Some(_guard) = self.in_flight.begin(RecordKey::Event(id)) else {
            return MutationOutcome::InFlight;
        };
        if !self
            .store
            .with_current(|q| q.event(id).is_some())
            .unwrap_or(false)
        {
            return MutationOutcome::NotFound;
        }

        match self.service.delete_event(id).await {
            Ok(()) | Err(QuoteServiceError::NotFound) => {
                self.store.remove_event(id);
                MutationOutcome::Applied
            }
            Err(err) => {
                tracing::warn!("deleting event {} failed: {}", id, err);
                self.report_failure(ACTION, &err);
                MutationOutcome::Failed
            }
        }
    }

    // ========================================================================
    // Failure plumbing
    // ========================================================================

    /// Mirror a quote's scalar fields onto its summary row so the list
    /// shows the same values as the open detail.
    fn sync_summary_fields(&self, quote_id: QuoteId, update: &QuoteUpdate) {
        self.store.mutate_summary(quote_id, |summary| {
            summary.customer = update.customer.clone();
            summary.quote_no = update.quote_no.clone();
            summary.description = update.description.clone();
            summary.sales_rep = update.sales_rep.clone();
            summary.hidden = update.hidden;
        });
    }

    fn report_failure(&self, action: &'static str, err: &QuoteServiceError) {
        self.store.notify(StateChange::MutationFailed {
            action,
            reason: err.to_string(),
        });
    }

    /// Undo a completion delta after a failed request. When the quote is
    /// still loaded the counters are re-derived from detail (absolute and
    /// therefore safe against an interleaved reload); otherwise the delta
    /// is inverted on the summary row directly.
    fn revert_completion(&self, quote_id: QuoteId, kind: CompletionKind, delta: i32) {
        if self.store.current_quote_id() == Some(quote_id) {
            self.refresh_rollups(quote_id);
        } else {
            rollups::apply_completion_delta(&self.store, quote_id, kind, -delta);
        }
    }

    fn refresh_rollups(&self, quote_id: QuoteId) {
        if self.store.current_quote_id() == Some(quote_id) {
            self.store
                .with_current(|quote| rollups::refresh_counts(&self.store, quote));
        }
    }
}
