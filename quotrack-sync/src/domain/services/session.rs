use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::domain::{
    models::{
        EventId, NewEvent, NewVendorQuote, NoteId, Quote, QuoteId, QuoteSummary, QuoteUpdate,
        TaskId, TaskPatch, VendorQuoteId, VendorQuotePatch,
    },
    ports::outbound::QuoteService,
    QuoteServiceError,
};

use super::mutations::{MutationOutcome, OptimisticMutator};
use super::rollups;
use super::store::{StateChange, StateStore};

/// One user's working session against a quote backend: the state store,
/// the optimistic mutation engine, and the load/refresh plumbing, wired
/// together behind one handle.
///
/// Renderers read through [`current_quote`]/[`quote_list`] and repaint on
/// [`subscribe`] notifications; UI event handlers call the async mutation
/// methods and let the outcome drive focus/toast behavior.
///
/// [`current_quote`]: Self::current_quote
/// [`quote_list`]: Self::quote_list
/// [`subscribe`]: Self::subscribe
pub struct QuoteSession<S> {
    store: Arc<StateStore>,
    service: Arc<S>,
    mutator: OptimisticMutator<S>,
}

impl<S: QuoteService> QuoteSession<S> {
    pub fn new(service: S) -> Self {
        let store = Arc::new(StateStore::new());
        let service = Arc::new(service);
        let mutator = OptimisticMutator::new(Arc::clone(&store), Arc::clone(&service));
        Self {
            store,
            service,
            mutator,
        }
    }

    // ========================================================================
    // Renderer surface
    // ========================================================================

    pub fn subscribe(&self) -> UnboundedReceiver<StateChange> {
        self.store.subscribe()
    }

    pub fn current_quote(&self) -> Option<Quote> {
        self.store.current_quote()
    }

    pub fn current_quote_id(&self) -> Option<QuoteId> {
        self.store.current_quote_id()
    }

    pub fn quote_list(&self) -> Vec<QuoteSummary> {
        self.store.quote_list()
    }

    pub fn summary(&self, id: QuoteId) -> Option<QuoteSummary> {
        self.store.summary(id)
    }

    pub fn frame_url(&self, id: QuoteId) -> Option<String> {
        self.store.frame_url(id)
    }

    pub fn cache_frame_url(&self, id: QuoteId, url: impl Into<String>) {
        self.store.cache_frame_url(id, url);
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Fetch a quote and make it current. Keeps the summary row's
    /// counters in line with the freshly loaded detail.
    pub async fn open_quote(&self, id: QuoteId) -> Result<(), QuoteServiceError> {
        let quote = self.service.fetch_quote(id).await?;
        self.store.set_current_quote(Some(quote));
        self.store
            .with_current(|quote| rollups::refresh_counts(&self.store, quote));
        Ok(())
    }

    /// Re-fetch the current quote in place. A drag-reorder survives this:
    /// the cached task order is applied over whatever order the server
    /// returns.
    pub async fn reload_current(&self) -> Result<(), QuoteServiceError> {
        let Some(id) = self.store.current_quote_id() else {
            return Err(QuoteServiceError::NotFound);
        };
        self.open_quote(id).await
    }

    pub fn close_quote(&self) {
        self.store.set_current_quote(None);
    }

    pub async fn refresh_quote_list(
        &self,
        search: Option<&str>,
        include_hidden: bool,
    ) -> Result<(), QuoteServiceError> {
        let list = self
            .service
            .fetch_quote_list(search, include_hidden)
            .await?;
        self.store.set_quote_list(list);
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Flip a task checkbox. The row updates immediately; a failed
    /// request flips it back and reports through the change channel.
    pub async fn toggle_task(&self, id: TaskId) -> MutationOutcome {
        let Some(done) = self
            .store
            .with_current(|q| q.task(id).map(|t| t.done))
            .flatten()
        else {
            return MutationOutcome::NotFound;
        };
        self.mutator.set_task_done(id, !done).await
    }

    pub async fn update_task(&self, id: TaskId, patch: TaskPatch) -> MutationOutcome {
        self.mutator.update_task(id, patch).await
    }

    pub async fn update_vendor_quote(
        &self,
        id: VendorQuoteId,
        patch: VendorQuotePatch,
    ) -> MutationOutcome {
        self.mutator.update_vendor_quote(id, patch).await
    }

    pub async fn update_quote(&self, update: QuoteUpdate) -> MutationOutcome {
        self.mutator.update_quote(update).await
    }

    /// Accepts the final ordered id list from the drag gesture layer.
    pub async fn reorder_tasks(&self, ordered: Vec<TaskId>) -> MutationOutcome {
        self.mutator.reorder_tasks(ordered).await
    }

    pub async fn add_task(&self, label: impl Into<String>, is_separator: bool) -> MutationOutcome {
        self.mutator.add_task(label, is_separator).await
    }

    pub async fn add_vendor_quote(&self, new_vendor_quote: NewVendorQuote) -> MutationOutcome {
        self.mutator.add_vendor_quote(new_vendor_quote).await
    }

    pub async fn add_note(&self, content: impl Into<String>) -> MutationOutcome {
        self.mutator.add_note(content).await
    }

    pub async fn add_event(&self, new_event: NewEvent) -> MutationOutcome {
        self.mutator.add_event(new_event).await
    }

    pub async fn remove_task(&self, id: TaskId) -> MutationOutcome {
        self.mutator.remove_task(id).await
    }

    pub async fn remove_vendor_quote(&self, id: VendorQuoteId) -> MutationOutcome {
        self.mutator.remove_vendor_quote(id).await
    }

    pub async fn remove_note(&self, id: NoteId) -> MutationOutcome {
        self.mutator.remove_note(id).await
    }

    pub async fn remove_event(&self, id: EventId) -> MutationOutcome {
        self.mutator.remove_event(id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::adapters::outbound::InMemoryQuoteService;
    use crate::domain::models::{
        Task, VendorId, VendorProgress, VendorQuote, VendorQuoteKind, VendorQuoteStatus,
    };
    use crate::domain::services::completed_task_count;

    fn make_task(id: i64, label: &str, done: bool, is_separator: bool, sort_order: i64) -> Task {
        Task {
            id: TaskId::new(id),
            label: label.to_string(),
            done,
            is_separator,
            sort_order,
        }
    }

    fn make_vendor_quote(id: i64, progress: VendorProgress) -> VendorQuote {
        VendorQuote {
            id: VendorQuoteId::new(id),
            kind: VendorQuoteKind::Freight,
            vendor_id: Some(VendorId::new(3)),
            vendor_name: "Acme Freight".to_string(),
            progress,
            cost: None,
            lead_time_days: None,
            quote_date: None,
            valid_until: None,
            contact_person: None,
            notes: None,
        }
    }

    fn make_quote(id: i64, customer: &str) -> Quote {
        Quote {
            id: QuoteId::new(id),
            customer: customer.to_string(),
            quote_no: format!("Q-{}", id),
            description: None,
            sales_rep: Some("Dana".to_string()),
            hidden: false,
            project_sheet_url: None,
            mpsf_link: None,
            folder_link: None,
            created_at: None,
            updated_at: None,
            tasks: vec![],
            vendor_quotes: vec![],
            notes: vec![],
            events: vec![],
        }
    }

    /// Quote 1: two real tasks (7, 8) and a separator (9); three vendor
    /// quotes of which 21 is complete. Quote 2 is a second quote to
    /// switch to.
    fn seed() -> Vec<Quote> {
        let mut first = make_quote(1, "Acme");
        first.tasks = vec![
            make_task(7, "Send drawings", false, false, 10),
            make_task(8, "Order parts", false, false, 20),
            make_task(9, "Milestones", false, true, 30),
        ];
        first.vendor_quotes = vec![
            make_vendor_quote(
                21,
                VendorProgress::Legacy {
                    requested: true,
                    entered: true,
                },
            ),
            make_vendor_quote(
                22,
                VendorProgress::Legacy {
                    requested: true,
                    entered: false,
                },
            ),
            make_vendor_quote(23, VendorProgress::Status(VendorQuoteStatus::Sent)),
        ];

        let mut second = make_quote(2, "Globex");
        second.tasks = vec![make_task(31, "Kickoff call", false, false, 10)];

        vec![first, second]
    }

    async fn make_session(service: InMemoryQuoteService) -> QuoteSession<InMemoryQuoteService> {
        let session = QuoteSession::new(service);
        session.refresh_quote_list(None, true).await.unwrap();
        session.open_quote(QuoteId::new(1)).await.unwrap();
        session
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<StateChange>) -> Vec<StateChange> {
        let mut changes = Vec::new();
        while let Ok(change) = rx.try_recv() {
            changes.push(change);
        }
        changes
    }

    #[tokio::test]
    async fn toggle_applies_immediately_and_confirms() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;

        assert_eq!(session.toggle_task(TaskId::new(7)).await, MutationOutcome::Applied);

        let quote = session.current_quote().unwrap();
        assert!(quote.task(TaskId::new(7)).unwrap().done);
        assert_eq!(session.summary(QuoteId::new(1)).unwrap().completed_tasks, 1);
        // Confirmed server-side as well.
        assert!(service
            .quote(QuoteId::new(1))
            .unwrap()
            .task(TaskId::new(7))
            .unwrap()
            .done);
    }

    #[tokio::test]
    async fn toggle_failure_rolls_back_detail_and_summary() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;
        service.fail_next("database locked");

        assert_eq!(
            session.toggle_task(TaskId::new(7)).await,
            MutationOutcome::RolledBack
        );

        let quote = session.current_quote().unwrap();
        assert!(!quote.task(TaskId::new(7)).unwrap().done);
        let summary = session.summary(QuoteId::new(1)).unwrap();
        assert_eq!(summary.completed_tasks, 0);
        assert_eq!(summary.task_count, 2);
    }

    #[tokio::test]
    async fn rollback_restores_the_store_byte_for_byte() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;

        let quote_before = session.current_quote();
        let list_before = session.quote_list();

        service.fail_next("boom");
        session.toggle_task(TaskId::new(7)).await;

        assert_eq!(session.current_quote(), quote_before);
        assert_eq!(session.quote_list(), list_before);
    }

    #[tokio::test]
    async fn summary_stays_consistent_across_toggle_sequences() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;

        let steps: &[(i64, bool)] = &[
            (7, false),
            (8, false),
            (7, true), // fails, rolls back
            (8, false),
            (8, false),
            (7, false),
        ];
        for (task_id, fail) in steps {
            if *fail {
                service.fail_next("flaky network");
            }
            session.toggle_task(TaskId::new(*task_id)).await;

            let quote = session.current_quote().unwrap();
            assert_eq!(
                session.summary(QuoteId::new(1)).unwrap().completed_tasks,
                completed_task_count(&quote),
                "after toggling task {}",
                task_id
            );
        }
    }

    #[tokio::test]
    async fn vendor_quote_completion_transition_updates_the_rollup() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;

        let summary = session.summary(QuoteId::new(1)).unwrap();
        assert_eq!(summary.vendor_quote_count, 3);
        assert_eq!(summary.completed_vendor_quotes, 1);

        // Marking the entered flag makes record 22 fully complete.
        let outcome = session
            .update_vendor_quote(VendorQuoteId::new(22), VendorQuotePatch::legacy(true, true))
            .await;
        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(
            session
                .summary(QuoteId::new(1))
                .unwrap()
                .completed_vendor_quotes,
            2
        );

        // Success is final: nothing moves after confirmation.
        assert_eq!(
            session
                .summary(QuoteId::new(1))
                .unwrap()
                .completed_vendor_quotes,
            2
        );
    }

    #[tokio::test]
    async fn vendor_quote_failure_reverts_progress_and_rollup() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;
        service.fail_next("timeout");

        let outcome = session
            .update_vendor_quote(
                VendorQuoteId::new(23),
                VendorQuotePatch::status(VendorQuoteStatus::Firm),
            )
            .await;
        assert_eq!(outcome, MutationOutcome::RolledBack);

        let quote = session.current_quote().unwrap();
        assert_eq!(
            quote.vendor_quote(VendorQuoteId::new(23)).unwrap().progress,
            VendorProgress::Status(VendorQuoteStatus::Sent)
        );
        assert_eq!(
            session
                .summary(QuoteId::new(1))
                .unwrap()
                .completed_vendor_quotes,
            1
        );
    }

    #[tokio::test]
    async fn drag_reorder_persists_the_exact_sequence_and_survives_refresh() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;

        let dragged = vec![TaskId::new(9), TaskId::new(7), TaskId::new(8)];
        assert_eq!(
            session.reorder_tasks(dragged.clone()).await,
            MutationOutcome::Applied
        );
        assert_eq!(
            service.persisted_orders(),
            vec![(QuoteId::new(1), dragged.clone())]
        );

        // The mock backend keeps serving the original order; the cached
        // order wins across a forced refresh.
        session.reload_current().await.unwrap();
        let order: Vec<i64> = session
            .current_quote()
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.id.as_i64())
            .collect();
        assert_eq!(order, vec![9, 7, 8]);
    }

    #[tokio::test]
    async fn tasks_created_since_the_capture_append_after_the_cached_order() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;

        session
            .reorder_tasks(vec![TaskId::new(9), TaskId::new(7), TaskId::new(8)])
            .await;

        // Another client adds a task; it only exists server-side.
        service
            .create_task(
                QuoteId::new(1),
                &crate::domain::models::NewTask {
                    label: "Confirm freight class".to_string(),
                    is_separator: false,
                    sort_order: 40,
                },
            )
            .await
            .unwrap();

        session.reload_current().await.unwrap();
        let order: Vec<i64> = session
            .current_quote()
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.id.as_i64())
            .collect();
        assert_eq!(&order[..3], &[9, 7, 8]);
        assert_eq!(order.len(), 4);
    }

    #[tokio::test]
    async fn reorder_failure_reverts_the_whole_order() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;
        let mut rx = session.subscribe();
        service.fail_next("conflict");

        let outcome = session
            .reorder_tasks(vec![TaskId::new(8), TaskId::new(9), TaskId::new(7)])
            .await;
        assert_eq!(outcome, MutationOutcome::RolledBack);

        let order: Vec<i64> = session
            .current_quote()
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.id.as_i64())
            .collect();
        assert_eq!(order, vec![7, 8, 9]);
        assert!(drain(&mut rx).iter().any(|c| matches!(
            c,
            StateChange::MutationFailed {
                action: "reorder tasks",
                ..
            }
        )));
    }

    #[tokio::test]
    async fn reorder_rejects_id_sets_that_do_not_match_the_list() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;

        let outcome = session
            .reorder_tasks(vec![TaskId::new(7), TaskId::new(8)])
            .await;
        assert!(matches!(outcome, MutationOutcome::Rejected(_)));
        assert!(service.persisted_orders().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn late_failure_after_a_quote_switch_cannot_touch_the_new_quote() {
        let service = InMemoryQuoteService::new()
            .with_quotes(seed())
            .with_latency(Duration::from_millis(50));
        let session = Arc::new(make_session(service.clone()).await);
        service.fail_next("gateway timeout");

        let background = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.toggle_task(TaskId::new(7)).await })
        };
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        // The optimistic change is visible, then the user moves on.
        assert_eq!(session.summary(QuoteId::new(1)).unwrap().completed_tasks, 1);
        session.open_quote(QuoteId::new(2)).await.unwrap();
        let second_before = session.current_quote();

        assert_eq!(background.await.unwrap(), MutationOutcome::RolledBack);

        // Rollback resolved against quote 1 by id: the displayed quote is
        // untouched and the stale optimistic counter was undone.
        assert_eq!(session.current_quote(), second_before);
        assert_eq!(session.summary(QuoteId::new(1)).unwrap().completed_tasks, 0);
        assert_eq!(session.summary(QuoteId::new(2)).unwrap().completed_tasks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn double_submission_on_one_record_is_rejected_while_in_flight() {
        let service = InMemoryQuoteService::new()
            .with_quotes(seed())
            .with_latency(Duration::from_millis(50));
        let session = Arc::new(make_session(service.clone()).await);

        let background = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.toggle_task(TaskId::new(7)).await })
        };
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(
            session.toggle_task(TaskId::new(7)).await,
            MutationOutcome::InFlight
        );
        // A different record is not blocked.
        assert_eq!(
            session.toggle_task(TaskId::new(8)).await,
            MutationOutcome::Applied
        );

        assert_eq!(background.await.unwrap(), MutationOutcome::Applied);
        // Once the request resolves the record accepts mutations again.
        assert_eq!(
            session.toggle_task(TaskId::new(7)).await,
            MutationOutcome::Applied
        );
    }

    #[tokio::test]
    async fn validation_failures_never_touch_the_store() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;
        let mut rx = session.subscribe();
        let before = session.current_quote();

        assert!(matches!(
            session.add_task("   ", false).await,
            MutationOutcome::Rejected(_)
        ));
        assert!(matches!(
            session.add_note("").await,
            MutationOutcome::Rejected(_)
        ));
        let mut bad_update = session.current_quote().unwrap().scalar_snapshot();
        bad_update.customer = String::new();
        assert!(matches!(
            session.update_quote(bad_update).await,
            MutationOutcome::Rejected(_)
        ));

        assert_eq!(session.current_quote(), before);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn creates_and_deletes_keep_list_counters_consistent() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;

        assert_eq!(session.add_task("Follow up", false).await, MutationOutcome::Applied);
        assert_eq!(session.summary(QuoteId::new(1)).unwrap().task_count, 3);

        // Separators join the list but not the totals.
        assert_eq!(session.add_task("Phase 2", true).await, MutationOutcome::Applied);
        assert_eq!(session.summary(QuoteId::new(1)).unwrap().task_count, 3);

        assert_eq!(session.add_note("Called the vendor").await, MutationOutcome::Applied);
        assert_eq!(session.summary(QuoteId::new(1)).unwrap().note_count, 1);

        let added_id = session
            .current_quote()
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.label == "Follow up")
            .map(|t| t.id)
            .unwrap();
        assert_eq!(session.remove_task(added_id).await, MutationOutcome::Applied);
        assert_eq!(session.summary(QuoteId::new(1)).unwrap().task_count, 2);
    }

    #[tokio::test]
    async fn create_failure_reports_and_changes_nothing() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;
        let mut rx = session.subscribe();
        let before = session.current_quote();

        service.fail_next("disk full");
        assert_eq!(session.add_task("Follow up", false).await, MutationOutcome::Failed);

        assert_eq!(session.current_quote(), before);
        assert!(drain(&mut rx).iter().any(|c| matches!(
            c,
            StateChange::MutationFailed {
                action: "add task",
                ..
            }
        )));
    }

    #[tokio::test]
    async fn delete_confirmed_gone_server_side_still_removes_locally() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;

        // Another client already deleted the record on the server.
        service.delete_task(TaskId::new(8)).await.unwrap();

        assert_eq!(session.remove_task(TaskId::new(8)).await, MutationOutcome::Applied);
        assert!(session
            .current_quote()
            .unwrap()
            .task(TaskId::new(8))
            .is_none());
        assert_eq!(session.summary(QuoteId::new(1)).unwrap().task_count, 1);
    }

    #[tokio::test]
    async fn quote_field_edits_sync_the_summary_row_and_roll_back_together() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;

        let mut update = session.current_quote().unwrap().scalar_snapshot();
        update.customer = "Acme Industrial".to_string();
        assert_eq!(session.update_quote(update).await, MutationOutcome::Applied);
        assert_eq!(
            session.summary(QuoteId::new(1)).unwrap().customer,
            "Acme Industrial"
        );

        let mut failing = session.current_quote().unwrap().scalar_snapshot();
        failing.customer = "Acme International".to_string();
        service.fail_next("validation failed upstream");
        assert_eq!(
            session.update_quote(failing).await,
            MutationOutcome::RolledBack
        );
        assert_eq!(session.current_quote().unwrap().customer, "Acme Industrial");
        assert_eq!(
            session.summary(QuoteId::new(1)).unwrap().customer,
            "Acme Industrial"
        );
    }

    #[tokio::test]
    async fn mutations_against_absent_records_are_absorbed() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;
        let mut rx = session.subscribe();

        assert_eq!(
            session.toggle_task(TaskId::new(999)).await,
            MutationOutcome::NotFound
        );
        assert_eq!(
            session
                .update_vendor_quote(VendorQuoteId::new(999), VendorQuotePatch::legacy(true, true))
                .await,
            MutationOutcome::NotFound
        );
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn closing_the_quote_absorbs_every_detail_mutation() {
        let service = InMemoryQuoteService::new().with_quotes(seed());
        let session = make_session(service.clone()).await;
        session.close_quote();

        assert_eq!(
            session.toggle_task(TaskId::new(7)).await,
            MutationOutcome::NotFound
        );
        assert_eq!(
            session.add_task("Orphan", false).await,
            MutationOutcome::NotFound
        );
        assert_eq!(session.current_quote(), None);
    }
}
