use async_trait::async_trait;

use crate::domain::{
    models::{
        Event, EventId, NewEvent, NewNote, NewTask, NewVendorQuote, Note, NoteId, Quote, QuoteId,
        QuoteSummary, QuoteUpdate, Task, TaskId, TaskPatch, VendorQuote, VendorQuoteId,
        VendorQuotePatch,
    },
    QuoteServiceError,
};

/// Outbound port for the quote backend.
///
/// This trait defines the contract any quote store (the REST backend, or
/// an in-memory double) must implement. Ids are always server-assigned:
/// create operations return the stored record so callers never invent
/// identifiers.
#[async_trait]
pub trait QuoteService: Send + Sync + 'static {
    /// Fetch one quote with all child collections.
    async fn fetch_quote(&self, id: QuoteId) -> Result<Quote, QuoteServiceError>;

    /// Fetch the quote list projection, optionally filtered by a search
    /// term matched against customer, quote number, description, and
    /// sales rep.
    async fn fetch_quote_list(
        &self,
        search: Option<&str>,
        include_hidden: bool,
    ) -> Result<Vec<QuoteSummary>, QuoteServiceError>;

    /// Replace a quote's scalar fields.
    async fn update_quote(
        &self,
        id: QuoteId,
        update: &QuoteUpdate,
    ) -> Result<(), QuoteServiceError>;

    /// Apply a partial update to a task.
    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<(), QuoteServiceError>;

    /// Apply a partial update to a vendor quote.
    async fn update_vendor_quote(
        &self,
        id: VendorQuoteId,
        patch: &VendorQuotePatch,
    ) -> Result<(), QuoteServiceError>;

    /// Persist a complete task ordering for a quote. All-or-nothing: the
    /// backend either stores the whole sequence or reports failure.
    async fn persist_task_order(
        &self,
        quote_id: QuoteId,
        ordered: &[TaskId],
    ) -> Result<(), QuoteServiceError>;

    async fn create_task(
        &self,
        quote_id: QuoteId,
        new_task: &NewTask,
    ) -> Result<Task, QuoteServiceError>;

    async fn create_vendor_quote(
        &self,
        quote_id: QuoteId,
        new_vendor_quote: &NewVendorQuote,
    ) -> Result<VendorQuote, QuoteServiceError>;

    async fn create_note(
        &self,
        quote_id: QuoteId,
        new_note: &NewNote,
    ) -> Result<Note, QuoteServiceError>;

    async fn create_event(
        &self,
        quote_id: QuoteId,
        new_event: &NewEvent,
    ) -> Result<Event, QuoteServiceError>;

    async fn delete_task(&self, id: TaskId) -> Result<(), QuoteServiceError>;

    async fn delete_vendor_quote(&self, id: VendorQuoteId) -> Result<(), QuoteServiceError>;

    async fn delete_note(&self, id: NoteId) -> Result<(), QuoteServiceError>;

    async fn delete_event(&self, id: EventId) -> Result<(), QuoteServiceError>;
}
