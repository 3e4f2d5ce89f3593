mod conversions;

use async_trait::async_trait;

use quotrack_client::{ApiFetchError, ClientConfig, QuotrackClient};

use crate::domain::{
    models::{
        Event, EventId, NewEvent, NewNote, NewTask, NewVendorQuote, Note, NoteId, Quote, QuoteId,
        QuoteSummary, QuoteUpdate, Task, TaskId, TaskPatch, VendorProgress, VendorQuote,
        VendorQuoteId, VendorQuotePatch,
    },
    ports::outbound::QuoteService,
    QuoteServiceError,
};

use self::conversions::{
    new_task_to_wire, new_vendor_quote_to_wire, quote_update_to_wire, task_patch_to_wire,
    to_domain_quote, to_domain_summary, vendor_quote_patch_to_wire,
};

/// Adapter that drives the REST backend through `quotrack-client`,
/// normalizing wire rows into the domain model at the boundary.
pub struct HttpQuoteService {
    client: QuotrackClient,
}

impl HttpQuoteService {
    pub fn new(config: &ClientConfig) -> Result<Self, QuoteServiceError> {
        QuotrackClient::new(config)
            .map(|client| Self { client })
            .map_err(map_fetch_error)
    }

    pub fn from_client(client: QuotrackClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuoteService for HttpQuoteService {
    async fn fetch_quote(&self, id: QuoteId) -> Result<Quote, QuoteServiceError> {
        let detail = self
            .client
            .fetch_quote(id.as_i64())
            .await
            .map_err(map_fetch_error)?;
        // Events are served from their own endpoint, not nested in detail.
        let events = self
            .client
            .fetch_events(id.as_i64())
            .await
            .map_err(map_fetch_error)?;
        Ok(to_domain_quote(detail, events))
    }

    async fn fetch_quote_list(
        &self,
        search: Option<&str>,
        include_hidden: bool,
    ) -> Result<Vec<QuoteSummary>, QuoteServiceError> {
        let rows = self
            .client
            .fetch_quotes(search, include_hidden)
            .await
            .map_err(map_fetch_error)?;
        Ok(rows.into_iter().map(to_domain_summary).collect())
    }

    async fn update_quote(
        &self,
        id: QuoteId,
        update: &QuoteUpdate,
    ) -> Result<(), QuoteServiceError> {
        self.client
            .update_quote(id.as_i64(), &quote_update_to_wire(update))
            .await
            .map_err(map_fetch_error)
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<(), QuoteServiceError> {
        self.client
            .update_task(id.as_i64(), &task_patch_to_wire(patch))
            .await
            .map_err(map_fetch_error)
    }

    async fn update_vendor_quote(
        &self,
        id: VendorQuoteId,
        patch: &VendorQuotePatch,
    ) -> Result<(), QuoteServiceError> {
        self.client
            .update_vendor_quote(id.as_i64(), &vendor_quote_patch_to_wire(patch))
            .await
            .map_err(map_fetch_error)
    }

    async fn persist_task_order(
        &self,
        quote_id: QuoteId,
        ordered: &[TaskId],
    ) -> Result<(), QuoteServiceError> {
        let ids: Vec<i64> = ordered.iter().map(|id| id.as_i64()).collect();
        self.client
            .reorder_tasks(quote_id.as_i64(), ids)
            .await
            .map_err(map_fetch_error)
    }

    async fn create_task(
        &self,
        quote_id: QuoteId,
        new_task: &NewTask,
    ) -> Result<Task, QuoteServiceError> {
        let id = self
            .client
            .create_task(quote_id.as_i64(), &new_task_to_wire(new_task))
            .await
            .map_err(map_fetch_error)?;
        Ok(Task {
            id: TaskId::new(id),
            label: new_task.label.clone(),
            done: false,
            is_separator: new_task.is_separator,
            sort_order: new_task.sort_order,
        })
    }

    async fn create_vendor_quote(
        &self,
        quote_id: QuoteId,
        new_vendor_quote: &NewVendorQuote,
    ) -> Result<VendorQuote, QuoteServiceError> {
        let id = self
            .client
            .create_vendor_quote(quote_id.as_i64(), &new_vendor_quote_to_wire(new_vendor_quote))
            .await
            .map_err(map_fetch_error)?;
        Ok(VendorQuote {
            id: VendorQuoteId::new(id),
            kind: new_vendor_quote.kind,
            vendor_id: Some(new_vendor_quote.vendor_id),
            vendor_name: new_vendor_quote.vendor_name.clone(),
            progress: VendorProgress::Status(new_vendor_quote.status),
            cost: new_vendor_quote.cost,
            lead_time_days: new_vendor_quote.lead_time_days,
            quote_date: new_vendor_quote.quote_date,
            valid_until: new_vendor_quote.valid_until,
            contact_person: new_vendor_quote.contact_person.clone(),
            notes: new_vendor_quote.notes.clone(),
        })
    }

    async fn create_note(
        &self,
        quote_id: QuoteId,
        new_note: &NewNote,
    ) -> Result<Note, QuoteServiceError> {
        let id = self
            .client
            .create_note(&quotrack_client::domain::NewNotePayload {
                quote_id: quote_id.as_i64(),
                content: new_note.content.clone(),
            })
            .await
            .map_err(map_fetch_error)?;
        Ok(Note {
            id: NoteId::new(id),
            content: new_note.content.clone(),
            created_at: None,
        })
    }

    async fn create_event(
        &self,
        quote_id: QuoteId,
        new_event: &NewEvent,
    ) -> Result<Event, QuoteServiceError> {
        let id = self
            .client
            .create_event(&quotrack_client::domain::NewEventPayload {
                quote_id: quote_id.as_i64(),
                description: new_event.description.clone(),
                past: new_event.past.clone(),
            })
            .await
            .map_err(map_fetch_error)?;
        Ok(Event {
            id: EventId::new(id),
            description: new_event.description.clone(),
            past: new_event.past.as_ref().map(|p| p.to_string()),
            created_at: None,
        })
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), QuoteServiceError> {
        self.client
            .delete_task(id.as_i64())
            .await
            .map_err(map_fetch_error)
    }

    async fn delete_vendor_quote(&self, id: VendorQuoteId) -> Result<(), QuoteServiceError> {
        self.client
            .delete_vendor_quote(id.as_i64())
            .await
            .map_err(map_fetch_error)
    }

    async fn delete_note(&self, id: NoteId) -> Result<(), QuoteServiceError> {
        self.client
            .delete_note(id.as_i64())
            .await
            .map_err(map_fetch_error)
    }

    async fn delete_event(&self, id: EventId) -> Result<(), QuoteServiceError> {
        self.client
            .delete_event(id.as_i64())
            .await
            .map_err(map_fetch_error)
    }
}

fn map_fetch_error(error: ApiFetchError) -> QuoteServiceError {
    match error {
        ApiFetchError::NotFound => QuoteServiceError::NotFound,
        ApiFetchError::ResponseError(msg)
        | ApiFetchError::ParsingError(msg)
        | ApiFetchError::Other(msg) => QuoteServiceError::remote(msg),
    }
}
