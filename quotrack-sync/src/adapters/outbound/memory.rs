use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    models::{
        Event, EventId, NewEvent, NewNote, NewTask, NewVendorQuote, Note, NoteId, Quote, QuoteId,
        QuoteSummary, QuoteUpdate, Task, TaskId, TaskPatch, VendorProgress, VendorQuote,
        VendorQuoteId, VendorQuotePatch,
    },
    ports::outbound::QuoteService,
    QuoteServiceError,
};
use crate::domain::services::{completed_task_count, completed_vendor_quote_count, task_total};

/// In-memory quote backend for tests and offline development.
///
/// Records live in a plain `Vec<Quote>`; list fetches derive summaries the
/// way the real backend's roll-up query does. [`fail_next`] injects a
/// failure into the next mutating call, and [`with_latency`] delays
/// mutating calls so tests can observe genuinely in-flight requests;
/// fetches stay instant, which lets a test switch quotes while a slow
/// mutation is still out.
///
/// `persist_task_order` records the received sequence but leaves the
/// stored task order untouched, so tests can exercise a client-side order
/// overriding what the server keeps returning.
///
/// [`fail_next`]: Self::fail_next
/// [`with_latency`]: Self::with_latency
#[derive(Clone, Default)]
pub struct InMemoryQuoteService {
    quotes: Arc<RwLock<Vec<Quote>>>,
    next_id: Arc<RwLock<i64>>,
    fail_next: Arc<RwLock<Option<String>>>,
    persisted_orders: Arc<RwLock<Vec<(QuoteId, Vec<TaskId>)>>>,
    latency: Option<Duration>,
}

impl InMemoryQuoteService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend with quotes. Child ids must be unique across the
    /// whole seed, as they would be in the real database.
    pub fn with_quotes(self, quotes: Vec<Quote>) -> Self {
        {
            let mut next_id = self.next_id.write().unwrap();
            for quote in &quotes {
                let max_child = quote
                    .tasks
                    .iter()
                    .map(|t| t.id.as_i64())
                    .chain(quote.vendor_quotes.iter().map(|v| v.id.as_i64()))
                    .chain(quote.notes.iter().map(|n| n.id.as_i64()))
                    .chain(quote.events.iter().map(|e| e.id.as_i64()))
                    .chain(std::iter::once(quote.id.as_i64()))
                    .max()
                    .unwrap_or(0);
                *next_id = (*next_id).max(max_child);
            }
            *self.quotes.write().unwrap() = quotes;
        }
        self
    }

    /// Delay every mutating call by the given duration.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next mutating call fail with the given reason.
    pub fn fail_next(&self, reason: impl Into<String>) {
        *self.fail_next.write().unwrap() = Some(reason.into());
    }

    /// Every task ordering received through `persist_task_order`.
    pub fn persisted_orders(&self) -> Vec<(QuoteId, Vec<TaskId>)> {
        self.persisted_orders.read().unwrap().clone()
    }

    /// Server-side view of a quote, for test assertions.
    pub fn quote(&self, id: QuoteId) -> Option<Quote> {
        self.quotes.read().unwrap().iter().find(|q| q.id == id).cloned()
    }

    /// Await point and failure injection for mutating calls.
    async fn gate(&self) -> Result<(), QuoteServiceError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(reason) = self.fail_next.write().unwrap().take() {
            return Err(QuoteServiceError::remote(reason));
        }
        Ok(())
    }

    fn fresh_id(&self) -> i64 {
        let mut next_id = self.next_id.write().unwrap();
        *next_id += 1;
        *next_id
    }

    fn summarize(quote: &Quote) -> QuoteSummary {
        QuoteSummary {
            id: quote.id,
            customer: quote.customer.clone(),
            quote_no: quote.quote_no.clone(),
            description: quote.description.clone(),
            sales_rep: quote.sales_rep.clone(),
            hidden: quote.hidden,
            created_at: quote.created_at,
            updated_at: quote.updated_at,
            task_count: task_total(quote),
            completed_tasks: completed_task_count(quote),
            vendor_quote_count: quote.vendor_quotes.len() as u32,
            completed_vendor_quotes: completed_vendor_quote_count(quote),
            note_count: quote.notes.len() as u32,
        }
    }

    fn matches_search(quote: &Quote, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        quote.customer.to_lowercase().contains(&needle)
            || quote.quote_no.to_lowercase().contains(&needle)
            || quote
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
            || quote
                .sales_rep
                .as_ref()
                .is_some_and(|r| r.to_lowercase().contains(&needle))
    }
}

#[async_trait]
impl QuoteService for InMemoryQuoteService {
    async fn fetch_quote(&self, id: QuoteId) -> Result<Quote, QuoteServiceError> {
        self.quote(id).ok_or(QuoteServiceError::NotFound)
    }

    async fn fetch_quote_list(
        &self,
        search: Option<&str>,
        include_hidden: bool,
    ) -> Result<Vec<QuoteSummary>, QuoteServiceError> {
        let quotes = self.quotes.read().unwrap();
        Ok(quotes
            .iter()
            .filter(|q| include_hidden || !q.hidden)
            .filter(|q| {
                search
                    .filter(|s| !s.is_empty())
                    .map_or(true, |s| Self::matches_search(q, s))
            })
            .map(Self::summarize)
            .collect())
    }

    async fn update_quote(
        &self,
        id: QuoteId,
        update: &QuoteUpdate,
    ) -> Result<(), QuoteServiceError> {
        self.gate().await?;
        let mut quotes = self.quotes.write().unwrap();
        let quote = quotes
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or(QuoteServiceError::NotFound)?;
        quote.apply(update);
        Ok(())
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<(), QuoteServiceError> {
        self.gate().await?;
        let mut quotes = self.quotes.write().unwrap();
        let task = quotes
            .iter_mut()
            .find_map(|q| q.task_mut(id))
            .ok_or(QuoteServiceError::NotFound)?;
        task.apply(patch);
        Ok(())
    }

    async fn update_vendor_quote(
        &self,
        id: VendorQuoteId,
        patch: &VendorQuotePatch,
    ) -> Result<(), QuoteServiceError> {
        self.gate().await?;
        let mut quotes = self.quotes.write().unwrap();
        let vendor_quote = quotes
            .iter_mut()
            .find_map(|q| q.vendor_quote_mut(id))
            .ok_or(QuoteServiceError::NotFound)?;
        vendor_quote.apply(patch);
        Ok(())
    }

    async fn persist_task_order(
        &self,
        quote_id: QuoteId,
        ordered: &[TaskId],
    ) -> Result<(), QuoteServiceError> {
        self.gate().await?;
        if self.quote(quote_id).is_none() {
            return Err(QuoteServiceError::NotFound);
        }
        self.persisted_orders
            .write()
            .unwrap()
            .push((quote_id, ordered.to_vec()));
        Ok(())
    }

    async fn create_task(
        &self,
        quote_id: QuoteId,
        new_task: &NewTask,
    ) -> Result<Task, QuoteServiceError> {
        self.gate().await?;
        let id = self.fresh_id();
        let mut quotes = self.quotes.write().unwrap();
        let quote = quotes
            .iter_mut()
            .find(|q| q.id == quote_id)
            .ok_or(QuoteServiceError::NotFound)?;
        let task = Task {
            id: TaskId::new(id),
            label: new_task.label.clone(),
            done: false,
            is_separator: new_task.is_separator,
            sort_order: new_task.sort_order,
        };
        quote.tasks.push(task.clone());
        Ok(task)
    }

    async fn create_vendor_quote(
        &self,
        quote_id: QuoteId,
        new_vendor_quote: &NewVendorQuote,
    ) -> Result<VendorQuote, QuoteServiceError> {
        self.gate().await?;
        let id = self.fresh_id();
        let mut quotes = self.quotes.write().unwrap();
        let quote = quotes
            .iter_mut()
            .find(|q| q.id == quote_id)
            .ok_or(QuoteServiceError::NotFound)?;
        let vendor_quote = VendorQuote {
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
        };
        quote.vendor_quotes.push(vendor_quote.clone());
        Ok(vendor_quote)
    }

    async fn create_note(
        &self,
        quote_id: QuoteId,
        new_note: &NewNote,
    ) -> Result<Note, QuoteServiceError> {
        self.gate().await?;
        let id = self.fresh_id();
        let mut quotes = self.quotes.write().unwrap();
        let quote = quotes
            .iter_mut()
            .find(|q| q.id == quote_id)
            .ok_or(QuoteServiceError::NotFound)?;
        let note = Note {
            id: NoteId::new(id),
            content: new_note.content.clone(),
            created_at: None,
        };
        quote.notes.insert(0, note.clone());
        Ok(note)
    }

    async fn create_event(
        &self,
        quote_id: QuoteId,
        new_event: &NewEvent,
    ) -> Result<Event, QuoteServiceError> {
        self.gate().await?;
        let id = self.fresh_id();
        let mut quotes = self.quotes.write().unwrap();
        let quote = quotes
            .iter_mut()
            .find(|q| q.id == quote_id)
            .ok_or(QuoteServiceError::NotFound)?;
        let event = Event {
            id: EventId::new(id),
            description: new_event.description.clone(),
            past: new_event.past.as_ref().map(|p| p.to_string()),
            created_at: None,
        };
        quote.events.insert(0, event.clone());
        Ok(event)
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), QuoteServiceError> {
        self.gate().await?;
        let mut quotes = self.quotes.write().unwrap();
        for quote in quotes.iter_mut() {
            if let Some(pos) = quote.tasks.iter().position(|t| t.id == id) {
                quote.tasks.remove(pos);
                return Ok(());
            }
        }
        Err(QuoteServiceError::NotFound)
    }

    async fn delete_vendor_quote(&self, id: VendorQuoteId) -> Result<(), QuoteServiceError> {
        self.gate().await?;
        let mut quotes = self.quotes.write().unwrap();
        for quote in quotes.iter_mut() {
            if let Some(pos) = quote.vendor_quotes.iter().position(|v| v.id == id) {
                quote.vendor_quotes.remove(pos);
                return Ok(());
            }
        }
        Err(QuoteServiceError::NotFound)
    }

    async fn delete_note(&self, id: NoteId) -> Result<(), QuoteServiceError> {
        self.gate().await?;
        let mut quotes = self.quotes.write().unwrap();
        for quote in quotes.iter_mut() {
            if let Some(pos) = quote.notes.iter().position(|n| n.id == id) {
                quote.notes.remove(pos);
                return Ok(());
            }
        }
        Err(QuoteServiceError::NotFound)
    }

    async fn delete_event(&self, id: EventId) -> Result<(), QuoteServiceError> {
        self.gate().await?;
        let mut quotes = self.quotes.write().unwrap();
        for quote in quotes.iter_mut() {
            if let Some(pos) = quote.events.iter().position(|e| e.id == id) {
                quote.events.remove(pos);
                return Ok(());
            }
        }
        Err(QuoteServiceError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_quote(id: i64) -> Quote {
        Quote {
            id: QuoteId::new(id),
            customer: "Acme".to_string(),
            quote_no: format!("Q-{}", id),
            description: Some("Conveyor line".to_string()),
            sales_rep: Some("Dana".to_string()),
            hidden: false,
            project_sheet_url: None,
            mpsf_link: None,
            folder_link: None,
            created_at: None,
            updated_at: None,
            tasks: vec![
                Task {
                    id: TaskId::new(id * 100 + 1),
                    label: "Request quotes".to_string(),
                    done: true,
                    is_separator: false,
                    sort_order: 10,
                },
                Task {
                    id: TaskId::new(id * 100 + 2),
                    label: "Enter pricing".to_string(),
                    done: false,
                    is_separator: false,
                    sort_order: 20,
                },
            ],
            vendor_quotes: vec![],
            notes: vec![],
            events: vec![],
        }
    }

    #[tokio::test]
    async fn list_derives_counters_from_detail() {
        let service = InMemoryQuoteService::new().with_quotes(vec![make_quote(1)]);
        let list = service.fetch_quote_list(None, false).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].task_count, 2);
        assert_eq!(list[0].completed_tasks, 1);
    }

    #[tokio::test]
    async fn list_respects_search_and_hidden_filters() {
        let mut hidden = make_quote(2);
        hidden.hidden = true;
        let service = InMemoryQuoteService::new().with_quotes(vec![make_quote(1), hidden]);

        assert_eq!(service.fetch_quote_list(None, false).await.unwrap().len(), 1);
        assert_eq!(service.fetch_quote_list(None, true).await.unwrap().len(), 2);
        assert_eq!(
            service
                .fetch_quote_list(Some("acme"), true)
                .await
                .unwrap()
                .len(),
            2
        );
        assert!(service
            .fetch_quote_list(Some("nope"), true)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn fail_next_fails_exactly_one_mutating_call() {
        let service = InMemoryQuoteService::new().with_quotes(vec![make_quote(1)]);
        service.fail_next("backend down");

        // Fetches are unaffected; the queued failure hits the next mutation.
        assert!(service.fetch_quote(QuoteId::new(1)).await.is_ok());
        let patch = TaskPatch::done(true);
        assert!(service.update_task(TaskId::new(101), &patch).await.is_err());
        assert!(service.update_task(TaskId::new(101), &patch).await.is_ok());
    }

    #[tokio::test]
    async fn created_ids_are_unique_and_server_assigned() {
        let service = InMemoryQuoteService::new().with_quotes(vec![make_quote(1)]);
        let quote_id = QuoteId::new(1);

        let first = service
            .create_task(
                quote_id,
                &NewTask {
                    label: "Follow up".to_string(),
                    is_separator: false,
                    sort_order: 30,
                },
            )
            .await
            .unwrap();
        let second = service
            .create_note(quote_id, &NewNote::new("Called vendor"))
            .await
            .unwrap();

        assert_ne!(first.id.as_i64(), second.id.as_i64());
        assert!(first.id.as_i64() > 102);
    }
}
