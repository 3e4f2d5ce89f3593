use time::OffsetDateTime;

use super::{
    Event, EventId, Note, NoteId, QuoteId, Task, TaskId, VendorQuote, VendorQuoteId,
};

/// The full detail of one quote: scalar fields plus the owned child
/// collections. At most one of these is loaded at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub id: QuoteId,
    pub customer: String,
    pub quote_no: String,
    pub description: Option<String>,
    pub sales_rep: Option<String>,
    pub hidden: bool,
    pub project_sheet_url: Option<String>,
    pub mpsf_link: Option<String>,
    pub folder_link: Option<String>,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    pub tasks: Vec<Task>,
    pub vendor_quotes: Vec<VendorQuote>,
    pub notes: Vec<Note>,
    pub events: Vec<Event>,
}

impl Quote {
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn vendor_quote(&self, id: VendorQuoteId) -> Option<&VendorQuote> {
        self.vendor_quotes.iter().find(|v| v.id == id)
    }

    pub fn vendor_quote_mut(&mut self, id: VendorQuoteId) -> Option<&mut VendorQuote> {
        self.vendor_quotes.iter_mut().find(|v| v.id == id)
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// The `sort_order` a task appended at the end of the list should get.
    pub fn next_task_sort_order(&self) -> i64 {
        self.tasks
            .iter()
            .map(|t| t.sort_order)
            .max()
            .unwrap_or(0)
            + super::SORT_ORDER_GAP
    }

    /// Apply a scalar-field update in place. Child collections are not
    /// touched.
    pub fn apply(&mut self, update: &QuoteUpdate) {
        self.customer = update.customer.clone();
        self.quote_no = update.quote_no.clone();
        self.description = update.description.clone();
        self.sales_rep = update.sales_rep.clone();
        self.project_sheet_url = update.project_sheet_url.clone();
        self.mpsf_link = update.mpsf_link.clone();
        self.folder_link = update.folder_link.clone();
        self.hidden = update.hidden;
    }

    /// Snapshot the scalar fields as an update that undoes any other one.
    pub fn scalar_snapshot(&self) -> QuoteUpdate {
        QuoteUpdate {
            customer: self.customer.clone(),
            quote_no: self.quote_no.clone(),
            description: self.description.clone(),
            sales_rep: self.sales_rep.clone(),
            project_sheet_url: self.project_sheet_url.clone(),
            mpsf_link: self.mpsf_link.clone(),
            folder_link: self.folder_link.clone(),
            hidden: self.hidden,
        }
    }
}

/// Replacement for a quote's scalar fields, mirroring the edit form: the
/// backend's update endpoint takes the full field set, not a delta.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteUpdate {
    pub customer: String,
    pub quote_no: String,
    pub description: Option<String>,
    pub sales_rep: Option<String>,
    pub project_sheet_url: Option<String>,
    pub mpsf_link: Option<String>,
    pub folder_link: Option<String>,
    pub hidden: bool,
}

/// The list projection of a quote, including the roll-up counters shown
/// without loading detail.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSummary {
    pub id: QuoteId,
    pub customer: String,
    pub quote_no: String,
    pub description: Option<String>,
    pub sales_rep: Option<String>,
    pub hidden: bool,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    pub task_count: u32,
    pub completed_tasks: u32,
    pub vendor_quote_count: u32,
    pub completed_vendor_quotes: u32,
    pub note_count: u32,
}
