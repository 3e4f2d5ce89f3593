use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use quotrack_client::domain as wire;

use crate::domain::models::{
    Event, EventId, NewTask, NewVendorQuote, Note, NoteId, Quote, QuoteId, QuoteSummary,
    QuoteUpdate, Task, TaskId, TaskPatch, VendorId, VendorProgress, VendorQuote, VendorQuoteId,
    VendorQuoteKind, VendorQuoteStatus, VendorQuotePatch, SORT_ORDER_GAP,
};

// ============================================================================
// Wire -> domain
// ============================================================================

/// The backend emits SQLite `CURRENT_TIMESTAMP` strings; newer revisions
/// emit RFC 3339. Accept both, treat anything else as absent.
pub(super) fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let sqlite = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    if let Ok(dt) = PrimitiveDateTime::parse(raw, sqlite) {
        return Some(dt.assume_utc());
    }
    OffsetDateTime::parse(raw, &Rfc3339).ok()
}

pub(super) fn opt_timestamp(raw: Option<&str>) -> Option<OffsetDateTime> {
    let raw = raw?;
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        tracing::debug!("unparseable timestamp from backend: {:?}", raw);
    }
    parsed
}

pub(super) fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

/// Fold both status vocabularies into the current one: current names
/// round-trip through `FromStr`, and the transitional names written by
/// the schema migration map onto their closest current state.
pub(super) fn parse_status(raw: &str) -> Option<VendorQuoteStatus> {
    if let Ok(status) = raw.parse::<VendorQuoteStatus>() {
        return Some(status);
    }
    match raw.to_ascii_lowercase().as_str() {
        "draft" => Some(VendorQuoteStatus::NotStarted),
        "requested" | "reviewing" => Some(VendorQuoteStatus::Sent),
        "received" | "selected" => Some(VendorQuoteStatus::Firm),
        "rejected" | "expired" => Some(VendorQuoteStatus::Invalid),
        _ => None,
    }
}

/// Legacy rows carry no sort order; synthesize the gap convention from
/// the served position so later inserts have room.
pub(super) fn to_domain_task(row: wire::TaskRow, index: usize) -> Task {
    Task {
        id: TaskId::new(row.id),
        label: row.label,
        done: row.done,
        is_separator: row.is_separator,
        sort_order: row
            .sort_order
            .unwrap_or((index as i64 + 1) * SORT_ORDER_GAP),
    }
}

/// Resolve a vendor quote row to the domain shape, normalizing whichever
/// progress representation the row carries. Rows with an unknown type or
/// status are reported as errors so the caller can skip them.
pub(super) fn to_domain_vendor_quote(row: wire::VendorQuoteRow) -> Result<VendorQuote, String> {
    let kind: VendorQuoteKind = row
        .kind
        .parse()
        .map_err(|_| format!("unknown vendor quote type {:?}", row.kind))?;

    let progress = match &row.status {
        Some(raw) => VendorProgress::Status(
            parse_status(raw).ok_or_else(|| format!("unknown vendor quote status {:?}", raw))?,
        ),
        None => VendorProgress::Legacy {
            requested: row.requested.unwrap_or(false),
            entered: row.entered.unwrap_or(false),
        },
    };

    Ok(VendorQuote {
        id: VendorQuoteId::new(row.id),
        kind,
        vendor_id: row.vendor_id.map(VendorId::new),
        vendor_name: row.vendor_name.or(row.vendor).unwrap_or_default(),
        progress,
        cost: row.cost,
        lead_time_days: row.lead_time_days,
        quote_date: row
            .quote_date
            .or(row.date)
            .as_deref()
            .and_then(parse_date),
        valid_until: row.valid_until.as_deref().and_then(parse_date),
        contact_person: row.contact_person,
        notes: row.notes,
    })
}

pub(super) fn to_domain_note(row: wire::NoteRow) -> Note {
    Note {
        id: NoteId::new(row.id),
        content: row.content,
        created_at: opt_timestamp(row.created_at.as_deref()),
    }
}

pub(super) fn to_domain_event(row: wire::EventRow) -> Event {
    Event {
        id: EventId::new(row.id),
        description: row.description,
        past: row.past,
        created_at: opt_timestamp(row.created_at.as_deref()),
    }
}

pub(super) fn to_domain_summary(row: wire::QuoteRow) -> QuoteSummary {
    QuoteSummary {
        id: QuoteId::new(row.id),
        customer: row.customer,
        quote_no: row.quote_no,
        description: row.description,
        sales_rep: row.sales_rep,
        hidden: row.hidden,
        created_at: opt_timestamp(row.created_at.as_deref()),
        updated_at: opt_timestamp(row.updated_at.as_deref()),
        task_count: row.task_count,
        completed_tasks: row.completed_tasks,
        vendor_quote_count: row.vendor_quote_count,
        completed_vendor_quotes: row.completed_vendor_quotes,
        note_count: row.note_count,
    }
}

pub(super) fn to_domain_quote(detail: wire::QuoteDetail, events: Vec<wire::EventRow>) -> Quote {
    let vendor_quotes = detail
        .vendor_quotes
        .into_iter()
        .filter_map(|row| {
            to_domain_vendor_quote(row)
                .map_err(|reason| tracing::warn!("skipping vendor quote row: {}", reason))
                .ok()
        })
        .collect();

    Quote {
        id: QuoteId::new(detail.id),
        customer: detail.customer,
        quote_no: detail.quote_no,
        description: detail.description,
        sales_rep: detail.sales_rep,
        hidden: detail.hidden,
        project_sheet_url: detail.project_sheet_url,
        mpsf_link: detail.mpsf_link,
        folder_link: detail.folder_link,
        created_at: opt_timestamp(detail.created_at.as_deref()),
        updated_at: opt_timestamp(detail.updated_at.as_deref()),
        tasks: detail
            .tasks
            .into_iter()
            .enumerate()
            .map(|(index, row)| to_domain_task(row, index))
            .collect(),
        vendor_quotes,
        notes: detail.notes.into_iter().map(to_domain_note).collect(),
        events: events.into_iter().map(to_domain_event).collect(),
    }
}

// ============================================================================
// Domain -> wire
// ============================================================================

pub(super) fn task_patch_to_wire(patch: &TaskPatch) -> wire::TaskUpdate {
    wire::TaskUpdate {
        label: patch.label.clone(),
        done: patch.done,
        is_separator: patch.is_separator,
    }
}

pub(super) fn vendor_quote_patch_to_wire(patch: &VendorQuotePatch) -> wire::VendorQuoteUpdate {
    let (requested, entered, status) = match patch.progress {
        Some(VendorProgress::Legacy { requested, entered }) => {
            (Some(requested), Some(entered), None)
        }
        Some(VendorProgress::Status(status)) => (None, None, Some(status.to_string())),
        None => (None, None, None),
    };

    // The backend's partial update skips absent fields, so clearing a
    // value cannot be expressed on the wire; `Some(None)` stays local.
    wire::VendorQuoteUpdate {
        kind: patch.kind.map(|k| k.to_string()),
        vendor_id: None,
        status,
        requested,
        entered,
        cost: patch.cost.flatten(),
        lead_time_days: patch.lead_time_days.flatten(),
        quote_date: patch.quote_date.flatten().map(|d| d.to_string()),
        valid_until: patch.valid_until.flatten().map(|d| d.to_string()),
        contact_person: patch.contact_person.clone().flatten(),
        notes: patch.notes.clone().flatten(),
    }
}

pub(super) fn quote_update_to_wire(update: &QuoteUpdate) -> wire::QuotePayload {
    wire::QuotePayload {
        customer: update.customer.clone(),
        quote_no: update.quote_no.clone(),
        description: update.description.clone(),
        sales_rep: update.sales_rep.clone(),
        project_sheet_url: update.project_sheet_url.clone(),
        mpsf_link: update.mpsf_link.clone(),
        folder_link: update.folder_link.clone(),
        hidden: Some(update.hidden),
    }
}

pub(super) fn new_task_to_wire(new_task: &NewTask) -> wire::NewTaskPayload {
    wire::NewTaskPayload {
        label: new_task.label.clone(),
        is_separator: new_task.is_separator,
        sort_order: Some(new_task.sort_order),
    }
}

pub(super) fn new_vendor_quote_to_wire(
    new_vendor_quote: &NewVendorQuote,
) -> wire::NewVendorQuotePayload {
    wire::NewVendorQuotePayload {
        kind: new_vendor_quote.kind.to_string(),
        vendor_id: new_vendor_quote.vendor_id.as_i64(),
        status: Some(new_vendor_quote.status.to_string()),
        cost: new_vendor_quote.cost,
        lead_time_days: new_vendor_quote.lead_time_days,
        quote_date: new_vendor_quote.quote_date.map(|d| d.to_string()),
        valid_until: new_vendor_quote.valid_until.map(|d| d.to_string()),
        contact_person: new_vendor_quote.contact_person.clone(),
        notes: new_vendor_quote.notes.clone(),
    }
}
