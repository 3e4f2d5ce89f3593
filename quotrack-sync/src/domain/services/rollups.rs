use crate::domain::models::{Quote, QuoteId};

use super::store::StateStore;

/// Which completion counter a delta applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Task,
    VendorQuote,
}

/// Tasks that count toward totals, i.e. everything but separators.
pub fn task_total(quote: &Quote) -> u32 {
    quote
        .tasks
        .iter()
        .filter(|t| t.counts_toward_totals())
        .count() as u32
}

pub fn completed_task_count(quote: &Quote) -> u32 {
    quote
        .tasks
        .iter()
        .filter(|t| t.counts_toward_totals() && t.done)
        .count() as u32
}

pub fn completed_vendor_quote_count(quote: &Quote) -> u32 {
    quote
        .vendor_quotes
        .iter()
        .filter(|v| v.is_fully_complete())
        .count() as u32
}

/// Signed change in a completion counter implied by a done/complete
/// transition.
pub fn completion_delta(was_complete: bool, now_complete: bool) -> i32 {
    (now_complete as i32) - (was_complete as i32)
}

/// Apply a completion delta to the matching summary row, clamped to
/// `[0, total]`. No-op when the quote is absent from the list.
pub fn apply_completion_delta(
    store: &StateStore,
    quote_id: QuoteId,
    kind: CompletionKind,
    delta: i32,
) {
    if delta == 0 {
        return;
    }
    store.mutate_summary(quote_id, |summary| match kind {
        CompletionKind::Task => {
            summary.completed_tasks =
                clamped_add(summary.completed_tasks, delta, summary.task_count);
        }
        CompletionKind::VendorQuote => {
            summary.completed_vendor_quotes = clamped_add(
                summary.completed_vendor_quotes,
                delta,
                summary.vendor_quote_count,
            );
        }
    });
}

/// Re-derive every counter on the summary row from the quote's live
/// collections. Used on load, after create/delete, and when a rollback
/// needs absolute numbers rather than a delta.
pub fn refresh_counts(store: &StateStore, quote: &Quote) {
    let task_count = task_total(quote);
    let completed_tasks = completed_task_count(quote);
    let vendor_quote_count = quote.vendor_quotes.len() as u32;
    let completed_vendor_quotes = completed_vendor_quote_count(quote);
    let note_count = quote.notes.len() as u32;

    store.mutate_summary(quote.id, |summary| {
        summary.task_count = task_count;
        summary.completed_tasks = completed_tasks;
        summary.vendor_quote_count = vendor_quote_count;
        summary.completed_vendor_quotes = completed_vendor_quotes;
        summary.note_count = note_count;
    });
}

fn clamped_add(count: u32, delta: i32, total: u32) -> u32 {
    let raw = count as i64 + delta as i64;
    raw.clamp(0, total as i64) as u32
}
