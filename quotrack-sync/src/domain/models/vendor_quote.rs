use strum::{Display, EnumString};
use time::Date;

use super::{VendorId, VendorQuoteId};

/// What a vendor is being asked to quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum VendorQuoteKind {
    Freight,
    Install,
    Forward,
}

/// Progress of a vendor quote under the enhanced tracking scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "title_case")]
pub enum VendorQuoteStatus {
    NotStarted,
    NotSent,
    Sent,
    Blocked,
    Invalid,
    Firm,
}

/// Progress representation of a vendor quote.
///
/// Rows written before the schema migration carry a `requested`/`entered`
/// boolean pair; newer rows carry a status value. A record holds exactly
/// one representation, and completion is answered here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorProgress {
    Legacy { requested: bool, entered: bool },
    Status(VendorQuoteStatus),
}

impl VendorProgress {
    /// Whether the quote has been both requested from the vendor and
    /// received back.
    pub fn is_fully_complete(&self) -> bool {
        match self {
            VendorProgress::Legacy { requested, entered } => *requested && *entered,
            VendorProgress::Status(status) => *status == VendorQuoteStatus::Firm,
        }
    }
}

/// A vendor's pricing/response record attached to a quote.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorQuote {
    pub id: VendorQuoteId,
    pub kind: VendorQuoteKind,
    pub vendor_id: Option<VendorId>,
    pub vendor_name: String,
    pub progress: VendorProgress,
    pub cost: Option<f64>,
    pub lead_time_days: Option<i32>,
    pub quote_date: Option<Date>,
    pub valid_until: Option<Date>,
    pub contact_person: Option<String>,
    pub notes: Option<String>,
}

impl VendorQuote {
    pub fn is_fully_complete(&self) -> bool {
        self.progress.is_fully_complete()
    }

    /// Apply a shallow patch in place.
    pub fn apply(&mut self, patch: &VendorQuotePatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(cost) = patch.cost {
            self.cost = cost;
        }
        if let Some(lead_time_days) = patch.lead_time_days {
            self.lead_time_days = lead_time_days;
        }
        if let Some(quote_date) = patch.quote_date {
            self.quote_date = quote_date;
        }
        if let Some(valid_until) = patch.valid_until {
            self.valid_until = valid_until;
        }
        if let Some(contact_person) = &patch.contact_person {
            self.contact_person = contact_person.clone();
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
    }

    /// Capture the patch that undoes `patch`.
    pub fn inverse_of(&self, patch: &VendorQuotePatch) -> VendorQuotePatch {
        VendorQuotePatch {
            kind: patch.kind.map(|_| self.kind),
            progress: patch.progress.map(|_| self.progress),
            cost: patch.cost.map(|_| self.cost),
            lead_time_days: patch.lead_time_days.map(|_| self.lead_time_days),
            quote_date: patch.quote_date.map(|_| self.quote_date),
            valid_until: patch.valid_until.map(|_| self.valid_until),
            contact_person: patch
                .contact_person
                .as_ref()
                .map(|_| self.contact_person.clone()),
            notes: patch.notes.as_ref().map(|_| self.notes.clone()),
        }
    }
}

/// Shallow partial update for a vendor quote. Optional fields use a nested
/// `Option` so a patch can clear a value as well as set one.
///
/// `progress` replaces the whole representation, which keeps a record from
/// mixing legacy booleans with status values mid-session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VendorQuotePatch {
    pub kind: Option<VendorQuoteKind>,
    pub progress: Option<VendorProgress>,
    pub cost: Option<Option<f64>>,
    pub lead_time_days: Option<Option<i32>>,
    pub quote_date: Option<Option<Date>>,
    pub valid_until: Option<Option<Date>>,
    pub contact_person: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl VendorQuotePatch {
    pub fn status(status: VendorQuoteStatus) -> Self {
        Self {
            progress: Some(VendorProgress::Status(status)),
            ..Default::default()
        }
    }

    pub fn legacy(requested: bool, entered: bool) -> Self {
        Self {
            progress: Some(VendorProgress::Legacy { requested, entered }),
            ..Default::default()
        }
    }
}

/// Payload for creating a vendor quote.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVendorQuote {
    pub kind: VendorQuoteKind,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub status: VendorQuoteStatus,
    pub cost: Option<f64>,
    pub lead_time_days: Option<i32>,
    pub quote_date: Option<Date>,
    pub valid_until: Option<Date>,
    pub contact_person: Option<String>,
    pub notes: Option<String>,
}

impl NewVendorQuote {
    pub fn new(kind: VendorQuoteKind, vendor_id: VendorId, vendor_name: impl Into<String>) -> Self {
        Self {
            kind,
            vendor_id,
            vendor_name: vendor_name.into(),
            status: VendorQuoteStatus::NotStarted,
            cost: None,
            lead_time_days: None,
            quote_date: None,
            valid_until: None,
            contact_person: None,
            notes: None,
        }
    }
}
