use serde::{Deserialize, Serialize};

use super::{NoteRow, TaskRow, VendorQuoteRow};

/// A row from `GET /api/quotes`: the list projection with roll-up counters.
///
/// Counter columns are computed server-side; `completed_vendor_quotes` is
/// absent on older server revisions and defaults to zero.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuoteRow {
    pub id: i64,
    pub customer: String,
    pub quote_no: String,
    pub description: Option<String>,
    pub sales_rep: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub task_count: u32,
    #[serde(default)]
    pub completed_tasks: u32,
    #[serde(default)]
    pub vendor_quote_count: u32,
    #[serde(default)]
    pub completed_vendor_quotes: u32,
    #[serde(default)]
    pub note_count: u32,
}

/// Full quote detail from `GET /api/quotes/{id}`, with nested children.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuoteDetail {
    pub id: i64,
    pub customer: String,
    pub quote_no: String,
    pub description: Option<String>,
    pub sales_rep: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    pub project_sheet_url: Option<String>,
    pub mpsf_link: Option<String>,
    pub folder_link: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskRow>,
    #[serde(default)]
    pub vendor_quotes: Vec<VendorQuoteRow>,
    #[serde(default)]
    pub notes: Vec<NoteRow>,
}

/// Body for `POST /api/quotes` and `PUT /api/quotes/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuotePayload {
    pub customer: String,
    pub quote_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_rep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_sheet_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpsf_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}
