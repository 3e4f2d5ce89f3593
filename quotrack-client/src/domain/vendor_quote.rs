use serde::{Deserialize, Serialize};

/// A vendor quote row as served by the backend.
///
/// Two row shapes coexist: legacy rows carry a vendor name plus the
/// `requested`/`entered` boolean pair; rows written after the schema
/// migration carry `vendor_id` plus the `status` column and the cost and
/// timing fields. All of those are optional here; shape resolution
/// happens downstream, not in the wire type.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VendorQuoteRow {
    pub id: i64,
    pub quote_id: i64,
    #[serde(rename = "type")]
    pub kind: String,

    // Legacy shape
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub requested: Option<bool>,
    #[serde(default)]
    pub entered: Option<bool>,
    #[serde(default)]
    pub date: Option<String>,

    // Enhanced shape
    #[serde(default)]
    pub vendor_id: Option<i64>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub lead_time_days: Option<i32>,
    #[serde(default)]
    pub quote_date: Option<String>,
    #[serde(default)]
    pub valid_until: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Partial update body for `PUT /api/vendor-quotes/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VendorQuoteUpdate {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body for `POST /api/quotes/{id}/vendor-quotes`.
#[derive(Debug, Clone, Serialize)]
pub struct NewVendorQuotePayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub vendor_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
