use serde::{Deserialize, Serialize};

/// A vendor directory row from `GET /api/vendors`.
///
/// Vendor lifecycle is owned by the backend; the client only resolves
/// names for display.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VendorRow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_active() -> bool {
    true
}
