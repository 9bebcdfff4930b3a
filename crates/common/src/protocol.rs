//! Request and response bodies for the public HTTP API.
//!
//! All bodies are JSON with camelCase keys, matching the document shape of
//! the stored records.

use serde::{Deserialize, Serialize};

use crate::record::{SalePriority, SaleStatus};

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

/// Request body for `POST /sales`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub customer_name: String,
    pub deal_value: String,
    pub status: SaleStatus,
    pub contact_date: String,
    pub salesperson: String,
    pub priority: SalePriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

/// Request body for `PUT /sales/:id`.
///
/// Every field is optional; only the fields present are changed. An absent
/// field leaves the stored value (and, for protected fields, the stored
/// ciphertext) untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SaleStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salesperson: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<SalePriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Response body for `GET /sales/count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

/// Request body for `POST /sales/migration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRequest {
    /// Organisation the caller's unassigned sales are moved into.
    pub organization_id: String,
}

/// Response body for `POST /sales/migration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResponse {
    pub migrated_count: usize,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Salespeople
// ---------------------------------------------------------------------------

/// Request body for `POST /sales-persons`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSalesPerson {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Generic bodies
// ---------------------------------------------------------------------------

/// Plain acknowledgement, e.g. after a delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"not_found"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether the field codec passed its encrypt/decrypt self-test.
    pub encryption_ready: bool,
    /// Number of sale documents held by the store.
    pub sales_stored: usize,
    /// Number of salesperson documents held by the store.
    pub sales_persons_stored: usize,
}
