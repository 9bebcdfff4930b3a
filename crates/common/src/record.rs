//! Plaintext application records.
//!
//! These are the shapes callers see. Protected attributes are always plaintext
//! here; their encrypted storage form never leaves the vault's repository layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline stage of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleStatus {
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
    #[serde(rename = "Negotiation")]
    Negotiation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalePriority {
    Low,
    Medium,
    High,
}

/// A single deal owned by one user.
///
/// `customer_name`, `deal_value`, `contact_date`, `salesperson` and `note` are
/// encrypted at rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Owner id issued by the identity provider.
    pub clerk_user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    pub customer_name: String,
    pub deal_value: String,
    pub status: SaleStatus,
    pub contact_date: String,
    pub salesperson: String,
    pub priority: SalePriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A salesperson that deals can be assigned to. `name` is encrypted at rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesPerson {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub clerk_user_id: String,
    pub name: String,
}
