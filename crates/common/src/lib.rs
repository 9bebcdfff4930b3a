//! Common types, API bodies, and errors shared across `salex-vault` crates.

pub mod error;
pub mod protocol;
pub mod record;

pub use error::ServiceError;
pub use record::{Sale, SalePriority, SaleStatus, SalesPerson};
