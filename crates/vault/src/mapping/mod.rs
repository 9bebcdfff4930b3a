//! Codec-aware serialisation boundary between records and stored documents.
//!
//! # Responsibilities
//!
//! - Declare, per entity type, which document fields are encrypted at rest.
//! - Seal a plaintext document into its storage form (encrypt protected
//!   fields) and open a stored document back into plaintext.
//!
//! # Module invariants
//!
//! - Absent and null fields bypass the codec in both directions.
//! - Non-protected fields are never modified.
//! - No storage dependency: this module must not import anything from
//!   `crate::store`.

pub mod document;
pub mod fields;

pub use document::{open_record, seal_document, seal_record, MappingError};
pub use fields::EntityKind;
