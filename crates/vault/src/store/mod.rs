//! Document storage and the repository that guards it.
//!
//! # Responsibilities
//!
//! - Hold stored documents per collection ([`DocumentStore`]).
//! - Expose owner-scoped CRUD over sales and salespeople ([`Repository`]),
//!   sealing protected fields on the way in and opening them on the way out.
//!
//! # Security invariants
//!
//! - Stored documents never contain plaintext for a protected field.
//! - Raw stored documents are never returned to HTTP callers.

pub mod memory;
pub mod repository;

pub use memory::DocumentStore;
pub use repository::{Repository, RepositoryError};
