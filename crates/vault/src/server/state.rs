//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::store::Repository;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped or already `Arc`-backed) so
/// that Axum can clone the state for each request without copying expensive data.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Owner-scoped persistence with the field codec at its boundary.
    pub repo: Repository,
    /// Name of the HTTP header carrying the caller's user id.
    pub user_header_name: Arc<String>,
}

impl AppState {
    /// Create a new [`AppState`] from a repository and header name.
    pub fn new(repo: Repository, user_header_name: String) -> Self {
        Self {
            repo,
            user_header_name: Arc::new(user_header_name),
        }
    }

    /// Empty store, random key, default header. Suitable for tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        use crate::crypto::{FieldCodec, FieldKey};
        use crate::store::DocumentStore;

        Self::new(
            Repository::new(DocumentStore::new(), FieldCodec::new(FieldKey::generate())),
            "X-User-Id".into(),
        )
    }
}
