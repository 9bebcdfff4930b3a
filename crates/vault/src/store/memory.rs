//! [`DocumentStore`]: in-process document collections.
//!
//! Stands in for the hosted document database. Documents are opaque JSON
//! values; the store never looks inside them except through the predicates
//! callers pass in.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

type Collection = Vec<(Uuid, Value)>;

/// Thread-safe map of collection name → documents in insertion order.
///
/// Wraps an `Arc<RwLock<_>>` so that request handlers can read concurrently
/// while writers take a short exclusive lock. Cloning shares the same data.
#[derive(Clone, Debug, Default)]
pub struct DocumentStore {
    inner: Arc<RwLock<HashMap<&'static str, Collection>>>,
}

impl DocumentStore {
    /// Create a new, empty [`DocumentStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document to `collection`.
    pub async fn insert(&self, collection: &'static str, id: Uuid, doc: Value) {
        let mut lock = self.inner.write().await;
        lock.entry(collection).or_default().push((id, doc));
    }

    /// Append a document to `collection` only if `check` accepts the current
    /// contents. The check and the insert happen under one write lock.
    pub async fn insert_checked<F, E>(
        &self,
        collection: &'static str,
        id: Uuid,
        doc: Value,
        check: F,
    ) -> Result<(), E>
    where
        F: FnOnce(&[(Uuid, Value)]) -> Result<(), E>,
    {
        let mut lock = self.inner.write().await;
        let docs = lock.entry(collection).or_default();
        check(docs)?;
        docs.push((id, doc));
        Ok(())
    }

    /// Fetch a copy of a single document.
    pub async fn get(&self, collection: &str, id: Uuid) -> Option<Value> {
        let lock = self.inner.read().await;
        lock.get(collection)?
            .iter()
            .find(|(doc_id, _)| *doc_id == id)
            .map(|(_, doc)| doc.clone())
    }

    /// Copies of every document matching `predicate`, oldest first.
    pub async fn find<P>(&self, collection: &str, predicate: P) -> Vec<(Uuid, Value)>
    where
        P: Fn(&Value) -> bool,
    {
        let lock = self.inner.read().await;
        lock.get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| predicate(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of documents matching `predicate`.
    pub async fn count<P>(&self, collection: &str, predicate: P) -> usize
    where
        P: Fn(&Value) -> bool,
    {
        let lock = self.inner.read().await;
        lock.get(collection)
            .map(|docs| docs.iter().filter(|(_, doc)| predicate(doc)).count())
            .unwrap_or(0)
    }

    /// Total number of documents in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.count(collection, |_| true).await
    }

    /// Apply `f` to a single document under the write lock.
    ///
    /// `f` returns `false` to decline the change (e.g. ownership mismatch),
    /// in which case it must leave the document untouched. Returns a copy of
    /// the modified document, or `None` if it does not exist or was declined.
    pub async fn modify<F>(&self, collection: &str, id: Uuid, f: F) -> Option<Value>
    where
        F: FnOnce(&mut Value) -> bool,
    {
        let mut lock = self.inner.write().await;
        let doc = lock
            .get_mut(collection)?
            .iter_mut()
            .find(|(doc_id, _)| *doc_id == id)
            .map(|(_, doc)| doc)?;
        f(&mut *doc).then(|| doc.clone())
    }

    /// Apply `f` to every document in `collection` under one write lock.
    ///
    /// Returns how many documents `f` reported as changed.
    pub async fn modify_all<F>(&self, collection: &str, mut f: F) -> usize
    where
        F: FnMut(&mut Value) -> bool,
    {
        let mut lock = self.inner.write().await;
        let Some(docs) = lock.get_mut(collection) else {
            return 0;
        };
        let mut changed = 0;
        for (_, doc) in docs.iter_mut() {
            if f(doc) {
                changed += 1;
            }
        }
        changed
    }

    /// Remove a document if `predicate` accepts it, returning the removed value.
    pub async fn remove_if<P>(&self, collection: &str, id: Uuid, predicate: P) -> Option<Value>
    where
        P: Fn(&Value) -> bool,
    {
        let mut lock = self.inner.write().await;
        let docs = lock.get_mut(collection)?;
        let pos = docs
            .iter()
            .position(|(doc_id, doc)| *doc_id == id && predicate(doc))?;
        Some(docs.remove(pos).1)
    }
}
