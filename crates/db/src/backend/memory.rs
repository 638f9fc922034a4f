//! In-process storage backed by a `HashMap` of collections.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::DocumentBackend;
use crate::{DbError, Document};

/// Collections kept in memory, each in insertion order.
///
/// Clone-friendly via `Arc`: clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, expected)| document.get(field) == Some(expected))
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
    async fn find(&self, collection: &str, filter: &Document) -> Result<Vec<Document>, DbError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_first(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<Option<Document>, DbError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| matches(d, filter)).cloned()))
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<(), DbError> {
        self.collections
            .write()
            .await
            .entry(collection.to_owned())
            .or_default()
            .push(document);
        Ok(())
    }

    async fn update_first(
        &self,
        collection: &str,
        filter: &Document,
        fields: &Document,
    ) -> Result<u64, DbError> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| matches(d, filter)));

        match target {
            Some(document) => {
                for (field, value) in fields {
                    document.insert(field.clone(), value.clone());
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
