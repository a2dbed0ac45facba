use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::account::{
  errors::DocumentStoreError,
  ports::{Document, DocumentStore},
};

type Collections = HashMap<String, HashMap<String, Document>>;

/// Process-local document store, for development and tests
#[derive(Default, Clone)]
pub struct InMemoryDocumentStore {
  collections: Arc<RwLock<Collections>>,
}

impl InMemoryDocumentStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of documents across all collections
  pub async fn len(&self) -> usize {
    self.collections.read().await.values().map(HashMap::len).sum()
  }

  pub async fn is_empty(&self) -> bool {
    self.len().await == 0
  }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DocumentStoreError> {
    let collections = self.collections.read().await;
    Ok(
      collections
        .get(collection)
        .and_then(|documents| documents.get(id))
        .cloned(),
    )
  }

  async fn set(
    &self,
    collection: &str,
    id: &str,
    data: Document,
  ) -> Result<(), DocumentStoreError> {
    let mut collections = self.collections.write().await;
    collections
      .entry(collection.to_string())
      .or_default()
      .insert(id.to_string(), data);
    Ok(())
  }

  async fn update(
    &self,
    collection: &str,
    id: &str,
    fields: Document,
  ) -> Result<(), DocumentStoreError> {
    let mut collections = self.collections.write().await;
    let document = collections
      .get_mut(collection)
      .and_then(|documents| documents.get_mut(id))
      .ok_or_else(|| DocumentStoreError::NotFound(format!("{}/{}", collection, id)))?;

    document.extend(fields);
    Ok(())
  }

  async fn delete(&self, collection: &str, id: &str) -> Result<(), DocumentStoreError> {
    let mut collections = self.collections.write().await;
    if let Some(documents) = collections.get_mut(collection) {
      documents.remove(id);
    }
    Ok(())
  }
}
