use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::EntityStore;
use crate::domain::{DomainError, EntityDocument};

/// Keeps exported documents in memory, keyed by id. Later saves of the same
/// id replace earlier ones.
pub struct InMemoryEntityStore {
    documents: Arc<Mutex<HashMap<String, EntityDocument>>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, id: &str) -> Option<EntityDocument> {
        self.documents.lock().await.get(id).cloned()
    }
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn save_batch(&self, documents: &[EntityDocument]) -> Result<(), DomainError> {
        let mut store = self.documents.lock().await;
        for document in documents {
            store.insert(document.id().to_string(), document.clone());
        }

        debug!("Saved {} documents to memory", documents.len());
        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.documents.lock().await.len() as u64)
    }
}
