use async_trait::async_trait;

use crate::domain::{DomainError, EntityDocument};

/// Destination for exported entity documents (vector store, file, memory).
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn save_batch(&self, documents: &[EntityDocument]) -> Result<(), DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}
