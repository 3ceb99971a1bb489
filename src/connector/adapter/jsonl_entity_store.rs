use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::EntityStore;
use crate::domain::{DomainError, EntityDocument};

/// Appends each exported document as one JSON line to a file.
pub struct JsonlEntityStore {
    path: PathBuf,
    written: Mutex<u64>,
}

impl JsonlEntityStore {
    /// Creates (or truncates) the output file.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref().to_path_buf();
        tokio::fs::write(&path, b"").await?;
        Ok(Self {
            path,
            written: Mutex::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EntityStore for JsonlEntityStore {
    async fn save_batch(&self, documents: &[EntityDocument]) -> Result<(), DomainError> {
        let mut buffer = Vec::new();
        for document in documents {
            serde_json::to_writer(&mut buffer, document)?;
            buffer.push(b'\n');
        }

        let mut written = self.written.lock().await;
        let mut file = OpenOptions::new().append(true).open(&self.path).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        *written += documents.len() as u64;

        debug!(
            "Appended {} documents to {}",
            documents.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(*self.written.lock().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writes_one_line_per_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("documents.jsonl");
        let store = JsonlEntityStore::create(&path).await.unwrap();

        let docs = vec![EntityDocument::overview("one"), EntityDocument::overview("two")];
        store.save_batch(&docs[..1]).await.unwrap();
        store.save_batch(&docs[1..]).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let decoded: EntityDocument = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(decoded.content(), "two");
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
