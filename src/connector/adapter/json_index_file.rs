use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{CodebaseIndex, DomainError};

pub const DEFAULT_INDEX_FILE: &str = "parsed_code.json";

/// Reads and writes a [`CodebaseIndex`] as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonIndexFile {
    path: PathBuf,
}

impl JsonIndexFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&self, index: &CodebaseIndex) -> Result<(), DomainError> {
        let json = serde_json::to_vec_pretty(index)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, json).await?;

        info!(
            "Wrote index for {} files to {}",
            index.file_count(),
            self.path.display()
        );
        Ok(())
    }

    pub async fn read(&self) -> Result<CodebaseIndex, DomainError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let index = serde_json::from_slice(&bytes)?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{qualified_name, Entity, EntityKind, FileIndex};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let file = JsonIndexFile::new(dir.path().join("out/parsed_code.json"));

        let mut file_index = FileIndex::empty();
        file_index.entities.push(
            Entity::new(
                EntityKind::Function,
                qualified_name("a.py", "f"),
                1,
                2,
                "def f():\n    g()".to_string(),
            )
            .with_calls(vec!["g".to_string()])
            .with_string_statements(Vec::new()),
        );
        let mut index = CodebaseIndex {
            overview: "readme".to_string(),
            ..Default::default()
        };
        index.files.insert("a.py".to_string(), file_index);
        index.files.insert("broken.py".to_string(), FileIndex::empty());

        file.write(&index).await.unwrap();
        let loaded = file.read().await.unwrap();

        assert_eq!(loaded, index);
    }

    #[tokio::test]
    async fn test_output_uses_external_field_names() {
        let dir = TempDir::new().unwrap();
        let file = JsonIndexFile::new(dir.path().join(DEFAULT_INDEX_FILE));

        let mut index = CodebaseIndex::default();
        index.files.insert("a.py".to_string(), FileIndex::empty());
        file.write(&index).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(file.path()).unwrap()).unwrap();
        let entry = &value["files"]["a.py"];
        for key in [
            "entities",
            "imports",
            "callEdges",
            "globalVariables",
            "classMethods",
            "importedFunctions",
            "referencedBy",
        ] {
            assert!(entry.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(value["overview"], "");
    }
}
