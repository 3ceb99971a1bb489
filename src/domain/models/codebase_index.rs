use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{EntityKind, FileIndex};

/// The aggregate handed to storage and embedding collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodebaseIndex {
    pub overview: String,
    pub files: BTreeMap<String, FileIndex>,
    /// Run-wide identifier → calling files. Best-effort, unresolved.
    pub references: BTreeMap<String, Vec<String>>,
}

impl CodebaseIndex {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn entity_count(&self) -> usize {
        self.files.values().map(FileIndex::entity_count).sum()
    }

    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.files.values().map(|f| f.count_kind(kind)).sum()
    }

    pub fn import_count(&self) -> usize {
        self.files.values().map(|f| f.imports.len()).sum()
    }

    pub fn file(&self, path: &str) -> Option<&FileIndex> {
        self.files.get(path)
    }

    /// Paths whose record is empty, i.e. files that failed to parse.
    pub fn empty_files(&self) -> Vec<&str> {
        self.files
            .iter()
            .filter(|(_, index)| index.is_empty())
            .map(|(path, _)| path.as_str())
            .collect()
    }
}
