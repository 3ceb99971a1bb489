use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::{CodebaseIndex, FileIndex, ReferenceIndex};

/// Folds per-file results into the codebase-wide index.
///
/// Nothing is recomputed or deduplicated here: entity names are already unique
/// because they carry their file path.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexAssembler;

impl IndexAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble<I>(
        &self,
        overview: Option<String>,
        files: I,
        references: &ReferenceIndex,
    ) -> CodebaseIndex
    where
        I: IntoIterator<Item = (String, FileIndex)>,
    {
        let files: BTreeMap<String, FileIndex> = files.into_iter().collect();
        let index = CodebaseIndex {
            overview: overview.unwrap_or_default(),
            files,
            references: references.snapshot(),
        };

        debug!(
            "Assembled index: {} files, {} entities, {} referenced identifiers",
            index.file_count(),
            index.entity_count(),
            index.references.len()
        );

        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{qualified_name, Entity, EntityKind};

    fn helper_file(path: &str) -> FileIndex {
        let mut index = FileIndex::empty();
        index.entities.push(Entity::new(
            EntityKind::Function,
            qualified_name(path, "helper"),
            1,
            2,
            "def helper():\n    run()".to_string(),
        ));
        index
            .referenced_by
            .insert("run".to_string(), vec![path.to_string()]);
        index
    }

    #[test]
    fn test_assemble_keeps_same_named_entities_apart() {
        let references = ReferenceIndex::new();
        let a = helper_file("a.py");
        let b = helper_file("b.py");
        references.merge(&a.referenced_by);
        references.merge(&b.referenced_by);

        let index = IndexAssembler::new().assemble(
            Some("# Readme".to_string()),
            vec![("a.py".to_string(), a), ("b.py".to_string(), b)],
            &references,
        );

        assert_eq!(index.overview, "# Readme");
        assert_eq!(index.file_count(), 2);
        assert_eq!(index.entity_count(), 2);
        assert!(index.file("a.py").unwrap().find_entity("a.py::helper").is_some());
        assert!(index.file("b.py").unwrap().find_entity("b.py::helper").is_some());
        assert_eq!(index.references["run"], vec!["a.py", "b.py"]);
    }

    #[test]
    fn test_assemble_without_overview() {
        let index = IndexAssembler::new().assemble(
            None,
            vec![("broken.py".to_string(), FileIndex::empty())],
            &ReferenceIndex::new(),
        );

        assert_eq!(index.overview, "");
        assert_eq!(index.empty_files(), vec!["broken.py"]);
        assert!(index.references.is_empty());
    }
}
