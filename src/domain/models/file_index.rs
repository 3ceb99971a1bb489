use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CallEdge, Entity, EntityKind};

/// A single imported name.
///
/// `import a.b` has no originating module; `from a import b` records `a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    name: String,
    module: Option<String>,
}

impl ImportRecord {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
        }
    }

    pub fn from_module(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: Some(module.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn dotted_path(&self) -> String {
        match &self.module {
            Some(module) => format!("{}.{}", module, self.name),
            None => self.name.clone(),
        }
    }
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileIndex {
    pub entities: Vec<Entity>,
    pub imports: Vec<String>,
    pub call_edges: Vec<CallEdge>,
    pub global_variables: Vec<String>,
    pub class_methods: BTreeMap<String, String>,
    pub imported_functions: BTreeMap<String, String>,
    /// This file's contribution to the run-wide reference index.
    pub referenced_by: BTreeMap<String, Vec<String>>,
}

impl FileIndex {
    /// The record kept for a file that failed to parse.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self.imports.is_empty()
            && self.call_edges.is_empty()
            && self.global_variables.is_empty()
            && self.class_methods.is_empty()
            && self.imported_functions.is_empty()
            && self.referenced_by.is_empty()
    }

    pub fn add_import(&mut self, record: &ImportRecord) {
        self.imports.push(record.dotted_path());
        if let Some(module) = record.module() {
            self.imported_functions
                .insert(record.name().to_string(), module.to_string());
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn find_entity(&self, qualified_name: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.qualified_name() == qualified_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_dotted_path() {
        assert_eq!(ImportRecord::plain("os.path").dotted_path(), "os.path");
        assert_eq!(
            ImportRecord::from_module("collections", "OrderedDict").dotted_path(),
            "collections.OrderedDict"
        );
    }

    #[test]
    fn test_add_import_last_write_wins() {
        let mut index = FileIndex::empty();
        index.add_import(&ImportRecord::plain("json"));
        index.add_import(&ImportRecord::from_module("a", "load"));
        index.add_import(&ImportRecord::from_module("b", "load"));

        assert_eq!(index.imports, vec!["json", "a.load", "b.load"]);
        assert_eq!(index.imported_functions.get("load"), Some(&"b".to_string()));
        assert!(!index.imported_functions.contains_key("json"));
    }

    #[test]
    fn test_empty_round_trips_as_empty() {
        let empty = FileIndex::empty();
        assert!(empty.is_empty());

        let parsed: FileIndex = serde_json::from_str("{}").unwrap();
        assert!(parsed.is_empty());
    }
}
