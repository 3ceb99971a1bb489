use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Entity, EntityKind};

/// Identifier used for the overview document.
pub const OVERVIEW_DOCUMENT_ID: &str = "README";

/// Content-addressed id for an entity: SHA-256 of `file::qualified_name::start_line`.
///
/// Stable across runs on unchanged input, so re-exporting the same index
/// produces the same ids and storage can deduplicate on them.
pub fn compute_entity_id(file_path: &str, qualified_name: &str, start_line: u32) -> String {
    let key = format!("{}::{}::{}", file_path, qualified_name, start_line);
    let hash = Sha256::digest(key.as_bytes());
    format!("{:x}", hash)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub file: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntityKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    pub docstring: String,
    /// JSON-encoded list, kept as a string for flat metadata stores.
    #[serde(default)]
    pub calls: String,
    #[serde(default)]
    pub string_statements: String,
}

/// A storage-ready record derived from one entity (or the overview).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDocument {
    id: String,
    content: String,
    metadata: DocumentMetadata,
}

impl EntityDocument {
    pub fn from_entity(file_path: &str, entity: &Entity) -> Self {
        let metadata = DocumentMetadata {
            file: file_path.to_string(),
            name: entity.qualified_name().to_string(),
            kind: Some(entity.kind()),
            start_line: Some(entity.start_line()),
            end_line: Some(entity.end_line()),
            docstring: entity.docstring().unwrap_or_default().to_string(),
            calls: encode_list(entity.calls()),
            string_statements: encode_list(entity.string_statements()),
        };

        Self {
            id: compute_entity_id(file_path, entity.qualified_name(), entity.start_line()),
            content: entity.source_text().to_string(),
            metadata,
        }
    }

    pub fn overview(content: &str) -> Self {
        Self {
            id: OVERVIEW_DOCUMENT_ID.to_string(),
            content: content.to_string(),
            metadata: DocumentMetadata {
                file: "README.md".to_string(),
                name: "Project README".to_string(),
                kind: None,
                start_line: None,
                end_line: None,
                docstring: "README provides an overview of the project.".to_string(),
                calls: encode_list(&[]),
                string_statements: encode_list(&[]),
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }
}

fn encode_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}
