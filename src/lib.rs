pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    EntityExtractor, EntityStore, ExportDocumentsUseCase, ExtractionBudget, ExportOptions, ExportReport,
    FailureReason, FileFailure, IndexCodebaseUseCase, IndexOptions, IndexOutcome, IndexReport,
    SourceWalker,
};

pub use connector::{InMemoryEntityStore, JsonIndexFile, JsonlEntityStore, TreeSitterExtractor};

pub use domain::{
    CallEdge, CodebaseIndex, DomainError, Entity, EntityDocument, EntityKind, FileIndex,
    ImportRecord, IndexAssembler, Language, ReferenceIndex,
};
