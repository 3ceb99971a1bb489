mod codebase_index;
mod entity;
mod entity_document;
mod file_index;
mod language;
mod reference_index;
mod source_file;

pub use codebase_index::*;
pub use entity::*;
pub use entity_document::*;
pub use file_index::*;
pub use language::*;
pub use reference_index::*;
pub use source_file::*;
