mod in_memory_entity_store;
mod json_index_file;
mod jsonl_entity_store;
mod python_literal;
mod treesitter_extractor;

pub use in_memory_entity_store::*;
pub use json_index_file::*;
pub use jsonl_entity_store::*;
pub use treesitter_extractor::*;
