mod entity_extractor;
mod entity_store;

pub use entity_extractor::*;
pub use entity_store::*;
