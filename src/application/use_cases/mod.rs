mod export_documents;
mod index_codebase;

pub use export_documents::*;
pub use index_codebase::*;
