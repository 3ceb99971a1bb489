//! Domain services operating purely on domain models.

mod index_assembler;

pub use index_assembler::*;
