//! # Domain Layer
//!
//! Index models, the assembler, and errors.
//! This layer is independent of the parser and the filesystem.

mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
