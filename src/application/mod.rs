//! # Application Layer
//!
//! Source discovery and the use cases orchestrating extraction, assembly and
//! export.

pub mod interfaces;
mod source_walker;
pub mod use_cases;

pub use interfaces::*;
pub use source_walker::*;
pub use use_cases::*;
