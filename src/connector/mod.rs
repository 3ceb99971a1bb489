//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Parsing (Tree-sitter, Python grammar)
//! - Document stores (in-memory, JSON lines)
//! - Index file I/O (JSON)

pub mod adapter;

pub use adapter::*;
