use std::path::{Path, PathBuf};

/// A file found by the walker, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePath {
    absolute_path: PathBuf,
    relative_path: String,
}

impl SourcePath {
    pub fn new(absolute_path: PathBuf, root: &Path) -> Self {
        let relative_path = relative_display(&absolute_path, root);
        Self {
            absolute_path,
            relative_path,
        }
    }

    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Root-relative path with `/` separators; used as the file key and
    /// qualified-name prefix.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }
}

/// A source file's path and full text, read once for extraction.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: String,
    content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

fn relative_display(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
