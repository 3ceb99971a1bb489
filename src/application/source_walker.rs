use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::domain::{DomainError, SourcePath};

pub const DEFAULT_EXTENSION: &str = "py";
pub const DEFAULT_OVERVIEW_FILE_NAME: &str = "readme.md";

/// Enumerates source files under a root directory.
///
/// Every directory is walked, hidden ones included, and nothing is filtered
/// except by extension. Symlinked files are included; symlinked directories
/// are not followed. Within a directory files come before subdirectories,
/// each sorted by name, so the order is the same on every run. Calling
/// [`walk`](Self::walk) again starts a fresh traversal.
#[derive(Debug, Clone)]
pub struct SourceWalker {
    root: PathBuf,
    extension: String,
    overview_file_name: String,
}

impl SourceWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            overview_file_name: DEFAULT_OVERVIEW_FILE_NAME.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// File name (matched case-insensitively) captured as the overview document.
    pub fn with_overview_file_name(mut self, name: impl Into<String>) -> Self {
        self.overview_file_name = name.into().to_lowercase();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn walk(&self) -> SourceWalk {
        let inner = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by(files_before_directories)
            .into_iter();

        SourceWalk {
            inner,
            root: self.root.clone(),
            extension: self.extension.clone(),
            overview_file_name: self.overview_file_name.clone(),
            overview: None,
        }
    }

    /// Walks to completion. Any directory error aborts the walk.
    pub fn collect(&self) -> Result<(Vec<SourcePath>, Option<String>), DomainError> {
        let mut walk = self.walk();
        let mut sources = Vec::new();
        for source in walk.by_ref() {
            sources.push(source?);
        }
        Ok((sources, walk.into_overview()))
    }
}

fn files_before_directories(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// One traversal in progress. Yields source paths and remembers the last
/// overview document seen so far.
pub struct SourceWalk {
    inner: walkdir::IntoIter,
    root: PathBuf,
    extension: String,
    overview_file_name: String,
    overview: Option<String>,
}

impl SourceWalk {
    pub fn into_overview(self) -> Option<String> {
        self.overview
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }

    fn capture_overview(&mut self, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!("Captured overview document: {}", path.display());
                self.overview = Some(text);
            }
            Err(e) => debug!("Skipping unreadable overview {}: {}", path.display(), e),
        }
    }
}

impl Iterator for SourceWalk {
    type Item = Result<SourcePath, DomainError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let location = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| self.root.display().to_string());
                    return Some(Err(DomainError::walk(format!("{}: {}", location, e))));
                }
            };

            // Linked files are read through the link; linked directories are not entered.
            let file_type = entry.file_type();
            if !(file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())) {
                continue;
            }

            let path = entry.path();
            if self.matches_extension(path) {
                return Some(Ok(SourcePath::new(path.to_path_buf(), &self.root)));
            }

            if entry.file_name().to_string_lossy().to_lowercase() == self.overview_file_name {
                self.capture_overview(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &[u8]) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn relative_paths(walker: &SourceWalker) -> Vec<String> {
        let (sources, _) = walker.collect().unwrap();
        sources
            .iter()
            .map(|s| s.relative_path().to_string())
            .collect()
    }

    #[test]
    fn test_walk_filters_by_extension_and_recurses() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.py", b"print(1)\n");
        write(dir.path(), "notes.txt", b"ignore me\n");
        write(dir.path(), "pkg/util.py", b"x = 1\n");
        write(dir.path(), ".hidden/secret.py", b"y = 2\n");
        write(dir.path(), "pkg/deep/er/mod.py", b"z = 3\n");

        let walker = SourceWalker::new(dir.path());
        assert_eq!(
            relative_paths(&walker),
            vec![
                "main.py",
                ".hidden/secret.py",
                "pkg/util.py",
                "pkg/deep/er/mod.py",
            ]
        );
    }

    #[test]
    fn test_walk_is_restartable() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.py", b"");
        write(dir.path(), "b/c.py", b"");

        let walker = SourceWalker::new(dir.path());
        assert_eq!(relative_paths(&walker), relative_paths(&walker));
    }

    #[test]
    fn test_last_overview_wins() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", b"root readme");
        write(dir.path(), "docs/readme.md", b"docs readme");
        write(dir.path(), "app.py", b"");

        let walker = SourceWalker::new(dir.path());
        let (sources, overview) = walker.collect().unwrap();

        assert_eq!(sources.len(), 1);
        assert_eq!(overview.as_deref(), Some("docs readme"));
    }

    #[test]
    fn test_unreadable_overview_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", &[0xff, 0xfe, 0x00, 0xc3]);
        write(dir.path(), "app.py", b"");

        let (_, overview) = SourceWalker::new(dir.path()).collect().unwrap();
        assert!(overview.is_none());
    }

    #[test]
    fn test_custom_extension_and_overview_name() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "tool.pyw", b"");
        write(dir.path(), "tool.py", b"");
        write(dir.path(), "OVERVIEW.TXT", b"about");

        let walker = SourceWalker::new(dir.path())
            .with_extension(".pyw")
            .with_overview_file_name("overview.txt");
        let (sources, overview) = walker.collect().unwrap();

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].relative_path(), "tool.pyw");
        assert_eq!(overview.as_deref(), Some("about"));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let walker = SourceWalker::new(dir.path().join("does-not-exist"));

        let result = walker.collect();
        assert!(matches!(result, Err(DomainError::WalkError(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_included() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main.py", b"x = 1\n");
        write(dir.path(), "other/lib.py", b"y = 2\n");
        write(dir.path(), "other/nested/deep.py", b"z = 3\n");
        symlink("../other/lib.py", dir.path().join("src/linked.py")).unwrap();
        symlink("../other", dir.path().join("src/vendored")).unwrap();
        symlink("missing.py", dir.path().join("src/ghost.py")).unwrap();

        let walker = SourceWalker::new(dir.path().join("src"));
        assert_eq!(relative_paths(&walker), vec!["linked.py", "main.py"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.py", b"");
        write(dir.path(), "locked/b.py", b"");
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still list the directory.
        let readable = fs::read_dir(&locked).is_ok();
        let result = SourceWalker::new(dir.path()).collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            return;
        }
        match result {
            Err(DomainError::WalkError(msg)) => assert!(msg.contains("locked")),
            other => panic!("expected a walk error, got {:?}", other.map(|(s, _)| s.len())),
        }
    }
}
