use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// Run-scoped map from a called identifier to every file that calls it.
///
/// Append-only and safe to share between extraction workers. Entries are not
/// deduplicated: a file calling `foo()` three times is listed three times.
/// Calls are matched by bare name only, so this answers "who mentions this
/// name", not "who calls this definition".
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<String>>> {
        // Appends never leave the map half-written, so a poisoned lock is still usable.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends one file's slice (as produced by extraction) in a single lock.
    pub fn merge(&self, slice: &BTreeMap<String, Vec<String>>) {
        let mut entries = self.lock();
        for (identifier, files) in slice {
            entries
                .entry(identifier.clone())
                .or_default()
                .extend(files.iter().cloned());
        }
    }

    /// Sorted copy of the index; identical whatever order workers appended in.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.lock()
            .iter()
            .map(|(identifier, files)| {
                let mut files = files.clone();
                files.sort();
                (identifier.clone(), files)
            })
            .collect()
    }
}
