use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::{DomainError, FileIndex, Language};

/// How long one extraction may run, and the token that stops the whole run.
///
/// Extractors poll [`check`](Self::check) while working so that a timed-out or
/// cancelled file releases its blocking thread instead of running on.
#[derive(Debug, Clone)]
pub struct ExtractionBudget {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl ExtractionBudget {
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            cancel,
        }
    }

    pub fn unlimited() -> Self {
        Self {
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn check(&self) -> Result<(), DomainError> {
        if self.cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(DomainError::timeout("extraction exceeded its time budget"));
        }
        Ok(())
    }
}

/// Turns one source file into its [`FileIndex`].
///
/// Implementations must not keep state between calls; the indexer runs them
/// on several files at once.
pub trait EntityExtractor: Send + Sync {
    /// Extract entities, imports, call edges and references from a file,
    /// giving up once `budget` is exhausted.
    ///
    /// Returns `DomainError::ParseError` when the file has any syntax error,
    /// `DomainError::Timeout` or `DomainError::Cancelled` when the budget runs out.
    fn extract_within(
        &self,
        file_path: &str,
        content: &str,
        budget: &ExtractionBudget,
    ) -> Result<FileIndex, DomainError>;

    fn language(&self) -> Language;

    fn extract(&self, file_path: &str, content: &str) -> Result<FileIndex, DomainError> {
        self.extract_within(file_path, content, &ExtractionBudget::unlimited())
    }

    /// Like [`extract`](Self::extract), but a file that fails to parse yields
    /// an empty record instead of an error. Other errors still propagate.
    fn extract_or_empty(&self, file_path: &str, content: &str) -> Result<FileIndex, DomainError> {
        match self.extract(file_path, content) {
            Ok(index) => Ok(index),
            Err(DomainError::ParseError(reason)) => {
                debug!("Recording empty index for {}: {}", file_path, reason);
                Ok(FileIndex::empty())
            }
            Err(e) => Err(e),
        }
    }
}
