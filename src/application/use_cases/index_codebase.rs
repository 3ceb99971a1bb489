use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::{
    EntityExtractor, ExtractionBudget, SourceWalker, DEFAULT_EXTENSION,
    DEFAULT_OVERVIEW_FILE_NAME,
};
use crate::domain::{
    CodebaseIndex, DomainError, FileIndex, IndexAssembler, ReferenceIndex, SourceFile, SourcePath,
};

const DEFAULT_FILE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct IndexOptions {
    extension: String,
    overview_file_name: String,
    concurrency: usize,
    file_timeout: Duration,
    show_progress: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            overview_file_name: DEFAULT_OVERVIEW_FILE_NAME.to_string(),
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            file_timeout: DEFAULT_FILE_TIMEOUT,
            show_progress: false,
        }
    }
}

impl IndexOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_overview_file_name(mut self, name: impl Into<String>) -> Self {
        self.overview_file_name = name.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_file_timeout(mut self, timeout: Duration) -> Self {
        self.file_timeout = timeout;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn file_timeout(&self) -> Duration {
        self.file_timeout
    }
}

/// Why a file is missing from, or empty in, the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Syntax error; the file is kept with an empty record.
    Parse(String),
    /// Could not be read; the file is omitted.
    Read(String),
    /// Extraction exceeded the per-file timeout; the file is omitted.
    Timeout,
    /// The extraction task failed; the file is omitted.
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    path: String,
    reason: FailureReason,
}

impl FileFailure {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn reason(&self) -> &FailureReason {
        &self.reason
    }
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            FailureReason::Parse(msg) => write!(f, "{}: parse error ({})", self.path, msg),
            FailureReason::Read(msg) => write!(f, "{}: unreadable ({})", self.path, msg),
            FailureReason::Timeout => write!(f, "{}: timed out", self.path),
            FailureReason::Internal(msg) => write!(f, "{}: {}", self.path, msg),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub entity_count: usize,
    pub failures: Vec<FileFailure>,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct IndexOutcome {
    pub index: CodebaseIndex,
    pub report: IndexReport,
}

enum FileOutcome {
    Indexed(String, FileIndex),
    Unparseable(String, String),
    Skipped(FileFailure),
}

/// Walks a directory, extracts every source file and assembles the index.
///
/// Files are extracted on the blocking pool, `concurrency` at a time, and
/// consumed in discovery order. The run can be cancelled between files.
pub struct IndexCodebaseUseCase {
    extractor: Arc<dyn EntityExtractor>,
    assembler: IndexAssembler,
}

impl IndexCodebaseUseCase {
    pub fn new(extractor: Arc<dyn EntityExtractor>) -> Self {
        Self {
            extractor,
            assembler: IndexAssembler::new(),
        }
    }

    pub async fn execute(
        &self,
        path: &str,
        options: &IndexOptions,
        cancel: &CancellationToken,
    ) -> Result<IndexOutcome, DomainError> {
        let absolute_path = Path::new(path)
            .canonicalize()
            .map_err(|e| DomainError::InvalidInput(format!("Invalid path: {}", e)))?;
        if !absolute_path.is_dir() {
            return Err(DomainError::invalid_input(format!(
                "Not a directory: {}",
                absolute_path.display()
            )));
        }

        info!("Indexing codebase at {}", absolute_path.display());
        let start_time = Instant::now();

        let walker = SourceWalker::new(&absolute_path)
            .with_extension(options.extension.clone())
            .with_overview_file_name(options.overview_file_name.clone());
        let (sources, overview) = tokio::task::spawn_blocking(move || walker.collect())
            .await
            .map_err(|e| DomainError::internal(format!("Walk task failed: {}", e)))??;

        let total_files = sources.len();
        info!("Found {} files to index", total_files);
        if overview.is_some() {
            debug!("Overview document captured");
        }

        let progress_bar = if options.show_progress {
            let bar = ProgressBar::new(total_files as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                    .map_err(|e| DomainError::internal(format!("Invalid progress bar template: {}", e)))?
                    .progress_chars("#>-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let references = Arc::new(ReferenceIndex::new());
        let mut results = stream::iter(sources.into_iter().map(|source| {
            process_file(
                self.extractor.clone(),
                source,
                options.file_timeout,
                cancel.clone(),
                references.clone(),
            )
        }))
        .buffered(options.concurrency);

        let mut files = Vec::with_capacity(total_files);
        let mut failures = Vec::new();

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    progress_bar.abandon_with_message("cancelled");
                    warn!("Indexing cancelled after {} of {} files", files.len(), total_files);
                    return Err(DomainError::Cancelled);
                }
                next = results.next() => match next {
                    Some(outcome) => outcome,
                    None => break,
                },
            };

            match outcome {
                FileOutcome::Indexed(path, index) => {
                    progress_bar.set_message(path.clone());
                    files.push((path, index));
                }
                FileOutcome::Unparseable(path, reason) => {
                    warn!("Failed to parse file {}: {}", path, reason);
                    failures.push(FileFailure {
                        path: path.clone(),
                        reason: FailureReason::Parse(reason),
                    });
                    files.push((path, FileIndex::empty()));
                }
                FileOutcome::Skipped(failure) => {
                    warn!("Skipping {}", failure);
                    failures.push(failure);
                }
            }
            progress_bar.inc(1);
        }

        progress_bar.finish_with_message("done");

        let files_processed = files.len();
        let index = self.assembler.assemble(overview, files, &references);
        let duration = start_time.elapsed();

        info!(
            "Indexing complete: {} files, {} entities, {} failures in {:.2}s",
            files_processed,
            index.entity_count(),
            failures.len(),
            duration.as_secs_f64()
        );

        let report = IndexReport {
            files_discovered: total_files,
            files_processed,
            entity_count: index.entity_count(),
            failures,
            duration,
        };

        Ok(IndexOutcome { index, report })
    }
}

async fn process_file(
    extractor: Arc<dyn EntityExtractor>,
    source: SourcePath,
    file_timeout: Duration,
    cancel: CancellationToken,
    references: Arc<ReferenceIndex>,
) -> FileOutcome {
    let path = source.relative_path().to_string();
    debug!("Processing file: {}", path);

    let content = match tokio::fs::read_to_string(source.absolute_path()).await {
        Ok(content) => content,
        Err(e) => {
            return FileOutcome::Skipped(FileFailure {
                path,
                reason: FailureReason::Read(e.to_string()),
            })
        }
    };

    // The budget stops the blocking work itself; the outer timeout only covers
    // extractors that never poll it.
    let file = SourceFile::new(path.clone(), content);
    let budget = ExtractionBudget::new(file_timeout, cancel);
    let task = tokio::task::spawn_blocking(move || {
        extractor.extract_within(file.path(), file.content(), &budget)
    });

    match tokio::time::timeout(file_timeout, task).await {
        Err(_) | Ok(Ok(Err(DomainError::Timeout(_)))) => FileOutcome::Skipped(FileFailure {
            path,
            reason: FailureReason::Timeout,
        }),
        Ok(Err(e)) => FileOutcome::Skipped(FileFailure {
            path,
            reason: FailureReason::Internal(format!("Extraction task failed: {}", e)),
        }),
        Ok(Ok(Err(DomainError::ParseError(reason)))) => FileOutcome::Unparseable(path, reason),
        Ok(Ok(Err(e))) => FileOutcome::Skipped(FileFailure {
            path,
            reason: FailureReason::Internal(e.to_string()),
        }),
        Ok(Ok(Ok(index))) => {
            references.merge(&index.referenced_by);
            debug!("Indexed {} entities from {}", index.entity_count(), path);
            FileOutcome::Indexed(path, index)
        }
    }
}
