use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::EntityStore;
use crate::domain::{CodebaseIndex, DomainError, EntityDocument};

pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    batch_size: usize,
    include_overview: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            include_overview: true,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_overview(mut self, include: bool) -> Self {
        self.include_overview = include;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub documents: u64,
    pub batches: u64,
    pub duplicates: u64,
}

/// Turns an index into content-addressed documents and stores them in
/// fixed-size batches, flushing the remainder at the end.
pub struct ExportDocumentsUseCase {
    store: Arc<dyn EntityStore>,
}

impl ExportDocumentsUseCase {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        index: &CodebaseIndex,
        options: &ExportOptions,
    ) -> Result<ExportReport, DomainError> {
        if options.batch_size == 0 {
            return Err(DomainError::invalid_input("Batch size must be at least 1"));
        }

        let mut report = ExportReport::default();
        let mut seen = HashSet::new();
        let mut batch = Vec::with_capacity(options.batch_size);

        let overview = (options.include_overview && !index.overview.is_empty())
            .then(|| EntityDocument::overview(&index.overview));
        let entities = index.files.iter().flat_map(|(path, file)| {
            file.entities
                .iter()
                .map(move |entity| EntityDocument::from_entity(path, entity))
        });

        for document in overview.into_iter().chain(entities) {
            if !seen.insert(document.id().to_string()) {
                debug!("Skipping duplicate document {}", document.id());
                report.duplicates += 1;
                continue;
            }

            batch.push(document);
            if batch.len() >= options.batch_size {
                self.flush(&mut batch, &mut report).await?;
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch, &mut report).await?;
        }

        info!(
            "Exported {} documents in {} batches",
            report.documents, report.batches
        );
        Ok(report)
    }

    async fn flush(
        &self,
        batch: &mut Vec<EntityDocument>,
        report: &mut ExportReport,
    ) -> Result<(), DomainError> {
        report.batches += 1;
        info!("Storing batch {} ({} documents)", report.batches, batch.len());

        self.store.save_batch(batch).await?;
        report.documents += batch.len() as u64;
        batch.clear();
        Ok(())
    }
}
