use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use pyindex::cli::Commands;
use pyindex::{
    EntityKind, ExportDocumentsUseCase, ExportOptions, IndexCodebaseUseCase, IndexOptions,
    JsonIndexFile, JsonlEntityStore, TreeSitterExtractor,
};

#[derive(Parser)]
#[command(name = "pyindex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Index {
            path,
            output,
            extension,
            overview,
            jobs,
            timeout_secs,
            no_progress,
        } => {
            let mut options = IndexOptions::new()
                .with_extension(extension)
                .with_overview_file_name(overview)
                .with_file_timeout(Duration::from_secs(timeout_secs))
                .with_progress(!no_progress);
            if let Some(jobs) = jobs {
                options = options.with_concurrency(jobs);
            }

            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received, stopping after the current file");
                    ctrl_c.cancel();
                }
            });

            let use_case = IndexCodebaseUseCase::new(Arc::new(TreeSitterExtractor::new()));
            let outcome = use_case.execute(&path, &options, &cancel).await?;

            JsonIndexFile::new(&output).write(&outcome.index).await?;

            let report = &outcome.report;
            println!(
                "Indexed {} files ({} entities) into {}",
                report.files_processed, report.entity_count, output
            );
            if !report.failures.is_empty() {
                println!("{} files had problems:", report.failures.len());
                for failure in &report.failures {
                    println!("  {}", failure);
                }
            }
        }

        Commands::Export {
            index,
            output,
            batch_size,
            no_overview,
        } => {
            let codebase = JsonIndexFile::new(&index).read().await?;
            let store = Arc::new(JsonlEntityStore::create(&output).await?);

            let use_case = ExportDocumentsUseCase::new(store);
            let options = ExportOptions::new()
                .with_batch_size(batch_size)
                .with_overview(!no_overview);
            let report = use_case.execute(&codebase, &options).await?;

            if report.duplicates > 0 {
                warn!("Skipped {} duplicate documents", report.duplicates);
            }
            println!(
                "Stored {} documents in {} batches to {}",
                report.documents, report.batches, output
            );
        }

        Commands::Stats { index } => {
            let codebase = JsonIndexFile::new(&index).read().await?;

            println!("PyIndex Statistics");
            println!("==================");
            println!("Files:       {}", codebase.file_count());
            println!("Unparsed:    {}", codebase.empty_files().len());
            println!("Entities:    {}", codebase.entity_count());
            println!("  Functions: {}", codebase.count_kind(EntityKind::Function));
            println!("  Classes:   {}", codebase.count_kind(EntityKind::Class));
            println!("  Scripts:   {}", codebase.count_kind(EntityKind::Script));
            println!("Imports:     {}", codebase.import_count());
            println!("Referenced:  {} identifiers", codebase.references.len());
            println!(
                "Overview:    {}",
                if codebase.overview.is_empty() { "no" } else { "yes" }
            );
        }
    }

    Ok(())
}
