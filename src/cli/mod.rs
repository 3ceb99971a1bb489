use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Index every source file under a directory and write the JSON index
    Index {
        path: String,

        /// Where to write the index
        #[arg(short, long, default_value = "parsed_code.json")]
        output: String,

        /// Source file extension to index
        #[arg(long, default_value = "py")]
        extension: String,

        /// File name captured as the project overview (case-insensitive)
        #[arg(long, default_value = "readme.md")]
        overview: String,

        /// Files extracted in parallel (defaults to available cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Per-file extraction timeout
        #[arg(long, default_value = "30")]
        timeout_secs: u64,

        #[arg(long)]
        no_progress: bool,
    },

    /// Export entity documents from an index file in fixed-size batches
    Export {
        index: String,

        /// JSON-lines file receiving the documents
        #[arg(short, long, default_value = "documents.jsonl")]
        output: String,

        #[arg(long, default_value = "500")]
        batch_size: usize,

        /// Leave the overview document out of the export
        #[arg(long)]
        no_overview: bool,
    },

    /// Summarize an index file
    Stats {
        index: String,
    },
}
