//! # docsift CLI
//!
//! The `docsift` binary is the primary interface for docsift. It provides
//! commands for database initialization, document ingestion, question
//! answering, summarization, and starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! docsift --config ./config/docsift.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docsift init` | Create the SQLite database and run schema migrations |
//! | `docsift ingest <file>` | Ingest a document (dedup-aware, no question) |
//! | `docsift ask <file> "<question>"` | Ingest a document and answer a question |
//! | `docsift summarize <file>` | Ingest a document and stream a summary |
//! | `docsift serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! docsift init --config ./config/docsift.toml
//!
//! # Ask a question about a PDF; the answer streams to stdout
//! docsift ask paper.pdf "What method does the paper propose?"
//!
//! # Technical extractive summary, five lines
//! docsift summarize paper.pdf --style extractive --length "5 lines" --complexity technical
//!
//! # Start the HTTP server
//! docsift serve --config ./config/docsift.toml
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use docsift::config::{self, Config};
use docsift::db;
use docsift::extract;
use docsift::generate::OllamaGenerator;
use docsift::migrate;
use docsift::pipeline::{self, IngestOutcome, PipelineError, RequestKind};
use docsift::prompt::{Complexity, SummarySpec, SummaryStyle};
use docsift::server;
use docsift::sqlite_store::SqliteStore;

/// docsift — document question answering over lexical retrieval.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docsift.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "docsift",
    about = "docsift — document question answering over lexical retrieval",
    version,
    long_about = "docsift ingests documents with content-hash deduplication, splits them into \
    overlapping sentence-window chunks, ranks chunks against a question with TF-IDF + cosine \
    similarity, and streams an answer generated from the top-ranked chunks by a local LLM."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docsift.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the documents and chunks
    /// tables. Idempotent — running it multiple times is safe.
    Init,

    /// Ingest a document without asking anything.
    ///
    /// Extracts text, fingerprints it, and stores chunks unless an
    /// identical `(name, content)` pair was ingested before.
    Ingest {
        /// Path to the document (PDF, txt, md).
        file: PathBuf,
    },

    /// Ingest a document and answer a question about it.
    ///
    /// Streams the answer to stdout as it is generated. Requires a
    /// running Ollama instance (see `[generator]` in the config).
    Ask {
        /// Path to the document (PDF, txt, md).
        file: PathBuf,

        /// The question to answer from the document.
        query: String,
    },

    /// Ingest a document and stream a summary of it.
    Summarize {
        /// Path to the document (PDF, txt, md).
        file: PathBuf,

        /// Summary style: short, long, abstractive, or extractive.
        #[arg(long, default_value = "short")]
        style: SummaryStyle,

        /// Target length directive (e.g. "5 lines", "medium").
        #[arg(long)]
        length: Option<String>,

        /// Audience register: simple or technical.
        #[arg(long, default_value = "simple")]
        complexity: Complexity,
    },

    /// Start the HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and exposes
    /// `/ask`, `/summarize`, and `/health`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { file } => {
            let outcome = run_ingest(&cfg, &file).await?;
            report_ingest(&outcome);
            println!("ok");
        }
        Commands::Ask { file, query } => {
            if query.trim().is_empty() {
                bail!("query must not be empty");
            }
            run_request(&cfg, &file, RequestKind::Ask { query }).await?;
        }
        Commands::Summarize {
            file,
            style,
            length,
            complexity,
        } => {
            let spec = SummarySpec {
                style,
                length,
                complexity,
            };
            run_request(&cfg, &file, RequestKind::Summarize(spec)).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

/// Extract and ingest a document, printing nothing.
async fn run_ingest(cfg: &Config, file: &Path) -> anyhow::Result<IngestOutcome> {
    let pool = db::connect(cfg).await?;
    let store = SqliteStore::new(pool);
    let text = extract::extract_file(file)?;
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();
    let outcome = pipeline::ingest(&store, &name, &text, cfg).await?;
    Ok(outcome)
}

fn report_ingest(outcome: &IngestOutcome) {
    println!("document id: {}", outcome.document.id);
    if outcome.deduplicated {
        println!("already ingested; stored chunks reused");
    } else {
        println!("chunks written: {}", outcome.chunks_written);
    }
}

/// Ingest the document and run an ask or summarize request against it,
/// streaming fragments to stdout as they arrive.
async fn run_request(cfg: &Config, file: &Path, kind: RequestKind) -> anyhow::Result<()> {
    let pool = db::connect(cfg).await?;
    let store = SqliteStore::new(pool);
    let generator = OllamaGenerator::new(&cfg.generator);

    let text = extract::extract_file(file)?;
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    let outcome = pipeline::ingest(&store, &name, &text, cfg).await?;
    report_ingest(&outcome);

    let (tx, mut rx) = mpsc::channel::<String>(16);
    let printer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        while let Some(fragment) = rx.recv().await {
            let _ = stdout.write_all(fragment.as_bytes());
            let _ = stdout.flush();
        }
    });

    let result = pipeline::respond(&store, &generator, cfg, &outcome.document.id, &kind, tx).await;
    let _ = printer.await;

    match result {
        Ok(_) => {
            println!();
            Ok(())
        }
        Err(PipelineError::EmptyCorpus) => {
            println!("No relevant content found. Try a different document or question.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
