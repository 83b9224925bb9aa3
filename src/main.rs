//! # Persona Codex CLI (`codex`)
//!
//! The `codex` binary builds the vector index from a personal corpus and
//! answers questions about its owner from the terminal.
//!
//! ## Usage
//!
//! ```bash
//! codex --config ./config/codex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `codex ingest` | Rebuild the vector index from the corpus directory |
//! | `codex search "<query>"` | Show the chunks retrieved for a query |
//! | `codex ask "<question>"` | Answer one question |
//! | `codex chat` | Interactive conversation with history |
//! | `codex stats` | Index location, model and chunk counts |
//! | `codex modes` | List persona modes |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `info`); stdout carries only command output.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use persona_codex::prompt::Mode;
use persona_codex::{chat, config, ingest, retriever, stats};

/// Persona Codex CLI: answers questions about a person from their own
/// documents, in their own voice.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/codex.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "codex",
    about = "Persona Codex: a retrieval-augmented personal assistant",
    version,
    long_about = "Persona Codex ingests a CV, project write-ups and personal notes into a local \
    vector index, then answers questions about their owner in one of several persona modes, \
    grounding every answer in retrieved passages."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/codex.toml`.
    #[arg(long, global = true, default_value = "./config/codex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Rebuild the vector index from the corpus directory.
    ///
    /// Loads every admitted file, drops near-empty fragments, chunks each
    /// document with its category's policy, embeds the chunks and replaces
    /// the index directory. Fails without touching the index when no
    /// document survives preprocessing.
    Ingest {
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the chunks retrieved for a query, with scores.
    Search {
        /// The search query string.
        query: String,

        /// Number of chunks to return (defaults to `retrieval.k`).
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Answer a single question with no prior history.
    Ask {
        /// The question.
        question: String,

        /// Persona mode: `interview`, `storytelling`, `fast_facts` or `humble_brag`.
        #[arg(long, default_value = "interview")]
        mode: String,
    },

    /// Start an interactive conversation on stdin.
    ///
    /// Type `/mode <name>` to switch mode, `/reset` to clear history and
    /// `/quit` to leave.
    Chat {
        /// Initial persona mode.
        #[arg(long, default_value = "interview")]
        mode: String,
    },

    /// Show index location, embedding model and chunk counts per type.
    Stats,

    /// List the available persona modes.
    Modes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Modes = cli.command {
        chat::run_modes();
        return Ok(());
    }

    // Reject unknown modes before anything is loaded.
    let mode = match &cli.command {
        Commands::Ask { mode, .. } | Commands::Chat { mode } => Some(mode.parse::<Mode>()?),
        _ => None,
    };

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest { json } => {
            ingest::run_ingest(&cfg, json).await?;
        }
        Commands::Search { query, k } => {
            retriever::run_search(&cfg, &query, k).await?;
        }
        Commands::Ask { question, .. } => {
            chat::run_ask(&cfg, &question, mode.unwrap_or_default()).await?;
        }
        Commands::Chat { .. } => {
            chat::run_chat(&cfg, mode.unwrap_or_default()).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Modes => {}
    }

    Ok(())
}
