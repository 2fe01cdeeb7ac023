//! CLI binary for deckforge.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig` and prints the resulting deck as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use deckforge::{generate, Backend, DeckError, GenerationConfig, GenerationRequest, SourceDocument};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate a deck with the hosted backend (GEMINI_API_KEY must be set)
  deckforge "The Rust borrow checker"

  # Use a local inference server (LM Studio et al.)
  deckforge --backend local "Quarterly results"

  # Ground the deck on a text document
  deckforge --source notes.txt "Team offsite recap"

  # Write the deck JSON to a file
  deckforge "Kubernetes in production" -o deck.json

BACKENDS:
  hosted   Cloud model via the generateContent API; needs an API key.
  local    OpenAI-compatible chat-completions server on localhost;
           slower, no credential, larger output budget."#;

#[derive(Parser, Debug)]
#[command(
    name = "deckforge",
    version,
    about = "Generate structured slide decks from a topic with AI backends",
    after_help = AFTER_HELP
)]
struct Cli {
    /// Presentation topic (1-200 characters).
    topic: String,

    /// Backend to use: "hosted" or "local".
    #[arg(long, default_value = "hosted")]
    backend: String,

    /// Plain-text source document to ground the content on.
    #[arg(long, value_name = "FILE")]
    source: Option<PathBuf>,

    /// Hosted model identifier.
    #[arg(long)]
    model: Option<String>,

    /// Chat-completions URL of the local server.
    #[arg(long)]
    endpoint: Option<String>,

    /// API key for the hosted backend.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Write the deck JSON to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let backend: Backend = cli
        .backend
        .parse()
        .map_err(|e: DeckError| anyhow::anyhow!(e.to_string()))?;

    let mut builder = GenerationConfig::builder().backend(backend);
    if let Some(key) = &cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(model) = &cli.model {
        builder = builder.hosted_model(model);
    }
    if let Some(endpoint) = &cli.endpoint {
        builder = builder.local_endpoint(endpoint);
    }
    let config = builder.build().map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let mut request = GenerationRequest::new(&cli.topic);
    if let Some(path) = &cli.source {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source document {}", path.display()))?;
        request = request.with_source(SourceDocument {
            text,
            images: Vec::new(),
        });
    }

    let start = Instant::now();
    let deck = match generate(&request, &config).await {
        Ok(deck) => deck,
        Err(e) => {
            // Full detail to the log, the fixed per-category message to the user.
            tracing::error!("generation failed: {e}");
            anyhow::bail!("{}", e.user_message());
        }
    };

    let json = serde_json::to_string_pretty(&deck).context("failed to serialise deck")?;
    match &cli.out {
        Some(path) => write_atomic(path, &json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }

    eprintln!(
        "✔ {} slides via '{}' in {:.1}s",
        deck.metadata.slide_count,
        deck.metadata.backend_used,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Atomic write: temp file in the same directory, then rename, so a
/// crash never leaves a partial deck file behind.
fn write_atomic(path: &PathBuf, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "deckforge=info",
        1 => "deckforge=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
