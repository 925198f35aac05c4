//! # AI News Digest
//!
//! A news summarization pipeline that reads AI-focused RSS/Atom feeds,
//! extracts the full text of recent articles, summarizes each article and the
//! whole batch with a hosted LLM, and writes a single HTML digest.
//!
//! ## Usage
//!
//! ```sh
//! PERPLEXITY_API_KEY=... ai-news-digest --sources=3
//! ```
//!
//! ## Architecture
//!
//! The application follows a strictly sequential pipeline:
//! 1. **Collecting**: Read each enabled feed, keep entries from the last two days
//! 2. **Fetching**: Download each article page and extract its main text
//! 3. **Summarizing**: One LLM call per article, then one for the executive summary
//! 4. **Output**: Render and write `ai_news_summary.html`

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::process;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod sources;
mod summarize;
mod utils;

use api::{ChatClient, ChatConfig};
use cli::Cli;
use fetch::HttpFetcher;
use models::RunOutcome;
use pipeline::PipelineSettings;
use sources::{SourceLimit, SourceRegistry};
use utils::ensure_writable_parent;

/// Model calls are bounded by the client, not by the pipeline.
const MODEL_TIMEOUT_SECS: u64 = 120;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(sources = %args.sources, config = ?args.config, output = %args.output.display(), "Parsed CLI arguments");

    println!("🤖 AI News Summarizer");
    println!("{}", "=".repeat(50));

    // Everything below needs the key, so check it before touching the network.
    let Some(api_key) = args.api_key() else {
        error!("PERPLEXITY_API_KEY is not set");
        eprintln!("Error: PERPLEXITY_API_KEY environment variable is required");
        process::exit(1);
    };

    let registry = match &args.config {
        Some(path) => SourceRegistry::from_yaml_file(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load sources file");
            e
        })?,
        None => SourceRegistry::builtin(),
    };

    if let Err(e) = ensure_writable_parent(&args.output) {
        error!(
            path = %args.output.display(),
            error = %e,
            "Report location is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let sources = registry.enabled(SourceLimit::parse(&args.sources));
    info!(
        configured = registry.all().len(),
        selected = sources.len(),
        "Selected sources"
    );
    println!("Processing {} news sources...", sources.len());
    for source in &sources {
        println!("  • {}", source.name);
    }

    let fetcher = HttpFetcher::new()?;
    let model = ChatClient::new(ChatConfig {
        api_key: api_key.to_string(),
        api_base: args.api_base.clone(),
        model: args.model.clone(),
        timeout: std::time::Duration::from_secs(MODEL_TIMEOUT_SECS),
    })?;
    info!(?model, "Language model client ready");

    let settings = PipelineSettings {
        output_path: args.output.clone(),
        ..PipelineSettings::default()
    };

    let start_time = std::time::Instant::now();
    let outcome = pipeline::run(&fetcher, &model, &sources, &settings, Local::now()).await?;

    match outcome {
        RunOutcome::NoArticles => {
            println!("\n❌ No recent articles found. Try again later or check the RSS feeds.");
        }
        RunOutcome::NoContent => {
            println!("\n❌ No article content could be retrieved.");
        }
        RunOutcome::ReportWritten {
            path,
            article_count,
        } => {
            println!("\n📄 Generating HTML report...");
            println!("✅ HTML report generated as {}", path.display());
            info!(article_count, path = %path.display(), "Report written");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
