//! Command-line interface definitions for AI News Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Credentials and model settings can also come from environment variables.

use crate::pipeline::DEFAULT_OUTPUT;
use clap::Parser;
use std::path::PathBuf;

/// Collect recent AI news, summarize it with a hosted LLM, and write an HTML digest.
///
/// # Examples
///
/// ```sh
/// # All enabled sources
/// PERPLEXITY_API_KEY=... ai-news-digest
///
/// # Only the first three enabled sources
/// ai-news-digest --sources=3
///
/// # Custom source list
/// ai-news-digest --config ./sources.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Number of sources to process, or "all"
    #[arg(long, value_name = "N", default_value = "all")]
    pub sources: String,

    /// Optional path to a YAML file replacing the built-in source list
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where to write the HTML report
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// API key for the language-model provider
    #[arg(long, env = "PERPLEXITY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible chat completions API
    #[arg(long, env = "PERPLEXITY_API_BASE", default_value = "https://api.perplexity.ai")]
    pub api_base: String,

    /// Model name passed to the API
    #[arg(long, env = "PERPLEXITY_MODEL", default_value = "sonar")]
    pub model: String,
}

impl Cli {
    /// The API key, if one was given and is not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
