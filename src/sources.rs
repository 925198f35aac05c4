//! The source registry: which feeds exist and which of them to read.
//!
//! The registry is built once at startup, either from the built-in table in
//! [`SourceRegistry::builtin`] or from a YAML file passed with `--config`,
//! and is then only ever borrowed.
//!
//! # YAML format
//!
//! ```yaml
//! sources:
//!   - id: openai-blog
//!     name: OpenAI Blog
//!     rss_url: https://openai.com/news/rss.xml
//!     base_url: https://openai.com
//!     max_articles_per_source: 5
//! ```

use crate::models::SourceConfig;
use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Immutable, ordered table of configured sources.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRegistry {
    sources: Vec<SourceConfig>,
}

/// How many enabled sources to process, as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLimit {
    All,
    First(usize),
}

impl SourceLimit {
    /// Interpret a `--sources` value.
    ///
    /// `"all"` (any case) and the empty string mean every enabled source.
    /// Anything that is not a non-negative integer is reported with a warning
    /// and also treated as "all"; it is never an error.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return SourceLimit::All;
        }
        match raw.parse::<usize>() {
            Ok(n) => SourceLimit::First(n),
            Err(_) => {
                warn!(limit = %raw, "Invalid source limit; using all sources");
                SourceLimit::All
            }
        }
    }
}

impl SourceRegistry {
    pub fn new(sources: Vec<SourceConfig>) -> Self {
        Self { sources }
    }

    /// Load a registry from a YAML file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn from_yaml_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)?;
        let registry = Self::from_yaml_str(&raw)?;
        info!(count = registry.sources.len(), "Loaded sources file");
        Ok(registry)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    pub fn all(&self) -> &[SourceConfig] {
        &self.sources
    }

    /// Enabled sources in registry order, truncated to the first N when the
    /// limit asks for it.
    pub fn enabled(&self, limit: SourceLimit) -> Vec<&SourceConfig> {
        let enabled = self.sources.iter().filter(|s| s.enabled);
        match limit {
            SourceLimit::All => enabled.collect(),
            SourceLimit::First(n) => enabled.take(n).collect(),
        }
    }

    /// The built-in set of AI news feeds.
    pub fn builtin() -> Self {
        let source = |id: &str,
                      name: &str,
                      description: &str,
                      rss_url: &str,
                      base_url: &str,
                      enabled: bool,
                      tags: &[&str],
                      max_articles_per_source: usize| SourceConfig {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            rss_url: rss_url.to_string(),
            base_url: base_url.to_string(),
            enabled,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            max_articles_per_source,
        };

        Self::new(vec![
            // Industry research labs
            source(
                "openai-blog",
                "OpenAI Blog",
                "Latest research and product announcements from OpenAI",
                "https://openai.com/news/rss.xml",
                "https://openai.com",
                true,
                &["ai", "research", "gpt", "openai"],
                5,
            ),
            source(
                "deepmind-blog",
                "DeepMind Blog",
                "AI research breakthroughs and insights from DeepMind",
                "https://deepmind.google/blog/feed/basic/",
                "https://deepmind.google",
                true,
                &["ai", "research", "deepmind", "google"],
                5,
            ),
            source(
                "anthropic-news",
                "Anthropic News",
                "AI safety and research updates from Anthropic",
                "https://raw.githubusercontent.com/Olshansk/rss-feeds/main/feeds/feed_anthropic.xml",
                "https://www.anthropic.com",
                true,
                &["ai", "safety", "anthropic", "claude"],
                5,
            ),
            source(
                "google-ai-blog",
                "Google AI Blog",
                "Research and developments from Google's AI teams",
                "https://blog.google/technology/ai/rss/",
                "https://blog.google",
                true,
                &["ai", "research", "google", "tensorflow"],
                5,
            ),
            // Academic
            source(
                "arxiv-cs-ai",
                "ArXiv CS.AI",
                "Latest AI research papers from ArXiv",
                "https://arxiv.org/rss/cs.AI",
                "https://arxiv.org",
                false,
                &["ai", "research", "papers", "academic"],
                3,
            ),
            source(
                "arxiv-cs-lg",
                "ArXiv CS.LG (Machine Learning)",
                "Latest machine learning research papers from ArXiv",
                "https://arxiv.org/rss/cs.LG",
                "https://arxiv.org",
                false,
                &["ai", "ml", "research", "papers", "academic"],
                3,
            ),
            source(
                "berkeley-ai-research",
                "Berkeley AI Research",
                "Deep technical analysis from UC Berkeley AI Research",
                "https://bair.berkeley.edu/blog/feed.xml",
                "https://bair.berkeley.edu",
                true,
                &["ai", "research", "berkeley", "academic"],
                3,
            ),
            // Specialized AI sites
            source(
                "unite-ai",
                "Unite.AI",
                "Latest AI news and developments",
                "https://www.unite.ai/feed/",
                "https://www.unite.ai",
                true,
                &["ai", "news", "industry"],
                5,
            ),
            source(
                "the-decoder",
                "The Decoder",
                "AI news and deep dives into artificial intelligence",
                "https://the-decoder.com/feed/",
                "https://the-decoder.com",
                true,
                &["ai", "news", "analysis"],
                3,
            ),
            source(
                "ai-business",
                "AI Business",
                "Business-focused AI news and insights",
                "https://aibusiness.com/rss.xml",
                "https://aibusiness.com",
                true,
                &["ai", "business", "enterprise"],
                3,
            ),
            // News and industry analysis
            source(
                "mit-tech-review",
                "MIT Technology Review",
                "In-depth technology analysis and AI coverage",
                "https://www.technologyreview.com/feed/",
                "https://www.technologyreview.com",
                true,
                &["tech", "ai", "analysis", "mit"],
                3,
            ),
            source(
                "venturebeat-ai",
                "VentureBeat AI",
                "AI-focused coverage from VentureBeat",
                "https://venturebeat.com/category/ai/feed/",
                "https://venturebeat.com",
                true,
                &["ai", "business", "startups"],
                4,
            ),
            source(
                "wired-ai",
                "Wired AI",
                "AI coverage from Wired magazine",
                "https://www.wired.com/feed/tag/ai/latest/rss",
                "https://www.wired.com",
                true,
                &["ai", "tech", "culture", "wired"],
                3,
            ),
        ])
    }
}
