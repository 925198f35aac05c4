//! Data models for feed sources and the articles collected from them.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`SourceConfig`]: One configured RSS/Atom feed source
//! - [`Article`]: A feed entry that is progressively filled in with its
//!   extracted page text and its LLM summary
//! - [`RunOutcome`]: How a pipeline run ended

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A configured news source.
///
/// Sources are defined once at startup (either the built-in table or a YAML
/// file) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Stable identifier, e.g. `"openai-blog"`.
    pub id: String,
    /// Display name used in logs and in the report.
    pub name: String,
    /// Short human description of the source.
    #[serde(default)]
    pub description: String,
    /// URL of the RSS or Atom feed.
    pub rss_url: String,
    /// Site root, used to resolve relative entry links.
    pub base_url: String,
    /// Disabled sources are never fetched.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Free-form topic tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Upper bound on articles contributed by this source per run.
    pub max_articles_per_source: usize,
}

fn default_enabled() -> bool {
    true
}

/// A single news article moving through the pipeline.
///
/// Created by the feed collector with an empty `full_text` and `summary`.
/// The content fetcher fills `full_text`; the summarizer fills `summary`.
///
/// # Invariants
///
/// * `url` and `source_name` are never empty.
/// * `published` is always a real timestamp from the feed; entries without
///   one never become articles.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub published: DateTime<Utc>,
    pub source_name: String,
    pub summary: String,
    pub full_text: String,
}

impl Article {
    /// Build an article stub from feed data.
    pub fn stub(
        title: impl Into<String>,
        url: impl Into<String>,
        published: DateTime<Utc>,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            published,
            source_name: source_name.into(),
            summary: String::new(),
            full_text: String::new(),
        }
    }

    /// Publish time as shown on the console and in the report.
    pub fn published_display(&self) -> String {
        self.published.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// No enabled source produced a recent article.
    NoArticles,
    /// Articles were found but none had usable page content.
    NoContent,
    /// The report was written.
    ReportWritten { path: PathBuf, article_count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_article_stub_starts_empty() {
        let published = Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap();
        let article = Article::stub("Title", "https://example.com/a", published, "Example");
        assert_eq!(article.url, "https://example.com/a");
        assert_eq!(article.source_name, "Example");
        assert!(article.summary.is_empty());
        assert!(article.full_text.is_empty());
    }

    #[test]
    fn test_published_display() {
        let published = Utc.with_ymd_and_hms(2025, 5, 6, 9, 5, 42).unwrap();
        let article = Article::stub("T", "https://example.com", published, "S");
        assert_eq!(article.published_display(), "2025-05-06 09:05");
    }

    #[test]
    fn test_source_config_yaml_defaults() {
        let yaml = r#"
id: example
name: Example Feed
rss_url: https://example.com/feed.xml
base_url: https://example.com
max_articles_per_source: 3
"#;
        let source: SourceConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(source.enabled);
        assert!(source.tags.is_empty());
        assert_eq!(source.description, "");
        assert_eq!(source.max_articles_per_source, 3);
    }
}
