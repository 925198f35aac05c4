//! Per-article and executive summaries.
//!
//! Both operations go through [`LanguageModel`] and never fail: a model error
//! is logged and replaced by a placeholder so the article (or the report)
//! still goes out.

use crate::api::{FieldSpec, Fields, LanguageModel, Task};
use crate::models::Article;
use crate::utils::{truncate_chars, truncate_for_log};
use chrono::NaiveDate;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Appended to article content cut down to the prompt budget.
pub const TRUNCATION_MARKER: &str = "... [content truncated]";

/// Prefix of the summary stored when the model call fails.
pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable for this article.";

/// Executive summary used when the batch call fails.
pub const EXECUTIVE_SUMMARY_UNAVAILABLE: &str =
    "Executive summary unavailable due to processing error.";

pub const ARTICLE_SUMMARY: Task = Task {
    name: "article_summary",
    instructions: "Summarize a news article into a single, informative paragraph that captures the key points and significance.",
    inputs: &[
        FieldSpec {
            name: "title",
            desc: "Article title",
        },
        FieldSpec {
            name: "content",
            desc: "Full article content",
        },
    ],
    outputs: &[FieldSpec {
        name: "summary",
        desc: "Single paragraph summary capturing key points and significance",
    }],
};

pub const EXECUTIVE_SUMMARY: Task = Task {
    name: "executive_summary",
    instructions: "Generate an executive summary from multiple AI news article summaries, highlighting key trends and developments.",
    inputs: &[
        FieldSpec {
            name: "article_summaries",
            desc: "Combined summaries of all articles",
        },
        FieldSpec {
            name: "date",
            desc: "Date of the report",
        },
    ],
    outputs: &[FieldSpec {
        name: "executive_summary",
        desc: "Executive summary highlighting key trends, developments, and insights from the AI news",
    }],
};

/// Settings for the summarization stage.
#[derive(Debug, Clone, Copy)]
pub struct SummarizeOptions {
    /// Article content is cut to this many characters before prompting.
    pub max_content_chars: usize,
    /// Pause between consecutive per-article calls.
    pub delay: Duration,
}

fn placeholder_summary(error: &dyn std::fmt::Display) -> String {
    format!("{SUMMARY_UNAVAILABLE} Error: {error}")
}

/// Summarize one article, falling back to a placeholder on failure.
#[instrument(level = "info", skip_all, fields(title = %truncate_for_log(&article.title, 60)))]
pub async fn summarize_article<M: LanguageModel>(
    model: &M,
    article: &Article,
    max_content_chars: usize,
) -> String {
    let (content, truncated) = truncate_chars(&article.full_text, max_content_chars, TRUNCATION_MARKER);
    if truncated {
        info!(max_content_chars, "Article content truncated for prompt");
    }

    let mut input = Fields::new();
    input.insert("title".to_string(), article.title.clone());
    input.insert("content".to_string(), content);

    match model.predict(&ARTICLE_SUMMARY, &input).await {
        Ok(mut output) => {
            let summary = output.remove("summary").unwrap_or_default();
            info!(chars = summary.chars().count(), "Generated summary");
            summary
        }
        Err(e) => {
            warn!(error = %e, url = %article.url, "Error summarizing article");
            placeholder_summary(&e)
        }
    }
}

/// Summarize every article in order, pausing between calls.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn summarize_all<M: LanguageModel>(
    model: &M,
    mut articles: Vec<Article>,
    options: &SummarizeOptions,
) -> Vec<Article> {
    let total = articles.len();
    for (i, article) in articles.iter_mut().enumerate() {
        info!(index = i + 1, total, "Summarizing article");
        let summary = summarize_article(model, article, options.max_content_chars).await;
        article.summary = summary;
        if i + 1 < total {
            sleep(options.delay).await;
        }
    }
    info!(total, "Generated summaries for all articles");
    articles
}

/// Render the per-article summaries as the executive-summary input.
///
/// One `"{n}. {title} ({source}): {summary}"` line per article, numbered from
/// one, separated by blank lines.
pub fn combine_summaries(articles: &[Article]) -> String {
    articles
        .iter()
        .enumerate()
        .map(|(i, a)| format!("{}. {} ({}): {}", i + 1, a.title, a.source_name, a.summary))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Produce the cross-article executive summary, or a placeholder on failure.
#[instrument(level = "info", skip_all, fields(count = articles.len(), %date))]
pub async fn executive_summary<M: LanguageModel>(
    model: &M,
    articles: &[Article],
    date: NaiveDate,
) -> String {
    let mut input = Fields::new();
    input.insert("article_summaries".to_string(), combine_summaries(articles));
    input.insert("date".to_string(), date.format("%Y-%m-%d").to_string());

    match model.predict(&EXECUTIVE_SUMMARY, &input).await {
        Ok(mut output) => {
            let summary = output.remove("executive_summary").unwrap_or_default();
            info!(chars = summary.chars().count(), "Generated executive summary");
            summary
        }
        Err(e) => {
            warn!(error = %e, "Error generating executive summary");
            EXECUTIVE_SUMMARY_UNAVAILABLE.to_string()
        }
    }
}
