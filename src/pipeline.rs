//! The end-to-end digest run.
//!
//! Stages run strictly one after another, each consuming the previous
//! stage's full output:
//!
//! 1. collect recent article stubs from the selected sources
//! 2. fetch page text, dropping articles without usable content
//! 3. summarize each article, then the whole batch
//! 4. render and write the HTML report
//!
//! Per-item failures are absorbed inside the stages. The only early exits
//! are "no articles found" and "no content retrieved", both reported through
//! [`RunOutcome`] without writing a report.

use crate::api::LanguageModel;
use crate::fetch::Fetch;
use crate::models::{Article, RunOutcome, SourceConfig};
use crate::outputs::html::{render_report, write_report};
use crate::scrapers::article::{ContentOptions, fetch_all_content};
use crate::scrapers::feed::{CollectOptions, collect_articles};
use crate::summarize::{SummarizeOptions, executive_summary, summarize_all};
use crate::utils::truncate_for_log;
use chrono::{DateTime, Duration as ChronoDuration, Local, Utc};
use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Default report location, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "ai_news_summary.html";

/// How many collected articles and summaries are echoed to the console.
const CONSOLE_LISTING: usize = 10;
/// How many content previews are echoed to the console.
const CONSOLE_PREVIEWS: usize = 3;

/// Fixed parameters of a run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub feed_timeout: Duration,
    pub article_timeout: Duration,
    pub recency_window: ChronoDuration,
    pub fetch_delay: Duration,
    pub summarize_delay: Duration,
    pub max_content_chars: usize,
    pub min_content_chars: usize,
    pub output_path: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            feed_timeout: Duration::from_secs(10),
            article_timeout: Duration::from_secs(15),
            recency_window: ChronoDuration::days(2),
            fetch_delay: Duration::from_secs(1),
            summarize_delay: Duration::from_secs(2),
            max_content_chars: 8000,
            min_content_chars: 100,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

fn print_collected(articles: &[Article]) {
    println!("\n📋 Recent articles found:");
    for (i, article) in articles.iter().take(CONSOLE_LISTING).enumerate() {
        println!("  {}. {}", i + 1, article.title);
        println!(
            "     Source: {} | Date: {}",
            article.source_name,
            article.published_display()
        );
        println!("     URL: {}", article.url);
        println!();
    }
    if articles.len() > CONSOLE_LISTING {
        println!("  ... and {} more articles", articles.len() - CONSOLE_LISTING);
    }
}

fn print_previews(articles: &[Article]) {
    println!("\n📖 Content retrieved successfully:");
    for (i, article) in articles.iter().take(CONSOLE_PREVIEWS).enumerate() {
        let preview: String = article.full_text.chars().take(200).collect();
        println!("\n{}. {}", i + 1, article.title);
        println!("   Content preview: {preview}...");
        println!(
            "   Full length: {} characters",
            article.full_text.chars().count()
        );
    }
}

fn print_summaries(articles: &[Article]) {
    println!("\n📝 Article Summaries:");
    for (i, article) in articles.iter().take(CONSOLE_LISTING).enumerate() {
        println!("  {}. {}", i + 1, article.title);
        println!("     Summary: {}", article.summary);
        println!();
    }
    if articles.len() > CONSOLE_LISTING {
        println!(
            "  ... and {} more summaries",
            articles.len() - CONSOLE_LISTING
        );
    }
}

/// Run the whole pipeline once against the given collaborators.
///
/// `now` anchors the recency window, the executive summary date and the
/// report timestamp.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn run<F: Fetch, M: LanguageModel>(
    fetcher: &F,
    model: &M,
    sources: &[&SourceConfig],
    settings: &PipelineSettings,
    now: DateTime<Local>,
) -> Result<RunOutcome, Box<dyn Error>> {
    let t0 = Instant::now();

    let collect = CollectOptions {
        now: now.with_timezone(&Utc),
        window: settings.recency_window,
        timeout: settings.feed_timeout,
    };
    let articles = collect_articles(fetcher, sources, &collect).await;
    if articles.is_empty() {
        info!("No recent articles found");
        return Ok(RunOutcome::NoArticles);
    }
    print_collected(&articles);

    let content = ContentOptions {
        timeout: settings.article_timeout,
        delay: settings.fetch_delay,
        min_chars: settings.min_content_chars,
    };
    let articles = fetch_all_content(fetcher, articles, &content).await;
    if articles.is_empty() {
        info!("No article content could be retrieved");
        return Ok(RunOutcome::NoContent);
    }
    print_previews(&articles);

    let summarize = SummarizeOptions {
        max_content_chars: settings.max_content_chars,
        delay: settings.summarize_delay,
    };
    let articles = summarize_all(model, articles, &summarize).await;
    print_summaries(&articles);

    let executive = executive_summary(model, &articles, now.date_naive()).await;
    println!("\n📊 Executive Summary:\n{executive}");
    info!(preview = %truncate_for_log(&executive, 120), "Executive summary ready");

    let html = render_report(&articles, &executive, now.naive_local());
    write_report(&settings.output_path, &html).await?;

    info!(
        articles = articles.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Digest complete"
    );
    Ok(RunOutcome::ReportWritten {
        path: settings.output_path.clone(),
        article_count: articles.len(),
    })
}
