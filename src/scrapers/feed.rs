//! Feed collection: turn each enabled source's RSS/Atom feed into recent
//! article stubs.
//!
//! For every source the feed document is fetched and parsed with `feed-rs`.
//! Entries are then walked in feed order:
//!
//! 1. the publish time is the entry's `published` field, falling back to
//!    `updated`; entries with neither are skipped,
//! 2. entries older than the recency window are skipped,
//! 3. the walk stops once the source's cap is reached, and never looks at
//!    more than twice the cap in raw entries.
//!
//! A failing source (network, HTTP status, unparseable feed) is logged and
//! contributes nothing; the remaining sources are still collected.

use crate::fetch::Fetch;
use crate::models::{Article, SourceConfig};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Fallback title for entries that carry none.
pub const UNTITLED: &str = "No title";

/// The fields of a feed entry that the collector looks at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl FeedEntry {
    /// `published`, or `updated` when the feed has no publish date.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.published.or(self.updated)
    }
}

/// Recency and fetch parameters for one collection pass.
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Reference "now" for the recency window.
    pub now: DateTime<Utc>,
    /// How far back an entry may be published and still be collected.
    pub window: ChronoDuration,
    /// Timeout for each feed request.
    pub timeout: Duration,
}

impl CollectOptions {
    /// Oldest publish time that is still collected (inclusive).
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.now - self.window
    }
}

/// Parse a raw RSS/Atom/JSON feed document into entries.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedEntry>, feed_rs::parser::ParseFeedError> {
    let feed = feed_rs::parser::parse(bytes)?;
    Ok(feed
        .entries
        .into_iter()
        .map(|entry| FeedEntry {
            title: entry
                .title
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty()),
            link: entry.links.first().map(|link| link.href.trim().to_string()),
            published: entry.published,
            updated: entry.updated,
        })
        .collect())
}

/// Resolve a possibly relative entry link against the source's site root.
fn resolve_link(base_url: &str, link: &str) -> Option<String> {
    if link.is_empty() {
        return None;
    }
    match Url::parse(base_url) {
        Ok(base) => base.join(link).ok().map(|u| u.to_string()),
        Err(_) => Url::parse(link).ok().map(|u| u.to_string()),
    }
}

/// Apply the timestamp, recency and cap rules to one source's entries.
///
/// Entries are examined in feed order. At most `2 × cap` raw entries are
/// looked at, and at most `cap` articles are returned.
///
/// # Arguments
///
/// * `source` - The source the entries came from (name, base URL, cap)
/// * `entries` - Parsed feed entries in feed order
/// * `options` - Supplies the recency cutoff, which is inclusive
///
/// # Returns
///
/// Article stubs for the accepted entries, in feed order. Entries without a
/// timestamp or a usable link are logged and skipped.
pub fn select_recent(
    source: &SourceConfig,
    entries: Vec<FeedEntry>,
    options: &CollectOptions,
) -> Vec<Article> {
    let cap = source.max_articles_per_source;
    let cutoff = options.cutoff();
    let mut articles = Vec::new();

    if cap == 0 {
        return articles;
    }

    for entry in entries.into_iter().take(cap.saturating_mul(2)) {
        let title = entry.title.clone().unwrap_or_else(|| UNTITLED.to_string());

        let Some(published) = entry.timestamp() else {
            warn!(source = %source.name, %title, "No date found for entry; skipping");
            continue;
        };

        if published < cutoff {
            debug!(source = %source.name, %title, %published, "Entry older than recency window");
            continue;
        }

        let Some(url) = entry
            .link
            .as_deref()
            .and_then(|link| resolve_link(&source.base_url, link))
        else {
            warn!(source = %source.name, %title, "Entry has no usable link; skipping");
            continue;
        };

        articles.push(Article::stub(title, url, published, source.name.clone()));

        if articles.len() >= cap {
            break;
        }
    }

    articles
}

/// Fetch and parse one source's feed, returning its recent articles.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn fetch_source<F: Fetch>(
    fetcher: &F,
    source: &SourceConfig,
    options: &CollectOptions,
) -> Result<Vec<Article>, Box<dyn Error>> {
    let body = fetcher.get(&source.rss_url, options.timeout).await?;
    let entries = parse_feed(&body)?;
    debug!(entries = entries.len(), "Parsed feed");
    Ok(select_recent(source, entries, options))
}

/// Collect recent articles from every given source, newest first.
///
/// The sort is stable, so articles sharing a publish time keep the order in
/// which they were discovered (source order, then feed order).
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn collect_articles<F: Fetch>(
    fetcher: &F,
    sources: &[&SourceConfig],
    options: &CollectOptions,
) -> Vec<Article> {
    let mut all_articles = Vec::new();

    for source in sources {
        info!(source = %source.name, url = %source.rss_url, "Fetching RSS feed");
        match fetch_source(fetcher, source, options).await {
            Ok(articles) => {
                info!(
                    source = %source.name,
                    count = articles.len(),
                    "Found recent articles"
                );
                all_articles.extend(articles);
            }
            Err(e) => {
                warn!(source = %source.name, error = %e, "Error fetching RSS feed; skipping source");
            }
        }
    }

    all_articles.sort_by(|a, b| b.published.cmp(&a.published));
    info!(count = all_articles.len(), "Total articles collected");
    all_articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{Canned, FakeFetcher};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap()
    }

    fn options() -> CollectOptions {
        CollectOptions {
            now: now(),
            window: ChronoDuration::days(2),
            timeout: Duration::from_secs(10),
        }
    }

    fn source(name: &str, cap: usize) -> SourceConfig {
        SourceConfig {
            id: name.to_lowercase(),
            name: name.to_string(),
            description: String::new(),
            rss_url: format!("https://{}.example/feed.xml", name.to_lowercase()),
            base_url: format!("https://{}.example", name.to_lowercase()),
            enabled: true,
            tags: vec![],
            max_articles_per_source: cap,
        }
    }

    fn entry(title: &str, published: DateTime<Utc>) -> FeedEntry {
        FeedEntry {
            title: Some(title.to_string()),
            link: Some(format!("/posts/{}", title.to_lowercase())),
            published: Some(published),
            updated: None,
        }
    }

    fn rss(items: &[(&str, &str, DateTime<Utc>)]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test feed</title><link>https://example.com</link><description>Test</description>"#,
        );
        for (title, link, published) in items {
            xml.push_str(&format!(
                "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate></item>",
                title,
                link,
                published.to_rfc2822()
            ));
        }
        xml.push_str("</channel></rss>");
        xml
    }

    #[test]
    fn test_timestamp_falls_back_to_updated() {
        let updated = now();
        let e = FeedEntry {
            updated: Some(updated),
            ..Default::default()
        };
        assert_eq!(e.timestamp(), Some(updated));
        assert_eq!(FeedEntry::default().timestamp(), None);
    }

    #[test]
    fn test_entry_without_timestamp_is_skipped() {
        let src = source("Blog", 5);
        let undated = FeedEntry {
            title: Some("Undated".to_string()),
            link: Some("https://blog.example/undated".to_string()),
            ..Default::default()
        };
        let articles = select_recent(&src, vec![undated, entry("Dated", now())], &options());
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Dated");
    }

    #[test]
    fn test_recency_cutoff_is_inclusive() {
        let src = source("Blog", 5);
        let cutoff = options().cutoff();
        let entries = vec![
            entry("AtCutoff", cutoff),
            entry("JustBefore", cutoff - ChronoDuration::seconds(1)),
            entry("TenDaysOld", now() - ChronoDuration::days(10)),
        ];
        let articles = select_recent(&src, entries, &options());
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["AtCutoff"]);
    }

    #[test]
    fn test_cap_limits_articles_per_source() {
        let src = source("Blog", 2);
        let entries = (0..6)
            .map(|i| entry(&format!("Post{i}"), now() - ChronoDuration::hours(i)))
            .collect();
        let articles = select_recent(&src, entries, &options());
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Post0");
        assert_eq!(articles[1].title, "Post1");
    }

    #[test]
    fn test_at_most_twice_the_cap_is_examined() {
        let src = source("Blog", 2);
        let stale = now() - ChronoDuration::days(30);
        // Four stale entries exhaust the 2 x cap budget before the fresh one.
        let mut entries: Vec<FeedEntry> =
            (0..4).map(|i| entry(&format!("Old{i}"), stale)).collect();
        entries.push(entry("Fresh", now()));
        assert!(select_recent(&src, entries, &options()).is_empty());
    }

    #[test]
    fn test_relative_links_resolve_against_base_url() {
        let src = source("Blog", 3);
        let articles = select_recent(&src, vec![entry("Hello", now())], &options());
        assert_eq!(articles[0].url, "https://blog.example/posts/hello");
        assert_eq!(articles[0].source_name, "Blog");
    }

    #[test]
    fn test_missing_title_and_link() {
        let src = source("Blog", 3);
        let untitled = FeedEntry {
            title: None,
            link: Some("https://blog.example/a".to_string()),
            published: Some(now()),
            updated: None,
        };
        let linkless = FeedEntry {
            title: Some("No link".to_string()),
            link: None,
            published: Some(now()),
            updated: None,
        };
        let articles = select_recent(&src, vec![untitled, linkless], &options());
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, UNTITLED);
    }

    #[test]
    fn test_parse_feed_rss() {
        let xml = rss(&[("First", "https://example.com/1", now())]);
        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("First"));
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/1"));
        assert_eq!(entries[0].published, Some(now()));
    }

    #[test]
    fn test_parse_feed_rejects_garbage() {
        assert!(parse_feed(b"<html><body>not a feed</body></html>").is_err());
    }

    #[tokio::test]
    async fn test_today_kept_ten_days_old_dropped() {
        let src = source("Blog", 5);
        let xml = rss(&[
            ("Today", "https://blog.example/today", now() - ChronoDuration::hours(1)),
            ("Stale", "https://blog.example/stale", now() - ChronoDuration::days(10)),
        ]);
        let fetcher = FakeFetcher::new().body(&src.rss_url, xml);

        let articles = collect_articles(&fetcher, &[&src], &options()).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Today");
        assert_eq!(articles[0].url, "https://blog.example/today");
    }

    #[tokio::test]
    async fn test_failing_source_does_not_stop_collection() {
        let broken = source("Broken", 5);
        let garbled = source("Garbled", 5);
        let good = source("Good", 5);
        let fetcher = FakeFetcher::new()
            .with(&broken.rss_url, Canned::Status(500))
            .body(&garbled.rss_url, "definitely not xml")
            .body(
                &good.rss_url,
                rss(&[("Fine", "https://good.example/fine", now())]),
            );

        let articles = collect_articles(&fetcher, &[&broken, &garbled, &good], &options()).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source_name, "Good");
        assert_eq!(fetcher.requested.borrow().len(), 3);
    }

    #[tokio::test]
    async fn test_articles_sorted_newest_first_with_stable_ties() {
        let a = source("Alpha", 5);
        let b = source("Beta", 5);
        let tie = now() - ChronoDuration::hours(3);
        let fetcher = FakeFetcher::new()
            .body(
                &a.rss_url,
                rss(&[
                    ("A-tie", "https://alpha.example/tie", tie),
                    ("A-old", "https://alpha.example/old", now() - ChronoDuration::hours(20)),
                ]),
            )
            .body(
                &b.rss_url,
                rss(&[
                    ("B-new", "https://beta.example/new", now() - ChronoDuration::minutes(5)),
                    ("B-tie", "https://beta.example/tie", tie),
                ]),
            );

        let articles = collect_articles(&fetcher, &[&a, &b], &options()).await;
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["B-new", "A-tie", "B-tie", "A-old"]);
        assert!(articles.windows(2).all(|w| w[0].published >= w[1].published));
    }

    #[tokio::test]
    async fn test_no_sources_collects_nothing() {
        let fetcher = FakeFetcher::new();
        let articles = collect_articles(&fetcher, &[], &options()).await;
        assert!(articles.is_empty());
        assert!(fetcher.requested.borrow().is_empty());
    }
}
