//! Article page retrieval and main-text extraction.
//!
//! Each article URL is fetched once and its main body text is pulled out of
//! the HTML with a fixed order of heuristics, stopping at the first one that
//! yields text:
//!
//! 1. Non-content elements (`script`, `style`, `nav`, `header`, `footer`,
//!    `aside`, `iframe`) are removed from the document first.
//! 2. The first element matching [`CONTENT_SELECTORS`] (in order) is used.
//! 3. Otherwise, every `<p>` whose trimmed text is longer than
//!    [`MIN_PARAGRAPH_CHARS`] is concatenated.
//! 4. Otherwise, the whole `<body>` text is used.
//!
//! Whitespace is then collapsed. Articles whose text ends up shorter than
//! the usable-content threshold are dropped by [`fetch_all_content`].

use crate::fetch::Fetch;
use crate::models::Article;
use crate::utils::{collapse_whitespace, truncate_for_log};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Content-container selectors, most specific first.
pub const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "[role=\"main\"]",
    ".post-content",
    ".article-content",
    ".entry-content",
    ".content",
    ".post-body",
    ".article-body",
    "main",
    ".main-content",
];

/// Paragraphs at or under this many characters are treated as boilerplate.
pub const MIN_PARAGRAPH_CHARS: usize = 50;

static NON_CONTENT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script, style, nav, header, footer, aside, iframe")
        .expect("static selector")
});

static CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("static selector"))
        .collect()
});

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("static selector"));

/// Text nodes under `element`, each trimmed, joined by single spaces.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Detach every non-content element from the tree.
fn strip_non_content(document: &mut Html) {
    let ids: Vec<_> = document.select(&NON_CONTENT).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Extract the main text of an HTML page.
///
/// Returns an empty string when no strategy finds any text.
pub fn extract_text(html: &str) -> String {
    let mut document = Html::parse_document(html);
    strip_non_content(&mut document);
    // `Html::select` still sees detached nodes; walk the attached tree only.
    let root = document.root_element();

    let from_container = CONTAINERS
        .iter()
        .find_map(|selector| root.select(selector).next())
        .map(visible_text)
        .unwrap_or_default();

    let text = if !from_container.is_empty() {
        from_container
    } else {
        let paragraphs = root
            .select(&PARAGRAPH)
            .map(visible_text)
            .filter(|t| t.chars().count() > MIN_PARAGRAPH_CHARS)
            .collect::<Vec<_>>()
            .join(" ");

        if !paragraphs.is_empty() {
            paragraphs
        } else {
            root.select(&BODY)
                .next()
                .map(visible_text)
                .unwrap_or_default()
        }
    };

    collapse_whitespace(&text)
}

/// Whether extracted text is long enough to summarize.
pub fn has_usable_content(text: &str, min_chars: usize) -> bool {
    text.chars().count() >= min_chars
}

/// Fetch one article page and extract its text.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_article_text<F: Fetch>(
    fetcher: &F,
    url: &str,
    timeout: Duration,
) -> Result<String, Box<dyn Error>> {
    let body = fetcher.get(url, timeout).await?;
    let html = String::from_utf8_lossy(&body);
    Ok(extract_text(&html))
}

/// Pacing and filtering parameters for [`fetch_all_content`].
#[derive(Debug, Clone, Copy)]
pub struct ContentOptions {
    /// Timeout for each article request.
    pub timeout: Duration,
    /// Pause between consecutive article requests.
    pub delay: Duration,
    /// Articles with fewer extracted characters are dropped.
    pub min_chars: usize,
}

/// Fill in `full_text` for every article, one at a time, then drop the
/// articles without usable content.
///
/// A failed fetch leaves the article's text empty. The pause between
/// requests is taken whether or not the previous request succeeded.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn fetch_all_content<F: Fetch>(
    fetcher: &F,
    articles: Vec<Article>,
    options: &ContentOptions,
) -> Vec<Article> {
    let total = articles.len();
    let ContentOptions {
        timeout,
        delay,
        min_chars,
    } = *options;

    let fetched: Vec<Article> = stream::iter(articles.into_iter().enumerate())
        .then(|(i, mut article)| async move {
            info!(
                index = i + 1,
                total,
                title = %truncate_for_log(&article.title, 60),
                "Fetching article content"
            );

            article.full_text = match fetch_article_text(fetcher, &article.url, timeout).await {
                Ok(text) => {
                    let chars = text.chars().count();
                    if has_usable_content(&text, min_chars) {
                        info!(chars, "Extracted article text");
                    } else {
                        warn!(chars, url = %article.url, "Article content seems too short");
                    }
                    text
                }
                Err(e) => {
                    warn!(url = %article.url, error = %e, "Error fetching article content");
                    String::new()
                }
            };

            if i + 1 < total {
                sleep(delay).await;
            }
            article
        })
        .collect()
        .await;

    let with_content: Vec<Article> = fetched
        .into_iter()
        .filter(|a| has_usable_content(&a.full_text, min_chars))
        .collect();

    info!(
        retrieved = with_content.len(),
        total, "Retrieved article content"
    );
    with_content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{Canned, FakeFetcher};
    use chrono::{TimeZone, Utc};

    const LONG: &str = "This paragraph is comfortably longer than fifty characters of text.";

    fn options() -> ContentOptions {
        ContentOptions {
            timeout: Duration::from_secs(15),
            delay: Duration::ZERO,
            min_chars: 100,
        }
    }

    fn article(url: &str) -> Article {
        let published = Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap();
        Article::stub(format!("Title for {url}"), url, published, "Source")
    }

    #[test]
    fn test_article_tag_beats_paragraphs() {
        let html = format!(
            "<html><body><p>{LONG}</p><article>Inside the article element</article></body></html>"
        );
        assert_eq!(extract_text(&html), "Inside the article element");
    }

    #[test]
    fn test_selector_order_is_respected() {
        let html = r#"<html><body>
            <div class="entry-content">entry content</div>
            <div role="main">role main</div>
        </body></html>"#;
        assert_eq!(extract_text(html), "role main");
    }

    #[test]
    fn test_paragraph_fallback_skips_short_paragraphs() {
        let html = format!("<html><body><div><p>Too short.</p><p>{LONG}</p><p>  {LONG}  </p></div></body></html>");
        assert_eq!(extract_text(&html), format!("{LONG} {LONG}"));
    }

    #[test]
    fn test_body_fallback() {
        let html = "<html><body><div>Just   some\n\n loose <span>text</span></div></body></html>";
        assert_eq!(extract_text(html), "Just some loose text");
    }

    #[test]
    fn test_non_content_elements_are_removed() {
        let html = r#"<html><head><style>body { color: red; }</style></head><body>
            <header>Site header</header>
            <nav>Home | About</nav>
            <article>
                <script>var tracking = true;</script>
                Real story text.
                <aside>Related links</aside>
            </article>
            <footer>Copyright</footer>
        </body></html>"#;
        assert_eq!(extract_text(html), "Real story text.");
    }

    #[test]
    fn test_article_inside_stripped_element_is_not_used() {
        let html = format!(
            "<html><body><aside><article>sidebar teaser</article></aside><p>{LONG}</p></body></html>"
        );
        assert_eq!(extract_text(&html), LONG);
    }

    #[test]
    fn test_paragraph_inside_footer_is_not_used() {
        let html = format!(
            "<html><body><footer><p>FOOTER {LONG}</p></footer><div><p>{LONG}</p></div></body></html>"
        );
        assert_eq!(extract_text(&html), LONG);
    }

    #[test]
    fn test_body_fallback_ignores_stripped_elements() {
        let html = "<html><body><nav>Home | About</nav><div>Loose story text</div></body></html>";
        assert_eq!(extract_text(html), "Loose story text");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(extract_text(""), "");
        assert_eq!(extract_text("<html><body><script>x()</script></body></html>"), "");
    }

    #[test]
    fn test_has_usable_content_threshold() {
        assert!(!has_usable_content(&"x".repeat(99), 100));
        assert!(has_usable_content(&"x".repeat(100), 100));
        assert!(!has_usable_content("", 100));
    }

    #[tokio::test]
    async fn test_timeout_and_short_pages_are_dropped() {
        let long_page = format!("<html><body><article>{}</article></body></html>", LONG.repeat(3));
        let fetcher = FakeFetcher::new()
            .body("https://a.example/ok", long_page)
            .with("https://a.example/slow", Canned::Timeout)
            .body("https://a.example/short", "<html><body><article>tiny</article></body></html>");

        let articles = vec![
            article("https://a.example/slow"),
            article("https://a.example/ok"),
            article("https://a.example/short"),
        ];
        let kept = fetch_all_content(&fetcher, articles, &options()).await;

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://a.example/ok");
        assert!(kept[0].full_text.chars().count() >= 100);
        assert_eq!(fetcher.requested.borrow().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_fetches_even_after_failure() {
        let page = format!("<html><body><article>{}</article></body></html>", LONG.repeat(2));
        let fetcher = FakeFetcher::new()
            .body("https://a.example/1", page.clone())
            .with("https://a.example/2", Canned::Timeout)
            .body("https://a.example/3", page);
        let options = ContentOptions {
            delay: Duration::from_secs(1),
            ..options()
        };

        let start = tokio::time::Instant::now();
        let kept = fetch_all_content(
            &fetcher,
            vec![
                article("https://a.example/1"),
                article("https://a.example/2"),
                article("https://a.example/3"),
            ],
            &options,
        )
        .await;

        // Two gaps between three requests, none after the last.
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(kept.len(), 2);
        assert_eq!(fetcher.requested.borrow().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_preserves_order() {
        let page = format!("<html><body><article>{}</article></body></html>", LONG.repeat(2));
        let fetcher = FakeFetcher::new()
            .body("https://a.example/1", page.clone())
            .body("https://a.example/2", page);
        let kept = fetch_all_content(
            &fetcher,
            vec![article("https://a.example/1"), article("https://a.example/2")],
            &options(),
        )
        .await;
        let urls: Vec<&str> = kept.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example/1", "https://a.example/2"]);
    }
}
