//! Self-contained HTML report.
//!
//! [`render_report`] is a pure function: the same articles, executive summary
//! and generation time always produce the same bytes. All styling is inline so
//! the file can be opened or mailed on its own.

use crate::models::Article;
use crate::utils::escape_html;
use chrono::NaiveDateTime;
use itertools::Itertools;
use std::error::Error;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const STYLE: &str = r#"        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            max-width: 1200px;
            margin: 0 auto;
            padding: 20px;
            background-color: #f8f9fa;
        }
        .header {
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            color: white;
            padding: 30px;
            border-radius: 10px;
            margin-bottom: 30px;
            text-align: center;
        }
        .header h1 { margin: 0; font-size: 2.5em; font-weight: 700; }
        .header .subtitle { margin: 10px 0 0 0; font-size: 1.2em; opacity: 0.9; }
        .stats { display: flex; justify-content: center; gap: 20px; margin-top: 20px; }
        .stat { background: rgba(255,255,255,0.2); padding: 15px; border-radius: 8px; text-align: center; }
        .stat .number { font-size: 2em; font-weight: bold; display: block; }
        .stat .label { font-size: 0.9em; opacity: 0.9; }
        .executive-summary, .articles-section {
            background: white;
            padding: 25px;
            border-radius: 10px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
            margin-bottom: 30px;
        }
        .executive-summary h2, .articles-section h2 {
            color: #333;
            margin-top: 0;
            font-size: 1.8em;
            padding-bottom: 10px;
        }
        .executive-summary h2 { border-bottom: 3px solid #667eea; }
        .articles-section h2 { border-bottom: 3px solid #764ba2; }
        .article {
            border-left: 4px solid #667eea;
            padding: 20px;
            margin: 20px 0;
            background: #f8f9fa;
            border-radius: 0 8px 8px 0;
        }
        .article h3 { margin-top: 0; color: #333; font-size: 1.3em; }
        .article .meta { color: #666; font-size: 0.9em; margin-bottom: 15px; }
        .article .summary { font-size: 1em; line-height: 1.7; color: #444; }
        .article .link { margin-top: 15px; }
        .article .link a { color: #667eea; text-decoration: none; font-weight: 500; }
        .footer { text-align: center; color: #666; font-size: 0.9em; margin-top: 30px; }
"#;

/// Distinct source names in order of first appearance.
pub fn distinct_sources(articles: &[Article]) -> Vec<&str> {
    articles
        .iter()
        .map(|a| a.source_name.as_str())
        .unique()
        .collect()
}

/// Blank-line separated text as escaped `<p>` elements.
fn paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(p)))
        .join("\n        ")
}

/// Render the full HTML report.
pub fn render_report(
    articles: &[Article],
    executive_summary: &str,
    generated_at: NaiveDateTime,
) -> String {
    let report_date = generated_at.format("%Y-%m-%d");
    let report_time = generated_at.format("%H:%M:%S");
    let sources = distinct_sources(articles);

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AI News Summary - {report_date}</title>
    <style>
{STYLE}    </style>
</head>
<body>
    <div class="header">
        <h1>🤖 AI News Summary</h1>
        <div class="subtitle">Generated on {report_date} at {report_time}</div>
        <div class="stats">
            <div class="stat">
                <span class="number">{article_count}</span>
                <span class="label">Articles Analyzed</span>
            </div>
            <div class="stat">
                <span class="number">{source_count}</span>
                <span class="label">Sources</span>
            </div>
        </div>
    </div>

    <div class="executive-summary">
        <h2>📊 Executive Summary</h2>
        {summary}
    </div>

    <div class="articles-section">
        <h2>📰 Article Summaries</h2>
"#,
        article_count = articles.len(),
        source_count = sources.len(),
        summary = paragraphs(executive_summary),
    );

    for (i, article) in articles.iter().enumerate() {
        let _ = write!(
            html,
            r#"
        <div class="article">
            <h3>{index}. {title}</h3>
            <div class="meta">
                <strong>Source:</strong> {source} |
                <strong>Published:</strong> {published}
            </div>
            <div class="summary">{summary}</div>
            <div class="link">
                <a href="{url}" target="_blank" rel="noopener">Read full article →</a>
            </div>
        </div>
"#,
            index = i + 1,
            title = escape_html(&article.title),
            source = escape_html(&article.source_name),
            published = article.published_display(),
            summary = escape_html(&article.summary),
            url = escape_html(&article.url),
        );
    }

    let _ = write!(
        html,
        r#"    </div>

    <div class="footer">
        <p>Report generated by AI News Digest</p>
        <p>Sources processed: {}</p>
    </div>
</body>
</html>
"#,
        escape_html(&sources.join(", "))
    );

    html
}

/// Write the report, replacing any previous file at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_report(path: &Path, html: &str) -> Result<(), Box<dyn Error>> {
    fs::write(path, html).await?;
    info!(bytes = html.len(), "Wrote HTML report");
    Ok(())
}
