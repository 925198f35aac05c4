//! Utility functions for text shaping, log previews and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace normalization for extracted page text
//! - Character-safe truncation for prompts and log fields
//! - HTML escaping for the report
//! - JSON error detection for handling truncated LLM responses
//! - Output location validation before any network work starts

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, " ").trim().to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes appended. Cuts never split a multi-byte character.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Keep the first `max` characters of `s`, appending `marker` when anything
/// was dropped.
///
/// # Arguments
///
/// * `s` - The text to cut down
/// * `max` - Number of characters (not bytes) to keep
/// * `marker` - Suffix added after the kept prefix when `s` was longer
///
/// # Returns
///
/// The possibly shortened text, and `true` if anything was dropped.
pub fn truncate_chars(s: &str, max: usize, marker: &str) -> (String, bool) {
    match s.char_indices().nth(max) {
        None => (s.to_string(), false),
        Some((cut, _)) => (format!("{}{}", &s[..cut], marker), true),
    }
}

/// Escape text for inclusion in HTML element content or quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the LLM response is cut off (e.g., due to token limits), the
/// resulting JSON will fail to parse with an EOF error.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Ensure the directory that will hold `file` exists and is writable.
///
/// Creates the parent directory if needed, then writes and removes a probe
/// file next to the target.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %file.display()))]
pub fn ensure_writable_parent(file: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let probe_path = dir.join("..__probe_write__");
    fs::File::create(&probe_path)?;
    let _ = fs::remove_file(&probe_path);
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}
