//! Output generation.
//!
//! # Submodules
//!
//! - [`html`]: Renders the digest as a single self-contained HTML file
//!
//! # Output Structure
//!
//! ```text
//! ./ai_news_summary.html   # overwritten on every run
//! ```

pub mod html;
