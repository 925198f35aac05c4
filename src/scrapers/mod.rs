//! Network-facing stages of the pipeline.
//!
//! Both stages follow the same pattern:
//!
//! 1. **Feeds** ([`feed`]): read each enabled source's RSS/Atom feed and keep
//!    the recent entries as article stubs
//! 2. **Articles** ([`article`]): download each stub's page and extract its
//!    main text
//!
//! # Common Patterns
//!
//! - Requests go through [`crate::fetch::Fetch`] one at a time, each with a
//!   fixed timeout
//! - A failure for one source or one article is logged and that item is
//!   skipped; it never aborts the stage

pub mod article;
pub mod feed;
