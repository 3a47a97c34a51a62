//! # trendfeed
//!
//! Turns trending repository listings into RSS feeds, with each item
//! carrying the repository's README.
//!
//! ## Architecture
//!
//! ```text
//! Cache ─hit──────────────┐
//!   └miss→ Trending fetch ┴→ README enrichment → Render → Write
//! ```
//!
//! - [`cache`]: on-disk listing cache with age-based expiry
//! - [`trending`]: listing page retrieval and markup extraction
//! - [`readme`]: README fetching with branch fallback, retry and backoff
//! - [`render`]: RSS 2.0 serialization
//! - [`pipeline`]: drives sources through the steps above
//!
//! ## Quick Start
//!
//! ```bash
//! # Daily trending Rust repositories
//! trendfeed --language rust --since daily --output feeds/rust.xml
//!
//! # Every source in a configuration file
//! trendfeed --config feeds.toml
//! ```

/// Application context and error types.
pub mod app;

/// Listing cache keyed by language, time range and source URL.
pub mod cache;

/// Command-line interface using clap.
pub mod cli;

/// Configuration file loading and settings merging.
///
/// Precedence, lowest first: built-in defaults, `[global]`, the source entry,
/// command-line flags.
pub mod config;

/// Core domain models.
///
/// - [`TrendingRecord`](domain::TrendingRecord): one scraped repository
/// - [`SourceSpec`](domain::SourceSpec): one feed to produce
pub mod domain;

/// HTTP transport.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for GET requests
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Source orchestration with per-source failure isolation.
pub mod pipeline;

/// README enrichment with bounded concurrency.
pub mod readme;

/// RSS feed rendering.
pub mod render;

/// Trending listing fetch and parse.
pub mod trending;

#[cfg(test)]
mod test_support;
