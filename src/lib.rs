//! # newsdesk
//!
//! Client-side data layer for a news and blog aggregator: headlines,
//! category listings, search, videos and blog posts pulled from public JSON
//! APIs, normalized into one article shape, ranked by engagement, and kept
//! across restarts.
//!
//! ## Architecture
//!
//! ```text
//! FetchGateway → Normalizer → ContentStore → Store
//!                                   ↘ EngagementRanker
//! ```
//!
//! - [`fetcher`]: response cache, in-flight dedupe and retry around HTTP
//! - [`normalizer`]: provider records to [`Article`](domain::Article)
//! - [`content`]: collection guards, pagination and write-through state
//! - [`store`]: SQLite persistence of versioned JSON snapshots
//!
//! ## Quick Start
//!
//! ```bash
//! # Technology, general and video headlines
//! newsdesk headlines
//!
//! # Search, title matches only
//! newsdesk search "rust" --mode qInTitle
//!
//! # Blog posts by trend
//! newsdesk blogs --sort trendy
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// config, store, gateway, content store, saved items and ranker.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/newsdesk/config.toml`.
pub mod config;

/// Collections, search and lookups built on the gateway.
pub mod content;

/// Core domain models.
///
/// - [`Article`](domain::Article): canonical article shape
/// - [`SearchOptions`](domain::SearchOptions): search filters and page cap
pub mod domain;

/// HTTP access with caching, dedupe and retry.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for a single GET
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`FetchGateway`](fetcher::FetchGateway): the chokepoint every read goes through
pub mod fetcher;

/// Provider record normalization.
pub mod normalizer;

/// Engagement scores and sort orders.
pub mod ranking;

/// Bookmarked articles.
pub mod saved;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): key/value trait for JSON records
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
