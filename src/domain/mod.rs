pub mod article;
pub mod search;

pub use article::{Article, EngagementCounts, Source, UNTITLED};
pub use search::{normalize_key, SearchMode, SearchOptions};
