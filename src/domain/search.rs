use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SEARCH_PAGES: u32 = 3;
pub const MAX_SEARCH_PAGES: u32 = 10;

/// Which query parameter the search text is sent as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchMode {
    /// Full text (`q`)
    #[default]
    Q,
    /// Title only (`qInTitle`)
    InTitle,
    /// Title, URL, keywords and meta (`qInMeta`)
    InMeta,
}

impl SearchMode {
    pub fn param(&self) -> &'static str {
        match self {
            SearchMode::Q => "q",
            SearchMode::InTitle => "qInTitle",
            SearchMode::InMeta => "qInMeta",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "q" => Ok(SearchMode::Q),
            "qintitle" | "title" => Ok(SearchMode::InTitle),
            "qinmeta" | "meta" => Ok(SearchMode::InMeta),
            other => Err(format!("Invalid search mode: {}. Use q, qInTitle or qInMeta", other)),
        }
    }
}

/// Optional filters for a news search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchOptions {
    pub mode: SearchMode,
    pub language: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    /// Comma-separated list of domains (provider accepts at most 5)
    pub domains: Option<String>,
    /// `YYYY-MM-DD` or ISO 8601
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub max_pages: Option<u32>,
}

impl SearchOptions {
    /// Page cap clamped to `[1, MAX_SEARCH_PAGES]`.
    pub fn page_limit(&self) -> u32 {
        self.max_pages
            .unwrap_or(DEFAULT_SEARCH_PAGES)
            .clamp(1, MAX_SEARCH_PAGES)
    }

    /// Stable cache key for `query` under these options. Text is trimmed and
    /// lowercased so equivalent searches share one entry.
    pub fn cache_key(&self, query: &str) -> String {
        let norm = |v: &Option<String>| v.as_deref().map(normalize_key).unwrap_or_default();
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}",
            normalize_key(query),
            self.mode,
            norm(&self.language),
            norm(&self.country),
            norm(&self.category),
            norm(&self.domains),
            norm(&self.from_date),
            norm(&self.to_date),
            self.page_limit()
        )
    }
}

/// Trim and lowercase text used as a collection or cache key.
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}
