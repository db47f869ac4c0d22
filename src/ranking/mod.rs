//! Engagement-derived scores and listing sort orders.
//!
//! Scores depend on "now", so they are recomputed on every call and never
//! persisted.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::domain::Article;
use crate::fetcher::{Clock, SystemClock};

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;
/// Age assumed for articles whose date cannot be parsed.
const UNKNOWN_AGE_DAYS: f64 = 365.0;
const DECAY_DAYS: f64 = 30.0;

const COMMENT_WEIGHT: f64 = 2.0;
const VIEW_WEIGHT: f64 = 0.1;
const TOP_POPULAR_WEIGHT: f64 = 0.6;
const TOP_TRENDY_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    New,
    Trendy,
    Popular,
    Top,
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortMode::New => "new",
            SortMode::Trendy => "trendy",
            SortMode::Popular => "popular",
            SortMode::Top => "top",
        };
        f.write_str(name)
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(SortMode::New),
            "trendy" => Ok(SortMode::Trendy),
            "popular" => Ok(SortMode::Popular),
            "top" => Ok(SortMode::Top),
            other => Err(format!(
                "Invalid sort mode: {}. Use new, trendy, popular or top",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngagementMetrics {
    pub published_at: Option<DateTime<Utc>>,
    pub likes: f64,
    pub comments: f64,
    pub views: f64,
    pub engagement: f64,
    pub age_hours: f64,
    pub age_days: f64,
    pub trendy_score: f64,
    pub popular_score: f64,
    pub top_score: f64,
    /// Scores relative to the best in the scored batch (floor of 1)
    pub popular_norm: f64,
    pub trendy_norm: f64,
    pub top_norm: f64,
}

impl EngagementMetrics {
    pub fn compute(article: &Article, now: DateTime<Utc>) -> Self {
        let published_at = article.published_at.as_deref().and_then(parse_timestamp);
        let age_ms = published_at.map(|at| (now - at).num_milliseconds().max(0) as f64);

        let likes = non_negative(article.stats.likes);
        let comments = non_negative(article.stats.comments);
        let views = non_negative(article.stats.views);
        let engagement = likes + comments * COMMENT_WEIGHT + views * VIEW_WEIGHT;

        let age_hours = age_ms.map(|ms| (ms / MS_PER_HOUR).max(1.0)).unwrap_or(1.0);
        let trendy_score = engagement / age_hours.sqrt();
        let popular_score = engagement;

        let age_days = age_ms.map(|ms| ms / MS_PER_DAY).unwrap_or(UNKNOWN_AGE_DAYS);
        let decay = (-age_days / DECAY_DAYS).exp();
        let top_score = (popular_score * TOP_POPULAR_WEIGHT + trendy_score * TOP_TRENDY_WEIGHT)
            * (0.5 + 0.5 * decay);

        Self {
            published_at,
            likes,
            comments,
            views,
            engagement,
            age_hours,
            age_days,
            trendy_score,
            popular_score,
            top_score,
            popular_norm: 0.0,
            trendy_norm: 0.0,
            top_norm: 0.0,
        }
    }

    fn sort_key(&self, mode: SortMode) -> f64 {
        match mode {
            SortMode::New => self
                .published_at
                .map(|at| at.timestamp_millis() as f64)
                .unwrap_or(0.0),
            SortMode::Trendy => self.trendy_score,
            SortMode::Popular => self.popular_score,
            SortMode::Top => self.top_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredArticle {
    pub article: Article,
    pub metrics: EngagementMetrics,
}

pub struct EngagementRanker {
    clock: Arc<dyn Clock>,
}

impl Default for EngagementRanker {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl EngagementRanker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn score(&self, articles: &[Article]) -> Vec<ScoredArticle> {
        score_at(articles, self.clock.now())
    }

    pub fn sort_by(&self, articles: &[Article], mode: SortMode) -> Vec<Article> {
        self.rank(articles, mode)
            .into_iter()
            .map(|scored| scored.article)
            .collect()
    }

    /// Scored and sorted, for callers that display the metrics.
    pub fn rank(&self, articles: &[Article], mode: SortMode) -> Vec<ScoredArticle> {
        let mut scored = self.score(articles);
        sort_scored(&mut scored, mode);
        scored
    }
}

pub fn score_at(articles: &[Article], now: DateTime<Utc>) -> Vec<ScoredArticle> {
    let mut scored: Vec<ScoredArticle> = articles
        .iter()
        .map(|article| ScoredArticle {
            metrics: EngagementMetrics::compute(article, now),
            article: article.clone(),
        })
        .collect();

    let max_of = |key: fn(&EngagementMetrics) -> f64| {
        scored
            .iter()
            .map(|s| key(&s.metrics))
            .fold(1.0_f64, f64::max)
    };
    let max_popular = max_of(|m| m.popular_score);
    let max_trendy = max_of(|m| m.trendy_score);
    let max_top = max_of(|m| m.top_score);

    for s in &mut scored {
        s.metrics.popular_norm = s.metrics.popular_score / max_popular;
        s.metrics.trendy_norm = s.metrics.trendy_score / max_trendy;
        s.metrics.top_norm = s.metrics.top_score / max_top;
    }

    scored
}

/// Descending by the mode's key. `sort_by` is stable, so ties keep their
/// input order.
pub fn sort_scored(scored: &mut [ScoredArticle], mode: SortMode) {
    scored.sort_by(|a, b| descending(a.metrics.sort_key(mode), b.metrics.sort_key(mode)));
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn non_negative(n: f64) -> f64 {
    if n.is_finite() && n > 0.0 {
        n
    } else {
        0.0
    }
}

/// Parse the date formats providers emit. `None` when unparseable.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
