//! Collection-level orchestration over the fetch gateway.
//!
//! Each `fetch_*` method serves its collection from memory when it already
//! holds articles, otherwise fetches, normalizes, filters image-less
//! entries, caps, stores and returns. Fetch failures never escape: they are
//! logged, recorded for [`ContentStore::last_error`], and the call resolves
//! to an empty list.

pub mod endpoints;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::app::Result;
use crate::config::Config;
use crate::domain::{normalize_key, Article, SearchOptions, Source};
use crate::fetcher::{FetchError, FetchGateway};
use crate::normalizer::Normalizer;
use crate::saved::SavedItemsRegistry;
use crate::store::{BlogSnapshot, NewsSnapshot, Persisted, Store, BLOG_RECORD, NEWS_RECORD};

pub use endpoints::Endpoints;

/// Articles kept for the technology, general and video collections.
pub const FEED_CAP: usize = 4;
/// Articles kept per category.
pub const CATEGORY_CAP: usize = 12;

/// A collection that [`ContentStore::invalidate`] can clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collection {
    Technology,
    General,
    Video,
    /// One category, by (un-normalized) name
    Category(String),
    AllCategories,
    Search,
    Blog,
}

#[derive(Default)]
struct SearchState {
    by_key: HashMap<String, Vec<Article>>,
    latest: Vec<Article>,
}

pub struct ContentStore {
    gateway: FetchGateway,
    normalizer: Normalizer,
    endpoints: Endpoints,
    search_page_delay: Duration,
    news: Arc<Persisted<NewsSnapshot>>,
    blog: Persisted<BlogSnapshot>,
    searches: Mutex<SearchState>,
    last_error: Mutex<Option<String>>,
    loading: AtomicUsize,
}

impl ContentStore {
    /// Rehydrates persisted collections from `store`.
    pub fn new(gateway: FetchGateway, config: &Config, store: Arc<dyn Store>) -> Result<Self> {
        let endpoints = Endpoints::from_config(config)?;
        Ok(Self {
            gateway,
            normalizer: Normalizer::new(),
            endpoints,
            search_page_delay: config.cache.search_page_delay(),
            news: Arc::new(Persisted::load(store.clone(), NEWS_RECORD)),
            blog: Persisted::load(store, BLOG_RECORD),
            searches: Mutex::new(SearchState::default()),
            last_error: Mutex::new(None),
            loading: AtomicUsize::new(0),
        })
    }

    /// Saved items share the news record, so the registry is handed out from here.
    pub fn saved(&self) -> SavedItemsRegistry {
        SavedItemsRegistry::new(self.news.clone())
    }

    pub async fn fetch_technology(&self) -> Vec<Article> {
        if let Some(cached) = self.news.read(|s| non_empty(&s.technology_articles)) {
            debug!("Technology articles served from memory");
            return cached;
        }

        let _loading = self.begin();
        let url = self.endpoints.technology();
        match self.load_listing(&url, "results", Source::News).await {
            Ok(mut articles) => {
                articles.truncate(FEED_CAP);
                info!("Fetched {} technology articles", articles.len());
                self.news.mutate(|s| {
                    s.technology_articles = articles.clone();
                    true
                });
                articles
            }
            Err(e) => self.fail("Error fetching technology news", e),
        }
    }

    pub async fn fetch_general(&self) -> Vec<Article> {
        if let Some(cached) = self.news.read(|s| non_empty(&s.general_articles)) {
            debug!("General articles served from memory");
            return cached;
        }

        let _loading = self.begin();
        let url = self.endpoints.general();
        match self.load_listing(&url, "results", Source::News).await {
            Ok(mut articles) => {
                articles.truncate(FEED_CAP);
                info!("Fetched {} general articles", articles.len());
                self.news.mutate(|s| {
                    s.general_articles = articles.clone();
                    true
                });
                articles
            }
            Err(e) => self.fail("Error fetching general news", e),
        }
    }

    pub async fn fetch_videos(&self) -> Vec<Article> {
        if let Some(cached) = self.news.read(|s| non_empty(&s.video_articles)) {
            debug!("Videos served from memory");
            return cached;
        }

        let _loading = self.begin();
        match self.video_pages().await {
            Ok(mut videos) => {
                videos.truncate(FEED_CAP);
                info!("Fetched {} videos", videos.len());
                self.news.mutate(|s| {
                    s.video_articles = videos.clone();
                    true
                });
                videos
            }
            Err(e) => self.fail("Error fetching videos", e),
        }
    }

    /// Category names are trimmed and lowercased before use; a blank name
    /// yields an empty list without fetching.
    pub async fn fetch_by_category(&self, category: &str) -> Vec<Article> {
        let key = normalize_key(category);
        if key.is_empty() {
            return Vec::new();
        }

        if let Some(cached) = self
            .news
            .read(|s| s.category_articles.get(&key).and_then(|a| non_empty(a)))
        {
            debug!(category = %key, "Category served from memory");
            return cached;
        }

        let _loading = self.begin();
        let url = self.endpoints.news_category(&key);
        match self.load_listing(&url, "results", Source::News).await {
            Ok(mut articles) => {
                articles.truncate(CATEGORY_CAP);
                info!(category = %key, "Fetched {} category articles", articles.len());
                self.news.mutate(|s| {
                    s.category_articles.insert(key.clone(), articles.clone());
                    true
                });
                articles
            }
            Err(e) => self.fail(&format!("Error fetching {} news", key), e),
        }
    }

    /// Multi-page news search. Results are deduped by identity key across
    /// pages; entries without one are dropped. A blank query yields an empty
    /// list without fetching.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Vec<Article> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let key = options.cache_key(query);
        {
            let mut searches = self.lock_searches();
            if let Some(hit) = searches.by_key.get(&key).and_then(|a| non_empty(a)) {
                debug!(key = %key, "Search served from memory");
                searches.latest = hit.clone();
                return hit;
            }
        }

        let _loading = self.begin();
        match self.search_pages(query, options).await {
            Ok(results) => {
                info!(query, "Search returned {} articles", results.len());
                let mut searches = self.lock_searches();
                if !results.is_empty() {
                    searches.by_key.insert(key, results.clone());
                }
                searches.latest = results.clone();
                results
            }
            Err(e) => self.fail("Error searching news", e),
        }
    }

    /// `count` falls back to the configured default. The provider may send
    /// more posts than asked for; the list is cut to the requested count.
    pub async fn fetch_blog_posts(&self, count: Option<u32>) -> Vec<Article> {
        if let Some(cached) = self.blog.read(|s| non_empty(&s.posts)) {
            debug!("Blog posts served from memory");
            return cached;
        }

        let _loading = self.begin();
        let limit = self.endpoints.blog_count(count) as usize;
        let url = self.endpoints.blog_posts(count);
        match self.load_listing(&url, "posts", Source::Blog).await {
            Ok(mut posts) => {
                posts.truncate(limit);
                info!("Fetched {} blog posts", posts.len());
                self.blog.mutate(|s| {
                    s.posts = posts.clone();
                    true
                });
                posts
            }
            Err(e) => self.fail("Error fetching blog posts", e),
        }
    }

    /// Populate technology, general and video collections concurrently.
    /// Each collection fails independently.
    pub async fn fetch_all_if_needed(&self) {
        tokio::join!(
            self.fetch_technology(),
            self.fetch_general(),
            self.fetch_videos()
        );
    }

    /// Look an article up by identity key across every in-memory collection,
    /// then in the durable snapshots. Never fetches.
    pub fn fetch_article_by_id(&self, id: &str) -> Option<Article> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        let matches = |a: &&Article| a.identity_key() == Some(id);

        if let Some(found) = self.news.read(|s| s.articles().find(matches).cloned()) {
            return Some(found);
        }
        if let Some(found) = self.blog.read(|s| s.posts.iter().find(matches).cloned()) {
            return Some(found);
        }
        {
            let searches = self.lock_searches();
            let found = searches
                .latest
                .iter()
                .chain(searches.by_key.values().flatten())
                .find(matches)
                .cloned();
            if found.is_some() {
                return found;
            }
        }

        debug!(id, "Article not in memory, checking durable snapshot");
        if let Some(found) = self
            .news
            .durable()
            .and_then(|s| s.articles().find(matches).cloned())
        {
            return Some(found);
        }
        self.blog
            .durable()
            .and_then(|s| s.posts.into_iter().find(|a| a.identity_key() == Some(id)))
    }

    /// Drop a collection so the next fetch goes back to the network (subject
    /// to the gateway's response cache).
    pub fn invalidate(&self, collection: Collection) {
        debug!(?collection, "Invalidating collection");
        match collection {
            Collection::Technology => {
                self.news.mutate(|s| clear(&mut s.technology_articles));
            }
            Collection::General => {
                self.news.mutate(|s| clear(&mut s.general_articles));
            }
            Collection::Video => {
                self.news.mutate(|s| clear(&mut s.video_articles));
            }
            Collection::Category(name) => {
                let key = normalize_key(&name);
                self.news
                    .mutate(|s| s.category_articles.remove(&key).is_some());
            }
            Collection::AllCategories => {
                self.news.mutate(|s| {
                    let had_any = !s.category_articles.is_empty();
                    s.category_articles.clear();
                    had_any
                });
            }
            Collection::Search => {
                let mut searches = self.lock_searches();
                searches.by_key.clear();
                searches.latest.clear();
            }
            Collection::Blog => {
                self.blog.mutate(|s| clear(&mut s.posts));
            }
        }
    }

    pub fn technology_articles(&self) -> Vec<Article> {
        self.news.read(|s| s.technology_articles.clone())
    }

    pub fn general_articles(&self) -> Vec<Article> {
        self.news.read(|s| s.general_articles.clone())
    }

    pub fn video_articles(&self) -> Vec<Article> {
        self.news.read(|s| s.video_articles.clone())
    }

    pub fn category_articles(&self, category: &str) -> Vec<Article> {
        let key = normalize_key(category);
        self.news
            .read(|s| s.category_articles.get(&key).cloned().unwrap_or_default())
    }

    /// Results of the most recent search.
    pub fn search_results(&self) -> Vec<Article> {
        self.lock_searches().latest.clone()
    }

    pub fn blog_posts(&self) -> Vec<Article> {
        self.blog.read(|s| s.posts.clone())
    }

    /// Message from the most recent failed fetch. Cleared when a fetch starts.
    pub fn last_error(&self) -> Option<String> {
        self.lock_error().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    async fn load_listing(
        &self,
        url: &str,
        field: &str,
        source: Source,
    ) -> std::result::Result<Vec<Article>, FetchError> {
        let body = self.gateway.request(url).await?;
        let records = records_in(&body, field)?;
        Ok(self.normalizer.listing(records, source))
    }

    async fn video_pages(&self) -> std::result::Result<Vec<Article>, FetchError> {
        let settings = self.endpoints.video_settings();
        let clock = self.gateway.clock();
        let mut videos = Vec::new();
        let max_pages = settings.max_pages.max(1);
        let mut page_token: Option<String> = None;

        for page in 1..=max_pages {
            let url = self.endpoints.videos(page_token.as_deref());
            let body = self.gateway.request(&url).await?;
            videos.extend(
                self.normalizer
                    .listing(records_in(&body, "items")?, Source::Video),
            );

            page_token = body
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(String::from);

            if videos.len() >= FEED_CAP || page_token.is_none() || page == max_pages {
                break;
            }
            debug!(page, collected = videos.len(), "Fetching next video page");
            clock.sleep(settings.page_delay()).await;
        }

        Ok(videos)
    }

    async fn search_pages(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> std::result::Result<Vec<Article>, FetchError> {
        let clock = self.gateway.clock();
        let limit = options.page_limit();
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 1..=limit {
            let url = self.endpoints.news_search(query, options, cursor.as_deref());
            let body = self.gateway.request(&url).await?;

            for article in self
                .normalizer
                .listing(records_in(&body, "results")?, Source::News)
            {
                let Some(key) = article.identity_key() else {
                    continue;
                };
                if seen.insert(key.to_string()) {
                    results.push(article);
                }
            }

            cursor = next_page_cursor(&body);
            if cursor.is_none() || page == limit {
                break;
            }
            debug!(page, "Fetching next search page");
            clock.sleep(self.search_page_delay).await;
        }

        Ok(results)
    }

    fn begin(&self) -> LoadingGuard<'_> {
        *self.lock_error() = None;
        self.loading.fetch_add(1, Ordering::SeqCst);
        LoadingGuard(&self.loading)
    }

    fn fail(&self, context: &str, error: FetchError) -> Vec<Article> {
        warn!(error = %error, "{}", context);
        *self.lock_error() = Some(format!("{}: {}", context, error));
        Vec::new()
    }

    fn lock_searches(&self) -> MutexGuard<'_, SearchState> {
        self.searches.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn lock_error(&self) -> MutexGuard<'_, Option<String>> {
        self.last_error.lock().unwrap_or_else(|p| p.into_inner())
    }
}

struct LoadingGuard<'a>(&'a AtomicUsize);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn records_in<'a>(body: &'a Value, field: &str) -> std::result::Result<&'a [Value], FetchError> {
    body.get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| FetchError::Malformed(format!("response has no `{}` array", field)))
}

/// The news provider sends its cursor as a string, occasionally a number.
fn next_page_cursor(body: &Value) -> Option<String> {
    match body.get("nextPage")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(articles: &[Article]) -> Option<Vec<Article>> {
    (!articles.is_empty()).then(|| articles.to_vec())
}

fn clear(articles: &mut Vec<Article>) -> bool {
    let had_any = !articles.is_empty();
    articles.clear();
    had_any
}
