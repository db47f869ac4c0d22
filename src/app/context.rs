use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{NewsdeskError, Result};
use crate::config::Config;
use crate::content::ContentStore;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::{FetchGateway, Fetcher, RetryPolicy, SystemClock};
use crate::ranking::EngagementRanker;
use crate::saved::SavedItemsRegistry;
use crate::store::{SqliteStore, Store};

pub struct AppContext {
    pub config: Config,
    pub content: ContentStore,
    pub saved: SavedItemsRegistry,
    pub ranker: EngagementRanker,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        Self::with_config(Config::load()?, db_path)
    }

    pub fn with_config(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store: Arc<dyn Store> = Arc::new(SqliteStore::new(&db_path)?);
        Self::assemble(config, store)
    }

    /// Nothing written by this context outlives the process.
    pub fn in_memory(config: Config) -> Result<Self> {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory()?);
        Self::assemble(config, store)
    }

    fn assemble(config: Config, store: Arc<dyn Store>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new()?);
        let clock = Arc::new(SystemClock);
        let gateway = FetchGateway::with_settings(
            fetcher,
            clock.clone(),
            RetryPolicy::default(),
            config.cache.ttl(),
        );
        let content = ContentStore::new(gateway, &config, store)?;
        let saved = content.saved();

        Ok(Self {
            config,
            content,
            saved,
            ranker: EngagementRanker::new(clock),
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| NewsdeskError::Other("Could not find data directory".into()))?;
        let newsdesk_dir = data_dir.join("newsdesk");
        std::fs::create_dir_all(&newsdesk_dir)?;
        Ok(newsdesk_dir.join("newsdesk.db"))
    }
}
