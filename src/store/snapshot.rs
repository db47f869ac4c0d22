//! Versioned JSON records and the write-through cell that keeps them durable.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app::Result;
use crate::domain::Article;
use crate::store::Store;

pub const NEWS_RECORD: &str = "news-store";
pub const BLOG_RECORD: &str = "blog-posts";
pub const SNAPSHOT_VERSION: u32 = 1;

/// Collections and saved items that survive restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSnapshot {
    pub technology_articles: Vec<Article>,
    pub general_articles: Vec<Article>,
    pub video_articles: Vec<Article>,
    /// Keyed by normalized category name
    pub category_articles: BTreeMap<String, Vec<Article>>,
    pub saved_items: Vec<Article>,
}

impl NewsSnapshot {
    /// Every article held by the snapshot, in lookup order.
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.technology_articles
            .iter()
            .chain(&self.general_articles)
            .chain(&self.video_articles)
            .chain(self.category_articles.values().flatten())
            .chain(&self.saved_items)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogSnapshot {
    pub posts: Vec<Article>,
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    state: T,
}

/// Read and decode a record. Missing, corrupt and wrong-version records all
/// yield `None`.
pub fn read_record<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Option<T> {
    let raw = match store.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "Failed to read persisted record");
            return None;
        }
    };

    match serde_json::from_str::<Envelope<T>>(&raw) {
        Ok(envelope) if envelope.version == SNAPSHOT_VERSION => Some(envelope.state),
        Ok(envelope) => {
            warn!(
                key,
                version = envelope.version,
                expected = SNAPSHOT_VERSION,
                "Discarding persisted record with unknown version"
            );
            None
        }
        Err(e) => {
            warn!(key, error = %e, "Discarding corrupt persisted record");
            None
        }
    }
}

pub fn write_record<T: Serialize>(store: &dyn Store, key: &str, state: &T) -> Result<()> {
    let json = serde_json::to_string(&Envelope {
        version: SNAPSHOT_VERSION,
        state,
    })?;
    store.save(key, &json)
}

/// In-memory state mirrored to a [`Store`] record after every change.
///
/// Persist failures are logged and swallowed: the in-memory copy stays
/// authoritative for the running process.
pub struct Persisted<T> {
    key: &'static str,
    state: Mutex<T>,
    store: Arc<dyn Store>,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    /// Rehydrate from `store`, starting empty if nothing usable is there.
    pub fn load(store: Arc<dyn Store>, key: &'static str) -> Self {
        let state = read_record(store.as_ref(), key).unwrap_or_default();
        debug!(key, "Rehydrated persisted state");
        Self {
            key,
            state: Mutex::new(state),
            store,
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshot(&self) -> T {
        self.lock().clone()
    }

    /// Apply `f`; when it reports a change the new state is written through.
    pub fn mutate(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let mut state = self.lock();
        let changed = f(&mut state);
        if changed {
            if let Err(e) = write_record(self.store.as_ref(), self.key, &*state) {
                warn!(key = self.key, error = %e, "Failed to persist state");
            }
        }
        changed
    }

    /// Whatever is currently in durable storage, ignoring the in-memory copy.
    pub fn durable(&self) -> Option<T> {
        read_record(self.store.as_ref(), self.key)
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}
