pub mod memory;
pub mod snapshot;
pub mod sqlite;

use crate::app::Result;

pub use memory::MemoryStore;
pub use snapshot::{
    BlogSnapshot, NewsSnapshot, Persisted, BLOG_RECORD, NEWS_RECORD, SNAPSHOT_VERSION,
};
pub use sqlite::SqliteStore;

/// Durable key/value storage for JSON records.
pub trait Store: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}
