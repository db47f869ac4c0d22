use std::sync::Arc;

use tracing::info;

use crate::domain::Article;
use crate::store::{NewsSnapshot, Persisted};

/// User bookmarks, unique by identity key (id, else link) and kept in
/// insertion order. Backed by the same durable record as the news
/// collections.
#[derive(Clone)]
pub struct SavedItemsRegistry {
    state: Arc<Persisted<NewsSnapshot>>,
}

impl SavedItemsRegistry {
    pub fn new(state: Arc<Persisted<NewsSnapshot>>) -> Self {
        Self { state }
    }

    /// Returns false when the article has no identity key or is already saved.
    pub fn add(&self, article: &Article) -> bool {
        let Some(key) = article.identity_key() else {
            return false;
        };

        let added = self.state.mutate(|s| {
            if contains(&s.saved_items, key) {
                return false;
            }
            s.saved_items.push(article.clone());
            true
        });
        if added {
            info!(key, "Saved article");
        }
        added
    }

    /// Returns whether anything was removed.
    pub fn remove(&self, id_or_link: &str) -> bool {
        let removed = self.state.mutate(|s| {
            let before = s.saved_items.len();
            s.saved_items
                .retain(|a| a.identity_key() != Some(id_or_link));
            s.saved_items.len() != before
        });
        if removed {
            info!(key = id_or_link, "Removed saved article");
        }
        removed
    }

    pub fn is_saved(&self, id_or_link: &str) -> bool {
        self.state.read(|s| contains(&s.saved_items, id_or_link))
    }

    pub fn list(&self) -> Vec<Article> {
        self.state.read(|s| s.saved_items.clone())
    }

    pub fn len(&self) -> usize {
        self.state.read(|s| s.saved_items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn contains(items: &[Article], key: &str) -> bool {
    items.iter().any(|a| a.identity_key() == Some(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store, NEWS_RECORD};

    fn registry_with(store: Arc<dyn Store>) -> SavedItemsRegistry {
        SavedItemsRegistry::new(Arc::new(Persisted::load(store, NEWS_RECORD)))
    }

    fn registry() -> SavedItemsRegistry {
        registry_with(Arc::new(MemoryStore::new()))
    }

    fn with_id(id: &str) -> Article {
        Article {
            id: Some(id.into()),
            title: format!("Article {}", id),
            ..Default::default()
        }
    }

    fn with_link(link: &str) -> Article {
        Article {
            link: Some(link.into()),
            title: "Linked".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let saved = registry();
        let a = with_id("a");

        assert!(saved.add(&a));
        assert!(!saved.add(&a));
        assert_eq!(saved.list(), vec![a]);
    }

    #[test]
    fn test_add_without_identity_rejected() {
        let saved = registry();
        let anonymous = Article {
            title: "No id, no link".into(),
            ..Default::default()
        };

        assert!(!saved.add(&anonymous));
        assert!(saved.is_empty());
    }

    #[test]
    fn test_link_used_when_id_missing() {
        let saved = registry();
        assert!(saved.add(&with_link("https://x.test/p")));
        assert!(saved.is_saved("https://x.test/p"));
        assert!(!saved.add(&with_link("https://x.test/p")));
    }

    #[test]
    fn test_id_takes_precedence_over_link() {
        let saved = registry();
        let article = Article {
            id: Some("id-1".into()),
            link: Some("https://x.test/1".into()),
            ..Default::default()
        };
        saved.add(&article);

        assert!(saved.is_saved("id-1"));
        assert!(!saved.is_saved("https://x.test/1"));
    }

    #[test]
    fn test_remove() {
        let saved = registry();
        saved.add(&with_id("a"));
        saved.add(&with_id("b"));

        assert!(saved.remove("a"));
        assert!(!saved.remove("a"));
        assert!(!saved.is_saved("a"));
        assert_eq!(saved.list(), vec![with_id("b")]);
    }

    #[test]
    fn test_insertion_order_kept() {
        let saved = registry();
        for id in ["c", "a", "b"] {
            saved.add(&with_id(id));
        }

        let ids: Vec<_> = saved.list().into_iter().filter_map(|a| a.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_survives_restart() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        registry_with(store.clone()).add(&with_id("kept"));

        let reopened = registry_with(store);
        assert!(reopened.is_saved("kept"));
        assert_eq!(reopened.len(), 1);
    }
}
