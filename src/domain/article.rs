use serde::{Deserialize, Serialize};

/// Placeholder used when a provider record carries no usable title.
pub const UNTITLED: &str = "Untitled";

/// Provider family an article was normalized from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    News,
    Video,
    Blog,
}

/// Raw engagement counters as reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementCounts {
    pub likes: f64,
    pub comments: f64,
    pub views: f64,
}

/// Canonical article shape shared by every collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub author: Option<String>,
    pub author_image: Option<String>,
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub source: Source,
    pub stats: EngagementCounts,
}

impl Article {
    /// Key used to match articles across sources and sessions: the id when
    /// present, otherwise the link.
    pub fn identity_key(&self) -> Option<&str> {
        non_empty(self.id.as_deref()).or_else(|| non_empty(self.link.as_deref()))
    }

    pub fn has_image(&self) -> bool {
        self.image_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    pub fn display_author(&self) -> &str {
        self.author.as_deref().unwrap_or("Unknown")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_prefers_id() {
        let article = Article {
            id: Some("a1".into()),
            link: Some("https://example.com/a1".into()),
            ..Default::default()
        };
        assert_eq!(article.identity_key(), Some("a1"));
    }

    #[test]
    fn test_identity_falls_back_to_link() {
        let article = Article {
            id: Some(String::new()),
            link: Some("https://example.com/a1".into()),
            ..Default::default()
        };
        assert_eq!(article.identity_key(), Some("https://example.com/a1"));
    }

    #[test]
    fn test_identity_absent() {
        assert_eq!(Article::default().identity_key(), None);
    }

    #[test]
    fn test_deserialize_tolerates_missing_fields() {
        let article: Article = serde_json::from_str(r#"{"title":"Hi"}"#).unwrap();
        assert_eq!(article.title, "Hi");
        assert_eq!(article.source, Source::News);
        assert!(article.category.is_empty());
        assert_eq!(article.stats, EngagementCounts::default());
    }
}
