//! Configuration management for newsdesk.
//!
//! Configuration is read from `~/.config/newsdesk/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub news: NewsConfig,
    pub video: VideoConfig,
    pub blog: BlogConfig,
    pub cache: CacheConfig,
}

/// News search provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub base_url: String,
    pub api_key: String,
    pub language: String,
    pub country: String,
    /// Category queried by the technology collection
    pub technology_category: String,
    /// Category queried by the general collection; `None` asks for the
    /// uncategorized latest feed
    pub general_category: Option<String>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsdata.io/api/1/news".into(),
            api_key: String::new(),
            language: "en".into(),
            country: "us".into(),
            technology_category: "technology".into(),
            general_category: None,
        }
    }
}

/// Video search provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub base_url: String,
    pub api_key: String,
    pub query: String,
    pub page_size: u32,
    pub max_pages: u32,
    pub page_delay_ms: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/youtube/v3/search".into(),
            api_key: String::new(),
            query: "news".into(),
            page_size: 10,
            max_pages: 3,
            page_delay_ms: 1000,
        }
    }
}

impl VideoConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// Blog post listing provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    pub base_url: String,
    pub default_count: u32,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://public-api.wordpress.com/rest/v1.1/read/tags/news/posts".into(),
            default_count: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    /// Pause between search result pages
    pub search_page_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 120,
            search_page_delay_ms: 300,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn search_page_delay(&self) -> Duration {
        Duration::from_millis(self.search_page_delay_ms)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/newsdesk/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("newsdesk").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# newsdesk configuration
#
# API keys are left empty here. Requests without a key are still sent,
# but most providers will answer 401/403.

[news]
# newsdata.io compatible search endpoint
base_url = "https://newsdata.io/api/1/news"
api_key = ""
language = "en"
country = "us"
technology_category = "technology"
# Leave unset for the uncategorized latest feed
# general_category = "top"

[video]
# YouTube Data API v3 search endpoint
base_url = "https://www.googleapis.com/youtube/v3/search"
api_key = ""
query = "news"
page_size = 10
# Pages fetched at most per refresh, stopping early once enough videos are in
max_pages = 3
page_delay_ms = 1000

[blog]
# WordPress reader tag listing
base_url = "https://public-api.wordpress.com/rest/v1.1/read/tags/news/posts"
default_count = 100

[cache]
# How long a fetched response is reused before hitting the network again
ttl_secs = 120
search_page_delay_ms = 300
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.news.language, "en");
        assert_eq!(config.video.max_pages, 3);
        assert_eq!(config.blog.default_count, 100);
        assert_eq!(config.cache.ttl(), Duration::from_secs(120));
    }

    #[test]
    fn test_default_content_matches_default_struct() {
        let parsed: Config = toml::from_str(&Config::default_config_content()).unwrap();
        let defaults = Config::default();

        assert_eq!(parsed.news.base_url, defaults.news.base_url);
        assert_eq!(parsed.video.base_url, defaults.video.base_url);
        assert_eq!(parsed.video.page_delay(), defaults.video.page_delay());
        assert_eq!(parsed.blog.base_url, defaults.blog.base_url);
        assert_eq!(
            parsed.cache.search_page_delay(),
            defaults.cache.search_page_delay()
        );
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[news]
api_key = "secret"

[cache]
ttl_secs = 30
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.news.api_key, "secret");
        assert_eq!(config.news.country, "us");
        assert_eq!(config.cache.ttl_secs, 30);
        assert_eq!(config.cache.search_page_delay_ms, 300);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.video.query, "news");
        assert_eq!(config.news.technology_category, "technology");
        assert!(config.news.general_category.is_none());
    }

    #[test]
    fn test_general_category_override() {
        let config: Config = toml::from_str("[news]\ngeneral_category = \"top\"\n").unwrap();
        assert_eq!(config.news.general_category.as_deref(), Some("top"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[video]\nmax_pages = 1\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.video.max_pages, 1);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cache\nttl_secs = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
