use url::Url;

use crate::config::{BlogConfig, Config, NewsConfig, VideoConfig};
use crate::domain::SearchOptions;

/// Upper bound the blog listing accepts for `number`.
pub const MAX_BLOG_POSTS: u32 = 200;

/// Builds provider request URLs. Parameter order is fixed so identical
/// requests produce identical URLs, which the gateway uses as cache keys.
#[derive(Debug, Clone)]
pub struct Endpoints {
    news_base: Url,
    video_base: Url,
    blog_base: Url,
    news: NewsConfig,
    video: VideoConfig,
    blog: BlogConfig,
}

impl Endpoints {
    pub fn from_config(config: &Config) -> Result<Self, url::ParseError> {
        Ok(Self {
            news_base: Url::parse(&config.news.base_url)?,
            video_base: Url::parse(&config.video.base_url)?,
            blog_base: Url::parse(&config.blog.base_url)?,
            news: config.news.clone(),
            video: config.video.clone(),
            blog: config.blog.clone(),
        })
    }

    pub fn technology(&self) -> String {
        self.news_category(&self.news.technology_category)
    }

    /// Latest headlines; uncategorized unless `general_category` is set.
    pub fn general(&self) -> String {
        self.news_listing(self.news.general_category.as_deref())
    }

    pub fn news_category(&self, category: &str) -> String {
        self.news_listing(Some(category))
    }

    fn news_listing(&self, category: Option<&str>) -> String {
        let mut url = self.news_base.clone();
        {
            let mut query = url.query_pairs_mut();
            append_key(&mut query, "apikey", &self.news.api_key);
            query.append_pair("language", &self.news.language);
            query.append_pair("country", &self.news.country);
            if let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) {
                query.append_pair("category", category);
            }
        }
        url.into()
    }

    /// One page of a news search. `page` is the provider's `nextPage` cursor
    /// from the previous response.
    pub fn news_search(
        &self,
        query_text: &str,
        options: &SearchOptions,
        page: Option<&str>,
    ) -> String {
        let mut url = self.news_base.clone();
        {
            let mut query = url.query_pairs_mut();
            append_key(&mut query, "apikey", &self.news.api_key);
            query.append_pair(options.mode.param(), query_text);
            query.append_pair(
                "language",
                non_blank(&options.language).unwrap_or(&self.news.language),
            );
            query.append_pair(
                "country",
                non_blank(&options.country).unwrap_or(&self.news.country),
            );
            let optional = [
                ("category", &options.category),
                ("domain", &options.domains),
                ("from_date", &options.from_date),
                ("to_date", &options.to_date),
            ];
            for (name, value) in optional {
                if let Some(value) = non_blank(value) {
                    query.append_pair(name, value);
                }
            }
            if let Some(page) = page {
                query.append_pair("page", page);
            }
        }
        url.into()
    }

    pub fn videos(&self, page_token: Option<&str>) -> String {
        let mut url = self.video_base.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("part", "snippet");
            query.append_pair("type", "video");
            query.append_pair("maxResults", &self.video.page_size.to_string());
            query.append_pair("q", &self.video.query);
            append_key(&mut query, "key", &self.video.api_key);
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        url.into()
    }

    /// `count` defaults to the configured value and is clamped to
    /// `[1, MAX_BLOG_POSTS]`.
    pub fn blog_count(&self, count: Option<u32>) -> u32 {
        count
            .unwrap_or(self.blog.default_count)
            .clamp(1, MAX_BLOG_POSTS)
    }

    pub fn blog_posts(&self, count: Option<u32>) -> String {
        let count = self.blog_count(count);
        let mut url = self.blog_base.clone();
        url.query_pairs_mut()
            .append_pair("number", &count.to_string());
        url.into()
    }

    pub fn video_settings(&self) -> &VideoConfig {
        &self.video
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn append_key(
    query: &mut url::form_urlencoded::Serializer<'_, url::UrlQuery<'_>>,
    name: &str,
    key: &str,
) {
    if !key.is_empty() {
        query.append_pair(name, key);
    }
}
