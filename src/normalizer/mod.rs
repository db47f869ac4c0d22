//! Maps raw provider records onto the canonical [`Article`].
//!
//! Field precedence is expressed as ordered lists of JSON pointers; the first
//! candidate that yields a usable value wins. Normalization never fails:
//! missing or malformed fields fall back to `None`, an empty string, or the
//! [`UNTITLED`] placeholder.

mod text;

use serde_json::Value;
use url::Url;

use crate::domain::{Article, EngagementCounts, Source, UNTITLED};

pub use text::strip_html;

const NEWS_ID: &[&str] = &["/article_id", "/id", "/uuid", "/link"];
const NEWS_IMAGE: &[&str] = &["/image_url"];
const NEWS_LINK: &[&str] = &["/link"];
const NEWS_DATE: &[&str] = &["/pubDate", "/published_at"];

const VIDEO_ID: &[&str] = &["/id/videoId", "/id"];
const VIDEO_IMAGE: &[&str] = &[
    "/snippet/thumbnails/medium/url",
    "/snippet/thumbnails/high/url",
    "/snippet/thumbnails/default/url",
];
const VIDEO_AUTHOR: &[&str] = &["/snippet/channelTitle"];
const VIDEO_DATE: &[&str] = &["/snippet/publishedAt"];
const VIDEO_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

const BLOG_ID: &[&str] = &["/ID", "/id", "/URL"];
const BLOG_IMAGE: &[&str] = &["/featured_image", "/post_thumbnail/URL", "/_thumbnail_url"];
const BLOG_LINK: &[&str] = &["/URL", "/short_URL"];
const BLOG_AUTHOR: &[&str] = &["/author/name", "/author/display_name", "/author/nice_name"];
const BLOG_AVATAR: &[&str] = &[
    "/author/avatar_URL",
    "/author/avatar_URLs/96",
    "/author/avatar_URLs/48",
    "/author/avatar_URLs/24",
];
const BLOG_DATE: &[&str] = &["/date", "/modified"];
const BLOG_LIKES: &[&str] = &["/like_count", "/likes", "/likeCount", "/metadata/like_count"];
const BLOG_COMMENTS: &[&str] = &[
    "/comment_count",
    "/comments_count",
    "/commentCount",
    "/discussion/comment_count",
];
const BLOG_VIEWS: &[&str] = &["/view_count", "/views", "/viewCount", "/site_stats/views"];

/// Characters of raw post content used when a blog post has no excerpt.
const CONTENT_EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, record: &Value, source: Source) -> Article {
        match source {
            Source::News => self.normalize_news(record),
            Source::Video => self.normalize_video(record),
            Source::Blog => self.normalize_blog(record),
        }
    }

    /// Normalize a batch for a listing collection. Records without a usable
    /// image are dropped.
    pub fn listing(&self, records: &[Value], source: Source) -> Vec<Article> {
        records
            .iter()
            .map(|record| self.normalize(record, source))
            .filter(Article::has_image)
            .collect()
    }

    pub fn normalize_news(&self, record: &Value) -> Article {
        Article {
            id: first_text(record, NEWS_ID),
            title: title_of(record.get("title")),
            description: markup_text(record.get("description")).unwrap_or_default(),
            image_url: first_url(record, NEWS_IMAGE),
            link: first_text(record, NEWS_LINK),
            author: author_of(record),
            author_image: None,
            published_at: first_text(record, NEWS_DATE),
            category: string_list(record.get("category")),
            keywords: string_list(record.get("keywords")),
            source: Source::News,
            stats: EngagementCounts::default(),
        }
    }

    pub fn normalize_video(&self, record: &Value) -> Article {
        let id = first_text(record, VIDEO_ID);
        let snippet = record.get("snippet");

        Article {
            link: id.as_ref().map(|id| format!("{}{}", VIDEO_WATCH_URL, id)),
            id,
            title: title_of(snippet.and_then(|s| s.get("title"))),
            description: markup_text(snippet.and_then(|s| s.get("description")))
                .unwrap_or_default(),
            image_url: first_url(record, VIDEO_IMAGE),
            author: first_text(record, VIDEO_AUTHOR),
            author_image: None,
            published_at: first_text(record, VIDEO_DATE),
            category: Vec::new(),
            keywords: Vec::new(),
            source: Source::Video,
            stats: EngagementCounts::default(),
        }
    }

    pub fn normalize_blog(&self, record: &Value) -> Article {
        let title = markup_text(record.get("title"));
        let description = markup_text(record.get("excerpt"))
            .or_else(|| {
                record
                    .get("content")
                    .and_then(Value::as_str)
                    .map(|c| c.chars().take(CONTENT_EXCERPT_CHARS).collect::<String>())
                    .and_then(|c| non_empty(strip_html(&c)))
            })
            .unwrap_or_default();

        Article {
            id: first_text(record, BLOG_ID).or_else(|| title.clone()),
            title: title.unwrap_or_else(|| UNTITLED.to_string()),
            description,
            image_url: first_url(record, BLOG_IMAGE),
            link: first_text(record, BLOG_LINK),
            author: first_text(record, BLOG_AUTHOR),
            author_image: first_url(record, BLOG_AVATAR),
            published_at: first_text(record, BLOG_DATE),
            category: Vec::new(),
            keywords: Vec::new(),
            source: Source::Blog,
            stats: EngagementCounts {
                likes: first_count(record, BLOG_LIKES),
                comments: first_count(record, BLOG_COMMENTS),
                views: first_count(record, BLOG_VIEWS),
            },
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

/// Scalar at `pointer` as trimmed text; numbers are rendered, everything
/// else is ignored.
fn scalar_text(record: &Value, pointer: &str) -> Option<String> {
    match record.pointer(pointer)? {
        Value::String(s) => non_empty(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(record: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|p| scalar_text(record, p))
}

/// First candidate that parses as an absolute http(s) URL.
fn first_url(record: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .filter_map(|p| record.pointer(p).and_then(Value::as_str))
        .map(str::trim)
        .find(|candidate| is_http_url(candidate))
        .map(String::from)
}

fn is_http_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// First positive, finite number; 0 when none.
fn first_count(record: &Value, pointers: &[&str]) -> f64 {
    pointers
        .iter()
        .filter_map(|p| record.pointer(p).and_then(Value::as_f64))
        .find(|n| n.is_finite() && *n > 0.0)
        .unwrap_or(0.0)
}

fn markup_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .and_then(|s| non_empty(strip_html(s)))
}

fn title_of(value: Option<&Value>) -> String {
    markup_text(value).unwrap_or_else(|| UNTITLED.to_string())
}

/// List-valued `author`/`creator` joined with ", ", else the scalar field.
fn author_of(record: &Value) -> Option<String> {
    for field in ["author", "creator"] {
        if let Some(Value::Array(names)) = record.get(field) {
            let joined = names
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            return non_empty(joined);
        }
    }

    first_text(record, &["/author", "/creator"])
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_news_record_end_to_end() {
        let record = json!({
            "article_id": "x1",
            "image_url": "http://i/img.jpg",
            "title": "<b>Hi</b>",
            "creator": ["A", "B"]
        });

        let article = Normalizer::new().normalize_news(&record);

        assert_eq!(article.id.as_deref(), Some("x1"));
        assert_eq!(article.image_url.as_deref(), Some("http://i/img.jpg"));
        assert_eq!(article.title, "Hi");
        assert_eq!(article.author.as_deref(), Some("A, B"));
        assert_eq!(article.source, Source::News);
    }

    #[test]
    fn test_news_id_precedence() {
        let n = Normalizer::new();
        let all = json!({"article_id": "a", "id": "b", "uuid": "c", "link": "https://x/d"});
        assert_eq!(n.normalize_news(&all).id.as_deref(), Some("a"));

        let no_article_id = json!({"id": "b", "uuid": "c", "link": "https://x/d"});
        assert_eq!(n.normalize_news(&no_article_id).id.as_deref(), Some("b"));

        let uuid_only = json!({"uuid": "c", "link": "https://x/d"});
        assert_eq!(n.normalize_news(&uuid_only).id.as_deref(), Some("c"));

        let link_only = json!({"article_id": "", "link": "https://x/d"});
        assert_eq!(n.normalize_news(&link_only).id.as_deref(), Some("https://x/d"));
    }

    #[test]
    fn test_author_list_skips_empty_entries() {
        let record = json!({"author": ["Jane", "", null, " Joe "]});
        assert_eq!(
            Normalizer::new().normalize_news(&record).author.as_deref(),
            Some("Jane, Joe")
        );
    }

    #[test]
    fn test_author_scalar_fallbacks() {
        let n = Normalizer::new();
        assert_eq!(
            n.normalize_news(&json!({"author": "Solo"})).author.as_deref(),
            Some("Solo")
        );
        assert_eq!(
            n.normalize_news(&json!({"creator": "Maker"})).author.as_deref(),
            Some("Maker")
        );
        assert_eq!(n.normalize_news(&json!({})).author, None);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let article = Normalizer::new().normalize_news(&json!({"title": null}));

        assert_eq!(article.id, None);
        assert_eq!(article.title, UNTITLED);
        assert_eq!(article.description, "");
        assert_eq!(article.image_url, None);
        assert!(article.category.is_empty());
        assert!(article.keywords.is_empty());
    }

    #[test]
    fn test_non_object_record_does_not_panic() {
        let n = Normalizer::new();
        for record in [json!(null), json!(42), json!("text"), json!([1, 2])] {
            let article = n.normalize_news(&record);
            assert_eq!(article.title, UNTITLED);
            let video = n.normalize_video(&record);
            assert_eq!(video.link, None);
            let blog = n.normalize_blog(&record);
            assert_eq!(blog.image_url, None);
        }
    }

    #[test]
    fn test_listing_drops_records_without_image() {
        let records = vec![
            json!({"article_id": "1", "image_url": "https://img.example.com/1.jpg"}),
            json!({"article_id": "2"}),
            json!({"article_id": "3", "image_url": null}),
            json!({"article_id": "4", "image_url": "https://img.example.com/4.jpg"}),
            json!({"article_id": "5", "image_url": "not a url"}),
        ];

        let listing = Normalizer::new().listing(&records, Source::News);

        let ids: Vec<_> = listing.iter().map(|a| a.id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn test_category_and_keywords() {
        let record = json!({
            "category": ["technology", "science"],
            "keywords": "rust"
        });
        let article = Normalizer::new().normalize_news(&record);
        assert_eq!(article.category, vec!["technology", "science"]);
        assert_eq!(article.keywords, vec!["rust"]);
    }

    #[test]
    fn test_video_record() {
        let record = json!({
            "id": {"kind": "youtube#video", "videoId": "abc123"},
            "snippet": {
                "title": "Morning &amp; News",
                "description": "Daily roundup",
                "channelTitle": "Channel",
                "publishedAt": "2024-02-01T08:00:00Z",
                "thumbnails": {
                    "default": {"url": "https://i.ytimg.com/vi/abc123/default.jpg"},
                    "medium": {"url": "https://i.ytimg.com/vi/abc123/mqdefault.jpg"}
                }
            }
        });

        let article = Normalizer::new().normalize_video(&record);

        assert_eq!(article.id.as_deref(), Some("abc123"));
        assert_eq!(
            article.link.as_deref(),
            Some("https://www.youtube.com/watch?v=abc123")
        );
        assert_eq!(article.title, "Morning & News");
        assert_eq!(
            article.image_url.as_deref(),
            Some("https://i.ytimg.com/vi/abc123/mqdefault.jpg")
        );
        assert_eq!(article.author.as_deref(), Some("Channel"));
        assert_eq!(article.source, Source::Video);
    }

    #[test]
    fn test_video_thumbnail_fallback() {
        let record = json!({
            "id": {"videoId": "v"},
            "snippet": {"thumbnails": {"high": {"url": "https://i.ytimg.com/vi/v/hq.jpg"}}}
        });
        assert_eq!(
            Normalizer::new().normalize_video(&record).image_url.as_deref(),
            Some("https://i.ytimg.com/vi/v/hq.jpg")
        );
    }

    #[test]
    fn test_blog_cover_precedence_skips_invalid_candidates() {
        let record = json!({
            "ID": 991,
            "title": "Post",
            "featured_image": "",
            "post_thumbnail": {"URL": "ftp://files.example.com/cover.png"},
            "_thumbnail_url": "https://blog.example.com/thumb.png"
        });

        let article = Normalizer::new().normalize_blog(&record);

        assert_eq!(article.id.as_deref(), Some("991"));
        assert_eq!(
            article.image_url.as_deref(),
            Some("https://blog.example.com/thumb.png")
        );
    }

    #[test]
    fn test_blog_record() {
        let record = json!({
            "ID": 42,
            "title": "<p>Big &quot;Story&quot;</p>",
            "excerpt": "<p>Short  <em>excerpt</em></p>\n",
            "URL": "https://blog.example.com/big-story",
            "date": "2024-01-15T10:00:00+00:00",
            "featured_image": "https://blog.example.com/cover.jpg",
            "author": {
                "name": "Writer",
                "avatar_URL": "https://gravatar.example.com/w.png"
            },
            "like_count": 12,
            "discussion": {"comment_count": 3}
        });

        let article = Normalizer::new().normalize_blog(&record);

        assert_eq!(article.title, "Big \"Story\"");
        assert_eq!(article.description, "Short excerpt");
        assert_eq!(article.link.as_deref(), Some("https://blog.example.com/big-story"));
        assert_eq!(article.author.as_deref(), Some("Writer"));
        assert_eq!(
            article.author_image.as_deref(),
            Some("https://gravatar.example.com/w.png")
        );
        assert_eq!(article.published_at.as_deref(), Some("2024-01-15T10:00:00+00:00"));
        assert_eq!(article.stats.likes, 12.0);
        assert_eq!(article.stats.comments, 3.0);
        assert_eq!(article.stats.views, 0.0);
        assert_eq!(article.source, Source::Blog);
    }

    #[test]
    fn test_blog_description_falls_back_to_content() {
        let long = format!("<p>{}</p>", "word ".repeat(100));
        let record = json!({"title": "T", "content": long});

        let article = Normalizer::new().normalize_blog(&record);

        assert!(article.description.starts_with("word word"));
        assert!(article.description.len() <= CONTENT_EXCERPT_CHARS);
    }

    #[test]
    fn test_blog_engagement_skips_zero_candidates() {
        let record = json!({"like_count": 0, "likes": 7, "views": -3, "site_stats": {"views": 40}});
        let stats = Normalizer::new().normalize_blog(&record).stats;
        assert_eq!(stats.likes, 7.0);
        assert_eq!(stats.views, 40.0);
    }

    #[test]
    fn test_blog_id_falls_back_to_title() {
        let record = json!({"title": "Only a title"});
        assert_eq!(
            Normalizer::new().normalize_blog(&record).id.as_deref(),
            Some("Only a title")
        );
    }
}
