use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Reduce provider markup to plain text: tags removed, entities decoded,
/// whitespace collapsed.
pub fn strip_html(html: &str) -> String {
    let without_tags = TAG.replace_all(html, " ");
    let decoded = decode_html_entities(&without_tags);
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_simple_tags() {
        assert_eq!(strip_html("<b>Hi</b>"), "Hi");
    }

    #[test]
    fn test_block_tags_become_spaces() {
        assert_eq!(strip_html("<p>One</p><p>Two</p>"), "One Two");
    }

    #[test]
    fn test_entities_decoded_after_tags_removed() {
        assert_eq!(strip_html("&lt;b&gt; &amp; friends"), "<b> & friends");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(strip_html("  already plain  "), "already plain");
    }
}
