use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};
use tracing::debug;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));
static DOCUMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(html|head)[\s/>]").expect("document pattern is valid"));

/// Elements whose text never reaches the output.
const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "head"];

/// Reduces an HTML snippet (typically a feed description) to plain text.
/// Text runs are trimmed and joined with single spaces. Falls back to
/// [`strip_tags`] when the structured pass loses the content.
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    match extract_text(html) {
        Some(text) => text,
        None => {
            debug!("scraping: structured HTML pass recovered no text, using tag regex");
            strip_tags(html)
        }
    }
}

/// Deletes anything that looks like a tag.
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").trim().to_string()
}

fn extract_text(html: &str) -> Option<String> {
    // Only a real document has a head; as a fragment, leading <title> or
    // <noscript> stay in the body and keep their text.
    let document = if DOCUMENT_RE.is_match(html) {
        Html::parse_document(html)
    } else {
        Html::parse_fragment(html)
    };

    let mut parts = Vec::new();
    let mut skipped_any = false;
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => SKIPPED_ELEMENTS.contains(&element.name()),
            _ => false,
        });
        if hidden {
            skipped_any = true;
            continue;
        }
        let run = text.trim();
        if !run.is_empty() {
            parts.push(run);
        }
    }

    if parts.is_empty() && !skipped_any && !strip_tags(html).is_empty() {
        return None;
    }
    Some(parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_nested_markup() {
        assert_eq!(strip_html("<p>Hello <b>World</b></p>"), "Hello World");
    }

    #[test]
    fn test_script_and_style_are_dropped() {
        let html = "<style>p { color: red; }</style><p>Visible</p><script>track();</script> text";
        assert_eq!(strip_html(html), "Visible text");
    }

    #[test]
    fn test_head_is_dropped() {
        let html = "<html><head><title>Page</title></head><body><p>Body copy</p></body></html>";
        assert_eq!(strip_html(html), "Body copy");
    }

    #[test]
    fn test_head_only_elements_in_a_snippet_keep_their_text() {
        assert_eq!(strip_html("<title>Headline</title> body text"), "Headline body text");
        assert_eq!(strip_html("<noscript>No JS</noscript><p>Body</p>"), "No JS Body");
        assert_eq!(strip_html("<header>Top</header><p>Story</p>"), "Top Story");
    }

    #[test]
    fn test_unterminated_tag_uses_regex_fallback() {
        // The parser drops a tag cut off mid-attribute, text and all.
        assert_eq!(strip_html("<a href=\"https://example.com>Read more"), "Read more");
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(strip_html("Fish &amp; Chips"), "Fish & Chips");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(strip_html(""), "");
        assert_eq!(strip_html("   "), "");
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(strip_html("  Already plain  "), "Already plain");
    }

    #[test]
    fn test_strip_tags_regex() {
        assert_eq!(strip_tags("<a href=\"x\">link</a> text"), "link text");
        assert_eq!(strip_tags("no tags"), "no tags");
    }
}
