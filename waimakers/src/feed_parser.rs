/*
RSS 2.0 / Atom parsing into dashboard articles.

The document is read into a small namespace-aware element tree first, so a
malformed feed is rejected as a whole. Item fields are then resolved through
ordered candidate lists, which is where RSS and Atom tag names diverge.
*/

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use tracing::{debug, warn};

use common::Article;

use crate::dates::normalize_date;
use crate::scraping::strip_html;

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Items read per feed, in document order.
pub const MAX_ITEMS_PER_FEED: usize = 5;
pub const MAX_SUMMARY_CHARS: usize = 300;
const ELLIPSIS: &str = "...";
const PLACEHOLDER_TITLE: &str = "Untitled";

#[derive(Debug, Clone, Copy)]
enum Tag {
    /// No namespace (RSS 2.0)
    Plain(&'static str),
    Atom(&'static str),
}

const TITLE_TAGS: &[Tag] = &[Tag::Plain("title"), Tag::Atom("title")];
const DESCRIPTION_TAGS: &[Tag] = &[
    Tag::Plain("description"),
    Tag::Atom("summary"),
    Tag::Atom("content"),
];
const DATE_TAGS: &[Tag] = &[Tag::Plain("pubDate"), Tag::Atom("published"), Tag::Atom("updated")];

type LinkExtractor = fn(&Element) -> Option<String>;

/// First non-empty result wins.
const LINK_EXTRACTORS: &[LinkExtractor] = &[rss_link, atom_link];

#[derive(Debug, Default)]
struct Element {
    namespace: Option<String>,
    name: String,
    attributes: Vec<(String, String)>,
    /// Concatenated text and CDATA directly inside this element
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn is(&self, tag: Tag) -> bool {
        match tag {
            Tag::Plain(name) => self.namespace.is_none() && self.name == name,
            Tag::Atom(name) => self.namespace.as_deref() == Some(ATOM_NS) && self.name == name,
        }
    }

    fn child(&self, tag: Tag) -> Option<&Element> {
        self.children.iter().find(|c| c.is(tag))
    }

    /// First child matching any of `tags`, trying the tags in order.
    fn first_child_of(&self, tags: &[Tag]) -> Option<&Element> {
        tags.iter().find_map(|tag| self.child(*tag))
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Matching descendants in document order, excluding `self`.
    fn descendants<'a>(&'a self, tag: Tag, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.is(tag) {
                out.push(child);
            }
            child.descendants(tag, out);
        }
    }
}

fn rss_link(item: &Element) -> Option<String> {
    let link = item.child(Tag::Plain("link"))?;
    let href = link.attr("href").filter(|href| !href.is_empty());
    non_empty(href.unwrap_or(link.text.as_str()))
}

fn atom_link(item: &Element) -> Option<String> {
    non_empty(item.child(Tag::Atom("link"))?.attr("href")?)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Parses feed content into at most [`MAX_ITEMS_PER_FEED`] articles.
///
/// Never fails: malformed XML is logged and yields no articles. Items with an
/// empty or placeholder title are dropped.
pub fn parse_feed(content: &str, source_name: &str, keywords: &[String]) -> Vec<Article> {
    let root = match parse_document(content) {
        Ok(root) => root,
        Err(e) => {
            warn!(source = source_name, error = %e, "XML parse error");
            return Vec::new();
        }
    };

    let mut items = Vec::new();
    root.descendants(Tag::Plain("item"), &mut items);
    if items.is_empty() {
        root.descendants(Tag::Atom("entry"), &mut items);
    }
    debug!(source = source_name, items = items.len(), "parsed feed document");

    items
        .into_iter()
        .take(MAX_ITEMS_PER_FEED)
        .filter_map(|item| parse_item(item, source_name, keywords))
        .collect()
}

fn parse_item(item: &Element, source_name: &str, keywords: &[String]) -> Option<Article> {
    let title = item
        .first_child_of(TITLE_TAGS)
        .map(|e| e.text.trim().to_string())
        .unwrap_or_default();
    if title.is_empty() || title == PLACEHOLDER_TITLE {
        return None;
    }

    let link = LINK_EXTRACTORS
        .iter()
        .find_map(|extract| extract(item))
        .unwrap_or_default();

    let description = item
        .first_child_of(DESCRIPTION_TAGS)
        .map(|e| truncate_summary(&strip_html(&e.text)))
        .unwrap_or_default();
    let summary = match description.trim() {
        "" => format!("Latest news from {}", source_name),
        text => text.to_string(),
    };

    let raw_date = item.first_child_of(DATE_TAGS).map(|e| e.text.as_str());

    Some(Article {
        id: None,
        source: source_name.to_string(),
        highlights: highlights(&title, keywords),
        title,
        summary,
        date: normalize_date(raw_date),
        link,
        overview: Vec::new(),
    })
}

/// Keywords found (case-insensitively) in the title, in keyword order.
pub fn highlights(title: &str, keywords: &[String]) -> Vec<String> {
    let title = title.to_lowercase();
    keywords
        .iter()
        .filter(|kw| title.contains(&kw.to_lowercase()))
        .cloned()
        .collect()
}

/// Caps `text` at [`MAX_SUMMARY_CHARS`] characters, ellipsis included.
pub fn truncate_summary(text: &str) -> String {
    if text.chars().count() <= MAX_SUMMARY_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text
        .chars()
        .take(MAX_SUMMARY_CHARS - ELLIPSIS.len())
        .collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

fn parse_document(content: &str) -> Result<Element> {
    let mut reader = NsReader::from_str(content.trim_start_matches('\u{feff}'));
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(e)) => stack.push(open_element(ns, &e)?),
            (ns, Event::Empty(e)) => {
                let element = open_element(ns, &e)?;
                attach(&mut stack, &mut root, element)?;
            }
            (_, Event::End(_)) => {
                let element = stack.pop().context("closing tag without opening tag")?;
                attach(&mut stack, &mut root, element)?;
            }
            (_, Event::Text(t)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&t.unescape()?);
                }
            }
            (_, Event::CData(c)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        bail!("unclosed element <{}>", open.name);
    }
    root.context("document has no root element")
}

fn open_element(ns: ResolveResult, start: &BytesStart) -> Result<Element> {
    let namespace = match ns {
        ResolveResult::Bound(namespace) => Some(String::from_utf8_lossy(namespace.as_ref()).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            bail!("unbound namespace prefix '{}'", String::from_utf8_lossy(&prefix))
        }
    };

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        attributes.push((key, attr.unescape_value()?.into_owned()));
    }

    Ok(Element {
        namespace,
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        ..Element::default()
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => bail!("junk after document element <{}>", element.name),
        None => *root = Some(element),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_tree_resolves_namespaces() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>A</title></entry></feed>"#;
        let root = parse_document(xml).expect("parse");
        assert!(root.is(Tag::Atom("feed")));
        let entry = root.child(Tag::Atom("entry")).expect("entry");
        assert_eq!(entry.child(Tag::Atom("title")).expect("title").text, "A");
        assert!(entry.child(Tag::Plain("title")).is_none());
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        assert!(parse_document("<rss><channel></rss>").is_err());
        assert!(parse_document("<rss><channel>").is_err());
        assert!(parse_document("<a/><b/>").is_err());
        assert!(parse_document("").is_err());
        assert!(parse_document("<rss><x:item/></rss>").is_err());
    }

    #[test]
    fn test_cdata_is_kept_verbatim() {
        let root = parse_document("<d><![CDATA[<p>Hi &amp; bye</p>]]></d>").expect("parse");
        assert_eq!(root.text, "<p>Hi &amp; bye</p>");
    }

    #[test]
    fn test_truncate_summary_boundaries() {
        let exact = "x".repeat(MAX_SUMMARY_CHARS);
        assert_eq!(truncate_summary(&exact), exact);

        let long = "é".repeat(310);
        let truncated = truncate_summary(&long);
        assert_eq!(truncated.chars().count(), MAX_SUMMARY_CHARS);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_highlights_keep_keyword_order() {
        let keywords = vec!["GPT".to_string(), "OpenAI".to_string(), "Sora".to_string()];
        assert_eq!(
            highlights("OpenAI ships gpt-5", &keywords),
            vec!["GPT".to_string(), "OpenAI".to_string()]
        );
    }
}
