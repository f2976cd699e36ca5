use chrono::{Local, NaiveDate};
use std::collections::{BTreeSet, HashMap};

use common::Article;

/// Returned when there is nothing to summarise.
pub const EMPTY_BRIEFING: &str = "No news available yet. Click Start to fetch the latest AI updates.";
const CLOSING: &str = "\n\nScroll down for more details on each story.";

/// Company names reported in the big-tech paragraph.
const COMPANIES: [&str; 6] = ["OpenAI", "Google", "Microsoft", "Anthropic", "NVIDIA", "Meta"];

/// Narrative bucket for one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    BigTech,
    Funding,
    Products,
    Research,
    Regulation,
    Other,
}

/// Checked in order against the lower-cased title; the first rule that matches
/// decides the theme. Titles matching none are `Other`.
const THEME_RULES: [(Theme, &[&str]); 5] = [
    (Theme::BigTech, &["openai", "google", "microsoft", "anthropic", "nvidia", "meta"]),
    (Theme::Funding, &["funding", "raises", "valuation", "investment", "billion", "million"]),
    (Theme::Products, &["launch", "release", "introduce", "announce", "new", "update"]),
    (Theme::Research, &["research", "study", "paper", "discover", "breakthrough"]),
    (Theme::Regulation, &["eu", "regulation", "law", "policy", "government"]),
];

impl Theme {
    pub fn heading(self) -> &'static str {
        match self {
            Theme::BigTech => "Big Tech Moves",
            Theme::Funding => "Investment & Funding",
            Theme::Products => "Product Updates",
            Theme::Research => "Research & Innovation",
            Theme::Regulation => "Policy & Regulation",
            Theme::Other => "Also noteworthy",
        }
    }
}

pub fn classify(title: &str) -> Theme {
    let title = title.to_lowercase();
    THEME_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| title.contains(kw)))
        .map(|(theme, _)| *theme)
        .unwrap_or(Theme::Other)
}

/// Today's briefing for `articles`, dated with the local calendar day.
pub fn summarize(articles: &[Article]) -> String {
    summarize_on(articles, Local::now().date_naive())
}

/// Renders the canned briefing: an opening line, one paragraph per theme that has
/// articles (fixed order), optionally one "also noteworthy" paragraph, and a closing line.
pub fn summarize_on(articles: &[Article], today: NaiveDate) -> String {
    if articles.is_empty() {
        return EMPTY_BRIEFING.to_string();
    }

    let mut themes: HashMap<Theme, Vec<&Article>> = HashMap::new();
    for article in articles {
        themes.entry(classify(&article.title)).or_default().push(article);
    }

    let mut parts = vec![format!(
        "Here's what's happening in the world of AI on {}:",
        today.format("%A, %B %d")
    )];

    for (theme, _) in THEME_RULES {
        let Some(bucket) = themes.get(&theme) else {
            continue;
        };
        let lead = &bucket[0].title;
        if theme == Theme::BigTech {
            let companies = companies_in(bucket.iter().take(3).map(|a| a.title.as_str()));
            if !companies.is_empty() {
                let names = companies.into_iter().collect::<Vec<_>>().join(", ");
                parts.push(format!(
                    "\n\n**{}:** {} made headlines today. {}.",
                    theme.heading(),
                    names,
                    lead
                ));
            }
        } else {
            parts.push(format!("\n\n**{}:** {}.", theme.heading(), lead));
        }
    }

    // The opening line counts towards the four.
    if parts.len() < 4 {
        if let Some(other) = themes.get(&Theme::Other) {
            parts.push(format!("\n\n**{}:** {}.", Theme::Other.heading(), other[0].title));
        }
    }

    parts.push(CLOSING.to_string());
    parts.concat()
}

/// Recognised company names appearing in any of `titles`, sorted.
fn companies_in<'a>(titles: impl Iterator<Item = &'a str>) -> BTreeSet<&'static str> {
    let mut found = BTreeSet::new();
    for title in titles {
        let title = title.to_lowercase();
        found.extend(
            COMPANIES
                .iter()
                .copied()
                .filter(|company| title.contains(&company.to_lowercase())),
        );
    }
    found
}
