use common::{FeedSource, FeedsConfig};

/// Built-in AI news feeds: primary and backup sources, in the order they are polled.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRegistry {
    pub primary: Vec<FeedSource>,
    /// Polled only when the primary sources yield fewer articles than requested
    pub backup: Vec<FeedSource>,
}

impl FeedRegistry {
    pub fn new(primary: Vec<FeedSource>, backup: Vec<FeedSource>) -> Self {
        Self { primary, backup }
    }

    pub fn builtin() -> Self {
        Self::new(primary_sources(), backup_sources())
    }

    /// Built-in registry with any tier listed in the config replaced wholesale.
    pub fn from_config(feeds: &FeedsConfig) -> Self {
        Self::new(
            feeds.primary.clone().unwrap_or_else(primary_sources),
            feeds.backup.clone().unwrap_or_else(backup_sources),
        )
    }

}

impl Default for FeedRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn primary_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "TechCrunch AI",
            "https://techcrunch.com/category/artificial-intelligence/feed/",
            &["AI", "artificial intelligence", "machine learning", "GPT", "LLM", "startup"],
        ),
        FeedSource::new(
            "OpenAI",
            "https://openai.com/blog/rss/",
            &["OpenAI", "GPT", "ChatGPT", "DALL-E", "Sora", "o1"],
        ),
        FeedSource::new(
            "Google AI",
            "https://blog.google/technology/ai/rss/",
            &["Google", "Gemini", "DeepMind", "Bard"],
        ),
        FeedSource::new(
            "NVIDIA AI",
            "https://blogs.nvidia.com/feed/",
            &["NVIDIA", "GPU", "CUDA", "AI hardware", "inference"],
        ),
        FeedSource::new(
            "One Useful Thing",
            "https://www.oneusefulthing.org/feed",
            &["AI", "education", "Ethan Mollick", "productivity"],
        ),
        FeedSource::new(
            "The Verge AI",
            "https://www.theverge.com/rss/ai-artificial-intelligence/index.xml",
            &["AI", "tech", "Google", "Microsoft", "OpenAI"],
        ),
        FeedSource::new(
            "Ars Technica AI",
            "https://feeds.arstechnica.com/arstechnica/technology-lab",
            &["AI", "tech", "science", "research"],
        ),
        FeedSource::new(
            "MIT Tech Review AI",
            "https://www.technologyreview.com/topic/artificial-intelligence/feed",
            &["AI", "research", "MIT", "innovation"],
        ),
        FeedSource::new(
            "VentureBeat AI",
            "https://venturebeat.com/category/ai/feed/",
            &["AI", "enterprise", "startup", "funding"],
        ),
        FeedSource::new(
            "Wired AI",
            "https://www.wired.com/feed/tag/ai/latest/rss",
            &["AI", "tech", "future", "ethics"],
        ),
    ]
}

pub fn backup_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "Hacker News AI",
            "https://hnrss.org/newest?q=AI+OR+LLM+OR+GPT&count=10",
            &["AI", "LLM", "GPT", "startup"],
        ),
        FeedSource::new(
            "AI News",
            "https://www.artificialintelligence-news.com/feed/",
            &["AI", "machine learning", "deep learning"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_both_tiers() {
        let registry = FeedRegistry::builtin();
        assert_eq!(registry.primary.len(), 10);
        assert_eq!(registry.backup.len(), 2);
        assert_eq!(registry.primary[0].name, "TechCrunch AI");
    }

    #[test]
    fn config_replaces_only_listed_tiers() {
        let feeds = FeedsConfig {
            primary: Some(vec![FeedSource::new("Local", "http://localhost/feed", &["AI"])]),
            backup: None,
        };
        let registry = FeedRegistry::from_config(&feeds);
        assert_eq!(registry.primary.len(), 1);
        assert_eq!(registry.backup, backup_sources());
    }
}
