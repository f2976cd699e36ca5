use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use tracing::{info, warn};

use common::{sleep_millis, Article, Config, FeedKind, FeedSource, FetchResult};

use crate::dates::naive_instant;
use crate::feed_parser::parse_feed;
use crate::ingestion::{FeedFetcher, HttpFeedFetcher};
use crate::press_review;
use crate::registry::FeedRegistry;

/// Default pause after each network call.
pub const DEFAULT_DELAY_MILLIS: u64 = 500;

/// Walks the feed registry one source at a time and turns the results into a
/// ranked, numbered article list plus a briefing.
pub struct NewsAggregator {
    fetcher: Arc<dyn FeedFetcher>,
    registry: FeedRegistry,
    delay_millis: u64,
}

impl NewsAggregator {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, registry: FeedRegistry) -> Self {
        Self {
            fetcher,
            registry,
            delay_millis: DEFAULT_DELAY_MILLIS,
        }
    }

    pub fn with_delay_millis(mut self, delay_millis: u64) -> Self {
        self.delay_millis = delay_millis;
        self
    }

    /// HTTP fetcher and registry as described by the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFeedFetcher::new(&config.fetcher)?;
        Ok(Self::new(Arc::new(fetcher), FeedRegistry::from_config(&config.feeds))
            .with_delay_millis(config.fetcher.delay_millis))
    }

    pub fn registry(&self) -> &FeedRegistry {
        &self.registry
    }

    /// Fetches and parses one source. Failures are logged and yield no articles.
    pub async fn fetch_source(&self, source: &FeedSource) -> Vec<Article> {
        info!(source = %source.name, "fetching feed");
        let content = match self.fetcher.fetch(&source.url).await {
            Ok(content) => content,
            Err(e) => {
                warn!(source = %source.name, url = %source.url, error = %e, "failed to fetch feed");
                return Vec::new();
            }
        };

        match source.kind {
            FeedKind::Rss => parse_feed(&content, &source.name, &source.keywords),
        }
    }

    /// Runs the whole pipeline. Never fails; with no reachable source the result is
    /// empty and carries the empty-state briefing.
    pub async fn fetch_all(&self, max_articles: usize) -> FetchResult {
        info!(max_articles, "fetching AI news from sources");

        let mut collected = Vec::new();
        let mut successful_sources = 0;

        for source in &self.registry.primary {
            if self.collect(source, &mut collected).await {
                successful_sources += 1;
            }
        }

        if collected.len() < max_articles {
            info!(collected = collected.len(), "trying backup sources");
            let ceiling = max_articles.saturating_mul(2);
            for source in &self.registry.backup {
                if collected.len() >= ceiling {
                    break;
                }
                if self.collect(source, &mut collected).await {
                    successful_sources += 1;
                }
            }
        }

        info!(
            articles = collected.len(),
            sources = successful_sources,
            "fetched articles"
        );

        let articles = rank(collected, max_articles);
        let summary = press_review::summarize(&articles);
        FetchResult { articles, summary }
    }

    async fn collect(&self, source: &FeedSource, collected: &mut Vec<Article>) -> bool {
        let articles = self.fetch_source(source).await;
        let found = !articles.is_empty();
        collected.extend(articles);
        sleep_millis(self.delay_millis).await;
        found
    }
}

/// Newest first, capped at `max_articles`, numbered from 1.
///
/// Dates are compared as wall-clock instants with any offset dropped; undated or
/// unreadable dates count as "now". Ties keep their fetch order.
pub fn rank(articles: Vec<Article>, max_articles: usize) -> Vec<Article> {
    let now = Local::now().naive_local();
    let mut keyed: Vec<(NaiveDateTime, Article)> = articles
        .into_iter()
        .map(|article| (naive_instant(&article.date).unwrap_or(now), article))
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0));

    keyed
        .into_iter()
        .take(max_articles)
        .zip(1..)
        .map(|((_, mut article), id)| {
            article.id = Some(id);
            article
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(title: &str, date: &str) -> Article {
        Article {
            title: title.to_string(),
            date: date.to_string(),
            id: Some(99),
            ..Article::default()
        }
    }

    #[test]
    fn test_rank_orders_newest_first_and_renumbers() {
        let ranked = rank(
            vec![
                dated("old", "2025-12-01T09:00:00"),
                dated("new", "2025-12-19T10:00:00+00:00"),
                dated("mid", "2025-12-10T00:00:00"),
            ],
            2,
        );
        let titles: Vec<_> = ranked.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid"]);
        assert_eq!(ranked[0].id, Some(1));
        assert_eq!(ranked[1].id, Some(2));
    }

    #[test]
    fn test_rank_ignores_offsets() {
        // 10:00+05:00 is 05:00 UTC, but it is compared as 10:00.
        let ranked = rank(
            vec![
                dated("utc", "2025-12-19T09:00:00+00:00"),
                dated("ahead", "2025-12-19T10:00:00+05:00"),
            ],
            2,
        );
        assert_eq!(ranked[0].title, "ahead");
    }

    #[test]
    fn test_rank_unreadable_dates_count_as_now() {
        let ranked = rank(
            vec![dated("dated", "2020-01-01T00:00:00"), dated("undated", "soon")],
            5,
        );
        assert_eq!(ranked[0].title, "undated");
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_rank_keeps_fetch_order_for_ties() {
        let ranked = rank(
            vec![
                dated("first", "2025-12-19T10:00:00"),
                dated("second", "2025-12-19T10:00:00"),
            ],
            2,
        );
        assert_eq!(ranked[0].title, "first");
        assert_eq!(ranked[1].title, "second");
    }
}
