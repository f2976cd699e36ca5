use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use common::{Article, FetchResult};

pub const DEFAULT_USER_NAME: &str = "there";

/// Everything the dashboard page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardState {
    pub user_name: String,
    pub podcast_link: String,
    pub articles: Vec<Article>,
    pub summary: String,
    /// Whether articles have been loaded since start or the last clear
    pub ready: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            user_name: DEFAULT_USER_NAME.to_string(),
            podcast_link: String::new(),
            articles: Vec::new(),
            summary: String::new(),
            ready: false,
        }
    }
}

/// Owner of the in-memory dashboard state, shared by the HTTP handlers and any
/// agent driving the dashboard programmatically. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    state: Arc<RwLock<DashboardState>>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    pub async fn set_user_name(&self, name: impl Into<String>) -> String {
        let mut state = self.state.write().await;
        state.user_name = name.into();
        info!(user_name = %state.user_name, "dashboard: user name set");
        state.user_name.clone()
    }

    pub async fn set_podcast_link(&self, url: impl Into<String>) -> String {
        let mut state = self.state.write().await;
        state.podcast_link = url.into();
        info!(podcast_link = %state.podcast_link, "dashboard: podcast link set");
        state.podcast_link.clone()
    }

    /// Replaces the article list. Returns the new count.
    pub async fn load_articles(&self, articles: Vec<Article>) -> usize {
        let mut state = self.state.write().await;
        state.articles = articles;
        state.ready = true;
        info!(count = state.articles.len(), "dashboard: articles loaded");
        state.articles.len()
    }

    /// Appends one article. Returns the total count.
    pub async fn add_article(&self, article: Article) -> usize {
        let mut state = self.state.write().await;
        state.articles.push(article);
        state.ready = true;
        state.articles.len()
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.articles.clear();
        state.summary.clear();
        state.ready = false;
        info!("dashboard: cleared");
    }

    /// Installs the outcome of an aggregation run. Returns the article count.
    pub async fn apply_fetch(&self, result: FetchResult) -> usize {
        let mut state = self.state.write().await;
        state.articles = result.articles;
        state.summary = result.summary;
        state.ready = true;
        info!(count = state.articles.len(), "dashboard: fetch applied");
        state.articles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            ..Article::default()
        }
    }

    #[tokio::test]
    async fn test_initial_state() {
        let state = Dashboard::new().snapshot().await;
        assert_eq!(state.user_name, "there");
        assert!(state.podcast_link.is_empty());
        assert!(state.articles.is_empty());
        assert!(!state.ready);
    }

    #[tokio::test]
    async fn test_load_then_add_then_clear() {
        let dashboard = Dashboard::new();
        assert_eq!(dashboard.load_articles(vec![article("a"), article("b")]).await, 2);
        assert_eq!(dashboard.add_article(article("c")).await, 3);
        assert!(dashboard.snapshot().await.ready);

        dashboard.clear().await;
        let state = dashboard.snapshot().await;
        assert!(state.articles.is_empty());
        assert!(!state.ready);
    }

    #[tokio::test]
    async fn test_apply_fetch_replaces_articles_and_summary() {
        let dashboard = Dashboard::new();
        dashboard.load_articles(vec![article("stale")]).await;

        let count = dashboard
            .apply_fetch(FetchResult {
                articles: vec![article("fresh")],
                summary: "Briefing".to_string(),
            })
            .await;

        let state = dashboard.snapshot().await;
        assert_eq!(count, 1);
        assert_eq!(state.articles[0].title, "fresh");
        assert_eq!(state.summary, "Briefing");
        assert!(state.ready);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let dashboard = Dashboard::new();
        let handle = dashboard.clone();
        handle.set_user_name("Ada").await;
        handle.set_podcast_link("https://example.com/ep1.mp3").await;

        let state = dashboard.snapshot().await;
        assert_eq!(state.user_name, "Ada");
        assert_eq!(state.podcast_link, "https://example.com/ep1.mp3");
    }
}
