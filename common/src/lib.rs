/*!
common/src/lib.rs

Shared configuration types and data model for the WAIMAKERS news dashboard.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader merging a default config file with an override
- The article / feed source types shared by the fetcher and the server
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// HTTP server section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address Rocket binds to (e.g. "127.0.0.1")
    pub bind: String,
    pub port: u16,
    /// Directory holding index.html and the dashboard assets
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: "static".to_string(),
        }
    }
}

/// Fetching / politeness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub timeout_seconds: u64,
    /// Pause after each network call
    pub delay_millis: u64,
    pub max_articles: usize,
    /// Disables TLS certificate and hostname verification. Off unless set explicitly.
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            delay_millis: 500,
            max_articles: 10,
            accept_invalid_certs: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Kind of feed a source publishes. Only RSS/Atom XML is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    #[default]
    Rss,
}

/// A named news feed and the keywords highlighted in its titles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub kind: FeedKind,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl FeedSource {
    pub fn new(name: &str, url: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            kind: FeedKind::Rss,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.url)
            .with_context(|| format!("invalid URL for feed '{}': {}", self.name, self.url))?;
        Ok(())
    }
}

/// Optional replacement for the built-in feed registry.
/// A list left out keeps the built-in sources for that tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedsConfig {
    pub primary: Option<Vec<FeedSource>>,
    pub backup: Option<Vec<FeedSource>>,
}

/// Text-to-speech (ElevenLabs) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub api_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub model_id: String,
    pub default_voice: String,
    /// Where generated audio lands; "~" expands to $HOME
    pub output_dir: String,
    pub timeout_seconds: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.elevenlabs.io/v1".to_string(),
            api_key_env: "ELEVENLABS_API_KEY".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            default_voice: "rachel".to_string(),
            output_dir: "~/Desktop".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub fetcher: FetcherConfig,
    pub feeds: FeedsConfig,
    pub tts: TtsConfig,
}

impl Config {
    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let configured = self.feeds.primary.iter().chain(self.feeds.backup.iter()).flatten();
        for source in configured {
            source.validate()?;
        }
        Ok(())
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// A news article as shown on the dashboard.
///
/// Articles produced by the fetcher always carry a non-empty title and an `id`
/// assigned after ranking. Articles posted by other agents may omit any field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub source: String,
    pub title: String,
    pub summary: String,
    /// ISO-8601 timestamp
    pub date: String,
    pub link: String,
    /// Source keywords found in the title
    pub highlights: Vec<String>,
    pub overview: Vec<String>,
}

/// Output of one aggregation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchResult {
    pub articles: Vec<Article>,
    pub summary: String,
}

/// Convenience: sleep helper used by implementations (kept public for tests)
pub async fn sleep_millis(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_from_string_uses_defaults() {
        let toml = r#"
            [server]
            port = 9090

            [fetcher]
            max_articles = 5

            [[feeds.primary]]
            name = "Example"
            url = "https://example.com/feed.xml"
            keywords = ["AI"]
        "#;

        let cfg: Config = toml::from_str(toml).expect("parse config");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.fetcher.max_articles, 5);
        assert_eq!(cfg.fetcher.timeout_seconds, 10);
        assert!(!cfg.fetcher.accept_invalid_certs);

        let primary = cfg.feeds.primary.expect("primary feeds");
        assert_eq!(primary.len(), 1);
        assert_eq!(primary[0].kind, FeedKind::Rss);
        assert!(cfg.feeds.backup.is_none());
        assert_eq!(cfg.tts.api_key_env, "ELEVENLABS_API_KEY");
    }

    #[tokio::test]
    async fn override_file_takes_precedence() {
        let mut default_file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(default_file, "[server]\nport = 8080\nbind = \"0.0.0.0\"\n\n[fetcher]\ndelay_millis = 250")
            .expect("write default");
        let mut override_file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(override_file, "[server]\nport = 3000").expect("write override");

        let cfg = Config::load_with_defaults(Some(default_file.path()), Some(override_file.path()))
            .await
            .expect("load config");

        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.fetcher.delay_millis, 250);
    }

    #[tokio::test]
    async fn missing_files_yield_default_config() {
        let cfg = Config::load_with_defaults(
            Some(Path::new("does/not/exist.toml")),
            None,
        )
        .await
        .expect("load config");

        assert_eq!(cfg.fetcher.max_articles, 10);
        assert_eq!(cfg.server.port, 8080);
    }

    #[tokio::test]
    async fn invalid_feed_url_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "[[feeds.backup]]\nname = \"Broken\"\nurl = \"not a url\"").expect("write");

        let err = Config::load_with_defaults(None, Some(file.path())).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Broken"));
    }

    #[test]
    fn posted_article_accepts_missing_fields() {
        let article: Article = serde_json::from_str(r#"{"title": "GPT-5 Released"}"#).expect("parse");
        assert_eq!(article.title, "GPT-5 Released");
        assert!(article.id.is_none());
        assert!(article.highlights.is_empty());

        let json = serde_json::to_value(&article).expect("serialize");
        assert!(json.get("id").is_none());
    }
}
