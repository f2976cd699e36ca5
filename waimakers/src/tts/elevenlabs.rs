use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use common::TtsConfig;

use super::{Model, SpeechProvider, SpeechRequest, Subscription, Voice, VoiceSettings};

pub const DEFAULT_MODEL: &str = "eleven_multilingual_v2";
const API_KEY_HEADER: &str = "xi-api-key";

/// ElevenLabs REST client
pub struct ElevenLabsClient {
    base_url: String,
    api_key: String,
    model_id: String,
    /// Applies to synthesis; metadata calls use `metadata_timeout`
    synthesis_timeout: Duration,
    metadata_timeout: Duration,
    client: reqwest::Client,
}

impl ElevenLabsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model_id: DEFAULT_MODEL.to_string(),
            synthesis_timeout: Duration::from_secs(120),
            metadata_timeout: Duration::from_secs(30),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_defaults(mut self, model_id: impl Into<String>, timeout_secs: u64) -> Self {
        self.model_id = model_id.into();
        self.synthesis_timeout = Duration::from_secs(timeout_secs);
        self
    }

    /// Client for the configured endpoint, with the API key read from the
    /// environment variable named in `config.api_key_env`.
    pub fn from_config(config: &TtsConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("TTS API key env var '{}' not set", config.api_key_env))?;
        Ok(Self::new(&config.api_url, api_key).with_defaults(&config.model_id, config.timeout_seconds))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.metadata_timeout)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .get(path)
            .send()
            .await
            .with_context(|| format!("ElevenLabs request to {} failed", path))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API Error {}: {}", status.as_u16(), body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse ElevenLabs response from {}", path))
    }

    /// Character usage for the current billing period
    pub async fn subscription(&self) -> Result<Subscription> {
        self.get_json("/user/subscription").await
    }

    pub async fn models(&self) -> Result<Vec<Model>> {
        self.get_json("/models").await
    }
}

#[async_trait::async_trait]
impl SpeechProvider for ElevenLabsClient {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        let voice_id = request.voice_id();
        let body = SynthesisRequest {
            text: &request.text,
            model_id: request.model_id.as_deref().unwrap_or(&self.model_id),
            voice_settings: request.settings,
        };

        tracing::info!(voice = %request.voice, voice_id = %voice_id, chars = request.text.chars().count(), "tts: synthesizing");

        let response = self
            .client
            .post(format!("{}/text-to-speech/{}", self.base_url, voice_id))
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "audio/mpeg")
            .timeout(self.synthesis_timeout)
            .json(&body)
            .send()
            .await
            .context("ElevenLabs HTTP request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API Error {}: {}", status.as_u16(), body);
        }

        let audio = response.bytes().await.context("Failed to read audio body")?;
        Ok(audio.to_vec())
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let listing: VoiceListing = self.get_json("/voices").await?;
        Ok(listing.voices)
    }
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Deserialize)]
struct VoiceListing {
    #[serde(default)]
    voices: Vec<Voice>,
}
