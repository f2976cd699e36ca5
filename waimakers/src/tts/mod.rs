use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub mod elevenlabs;

/// Core trait for text-to-speech backends
#[async_trait::async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Render `request.text` and return the encoded audio (MP3).
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>>;

    /// Voices available to the account
    async fn list_voices(&self) -> Result<Vec<Voice>>;
}

/// Voice tuning sent with each synthesis request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    /// Style exaggeration
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.5,
            use_speaker_boost: true,
        }
    }
}

impl VoiceSettings {
    /// Steadier delivery for long-form narration.
    pub fn podcast() -> Self {
        Self {
            stability: 0.6,
            similarity_boost: 0.8,
            style: 0.4,
            use_speaker_boost: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    /// Preset voice name or raw voice id
    pub voice: String,
    /// Falls back to the provider's configured model when `None`
    pub model_id: Option<String>,
    pub settings: VoiceSettings,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            model_id: None,
            settings: VoiceSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: VoiceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn voice_id(&self) -> String {
        resolve_voice_id(&self.voice)
    }
}

/// Where the audio landed and what produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechOutput {
    pub file_path: PathBuf,
    pub file_size: usize,
    pub voice: String,
    pub voice_id: String,
    /// In characters
    pub text_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub character_count: i64,
    #[serde(default)]
    pub character_limit: i64,
}

impl Subscription {
    pub fn remaining(&self) -> i64 {
        self.character_limit - self.character_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub model_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetVoice {
    pub name: &'static str,
    pub id: &'static str,
    pub description: &'static str,
}

const fn preset(name: &'static str, id: &'static str, description: &'static str) -> PresetVoice {
    PresetVoice { name, id, description }
}

/// ElevenLabs pre-made voices, addressable by lower-case name.
pub const PRESET_VOICES: [PresetVoice; 11] = [
    preset("rachel", "21m00Tcm4TlvDq8ikWAM", "Calm, professional female"),
    preset("drew", "29vD33N1CtxCmqQRPOHJ", "Confident male"),
    preset("clyde", "2EiwWnXFnvU5JabPnv8n", "War veteran, deep male"),
    preset("paul", "5Q0t7uMcjvnagumLfvZi", "News anchor male"),
    preset("domi", "AZnzlk1XvdvUeBnXmlld", "Strong female"),
    preset("bella", "EXAVITQu4vr4xnSDxMaL", "Soft female"),
    preset("antoni", "ErXwobaYiN019PkySvjV", "Well-rounded male"),
    preset("josh", "TxGEqnHWrfWFTfGW9XjX", "Deep male"),
    preset("arnold", "VR6AewLTigWG4xSOukaG", "Crisp male"),
    preset("adam", "pNInz6obpgDQGcFmaJgB", "Deep male"),
    preset("sam", "yoZ06aMxZJJ28mfd3POQ", "Raspy male"),
];

/// Preset name (any case) to voice id; anything else is assumed to be an id already.
pub fn resolve_voice_id(voice: &str) -> String {
    let wanted = voice.to_lowercase();
    PRESET_VOICES
        .iter()
        .find(|p| p.name == wanted)
        .map(|p| p.id.to_string())
        .unwrap_or_else(|| voice.to_string())
}

/// Presets as a voice list, for when the API cannot be reached.
pub fn preset_voice_list() -> Vec<Voice> {
    PRESET_VOICES
        .iter()
        .map(|p| Voice {
            voice_id: p.id.to_string(),
            name: p.name.to_string(),
            category: Some("premade".to_string()),
        })
        .collect()
}

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MAX_TITLE_CHARS: usize = 30;

/// `{title}_{timestamp}.mp3`, with the title reduced to a file-system safe slug.
pub fn podcast_file_name(title: &str, now: NaiveDateTime) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let slug: String = kept
        .trim()
        .replace(' ', "_")
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect();
    format!("{}_{}.mp3", slug, now.format(TIMESTAMP_FORMAT))
}

pub fn default_file_name(now: NaiveDateTime) -> String {
    format!("elevenlabs_{}.mp3", now.format(TIMESTAMP_FORMAT))
}

pub fn with_mp3_extension(name: &str) -> String {
    if name.ends_with(".mp3") {
        name.to_string()
    } else {
        format!("{}.mp3", name)
    }
}

/// Expands a leading `~` to `$HOME`. Left untouched when `HOME` is unset.
pub fn expand_home(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}

/// Output location inside `output_dir`: the given file name (forced to `.mp3`)
/// or a timestamped default.
pub fn output_path(output_dir: &str, file_name: Option<&str>, now: NaiveDateTime) -> PathBuf {
    let name = match file_name {
        Some(name) => with_mp3_extension(name),
        None => default_file_name(now),
    };
    expand_home(output_dir).join(name)
}

/// Synthesizes `request` and writes the audio to `output_path`, creating parent
/// directories as needed.
pub async fn text_to_speech<P: SpeechProvider + ?Sized>(
    provider: &P,
    request: &SpeechRequest,
    output_path: &Path,
) -> Result<SpeechOutput> {
    if request.text.trim().is_empty() {
        bail!("No text provided");
    }

    let audio = provider.synthesize(request).await?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    tokio::fs::write(output_path, &audio)
        .await
        .with_context(|| format!("Failed to write audio file: {}", output_path.display()))?;

    info!(path = %output_path.display(), bytes = audio.len(), voice = %request.voice, "tts: audio saved");

    Ok(SpeechOutput {
        file_path: output_path.to_path_buf(),
        file_size: audio.len(),
        voice: request.voice.clone(),
        voice_id: request.voice_id(),
        text_length: request.text.chars().count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 12, 19)
            .and_then(|d| d.and_hms_opt(12, 30, 5))
            .expect("valid timestamp")
    }

    struct FixedAudio;

    #[async_trait::async_trait]
    impl SpeechProvider for FixedAudio {
        async fn synthesize(&self, _request: &SpeechRequest) -> Result<Vec<u8>> {
            Ok(vec![0xFF, 0xFB, 0x90, 0x00])
        }

        async fn list_voices(&self) -> Result<Vec<Voice>> {
            Ok(preset_voice_list())
        }
    }

    #[test]
    fn test_resolve_voice_id() {
        assert_eq!(resolve_voice_id("Rachel"), "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(resolve_voice_id("sam"), "yoZ06aMxZJJ28mfd3POQ");
        assert_eq!(resolve_voice_id("customVoiceId123"), "customVoiceId123");
    }

    #[test]
    fn test_podcast_file_name() {
        assert_eq!(
            podcast_file_name("  AI Weekly: Ep. #12! ", noon()),
            "AI_Weekly_Ep_12_20251219_123005.mp3"
        );
        let long = podcast_file_name(&"a".repeat(50), noon());
        assert_eq!(long, format!("{}_20251219_123005.mp3", "a".repeat(30)));
    }

    #[test]
    fn test_output_file_names() {
        assert_eq!(default_file_name(noon()), "elevenlabs_20251219_123005.mp3");
        assert_eq!(with_mp3_extension("intro"), "intro.mp3");
        assert_eq!(with_mp3_extension("intro.mp3"), "intro.mp3");
        assert_eq!(
            output_path("/tmp/out", Some("intro"), noon()),
            PathBuf::from("/tmp/out/intro.mp3")
        );
    }

    #[test]
    fn test_subscription_remaining() {
        let sub = Subscription {
            tier: None,
            character_count: 1200,
            character_limit: 10000,
        };
        assert_eq!(sub.remaining(), 8800);
    }

    #[tokio::test]
    async fn test_text_to_speech_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/briefing.mp3");
        let request = SpeechRequest::new("Good morning", "rachel");

        let output = text_to_speech(&FixedAudio, &request, &path).await.expect("tts");

        assert_eq!(output.file_size, 4);
        assert_eq!(output.voice_id, "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(output.text_length, 12);
        assert_eq!(std::fs::read(&path).expect("read audio").len(), 4);
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let request = SpeechRequest::new("   ", "rachel");
        let err = text_to_speech(&FixedAudio, &request, &dir.path().join("x.mp3"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No text"));
    }
}
