/*
waimakers - single-binary main.rs
Starts the dashboard server, or runs one of the one-shot commands (news fetch,
text-to-speech, account info) against the same configuration.
*/

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use waimakers::aggregator::NewsAggregator;
use waimakers::dashboard::Dashboard;
use waimakers::server::launch_rocket;
use waimakers::tts::elevenlabs::ElevenLabsClient;
use waimakers::tts::{self, SpeechProvider, SpeechRequest, VoiceSettings};

#[derive(Parser, Debug)]
#[command(name = "waimakers", about = "WAIMAKERS AI news dashboard, news fetcher and TTS client")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the dashboard HTTP server (default)
    Serve,
    /// Fetch the news once and print the briefing and article list
    Fetch {
        #[arg(long)]
        max_articles: Option<usize>,
    },
    /// Convert text to an MP3 file
    Speak {
        text: String,
        /// Preset voice name or voice id
        #[arg(long)]
        voice: Option<String>,
        /// File name inside the output directory
        #[arg(long)]
        output: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Render a podcast script with narration voice settings
    Podcast {
        /// Script text; use --script-file to read it from disk
        #[arg(required_unless_present = "script_file")]
        script: Option<String>,
        #[arg(long, value_name = "FILE", conflicts_with = "script")]
        script_file: Option<PathBuf>,
        #[arg(long, default_value = "podcast")]
        title: String,
        #[arg(long)]
        voice: Option<String>,
    },
    /// List available voices
    Voices,
    /// Show character usage for the account
    Credits,
    /// List text-to-speech models
    Models,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    // Load configuration with defaults
    let config = match Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Fetch { max_articles } => {
            fetch(&config, max_articles.unwrap_or(config.fetcher.max_articles)).await
        }
        Command::Speak { text, voice, output, model } => {
            let voice = voice.unwrap_or_else(|| config.tts.default_voice.clone());
            let mut request = SpeechRequest::new(text, voice);
            if let Some(model) = model {
                request = request.with_model(model);
            }
            let path = tts::output_path(&config.tts.output_dir, output.as_deref(), Local::now().naive_local());
            speak(&config, request, path).await
        }
        Command::Podcast { script, script_file, title, voice } => {
            let script = match (script, script_file) {
                (Some(script), _) => script,
                (None, Some(file)) => tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("Failed to read script file: {}", file.display()))?,
                (None, None) => anyhow::bail!("No script provided"),
            };
            let voice = voice.unwrap_or_else(|| config.tts.default_voice.clone());
            let request = SpeechRequest::new(script, voice).with_settings(VoiceSettings::podcast());
            let file_name = tts::podcast_file_name(&title, Local::now().naive_local());
            let path = tts::expand_home(&config.tts.output_dir).join(file_name);
            speak(&config, request, path).await
        }
        Command::Voices => voices(&config).await,
        Command::Credits => credits(&config).await,
        Command::Models => models(&config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    let aggregator = Arc::new(NewsAggregator::from_config(&config)?);
    info!(
        primary = aggregator.registry().primary.len(),
        backup = aggregator.registry().backup.len(),
        "feed registry ready"
    );

    // Launch the Rocket server (blocking until Rocket shuts down)
    info!("Launching Rocket HTTP server");
    if let Err(e) = launch_rocket(&config, Dashboard::new(), aggregator).await {
        error!(error = %e, "Rocket server failed");
        return Err(e);
    }

    info!("Shutdown complete");
    Ok(())
}

async fn fetch(config: &Config, max_articles: usize) -> Result<()> {
    let aggregator = NewsAggregator::from_config(config)?;
    let result = aggregator.fetch_all(max_articles).await;

    println!("{}\n", result.summary);
    for article in &result.articles {
        println!("{}. [{}] {}", article.id.unwrap_or_default(), article.source, article.title);
        println!("   {}", article.date);
        if !article.link.is_empty() {
            println!("   {}", article.link);
        }
        if !article.highlights.is_empty() {
            println!("   highlights: {}", article.highlights.join(", "));
        }
    }
    Ok(())
}

async fn speak(config: &Config, request: SpeechRequest, path: PathBuf) -> Result<()> {
    let client = ElevenLabsClient::from_config(&config.tts)?;
    let output = tts::text_to_speech(&client, &request, &path).await?;

    println!("Audio generated");
    println!("  Voice: {} ({})", output.voice, output.voice_id);
    println!("  Text length: {} characters", output.text_length);
    println!("  File size: {} KB", output.file_size / 1024);
    println!("  Saved to: {}", output.file_path.display());
    Ok(())
}

async fn voices(config: &Config) -> Result<()> {
    let client = ElevenLabsClient::from_config(&config.tts)?;
    let voices = match client.list_voices().await {
        Ok(voices) if !voices.is_empty() => voices,
        Ok(_) => tts::preset_voice_list(),
        Err(e) => {
            warn!(error = %e, "could not list voices, showing presets");
            tts::preset_voice_list()
        }
    };

    for voice in &voices {
        let description = tts::PRESET_VOICES
            .iter()
            .find(|p| p.id == voice.voice_id)
            .map(|p| p.description)
            .unwrap_or("");
        println!(
            "  {:<12} {}  [{}] {}",
            voice.name,
            voice.voice_id,
            voice.category.as_deref().unwrap_or("unknown"),
            description
        );
    }
    Ok(())
}

async fn credits(config: &Config) -> Result<()> {
    let client = ElevenLabsClient::from_config(&config.tts)?;
    let sub = client.subscription().await?;

    if let Some(tier) = &sub.tier {
        println!("Tier: {}", tier);
    }
    println!("Characters used: {}", sub.character_count);
    println!("Character limit: {}", sub.character_limit);
    println!("Remaining: {} characters", sub.remaining());
    Ok(())
}

async fn models(config: &Config) -> Result<()> {
    let client = ElevenLabsClient::from_config(&config.tts)?;
    for model in client.models().await? {
        println!("  {:<28} {}", model.model_id, model.name);
    }
    Ok(())
}
