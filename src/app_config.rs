use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;
use url::Url;

use crate::language_utils;
use crate::merger::CaptionLayout;
use crate::reconciler::{ReconcilerConfig, DEFAULT_MIN_DURATION_MS};
use crate::translation::DEFAULT_BATCH_SIZE;

/// Application configuration module
/// This module handles loading, creating and validating the JSON settings
/// file. Every section may be omitted; missing values take their defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Spoken language of the input videos (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Language to translate and dub into (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Working folders
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// What each run produces
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Timeline repair settings
    #[serde(default)]
    pub timeline: TimelineConfig,

    /// Translation backend
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Speech synthesis for dubbing
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Speech recognition
    #[serde(default)]
    pub recognition: RecognitionConfig,

    /// ffmpeg settings
    #[serde(default)]
    pub media: MediaConfig,
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: Anthropic
    Anthropic,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Output produced for each video
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// Bilingual subtitles burned into the video
    #[default]
    Subs,
    /// Subtitles plus a dubbed audio track
    Dub,
}

/// Whisper model size
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl WhisperModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Base => "base",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

// @struct: Folder names under the workspace root
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WorkspaceConfig {
    // @field: Root of the three folders
    pub root: String,
    // @field: Input videos
    pub video_input: String,
    // @field: Finished videos and dub tracks
    pub video_output: String,
    // @field: Bilingual subtitle files
    pub srt_output: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            video_input: "video_input".to_string(),
            video_output: "video_output".to_string(),
            srt_output: "srt_output".to_string(),
        }
    }
}

// @struct: Per-run behavior
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    // @field: Subtitles only, or subtitles and dub
    pub mode: PipelineMode,
    // @field: Recognition model size
    pub whisper_model: WhisperModel,
    // @field: Caption layout in the SRT output
    pub layout: CaptionLayout,
    // @field: Videos processed at once in batch runs
    pub concurrent_videos: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: PipelineMode::default(),
            whisper_model: WhisperModel::default(),
            layout: CaptionLayout::default(),
            concurrent_videos: 2,
        }
    }
}

// @struct: Timeline repair settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TimelineConfig {
    // @field: Shortest caption kept on screen
    pub min_duration_ms: u64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: DEFAULT_MIN_DURATION_MS,
        }
    }
}

impl TimelineConfig {
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            min_duration_ms: self.min_duration_ms,
        }
    }
}

/// Translation backend configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    // @field: Backend type
    #[serde(default)]
    pub provider: TranslationProvider,

    // @field: Model name, empty for the provider default
    #[serde(default)]
    pub model: String,

    // @field: Service URL, empty for the provider default
    #[serde(default)]
    pub endpoint: String,

    // @field: API key
    #[serde(default)]
    pub api_key: String,

    // @field: Texts per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    // @field: System prompt with {source_language}/{target_language} placeholders
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            model: String::new(),
            endpoint: String::new(),
            api_key: String::new(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl TranslationConfig {
    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if !self.model.is_empty() {
            return self.model.clone();
        }
        match self.provider {
            TranslationProvider::Ollama => default_ollama_model(),
            TranslationProvider::Anthropic => default_anthropic_model(),
        }
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if !self.endpoint.is_empty() {
            return self.endpoint.clone();
        }
        match self.provider {
            TranslationProvider::Ollama => default_ollama_endpoint(),
            TranslationProvider::Anthropic => String::new(),
        }
    }
}

// @struct: Speech synthesis command
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SynthesisConfig {
    pub program: String,
    pub voice: String,
    pub sample_rate: u32,
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            program: "edge-tts".to_string(),
            voice: crate::providers::tts::DEFAULT_VOICE.to_string(),
            sample_rate: 24_000,
            timeout_secs: 120,
        }
    }
}

// @struct: Speech recognition command
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RecognitionConfig {
    pub program: String,
    pub timeout_secs: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            program: "whisper".to_string(),
            timeout_secs: 3600,
        }
    }
}

// @struct: ffmpeg programs and mixing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MediaConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    // @field: Gain applied to the original audio under the dub
    pub original_volume: f32,
    pub timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            original_volume: 0.1,
            timeout_secs: 1800,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "zh".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.3
}

fn default_system_prompt() -> String {
    crate::translation::markers::DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_ollama_endpoint() -> String {
    crate::providers::ollama::DEFAULT_OLLAMA_ENDPOINT.to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

impl Config {
    /// Load `path`, or write the defaults there when it does not exist.
    ///
    /// The result is not validated; callers apply overrides first.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            return serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()));
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json =
            serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        language_utils::get_language_name(&self.source_language)?;
        language_utils::get_language_name(&self.target_language)?;

        if language_utils::language_codes_match(&self.source_language, &self.target_language) {
            warn!(
                "Source and target language are both '{}'; captions will repeat the same language",
                self.source_language
            );
        }

        if self.translation.batch_size == 0 {
            return Err(anyhow!("Translation batch size must be greater than zero"));
        }

        if self.timeline.min_duration_ms == 0 {
            return Err(anyhow!("Minimum caption duration must be greater than zero"));
        }

        if self.pipeline.concurrent_videos == 0 {
            return Err(anyhow!("Concurrent videos must be greater than zero"));
        }

        if self.translation.provider == TranslationProvider::Anthropic && self.translation.api_key.is_empty() {
            return Err(anyhow!("Translation API key is required for Anthropic provider"));
        }

        let endpoint = self.translation.get_endpoint();
        if !endpoint.is_empty() {
            Url::parse(&endpoint).with_context(|| format!("Invalid translation endpoint: {}", endpoint))?;
        }

        if self.synthesis.sample_rate == 0 {
            return Err(anyhow!("Synthesis sample rate must be greater than zero"));
        }

        if !(0.0..=1.0).contains(&self.media.original_volume) {
            return Err(anyhow!(
                "Original volume must be between 0 and 1, got {}",
                self.media.original_volume
            ));
        }

        Ok(())
    }

    /// Source language in the form passed to the speech recognizer
    pub fn recognition_language(&self) -> Result<String> {
        language_utils::normalize_to_part1_or_part2t(&self.source_language)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            log_level: LogLevel::default(),
            workspace: WorkspaceConfig::default(),
            pipeline: PipelineConfig::default(),
            timeline: TimelineConfig::default(),
            translation: TranslationConfig::default(),
            synthesis: SynthesisConfig::default(),
            recognition: RecognitionConfig::default(),
            media: MediaConfig::default(),
        }
    }
}
