use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::path::Path;

use crate::errors::ProviderError;
use crate::media::run_tool;
use crate::providers::SpeechRecognizer;
use crate::segment::Segment;

// @struct: Top level of whisper's JSON output
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

// @struct: One recognized segment, times in seconds
#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Parse whisper JSON output into raw segments.
///
/// Timestamps are converted to milliseconds here; negative or non-finite
/// values reject the whole transcript.
pub fn parse_whisper_json(json: &str) -> Result<Vec<Segment>, ProviderError> {
    let output: WhisperOutput = serde_json::from_str(json)
        .map_err(|e| ProviderError::ParseError(format!("Invalid whisper output: {}", e)))?;

    output
        .segments
        .into_iter()
        .enumerate()
        .map(|(index, s)| {
            Segment::from_seconds(index, s.start, s.end, s.text.trim())
                .map_err(|e| ProviderError::ParseError(e.to_string()))
        })
        .collect()
}

/// Speech recognizer running the whisper command-line tool
#[derive(Debug, Clone)]
pub struct WhisperCli {
    /// Executable name or path
    program: String,
    /// Model size (tiny, base, small, medium, large)
    model: String,
    /// Per-call timeout
    timeout_secs: u64,
}

impl WhisperCli {
    pub fn new(program: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperCli {
    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<Vec<Segment>, ProviderError> {
        let output_dir = tempfile::tempdir()
            .map_err(|e| ProviderError::CommandFailed(format!("Failed to create temp dir: {}", e)))?;

        let args = vec![
            audio_path.to_string_lossy().into_owned(),
            "--model".to_string(), self.model.clone(),
            "--language".to_string(), language.to_string(),
            "--task".to_string(), "transcribe".to_string(),
            "--output_format".to_string(), "json".to_string(),
            "--output_dir".to_string(), output_dir.path().to_string_lossy().into_owned(),
        ];

        run_tool(&self.program, &args, self.timeout_secs)
            .await
            .map_err(|e| ProviderError::CommandFailed(e.to_string()))?;

        let stem = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let json_path = output_dir.path().join(format!("{}.json", stem));

        let json = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            ProviderError::CommandFailed(format!("Missing whisper output {}: {}", json_path.display(), e))
        })?;

        let segments = parse_whisper_json(&json)?;
        debug!("Whisper produced {} segments for {}", segments.len(), audio_path.display());
        Ok(segments)
    }
}
