use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::dub::AudioClip;
use crate::errors::ProviderError;
use crate::media::{run_tool, MediaProcessor};
use crate::providers::SpeechSynthesizer;

/// Default voice for Mandarin output
pub const DEFAULT_VOICE: &str = "zh-CN-YunxiNeural";

/// Speech synthesizer running an edge-tts compatible command.
///
/// The command writes compressed audio; it is decoded to mono PCM at the
/// configured sample rate through the media collaborator before loading.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    /// Executable name or path
    program: String,
    /// Voice name passed to `--voice`
    voice: String,
    /// Sample rate of the clips produced
    sample_rate: u32,
    /// Per-call timeout
    timeout_secs: u64,
    /// Decoder for the command's output
    media: Arc<dyn MediaProcessor>,
}

impl CommandSynthesizer {
    pub fn new(
        program: impl Into<String>,
        voice: impl Into<String>,
        sample_rate: u32,
        timeout_secs: u64,
        media: Arc<dyn MediaProcessor>,
    ) -> Self {
        Self {
            program: program.into(),
            voice: voice.into(),
            sample_rate,
            timeout_secs,
            media,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, ProviderError> {
        let work_dir = tempfile::tempdir()
            .map_err(|e| ProviderError::CommandFailed(format!("Failed to create temp dir: {}", e)))?;
        let mp3_path = work_dir.path().join("speech.mp3");
        let wav_path = work_dir.path().join("speech.wav");

        let args = vec![
            "--voice".to_string(), self.voice.clone(),
            "--text".to_string(), text.to_string(),
            "--write-media".to_string(), mp3_path.to_string_lossy().into_owned(),
        ];
        run_tool(&self.program, &args, self.timeout_secs)
            .await
            .map_err(|e| ProviderError::CommandFailed(e.to_string()))?;

        self.media
            .decode_to_wav(&mp3_path, &wav_path, self.sample_rate)
            .await
            .map_err(|e| ProviderError::CommandFailed(e.to_string()))?;

        let clip = AudioClip::from_wav_file(&wav_path).map_err(|e| ProviderError::ParseError(e.to_string()))?;
        debug!("Synthesized {} ms of speech for {} chars", clip.duration_ms(), text.chars().count());
        Ok(clip)
    }
}
