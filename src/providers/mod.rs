/*!
 * External collaborators of the pipeline.
 *
 * The core never talks to a model or engine directly; it goes through the
 * traits below so each video pipeline can be handed its own (or a shared,
 * serialized) implementation:
 * - `TranslationBackend`: batch of source strings to batch of target strings
 * - `SpeechRecognizer`: audio file to raw timed segments
 * - `SpeechSynthesizer`: one target string to one audio clip
 *
 * Implementations:
 * - `ollama`, `anthropic`: LLM translation backends
 * - `whisper`: Whisper command-line recognizer
 * - `tts`: command-line speech synthesizer
 * - `mock`: deterministic collaborators for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;
use tokio::sync::Mutex;

use crate::dub::AudioClip;
use crate::errors::ProviderError;
use crate::segment::Segment;

/// Translates batches of text, preserving count and order
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Translate every string in `texts`.
    ///
    /// Implementations must return exactly one string per input in the same
    /// order; callers treat any other count as a fatal error.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Check that the backend is reachable
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Produces raw timed segments from an audio track
#[async_trait]
pub trait SpeechRecognizer: Send + Sync + Debug {
    /// Transcribe `audio_path` spoken in `language`.
    ///
    /// The result is untrusted and must go through the reconciler.
    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<Vec<Segment>, ProviderError>;
}

/// Synthesizes speech for one caption
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + Debug {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, ProviderError>;
}

/// Serializes every call to the wrapped collaborator.
///
/// Model handles that are not reentrant are wrapped once and shared by all
/// concurrently running video pipelines; only calls into the handle queue up,
/// the CPU-bound stages of each pipeline keep running in parallel.
#[derive(Debug)]
pub struct Exclusive<T> {
    inner: Mutex<T>,
}

impl<T> Exclusive<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }
}

#[async_trait]
impl<T: TranslationBackend> TranslationBackend for Exclusive<T> {
    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let guard = self.inner.lock().await;
        guard.translate_batch(texts, source_language, target_language).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let guard = self.inner.lock().await;
        guard.test_connection().await
    }
}

#[async_trait]
impl<T: SpeechRecognizer> SpeechRecognizer for Exclusive<T> {
    async fn transcribe(&self, audio_path: &Path, language: &str) -> Result<Vec<Segment>, ProviderError> {
        let guard = self.inner.lock().await;
        guard.transcribe(audio_path, language).await
    }
}

#[async_trait]
impl<T: SpeechSynthesizer> SpeechSynthesizer for Exclusive<T> {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, ProviderError> {
        let guard = self.inner.lock().await;
        guard.synthesize(text).await
    }
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod tts;
pub mod whisper;
