/*!
 * Mock collaborators for testing.
 *
 * - `MockTranslationBackend`: working, failing, intermittent, slow, or
 *   answering with the wrong number of entries
 * - `MockRecognizer`: returns a fixed raw transcript
 * - `MockSynthesizer`: produces silent clips whose length depends on the text
 *
 * Every mock counts its calls; clones share the counters. The recognizer and
 * synthesizer also record the highest number of calls seen in flight at once,
 * which lets tests check that shared handles are serialized.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::dub::AudioClip;
use crate::errors::ProviderError;
use crate::providers::{SpeechRecognizer, SpeechSynthesizer, TranslationBackend};
use crate::segment::Segment;

/// Behavior mode for the mock translation backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with one translation per input
    Working,
    /// Answers every batch with one entry too many
    ExtraEntry,
    /// Answers every batch with its last entry missing
    MissingEntry,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Simulates slow response
    Slow { delay_ms: u64 },
}

/// Mock translation backend
#[derive(Debug, Clone)]
pub struct MockTranslationBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Known translations; unknown texts get a tagged echo
    dictionary: HashMap<String, String>,
    /// Request counter shared by clones
    request_count: Arc<AtomicUsize>,
    /// Size of every batch received, in order
    batch_sizes: Arc<Mutex<Vec<usize>>>,
}

impl MockTranslationBackend {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            dictionary: HashMap::new(),
            request_count: Arc::new(AtomicUsize::new(0)),
            batch_sizes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock backend that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock backend that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create an intermittently failing mock backend
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Use fixed translations for the given source texts
    pub fn with_dictionary<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.dictionary = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Number of batches requested so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Sizes of the batches requested so far
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().map(|sizes| sizes.clone()).unwrap_or_default()
    }

    fn translate_one(&self, text: &str, target_language: &str) -> String {
        self.dictionary
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", target_language, text))
    }
}

#[async_trait]
impl TranslationBackend for MockTranslationBackend {
    async fn translate_batch(
        &self,
        texts: &[String],
        _source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut sizes) = self.batch_sizes.lock() {
            sizes.push(texts.len());
        }

        let translated: Vec<String> = texts.iter().map(|t| self.translate_one(t, target_language)).collect();

        match self.behavior {
            MockBehavior::Working => Ok(translated),

            MockBehavior::ExtraEntry => {
                let mut translated = translated;
                translated.push("[EXTRA]".to_string());
                Ok(translated)
            }

            MockBehavior::MissingEntry => {
                let mut translated = translated;
                translated.pop();
                Ok(translated)
            }

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(translated)
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(translated)
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated connection failure".to_string())),
            _ => Ok(()),
        }
    }
}

// Tracks how many calls are running at the same time.
#[derive(Debug, Default)]
struct CallTracker {
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl CallTracker {
    fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock recognizer returning the same raw transcript for every file
#[derive(Debug, Clone)]
pub struct MockRecognizer {
    segments: Vec<Segment>,
    fail: bool,
    delay_ms: u64,
    tracker: Arc<CallTracker>,
}

impl MockRecognizer {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            fail: false,
            delay_ms: 0,
            tracker: Arc::new(CallTracker::default()),
        }
    }

    /// A recognizer whose every call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    /// Hold each call for `delay_ms` before answering
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn call_count(&self) -> usize {
        self.tracker.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight together
    pub fn max_concurrent_calls(&self) -> usize {
        self.tracker.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn transcribe(&self, _audio_path: &Path, _language: &str) -> Result<Vec<Segment>, ProviderError> {
        self.tracker.enter();
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        self.tracker.exit();

        if self.fail {
            return Err(ProviderError::CommandFailed("Simulated recognition failure".to_string()));
        }
        Ok(self.segments.clone())
    }
}

/// Mock synthesizer producing silent clips.
///
/// Clip length is looked up by text, falling back to a fixed duration per
/// character.
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    sample_rate: u32,
    ms_per_char: u64,
    durations: HashMap<String, u64>,
    fail: bool,
    tracker: Arc<CallTracker>,
}

impl MockSynthesizer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ms_per_char: 100,
            durations: HashMap::new(),
            fail: false,
            tracker: Arc::new(CallTracker::default()),
        }
    }

    /// A synthesizer whose every call fails
    pub fn failing(sample_rate: u32) -> Self {
        Self {
            fail: true,
            ..Self::new(sample_rate)
        }
    }

    /// Fix the clip length for specific texts
    pub fn with_duration(mut self, text: impl Into<String>, duration_ms: u64) -> Self {
        self.durations.insert(text.into(), duration_ms);
        self
    }

    pub fn call_count(&self) -> usize {
        self.tracker.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight together
    pub fn max_concurrent_calls(&self) -> usize {
        self.tracker.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, ProviderError> {
        self.tracker.enter();
        tokio::task::yield_now().await;
        self.tracker.exit();

        if self.fail {
            return Err(ProviderError::CommandFailed("Simulated synthesis failure".to_string()));
        }

        let duration_ms = self
            .durations
            .get(text)
            .copied()
            .unwrap_or(self.ms_per_char * text.chars().count() as u64);
        Ok(AudioClip::silence(duration_ms, self.sample_rate))
    }
}
