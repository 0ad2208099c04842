/*!
 * Translator adapter: fills the target text of every segment in a timeline.
 *
 * Texts are sent to the backend in fixed-size batches, strictly in order and
 * one batch at a time. The result is all or nothing: a failed batch or a
 * batch answered with the wrong number of strings fails the whole call and
 * the caller's timeline is left untouched.
 */

use log::{debug, info};
use std::sync::Arc;

use crate::errors::TranslationError;
use crate::providers::TranslationBackend;
use crate::segment::Timeline;

/// Default number of texts sent per backend call
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Maps source-text segments to target-text segments
#[derive(Debug, Clone)]
pub struct TranslatorAdapter {
    /// The backend doing the actual translation
    backend: Arc<dyn TranslationBackend>,

    /// Number of texts per backend call
    batch_size: usize,
}

impl TranslatorAdapter {
    pub fn new(backend: Arc<dyn TranslationBackend>) -> Self {
        Self {
            backend,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Translate every segment of `timeline`.
    ///
    /// Returns a new timeline of the same length with `target_text` set on
    /// every segment.
    pub async fn translate(
        &self,
        timeline: &Timeline,
        source_language: &str,
        target_language: &str,
    ) -> Result<Timeline, TranslationError> {
        if self.batch_size == 0 {
            return Err(TranslationError::ZeroBatchSize);
        }

        if let Some(index) = timeline.iter().position(|s| s.source_text.trim().is_empty()) {
            return Err(TranslationError::EmptyInput { index });
        }

        let texts = timeline.source_texts();
        let total_batches = texts.len().div_ceil(self.batch_size);
        let mut translations: Vec<String> = Vec::with_capacity(texts.len());

        for (batch_index, batch) in texts.chunks(self.batch_size).enumerate() {
            debug!(
                "Translating batch {}/{} ({} texts)",
                batch_index + 1,
                total_batches,
                batch.len()
            );

            let translated = self
                .backend
                .translate_batch(batch, source_language, target_language)
                .await?;

            if translated.len() != batch.len() {
                return Err(TranslationError::CountMismatch {
                    batch: batch_index,
                    submitted: batch.len(),
                    received: translated.len(),
                });
            }

            translations.extend(translated.into_iter().map(|text| text.trim().to_string()));
        }

        let segments = timeline
            .iter()
            .cloned()
            .zip(translations)
            .map(|(segment, target)| segment.with_target(target))
            .collect();

        info!(
            "Translated {} segments from {} to {} in {} batches",
            timeline.len(),
            source_language,
            target_language,
            total_batches
        );

        Ok(Timeline::new(segments))
    }
}
