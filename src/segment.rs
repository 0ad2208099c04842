use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

// @module: Timed speech segments and per-video timelines

// @struct: One timed span of recognized speech
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Recognized source-language text
    pub source_text: String,

    // @field: Translated text, filled by the translator
    #[serde(default)]
    pub target_text: Option<String>,
}

impl Segment {
    pub fn new(start_ms: u64, end_ms: u64, source_text: impl Into<String>) -> Self {
        Segment {
            start_ms,
            end_ms,
            source_text: source_text.into(),
            target_text: None,
        }
    }

    /// Build a segment from recognizer output expressed in seconds.
    ///
    /// `index` is the position in the recognizer output and only used for
    /// error reporting. Negative or non-finite values are rejected; an end
    /// before start is kept as-is for the reconciler to repair.
    pub fn from_seconds(
        index: usize,
        start_secs: f64,
        end_secs: f64,
        text: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let start_ms = seconds_to_ms(index, start_secs)?;
        let end_ms = seconds_to_ms(index, end_secs)?;
        Ok(Self::new(start_ms, end_ms, text))
    }

    /// Attach a translation
    pub fn with_target(mut self, target_text: impl Into<String>) -> Self {
        self.target_text = Some(target_text.into());
        self
    }

    /// Duration in ms, zero for degenerate or inverted spans
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn is_translated(&self) -> bool {
        self.target_text.is_some()
    }
}

fn seconds_to_ms(index: usize, value: f64) -> Result<u64, ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidTimestamp { index, value });
    }
    Ok((value * 1000.0).round() as u64)
}

/// Ordered sequence of segments for one video.
///
/// A timeline returned by the reconciler has non-decreasing starts, no
/// overlaps and strictly positive durations. Later stages never mutate a
/// timeline in place; they build a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    segments: Vec<Segment>,
}

impl Timeline {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// End of the last segment, zero for an empty timeline
    pub fn end_ms(&self) -> u64 {
        self.segments.iter().map(|s| s.end_ms).max().unwrap_or(0)
    }

    /// Source texts in timeline order
    pub fn source_texts(&self) -> Vec<String> {
        self.segments.iter().map(|s| s.source_text.clone()).collect()
    }

    /// True when every segment carries a translation
    pub fn is_fully_translated(&self) -> bool {
        self.segments.iter().all(Segment::is_translated)
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
