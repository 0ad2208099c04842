/*!
 * Timeline reconciliation for raw recognition output.
 *
 * Recognition segments arrive roughly ordered but with the usual defects:
 * silent entries, overlapping spans, inverted or near-zero durations. The
 * reconciler repairs them with fixed, deterministic rules:
 * - blank entries are dropped
 * - segments are stably sorted by start
 * - an end before its start is inferred from the next later start
 * - overlaps are clipped at the later segment's start
 * - short segments are grown to the minimum duration inside the gap around
 *   them, or merged into a neighbour when the gap is too small
 *
 * Growing a short segment first moves its end towards the next start. When
 * that gap is not enough, its start also moves back towards the previous
 * end, so a segment's start may end up earlier than recognized.
 */

use log::{debug, info};

use crate::errors::ValidationError;
use crate::segment::{Segment, Timeline};

/// Default minimum caption duration in milliseconds
pub const DEFAULT_MIN_DURATION_MS: u64 = 500;

/// Configuration for timeline reconciliation
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Minimum duration any reconciled segment may have
    pub min_duration_ms: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: DEFAULT_MIN_DURATION_MS,
        }
    }
}

/// Counts of the repairs applied during one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Segments dropped because their text was blank
    pub dropped_empty: usize,
    /// Inverted segments whose end was inferred
    pub inferred_ends: usize,
    /// Segments whose end was clipped to remove an overlap
    pub clipped_overlaps: usize,
    /// Segments grown to reach the minimum duration
    pub extended: usize,
    /// Segments folded into a neighbour
    pub merged: usize,
}

impl ReconcileReport {
    pub fn total_repairs(&self) -> usize {
        self.dropped_empty + self.inferred_ends + self.clipped_overlaps + self.extended + self.merged
    }
}

/// Repairs raw recognition segments into a valid timeline
#[derive(Debug, Clone, Default)]
pub struct TimelineReconciler {
    config: ReconcilerConfig,
}

impl TimelineReconciler {
    /// Create a reconciler with the default minimum duration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reconciler with custom configuration
    pub fn with_config(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Reconcile raw segments into a timeline.
    ///
    /// The input slice is never modified.
    pub fn reconcile(&self, raw: &[Segment]) -> Result<Timeline, ValidationError> {
        self.reconcile_with_report(raw).map(|(timeline, _)| timeline)
    }

    /// Reconcile and also return what was repaired
    pub fn reconcile_with_report(
        &self,
        raw: &[Segment],
    ) -> Result<(Timeline, ReconcileReport), ValidationError> {
        let min = self.config.min_duration_ms;
        if min == 0 {
            return Err(ValidationError::ZeroMinimumDuration);
        }

        let mut report = ReconcileReport::default();

        // (original index, segment) so errors can point back at recognizer output
        let mut indexed: Vec<(usize, Segment)> = Vec::with_capacity(raw.len());
        for (index, segment) in raw.iter().enumerate() {
            let text = segment.source_text.trim();
            if text.is_empty() {
                debug!("Dropping blank segment {} ({}ms-{}ms)", index, segment.start_ms, segment.end_ms);
                report.dropped_empty += 1;
                continue;
            }
            let mut cleaned = segment.clone();
            cleaned.source_text = text.to_string();
            indexed.push((index, cleaned));
        }

        indexed.sort_by_key(|(_, segment)| segment.start_ms);

        Self::infer_inverted_ends(&mut indexed, &mut report)?;

        let mut segments: Vec<Segment> = indexed.into_iter().map(|(_, segment)| segment).collect();
        Self::clip_overlaps(&mut segments, &mut report);
        let reconciled = Self::apply_minimum_duration(segments, min, &mut report);

        if report.total_repairs() > 0 {
            info!(
                "Reconciled {} segments: {} dropped, {} ends inferred, {} overlaps clipped, {} extended, {} merged",
                reconciled.len(),
                report.dropped_empty,
                report.inferred_ends,
                report.clipped_overlaps,
                report.extended,
                report.merged
            );
        }

        Ok((Timeline::new(reconciled), report))
    }

    fn infer_inverted_ends(
        indexed: &mut [(usize, Segment)],
        report: &mut ReconcileReport,
    ) -> Result<(), ValidationError> {
        for i in 0..indexed.len() {
            let (index, start, end) = (indexed[i].0, indexed[i].1.start_ms, indexed[i].1.end_ms);
            if end >= start {
                continue;
            }

            let next_start = indexed[i + 1..]
                .iter()
                .map(|(_, next)| next.start_ms)
                .find(|&next| next > start);

            match next_start {
                Some(inferred) => {
                    debug!("Segment {} ends before it starts, inferring end {}ms", index, inferred);
                    indexed[i].1.end_ms = inferred;
                    report.inferred_ends += 1;
                }
                None => {
                    return Err(ValidationError::UninferableEnd {
                        index,
                        start_ms: start,
                        end_ms: end,
                    });
                }
            }
        }
        Ok(())
    }

    fn clip_overlaps(segments: &mut [Segment], report: &mut ReconcileReport) {
        for i in 0..segments.len().saturating_sub(1) {
            let next_start = segments[i + 1].start_ms;
            if segments[i].end_ms > next_start {
                debug!(
                    "Clipping segment ending at {}ms to next start {}ms",
                    segments[i].end_ms, next_start
                );
                segments[i].end_ms = next_start;
                report.clipped_overlaps += 1;
            }
        }
    }

    // Segments are sorted and non-overlapping on entry, so every segment
    // already fits between the previous end and the next start.
    fn apply_minimum_duration(
        segments: Vec<Segment>,
        min: u64,
        report: &mut ReconcileReport,
    ) -> Vec<Segment> {
        let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
        let mut carry: Option<Segment> = None;

        for i in 0..segments.len() {
            let mut segment = segments[i].clone();
            if let Some(previous) = carry.take() {
                segment.start_ms = previous.start_ms;
                segment.source_text = join_text(&previous.source_text, &segment.source_text);
                segment.target_text = join_optional(&previous.target_text, &segment.target_text);
            }

            if segment.duration_ms() >= min {
                out.push(segment);
                continue;
            }

            let lower = out.last().map_or(0, |previous| previous.end_ms);
            let upper = segments.get(i + 1).map(|next| next.start_ms);

            let wanted_end = segment.start_ms.saturating_add(min);
            let new_end = upper.map_or(wanted_end, |upper| wanted_end.min(upper));
            segment.end_ms = segment.end_ms.max(new_end);

            if segment.duration_ms() < min {
                let wanted_start = segment.end_ms.saturating_sub(min).max(lower);
                segment.start_ms = segment.start_ms.min(wanted_start);
            }

            if segment.duration_ms() >= min {
                debug!("Extended short segment to {}ms-{}ms", segment.start_ms, segment.end_ms);
                report.extended += 1;
                out.push(segment);
                continue;
            }

            report.merged += 1;
            if let Some(previous) = out.last_mut() {
                debug!("No room to extend segment at {}ms, merging into previous", segment.start_ms);
                previous.end_ms = segment.end_ms;
                previous.source_text = join_text(&previous.source_text, &segment.source_text);
                previous.target_text = join_optional(&previous.target_text, &segment.target_text);
            } else {
                debug!("No room to extend segment at {}ms, merging into next", segment.start_ms);
                carry = Some(segment);
            }
        }

        out
    }
}

fn join_text(first: &str, second: &str) -> String {
    format!("{} {}", first, second)
}

fn join_optional(first: &Option<String>, second: &Option<String>) -> Option<String> {
    match (first, second) {
        (Some(a), Some(b)) => Some(join_text(a, b)),
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (None, None) => None,
    }
}

/// Reconcile with the default configuration
pub fn reconcile(raw: &[Segment]) -> Result<Timeline, ValidationError> {
    TimelineReconciler::new().reconcile(raw)
}
