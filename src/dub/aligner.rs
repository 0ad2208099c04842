/*!
 * Dub aligner: lays one synthesized clip per segment onto a silent track.
 *
 * Every clip starts exactly at its segment's start. A clip may run past its
 * own segment's end but never past the next segment's start, where it is cut
 * off. Clips shorter than their slot are followed by silence; nothing is
 * stretched or resampled. The finished track is exactly as long as the video.
 */

use log::{debug, warn};
use std::collections::HashMap;

use crate::dub::audio::{ms_to_samples, AudioClip, ClipPlacement, DubTrack};
use crate::errors::AlignmentError;
use crate::segment::Timeline;

/// Builds full-length dub tracks at a fixed sample rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DubAligner {
    sample_rate: u32,
}

impl DubAligner {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Place `clips` (keyed by segment index) on a track spanning `video_duration_ms`.
    ///
    /// Every segment must have a clip recorded at this aligner's sample rate.
    /// Nothing is rendered unless all clips pass that check.
    pub fn align(
        &self,
        timeline: &Timeline,
        mut clips: HashMap<usize, AudioClip>,
        video_duration_ms: u64,
    ) -> Result<DubTrack, AlignmentError> {
        if self.sample_rate == 0 {
            return Err(AlignmentError::ZeroSampleRate);
        }

        for index in 0..timeline.len() {
            let clip = clips.get(&index).ok_or(AlignmentError::MissingClip { index })?;
            if clip.sample_rate() != self.sample_rate {
                return Err(AlignmentError::SampleRateMismatch {
                    index,
                    clip_rate: clip.sample_rate(),
                    track_rate: self.sample_rate,
                });
            }
        }

        let extra = clips.keys().filter(|index| **index >= timeline.len()).count();
        if extra > 0 {
            warn!("Ignoring {} clips with no matching segment", extra);
        }

        let mut track = DubTrack::silent(video_duration_ms, self.sample_rate);
        let segments = timeline.segments();

        for (index, segment) in segments.iter().enumerate() {
            let Some(clip) = clips.remove(&index) else {
                continue;
            };

            let offset_ms = segment.start_ms;
            let boundary_ms = segments
                .get(index + 1)
                .map_or(video_duration_ms, |next| next.start_ms.min(video_duration_ms));

            let native_ms = clip.duration_ms();
            let slot_ms = boundary_ms.saturating_sub(offset_ms);

            let start_sample = ms_to_samples(offset_ms, self.sample_rate);
            let slot_samples = ms_to_samples(boundary_ms, self.sample_rate).saturating_sub(start_sample);
            let placed_samples = clip.samples().len().min(slot_samples);
            let truncated = placed_samples < clip.samples().len();

            if offset_ms >= video_duration_ms {
                warn!(
                    "Segment {} starts at {} ms, after the video ends at {} ms; clip dropped",
                    index, offset_ms, video_duration_ms
                );
            } else if truncated {
                debug!(
                    "Clip {} truncated from {} ms to {} ms",
                    index, native_ms, slot_ms
                );
            }

            let placement = ClipPlacement {
                segment_index: index,
                offset_ms,
                native_duration_ms: native_ms,
                placed_duration_ms: native_ms.min(slot_ms),
                truncated,
            };
            track.place(placement, start_sample, &clip.samples()[..placed_samples]);
        }

        debug!(
            "Aligned {} clips onto a {} ms track ({} truncated)",
            track.placements().len(),
            track.duration_ms(),
            track.truncated_count()
        );

        Ok(track)
    }
}

/// Align `clips` onto a `video_duration_ms` track at `sample_rate`
pub fn align(
    timeline: &Timeline,
    clips: HashMap<usize, AudioClip>,
    video_duration_ms: u64,
    sample_rate: u32,
) -> Result<DubTrack, AlignmentError> {
    DubAligner::new(sample_rate).align(timeline, clips, video_duration_ms)
}
