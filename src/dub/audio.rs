use std::path::Path;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::errors::MediaIoError;

// @module: Mono PCM clips and full-length dub tracks

/// Convert a duration in ms to a sample count at `sample_rate`
pub fn ms_to_samples(ms: u64, sample_rate: u32) -> usize {
    (ms as u128 * sample_rate as u128 / 1000) as usize
}

/// Convert a sample count at `sample_rate` to whole milliseconds
pub fn samples_to_ms(samples: usize, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    (samples as u128 * 1000 / sample_rate as u128) as u64
}

// @struct: Synthesized speech for one segment
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    // @field: Mono samples in [-1.0, 1.0]
    samples: Vec<f32>,

    // @field: Samples per second
    sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// A clip of digital silence, mostly useful in tests
    pub fn silence(duration_ms: u64, sample_rate: u32) -> Self {
        Self::new(vec![0.0; ms_to_samples(duration_ms, sample_rate)], sample_rate)
    }

    /// Load a WAV file, mixing all channels down to mono
    pub fn from_wav_file(path: &Path) -> Result<Self, MediaIoError> {
        let mut reader = WavReader::open(path)
            .map_err(|e| MediaIoError::Audio(format!("Failed to open {}: {}", path.display(), e)))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| MediaIoError::Audio(format!("Failed to read {}: {}", path.display(), e)))?,
            SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| MediaIoError::Audio(format!("Failed to read {}: {}", path.display(), e)))?
            }
        };

        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        Ok(Self::new(samples, spec.sample_rate))
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Native duration of the clip in ms
    pub fn duration_ms(&self) -> u64 {
        samples_to_ms(self.samples.len(), self.sample_rate)
    }
}

// @struct: Where one clip ended up on the track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipPlacement {
    // @field: Segment position in the timeline
    pub segment_index: usize,

    // @field: Offset from track start in ms
    pub offset_ms: u64,

    // @field: Duration of the clip as synthesized
    pub native_duration_ms: u64,

    // @field: Duration actually placed on the track
    pub placed_duration_ms: u64,

    // @field: Whether the clip was cut at the next clip's start
    pub truncated: bool,
}

/// A continuous mono track spanning the whole video.
///
/// Gaps without speech are silence. The sample count always corresponds to
/// `duration_ms` at `sample_rate`.
#[derive(Debug, Clone, PartialEq)]
pub struct DubTrack {
    samples: Vec<f32>,
    sample_rate: u32,
    duration_ms: u64,
    placements: Vec<ClipPlacement>,
}

impl DubTrack {
    /// A silent track of the given length
    pub fn silent(duration_ms: u64, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; ms_to_samples(duration_ms, sample_rate)],
            sample_rate,
            duration_ms,
            placements: Vec::new(),
        }
    }

    /// Copy `samples` onto the track starting at `start_sample`
    pub(crate) fn place(&mut self, placement: ClipPlacement, start_sample: usize, samples: &[f32]) {
        let end = (start_sample + samples.len()).min(self.samples.len());
        if start_sample < end {
            self.samples[start_sample..end].copy_from_slice(&samples[..end - start_sample]);
        }
        self.placements.push(placement);
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Track length in ms, equal to the video duration it was built for
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn placements(&self) -> &[ClipPlacement] {
        &self.placements
    }

    /// Number of clips cut short at the next clip's start
    pub fn truncated_count(&self) -> usize {
        self.placements.iter().filter(|p| p.truncated).count()
    }

    /// Write the track as 16-bit mono PCM WAV
    pub fn write_wav(&self, path: &Path) -> Result<(), MediaIoError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MediaIoError::Audio(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)
            .map_err(|e| MediaIoError::Audio(format!("Failed to create {}: {}", path.display(), e)))?;

        for sample in &self.samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(value)
                .map_err(|e| MediaIoError::Audio(format!("Failed to write {}: {}", path.display(), e)))?;
        }

        writer
            .finalize()
            .map_err(|e| MediaIoError::Audio(format!("Failed to finalize {}: {}", path.display(), e)))
    }
}
