/*!
 * Media collaborator: audio extraction, probing, decoding and final muxing.
 *
 * Everything here shells out to ffmpeg/ffprobe. Each call runs under its own
 * timeout and failures surface as `MediaIoError` with the ffmpeg banner noise
 * stripped from stderr.
 */

use async_trait::async_trait;
use log::{debug, error};
use std::fmt::Debug;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::errors::MediaIoError;

/// Sample rate of the audio handed to speech recognition
pub const RECOGNITION_SAMPLE_RATE: u32 = 16_000;

/// Video/audio operations the pipeline needs
#[async_trait]
pub trait MediaProcessor: Send + Sync + Debug {
    /// Extract the audio track of `video` as mono WAV for recognition
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<(), MediaIoError>;

    /// Duration of `video` in whole milliseconds
    async fn probe_duration_ms(&self, video: &Path) -> Result<u64, MediaIoError>;

    /// Decode any audio file to mono 16-bit PCM WAV at `sample_rate`
    async fn decode_to_wav(&self, input: &Path, output: &Path, sample_rate: u32) -> Result<(), MediaIoError>;

    /// Burn `subtitles` into the picture, keeping the original audio
    async fn burn_subtitles(&self, video: &Path, subtitles: &Path, output: &Path) -> Result<(), MediaIoError>;

    /// Mix `dub` over the attenuated original audio and burn `subtitles` in
    async fn mux_dub(&self, video: &Path, dub: &Path, subtitles: &Path, output: &Path) -> Result<(), MediaIoError>;
}

/// Run `program` with `args`, failing after `timeout_secs`.
///
/// A non-zero exit status is reported with filtered stderr.
pub async fn run_tool(program: &str, args: &[String], timeout_secs: u64) -> Result<Output, MediaIoError> {
    debug!("Running {} {}", program, args.join(" "));

    let future = Command::new(program).args(args).kill_on_drop(true).output();

    let output = tokio::select! {
        result = future => {
            result.map_err(|e| MediaIoError::Spawn {
                program: program.to_string(),
                message: e.to_string(),
            })?
        },
        _ = tokio::time::sleep(Duration::from_secs(timeout_secs)) => {
            return Err(MediaIoError::Timeout {
                program: program.to_string(),
                secs: timeout_secs,
            });
        }
    };

    if !output.status.success() {
        let stderr = filter_ffmpeg_stderr(&String::from_utf8_lossy(&output.stderr));
        error!("{} failed: {}", program, stderr);
        return Err(MediaIoError::Failed {
            program: program.to_string(),
            code: output.status.code(),
            stderr,
        });
    }

    Ok(output)
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "libav",
        "libsw",
        "libpostproc",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "title",
        "encoder",
        "handler_name",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !noise_prefixes.iter().any(|p| trimmed.starts_with(p))
        })
        .collect();

    if meaningful.is_empty() {
        "unknown error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}

/// Quote a file path for use inside the `subtitles=` filter
pub fn escape_filter_path(path: &Path) -> String {
    let escaped = path
        .to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "'\\''");
    format!("'{}'", escaped)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `MediaProcessor` backed by the ffmpeg and ffprobe executables
#[derive(Debug, Clone)]
pub struct FfmpegMedia {
    ffmpeg: String,
    ffprobe: String,
    original_volume: f32,
    timeout_secs: u64,
}

impl FfmpegMedia {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>, original_volume: f32, timeout_secs: u64) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            original_volume,
            timeout_secs,
        }
    }

    async fn ffmpeg(&self, args: Vec<String>) -> Result<(), MediaIoError> {
        let mut full = vec!["-y".to_string(), "-hide_banner".to_string()];
        full.extend(args);
        run_tool(&self.ffmpeg, &full, self.timeout_secs).await?;
        Ok(())
    }

    /// Filter graph for dub mode: quiet original, dub on top, subtitles burned in
    pub fn dub_filter_graph(&self, subtitles: &Path) -> String {
        format!(
            "[0:a]volume={}[original];[original][1:a]amix=inputs=2:duration=longest[audio];[0:v]subtitles={}[video]",
            self.original_volume,
            escape_filter_path(subtitles)
        )
    }
}

impl Default for FfmpegMedia {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe", 0.1, 1800)
    }
}

#[async_trait]
impl MediaProcessor for FfmpegMedia {
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<(), MediaIoError> {
        self.ffmpeg(vec![
            "-i".into(), path_arg(video),
            "-vn".into(),
            "-ac".into(), "1".into(),
            "-ar".into(), RECOGNITION_SAMPLE_RATE.to_string(),
            "-c:a".into(), "pcm_s16le".into(),
            path_arg(output),
        ])
        .await
    }

    async fn probe_duration_ms(&self, video: &Path) -> Result<u64, MediaIoError> {
        let args = vec![
            "-v".to_string(), "error".to_string(),
            "-show_entries".to_string(), "format=duration".to_string(),
            "-of".to_string(), "default=noprint_wrappers=1:nokey=1".to_string(),
            path_arg(video),
        ];
        let output = run_tool(&self.ffprobe, &args, self.timeout_secs).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        let seconds: f64 = stdout.trim().parse().map_err(|_| MediaIoError::BadOutput {
            program: self.ffprobe.clone(),
            message: format!("Not a duration: '{}'", stdout.trim()),
        })?;

        if !seconds.is_finite() || seconds < 0.0 {
            return Err(MediaIoError::BadOutput {
                program: self.ffprobe.clone(),
                message: format!("Invalid duration {}", seconds),
            });
        }

        Ok((seconds * 1000.0).round() as u64)
    }

    async fn decode_to_wav(&self, input: &Path, output: &Path, sample_rate: u32) -> Result<(), MediaIoError> {
        self.ffmpeg(vec![
            "-i".into(), path_arg(input),
            "-ac".into(), "1".into(),
            "-ar".into(), sample_rate.to_string(),
            "-c:a".into(), "pcm_s16le".into(),
            path_arg(output),
        ])
        .await
    }

    async fn burn_subtitles(&self, video: &Path, subtitles: &Path, output: &Path) -> Result<(), MediaIoError> {
        self.ffmpeg(vec![
            "-i".into(), path_arg(video),
            "-vf".into(), format!("subtitles={}", escape_filter_path(subtitles)),
            "-c:v".into(), "libx264".into(),
            "-c:a".into(), "copy".into(),
            path_arg(output),
        ])
        .await
    }

    async fn mux_dub(&self, video: &Path, dub: &Path, subtitles: &Path, output: &Path) -> Result<(), MediaIoError> {
        self.ffmpeg(vec![
            "-i".into(), path_arg(video),
            "-i".into(), path_arg(dub),
            "-filter_complex".into(), self.dub_filter_graph(subtitles),
            "-map".into(), "[video]".into(),
            "-map".into(), "[audio]".into(),
            "-c:v".into(), "libx264".into(),
            "-c:a".into(), "aac".into(),
            path_arg(output),
        ])
        .await
    }
}
