use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, PipelineMode, TranslationProvider};
use crate::dub::{AudioClip, DubAligner};
use crate::file_utils::{FileManager, WorkspaceDirs};
use crate::media::{FfmpegMedia, MediaProcessor};
use crate::merger::merge_with_layout;
use crate::providers::anthropic::AnthropicBackend;
use crate::providers::ollama::OllamaBackend;
use crate::providers::tts::CommandSynthesizer;
use crate::providers::whisper::WhisperCli;
use crate::providers::{Exclusive, SpeechRecognizer, SpeechSynthesizer, TranslationBackend};
use crate::reconciler::TimelineReconciler;
use crate::segment::Timeline;
use crate::subtitle_processor::write_srt_file;
use crate::translation::TranslatorAdapter;

// @module: Per-video pipeline and batch processing

/// External services a pipeline calls into
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub backend: Arc<dyn TranslationBackend>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub media: Arc<dyn MediaProcessor>,
}

impl Collaborators {
    /// Build the command-line and HTTP collaborators described by `config`.
    ///
    /// Recognition and synthesis handles are shared by every video in a batch
    /// and are serialized through `Exclusive`.
    pub fn from_config(config: &Config) -> Self {
        let media: Arc<dyn MediaProcessor> = Arc::new(FfmpegMedia::new(
            config.media.ffmpeg.clone(),
            config.media.ffprobe.clone(),
            config.media.original_volume,
            config.media.timeout_secs,
        ));

        let recognizer = Arc::new(Exclusive::new(WhisperCli::new(
            config.recognition.program.clone(),
            config.pipeline.whisper_model.as_str(),
            config.recognition.timeout_secs,
        )));

        let translation = &config.translation;
        let backend: Arc<dyn TranslationBackend> = match translation.provider {
            TranslationProvider::Ollama => Arc::new(
                OllamaBackend::new(&translation.get_endpoint(), translation.get_model(), translation.timeout_secs)
                    .with_temperature(translation.temperature)
                    .with_system_prompt(translation.system_prompt.clone()),
            ),
            TranslationProvider::Anthropic => Arc::new(
                AnthropicBackend::new(
                    translation.api_key.clone(),
                    translation.get_endpoint(),
                    translation.get_model(),
                    translation.timeout_secs,
                )
                .with_temperature(translation.temperature)
                .with_system_prompt(translation.system_prompt.clone()),
            ),
        };

        let synthesizer = Arc::new(Exclusive::new(CommandSynthesizer::new(
            config.synthesis.program.clone(),
            config.synthesis.voice.clone(),
            config.synthesis.sample_rate,
            config.synthesis.timeout_secs,
            Arc::clone(&media),
        )));

        Self {
            recognizer,
            backend,
            synthesizer,
            media,
        }
    }
}

// @struct: Files produced for one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoOutcome {
    // @field: Input video
    pub video: PathBuf,
    // @field: Bilingual SRT
    pub subtitle_path: PathBuf,
    // @field: Final video
    pub video_path: PathBuf,
    // @field: Dub track, dub mode only
    pub dub_track_path: Option<PathBuf>,
    // @field: Captions in the SRT
    pub segment_count: usize,
}

// @struct: One video that could not be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFailure {
    pub name: String,
    pub error: String,
}

// @struct: Result of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    // @field: Names of the videos that completed
    pub processed: Vec<String>,
    // @field: Videos that failed, with their error
    pub failed: Vec<VideoFailure>,
    // @field: Human-readable summary
    pub message: String,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

// @struct: Contents of the input folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputListing {
    pub input_dir: PathBuf,
    pub videos: Vec<String>,
}

/// Runs the recognize, reconcile, translate, merge and output stages for
/// each video.
pub struct Pipeline {
    // @field: App configuration
    config: Config,
    // @field: Input and output folders
    workspace: WorkspaceDirs,
    // @field: External services
    collaborators: Collaborators,
    // @field: Progress bars of concurrently running videos
    multi_progress: MultiProgress,
}

impl Pipeline {
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let workspace = WorkspaceDirs::new(
            &config.workspace.root,
            &config.workspace.video_input,
            &config.workspace.video_output,
            &config.workspace.srt_output,
        );
        Self {
            config,
            workspace,
            collaborators,
            multi_progress: MultiProgress::new(),
        }
    }

    /// Pipeline with the real collaborators described by `config`
    pub fn from_config(config: Config) -> Self {
        let collaborators = Collaborators::from_config(&config);
        Self::new(config, collaborators)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workspace(&self) -> &WorkspaceDirs {
        &self.workspace
    }

    /// Warn early when the translation backend cannot be reached
    pub async fn check_backend(&self) {
        if let Err(e) = self.collaborators.backend.test_connection().await {
            warn!(
                "{} backend is not reachable: {}",
                self.config.translation.provider.display_name(),
                e
            );
        }
    }

    /// List the videos waiting in the input folder
    pub fn list_input_videos(&self) -> Result<InputListing> {
        self.workspace.ensure_directories()?;
        let videos = self
            .workspace
            .input_videos()?
            .iter()
            .map(|path| display_name(path))
            .collect();

        Ok(InputListing {
            input_dir: self.workspace.video_input.clone(),
            videos,
        })
    }

    /// Process one video from the input folder by file name
    pub async fn translate_one(&self, name: &str) -> Result<VideoOutcome> {
        self.workspace.ensure_directories()?;
        let video = self.workspace.video_input.join(name);

        if !FileManager::file_exists(&video) {
            return Err(anyhow!(
                "Video not found: {} (expected in {})",
                name,
                self.workspace.video_input.display()
            ));
        }
        if !FileManager::is_supported_video(&video) {
            return Err(anyhow!("Unsupported video format: {}", name));
        }

        self.process_video(&video).await
    }

    /// Process every video in the input folder.
    ///
    /// At most `concurrent_videos` pipelines run at once. A failing video is
    /// recorded in the report and does not stop the others.
    pub async fn translate_all(&self) -> Result<BatchReport> {
        let start_time = Instant::now();
        self.workspace.ensure_directories()?;
        let videos = self.workspace.input_videos()?;

        if videos.is_empty() {
            let message = format!(
                "No videos found in {}. Supported formats: {}",
                self.workspace.video_input.display(),
                crate::file_utils::VIDEO_EXTENSIONS.join(", ")
            );
            warn!("{}", message);
            return Ok(BatchReport {
                message,
                ..BatchReport::default()
            });
        }

        let folder_pb = self.multi_progress.add(ProgressBar::new(videos.len() as u64));
        folder_pb.set_style(progress_style("videos"));
        folder_pb.set_message("Processing videos");

        let results: Vec<(String, Result<VideoOutcome>)> = stream::iter(videos)
            .map(|video| {
                let folder_pb = folder_pb.clone();
                async move {
                    let name = display_name(&video);
                    let result = self.process_video(&video).await;
                    folder_pb.inc(1);
                    (name, result)
                }
            })
            .buffer_unordered(self.config.pipeline.concurrent_videos.max(1))
            .collect()
            .await;

        folder_pb.finish_with_message("Batch complete");

        let mut report = BatchReport::default();
        for (name, result) in results {
            match result {
                Ok(_) => report.processed.push(name),
                Err(e) => {
                    error!("Error processing {}: {:#}", name, e);
                    report.failed.push(VideoFailure {
                        name,
                        error: format!("{:#}", e),
                    });
                }
            }
        }
        report.processed.sort();
        report.failed.sort_by(|a, b| a.name.cmp(&b.name));

        report.message = format!(
            "Batch completed in {}: {} processed, {} failed",
            format_duration(start_time.elapsed()),
            report.processed.len(),
            report.failed.len()
        );
        info!("{}", report.message);

        Ok(report)
    }

    /// Run every stage for one video and write its outputs
    pub async fn process_video(&self, video: &Path) -> Result<VideoOutcome> {
        let start_time = Instant::now();
        let name = display_name(video);

        if !video.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", video));
        }
        info!("Processing {}", name);

        let work_dir = tempfile::tempdir().context("Failed to create working directory")?;
        let audio_path = work_dir.path().join("audio.wav");
        let media = &self.collaborators.media;

        media
            .extract_audio(video, &audio_path)
            .await
            .with_context(|| format!("Failed to extract audio from {}", name))?;

        let language = self.config.recognition_language()?;
        let raw = self
            .collaborators
            .recognizer
            .transcribe(&audio_path, &language)
            .await
            .with_context(|| format!("Speech recognition failed for {}", name))?;

        let reconciler = TimelineReconciler::with_config(self.config.timeline.reconciler_config());
        let (timeline, report) = reconciler.reconcile_with_report(&raw)?;
        debug!("{}: {} raw segments, {} repairs", name, raw.len(), report.total_repairs());
        if timeline.is_empty() {
            warn!("No speech recognized in {}", name);
        }

        let translator = TranslatorAdapter::new(Arc::clone(&self.collaborators.backend))
            .with_batch_size(self.config.translation.batch_size);
        let translated = translator
            .translate(&timeline, &self.config.source_language, &self.config.target_language)
            .await
            .with_context(|| format!("Translation failed for {}", name))?;

        let entries = merge_with_layout(&translated, self.config.pipeline.layout);
        let subtitle_path = self.workspace.subtitle_output_path(video);
        write_srt_file(&entries, &subtitle_path)?;
        info!("Subtitles written to {}", subtitle_path.display());

        let video_path = self.workspace.video_output_path(video);
        let dub_track_path = match self.config.pipeline.mode {
            PipelineMode::Subs => {
                media
                    .burn_subtitles(video, &subtitle_path, &video_path)
                    .await
                    .with_context(|| format!("Failed to burn subtitles into {}", name))?;
                None
            }
            PipelineMode::Dub => {
                let dub_path = self.workspace.dub_track_path(video);
                self.render_dub(video, &translated, &dub_path).await?;
                media
                    .mux_dub(video, &dub_path, &subtitle_path, &video_path)
                    .await
                    .with_context(|| format!("Failed to mux dub into {}", name))?;
                Some(dub_path)
            }
        };

        info!("Success: {} ({})", video_path.display(), format_duration(start_time.elapsed()));

        Ok(VideoOutcome {
            video: video.to_path_buf(),
            subtitle_path,
            video_path,
            dub_track_path,
            segment_count: entries.len(),
        })
    }

    /// Synthesize every caption and write the aligned track to `dub_path`
    async fn render_dub(&self, video: &Path, timeline: &Timeline, dub_path: &Path) -> Result<()> {
        let sample_rate = self.config.synthesis.sample_rate;
        let progress_bar = self.multi_progress.add(ProgressBar::new(timeline.len() as u64));
        progress_bar.set_style(progress_style("clips"));
        progress_bar.set_message(format!("Synthesizing {}", display_name(video)));

        let mut clips = HashMap::with_capacity(timeline.len());
        for (index, segment) in timeline.iter().enumerate() {
            let text = segment.target_text.as_deref().unwrap_or_default().trim();
            let clip = if text.is_empty() {
                AudioClip::new(Vec::new(), sample_rate)
            } else {
                self.collaborators
                    .synthesizer
                    .synthesize(text)
                    .await
                    .with_context(|| format!("Speech synthesis failed for segment {}", index))?
            };
            clips.insert(index, clip);
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();

        let video_duration_ms = self
            .collaborators
            .media
            .probe_duration_ms(video)
            .await
            .with_context(|| format!("Failed to read duration of {}", display_name(video)))?;

        let track = DubAligner::new(sample_rate).align(timeline, clips, video_duration_ms)?;
        if track.truncated_count() > 0 {
            debug!("{} dub clips cut at the next caption", track.truncated_count());
        }
        track.write_wav(dub_path)?;
        Ok(())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn progress_style(unit: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
            unit
        ))
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░")
}

// Format duration in a human-readable format
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}
