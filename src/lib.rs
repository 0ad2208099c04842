/*!
 * # dualsub - bilingual subtitles and dubbing for videos
 *
 * A Rust library that turns a video with speech in one language into a video
 * with bilingual burned-in captions and, optionally, a dubbed audio track.
 *
 * ## Pipeline
 *
 * recognize speech -> reconcile the timeline -> translate in batches ->
 * merge bilingual captions -> write SRT -> burn subtitles, or synthesize and
 * align a dub track and mux it under the captions.
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `segment`: timed segments and timelines
 * - `reconciler`: repairs raw recognizer output into a valid timeline
 * - `translation`: translator adapter and LLM batch markers
 * - `merger`: bilingual caption blocks
 * - `subtitle_processor`: SRT encoding and parsing
 * - `dub`: audio clips, dub tracks and the aligner
 * - `providers`: recognition, translation and synthesis collaborators:
 *   - `providers::ollama`: Ollama API backend
 *   - `providers::anthropic`: Anthropic API backend
 *   - `providers::whisper`: Whisper command-line recognizer
 *   - `providers::tts`: command-line speech synthesizer
 *   - `providers::mock`: deterministic collaborators for tests
 * - `media`: ffmpeg/ffprobe operations
 * - `file_utils`: workspace folders and video discovery
 * - `app_config`: configuration management
 * - `app_controller`: per-video pipeline and batch runs
 * - `language_utils`: ISO language code utilities
 * - `errors`: error types for each stage
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod dub;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod media;
pub mod merger;
pub mod providers;
pub mod reconciler;
pub mod segment;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{BatchReport, Collaborators, Pipeline, VideoOutcome};
pub use dub::{align, AudioClip, DubAligner, DubTrack};
pub use errors::{AlignmentError, AppError, MediaIoError, ProviderError, SubtitleError, TranslationError, ValidationError};
pub use merger::{merge, merge_with_layout, CaptionLayout};
pub use reconciler::{reconcile, TimelineReconciler};
pub use segment::{Segment, Timeline};
pub use subtitle_processor::CaptionEntry;
pub use translation::TranslatorAdapter;
