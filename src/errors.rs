/*!
 * Error types for the dualsub pipeline.
 *
 * Each pipeline stage owns one error enum so that a failure names the stage
 * that produced it. Stages fail whole: none of these errors ever travels
 * alongside a partially built timeline or track.
 */

use thiserror::Error;

/// Unrecoverable timing corruption found while reconciling recognition output
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A timestamp was negative, NaN or infinite
    #[error("Segment {index} has an invalid timestamp: {value}")]
    InvalidTimestamp {
        /// Position of the segment in the recognition output
        index: usize,
        /// The offending value in seconds
        value: f64,
    },

    /// End precedes start and no following segment allows inferring a new end
    #[error("Segment {index} ends before it starts ({start_ms}ms > {end_ms}ms) and its end cannot be inferred")]
    UninferableEnd {
        index: usize,
        start_ms: u64,
        end_ms: u64,
    },

    /// The minimum caption duration must be positive
    #[error("Minimum caption duration must be greater than zero")]
    ZeroMinimumDuration,
}

/// Errors that can occur when talking to an external collaborator
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A local collaborator process failed
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The backend answered with a different number of strings than submitted
    #[error("Translation count mismatch in batch {batch}: submitted {submitted}, received {received}")]
    CountMismatch {
        batch: usize,
        submitted: usize,
        received: usize,
    },

    /// A segment with no source text reached the translator
    #[error("Segment {index} has empty source text")]
    EmptyInput { index: usize },

    /// Batch size of zero cannot make progress
    #[error("Translation batch size must be greater than zero")]
    ZeroBatchSize,
}

/// Errors that can occur while building a dub track
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignmentError {
    /// No synthesized clip was supplied for a segment
    #[error("No audio clip for segment {index}")]
    MissingClip { index: usize },

    /// A clip was rendered at a different rate than the track
    #[error("Clip for segment {index} has sample rate {clip_rate} Hz, track expects {track_rate} Hz")]
    SampleRateMismatch {
        index: usize,
        clip_rate: u32,
        track_rate: u32,
    },

    /// The track sample rate must be positive
    #[error("Track sample rate must be greater than zero")]
    ZeroSampleRate,
}

/// Failure of an external media step (extraction, burn-in, muxing)
#[derive(Error, Debug)]
pub enum MediaIoError {
    /// The media tool could not be launched
    #[error("Failed to execute {program}: {message}")]
    Spawn { program: String, message: String },

    /// The media tool exited with a failure status
    #[error("{program} failed (exit {code:?}): {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The media tool did not finish in time
    #[error("{program} timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },

    /// Output of the media tool could not be interpreted
    #[error("Unexpected output from {program}: {message}")]
    BadOutput { program: String, message: String },

    /// Reading or writing an audio file failed
    #[error("Audio file error: {0}")]
    Audio(String),
}

/// Errors that can occur while reading subtitle files
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// A block did not have the expected shape
    #[error("Malformed subtitle block at line {line}: {message}")]
    MalformedBlock { line: usize, message: String },

    /// A timestamp could not be parsed
    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from timeline validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from dub alignment
    #[error("Alignment error: {0}")]
    Alignment(#[from] AlignmentError),

    /// Error from a media step
    #[error("Media error: {0}")]
    Media(#[from] MediaIoError),

    /// Error from subtitle parsing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
