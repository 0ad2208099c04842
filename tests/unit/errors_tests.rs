/*!
 * Tests for error types and conversions
 */

use dualsub::errors::{
    AlignmentError, AppError, MediaIoError, ProviderError, SubtitleError, TranslationError, ValidationError,
};

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 429,
        message: "Too many requests".to_string(),
    };
    let display = error.to_string();
    assert!(display.contains("429"));
    assert!(display.contains("Too many requests"));
}

#[test]
fn test_translationError_countMismatch_shouldNameBatchAndCounts() {
    let error = TranslationError::CountMismatch {
        batch: 2,
        submitted: 8,
        received: 9,
    };
    assert_eq!(
        error.to_string(),
        "Translation count mismatch in batch 2: submitted 8, received 9"
    );
}

#[test]
fn test_translationError_fromProviderError_shouldWrapIt() {
    let error: TranslationError = ProviderError::ConnectionError("refused".to_string()).into();
    assert!(matches!(error, TranslationError::Provider(ProviderError::ConnectionError(_))));
    assert!(error.to_string().contains("refused"));
}

#[test]
fn test_validationError_uninferableEnd_shouldShowTimes() {
    let error = ValidationError::UninferableEnd {
        index: 4,
        start_ms: 1500,
        end_ms: 1200,
    };
    let display = error.to_string();
    assert!(display.contains("Segment 4"));
    assert!(display.contains("1500ms > 1200ms"));
}

#[test]
fn test_alignmentError_sampleRateMismatch_shouldShowBothRates() {
    let error = AlignmentError::SampleRateMismatch {
        index: 1,
        clip_rate: 22_050,
        track_rate: 24_000,
    };
    let display = error.to_string();
    assert!(display.contains("22050 Hz"));
    assert!(display.contains("24000 Hz"));
}

#[test]
fn test_mediaIoError_failed_shouldShowProgramAndStderr() {
    let error = MediaIoError::Failed {
        program: "ffmpeg".to_string(),
        code: Some(1),
        stderr: "Invalid data".to_string(),
    };
    assert_eq!(error.to_string(), "ffmpeg failed (exit Some(1)): Invalid data");
}

#[test]
fn test_appError_fromStageErrors_shouldKeepStageName() {
    let alignment: AppError = AlignmentError::MissingClip { index: 3 }.into();
    let subtitle: AppError = SubtitleError::InvalidTimestamp("bad".to_string()).into();
    let media: AppError = MediaIoError::Timeout {
        program: "ffprobe".to_string(),
        secs: 30,
    }
    .into();

    assert_eq!(alignment.to_string(), "Alignment error: No audio clip for segment 3");
    assert!(subtitle.to_string().starts_with("Subtitle error:"));
    assert_eq!(media.to_string(), "Media error: ffprobe timed out after 30 seconds");
}

#[test]
fn test_appError_fromIoError_shouldBecomeFileError() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.mp4");
    let error: AppError = io.into();
    assert!(matches!(error, AppError::File(ref msg) if msg.contains("missing.mp4")));
}

#[test]
fn test_appError_fromAnyhow_shouldBecomeUnknown() {
    let error: AppError = anyhow::anyhow!("something odd").into();
    assert!(matches!(error, AppError::Unknown(ref msg) if msg == "something odd"));
}
