/*!
 * Tests for processing the whole input folder
 */

use anyhow::Result;

use dualsub::providers::mock::{MockRecognizer, MockSynthesizer, MockTranslationBackend};

use crate::common::{self, FakeMedia};

#[tokio::test]
async fn test_translateAll_withEmptyFolder_shouldReportNoVideos() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test = common::build_pipeline(
        common::test_config(temp_dir.path()),
        MockRecognizer::new(common::hi_bye_segments()),
        MockTranslationBackend::working(),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let report = test.pipeline.translate_all().await?;

    assert!(report.processed.is_empty());
    assert!(!report.has_failures());
    assert!(report.message.starts_with("No videos found in"));
    assert!(report.message.contains("mp4"));
    assert!(temp_dir.path().join("video_input").is_dir());
    assert!(temp_dir.path().join("srt_output").is_dir());
    Ok(())
}

#[tokio::test]
async fn test_translateAll_withBrokenVideo_shouldIsolateFailure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    common::add_input_video(&config, "a_intro.mp4")?;
    common::add_input_video(&config, "broken.mov")?;
    common::add_input_video(&config, "c_outro.mkv")?;
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(common::hi_bye_segments()),
        MockTranslationBackend::working(),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let report = test.pipeline.translate_all().await?;

    assert_eq!(report.processed, vec!["a_intro.mp4".to_string(), "c_outro.mkv".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "broken.mov");
    assert!(report.failed[0].error.contains("Failed to extract audio from broken.mov"));
    assert!(report.message.contains("2 processed, 1 failed"));

    let srt_dir = temp_dir.path().join("srt_output");
    assert!(srt_dir.join("a_intro_bilingual.srt").exists());
    assert!(srt_dir.join("c_outro_bilingual.srt").exists());
    assert!(!srt_dir.join("broken_bilingual.srt").exists());
    Ok(())
}

#[tokio::test]
async fn test_translateAll_withPreviousOutputsInInput_shouldSkipThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    common::add_input_video(&config, "talk.mp4")?;
    common::add_input_video(&config, "talk_bilingual.mp4")?;
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(common::hi_bye_segments()),
        MockTranslationBackend::working(),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let report = test.pipeline.translate_all().await?;

    assert_eq!(report.processed, vec!["talk.mp4".to_string()]);
    assert_eq!(test.recognizer.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_translateAll_withConcurrencyLimit_shouldNeverExceedIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.pipeline.concurrent_videos = 2;
    for name in ["a.mp4", "b.mp4", "c.mp4", "d.mp4", "e.mp4"] {
        common::add_input_video(&config, name)?;
    }
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(common::hi_bye_segments()).with_delay(30),
        MockTranslationBackend::working(),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let report = test.pipeline.translate_all().await?;

    assert_eq!(report.processed.len(), 5);
    assert_eq!(test.recognizer.call_count(), 5);
    assert_eq!(test.recognizer.max_concurrent_calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_translateAll_withSingleSlot_shouldRunSequentially() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.pipeline.concurrent_videos = 1;
    for name in ["a.mp4", "b.mp4", "c.mp4"] {
        common::add_input_video(&config, name)?;
    }
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(common::hi_bye_segments()).with_delay(10),
        MockTranslationBackend::working(),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let report = test.pipeline.translate_all().await?;

    assert_eq!(report.processed.len(), 3);
    assert_eq!(test.recognizer.max_concurrent_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_listInputVideos_shouldReturnSortedNames() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    common::add_input_video(&config, "zeta.webm")?;
    common::add_input_video(&config, "alpha.mp4")?;
    common::add_input_video(&config, "readme.md")?;
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(Vec::new()),
        MockTranslationBackend::working(),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let listing = test.pipeline.list_input_videos()?;

    assert_eq!(listing.videos, vec!["alpha.mp4".to_string(), "zeta.webm".to_string()]);
    assert_eq!(listing.input_dir, temp_dir.path().join("video_input"));
    Ok(())
}
