/*!
 * End-to-end tests for processing a single video with mock collaborators
 */

use anyhow::Result;
use std::fs;

use dualsub::app_config::PipelineMode;
use dualsub::dub::AudioClip;
use dualsub::merger::CaptionLayout;
use dualsub::providers::mock::{MockBehavior, MockRecognizer, MockSynthesizer, MockTranslationBackend};
use dualsub::Segment;

use crate::common::{self, FakeMedia, MediaCall};

fn hi_bye_backend() -> MockTranslationBackend {
    MockTranslationBackend::working().with_dictionary([("Hi", "嗨"), ("Bye", "再见")])
}

#[tokio::test]
async fn test_translateOne_inSubsMode_shouldWriteBilingualSrtAndBurnIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let video = common::add_input_video(&config, "talk.mp4")?;
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(common::hi_bye_segments()),
        hi_bye_backend(),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let outcome = test.pipeline.translate_one("talk.mp4").await?;

    let expected = "1\n00:00:00,000 --> 00:00:01,000\nHi\n嗨\n\n2\n00:00:01,000 --> 00:00:02,000\nBye\n再见\n\n";
    assert_eq!(fs::read_to_string(&outcome.subtitle_path)?, expected);
    assert_eq!(outcome.subtitle_path, temp_dir.path().join("srt_output").join("talk_bilingual.srt"));
    assert_eq!(outcome.video_path, temp_dir.path().join("video_output").join("talk_bilingual.mp4"));
    assert!(outcome.video_path.exists());
    assert_eq!(outcome.dub_track_path, None);
    assert_eq!(outcome.segment_count, 2);

    assert_eq!(
        test.media.calls(),
        vec![MediaCall::ExtractAudio(video.clone()), MediaCall::BurnSubtitles(video)]
    );
    assert_eq!(test.synthesizer.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_translateOne_inDubMode_shouldWriteTrackSpanningWholeVideo() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.pipeline.mode = PipelineMode::Dub;
    let video = common::add_input_video(&config, "talk.mp4")?;
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(common::hi_bye_segments()),
        hi_bye_backend(),
        MockSynthesizer::new(1000).with_duration("嗨", 1600),
        FakeMedia::new(5000),
    );

    let outcome = test.pipeline.process_video(&video).await?;

    let dub_path = outcome.dub_track_path.expect("dub mode should produce a track");
    assert_eq!(dub_path, temp_dir.path().join("video_output").join("talk_dub.wav"));
    let track = AudioClip::from_wav_file(&dub_path)?;
    assert_eq!(track.sample_rate(), 1000);
    assert_eq!(track.duration_ms(), 5000);

    assert_eq!(test.synthesizer.call_count(), 2);
    assert!(test.media.calls().contains(&MediaCall::ProbeDuration(video.clone())));
    assert_eq!(test.media.calls().last(), Some(&MediaCall::MuxDub(video)));
    assert!(outcome.subtitle_path.exists());
    Ok(())
}

#[tokio::test]
async fn test_processVideo_withMessyRecognition_shouldWriteRepairedTimings() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let video = common::add_input_video(&config, "talk.mp4")?;
    let raw = vec![
        Segment::new(2100, 4000, "there"),
        Segment::new(0, 1500, "Hello"),
        Segment::new(2000, 2050, "um"),
        Segment::new(4000, 4500, "   "),
    ];
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(raw),
        MockTranslationBackend::working(),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let outcome = test.pipeline.process_video(&video).await?;

    let entries = dualsub::subtitle_processor::parse_srt_file(&outcome.subtitle_path)?;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].lines, vec!["um".to_string(), "[zh] um".to_string()]);
    assert!(entries[1].end_ms - entries[1].start_ms >= 500);
    for pair in entries.windows(2) {
        assert!(pair[0].end_ms <= pair[1].start_ms);
    }
    Ok(())
}

#[tokio::test]
async fn test_processVideo_withTargetOnlyLayout_shouldWriteTranslationsOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.pipeline.layout = CaptionLayout::TargetOnly;
    let video = common::add_input_video(&config, "talk.mp4")?;
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(common::hi_bye_segments()),
        hi_bye_backend(),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let outcome = test.pipeline.process_video(&video).await?;

    let entries = dualsub::subtitle_processor::parse_srt_file(&outcome.subtitle_path)?;
    assert_eq!(entries[0].lines, vec!["嗨".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_processVideo_withExtraTranslation_shouldFailWithoutWritingSrt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let video = common::add_input_video(&config, "talk.mp4")?;
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(common::hi_bye_segments()),
        MockTranslationBackend::new(MockBehavior::ExtraEntry),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let error = test.pipeline.process_video(&video).await.unwrap_err();

    let message = format!("{:#}", error);
    assert!(message.contains("Translation failed for talk.mp4"));
    assert!(message.contains("submitted 2, received 3"));
    assert!(!test.pipeline.workspace().subtitle_output_path(&video).exists());
    assert!(!test.pipeline.workspace().video_output_path(&video).exists());
    Ok(())
}

#[tokio::test]
async fn test_processVideo_withFailingSynthesis_shouldNotWriteDubTrack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.pipeline.mode = PipelineMode::Dub;
    let video = common::add_input_video(&config, "talk.mp4")?;
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(common::hi_bye_segments()),
        hi_bye_backend(),
        MockSynthesizer::failing(1000),
        FakeMedia::new(5000),
    );

    let result = test.pipeline.process_video(&video).await;

    assert!(result.is_err());
    assert!(!test.pipeline.workspace().dub_track_path(&video).exists());
    assert!(!test.media.calls().iter().any(|c| matches!(c, MediaCall::MuxDub(_))));
    Ok(())
}

#[tokio::test]
async fn test_processVideo_withNoSpeech_shouldWriteEmptySrt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let video = common::add_input_video(&config, "silent.mp4")?;
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(Vec::new()),
        MockTranslationBackend::working(),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let outcome = test.pipeline.process_video(&video).await?;

    assert_eq!(outcome.segment_count, 0);
    assert_eq!(fs::read_to_string(&outcome.subtitle_path)?, "");
    assert_eq!(test.backend.request_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_translateOne_withMissingVideo_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test = common::build_pipeline(
        common::test_config(temp_dir.path()),
        MockRecognizer::new(common::hi_bye_segments()),
        hi_bye_backend(),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let error = test.pipeline.translate_one("ghost.mp4").await.unwrap_err();

    assert!(error.to_string().contains("Video not found: ghost.mp4"));
    assert_eq!(test.recognizer.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_translateOne_withUnsupportedExtension_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    common::add_input_video(&config, "notes.txt")?;
    let test = common::build_pipeline(
        config,
        MockRecognizer::new(common::hi_bye_segments()),
        hi_bye_backend(),
        MockSynthesizer::new(1000),
        FakeMedia::new(5000),
    );

    let error = test.pipeline.translate_one("notes.txt").await.unwrap_err();

    assert!(error.to_string().contains("Unsupported video format"));
    assert!(test.media.calls().is_empty());
    Ok(())
}
