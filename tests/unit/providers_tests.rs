/*!
 * Tests for the collaborator implementations
 */

use std::path::Path;
use std::sync::Arc;

use dualsub::errors::ProviderError;
use dualsub::providers::anthropic::{AnthropicBackend, AnthropicRequest, AnthropicResponse};
use dualsub::providers::mock::{MockRecognizer, MockSynthesizer, MockTranslationBackend};
use dualsub::providers::ollama::{GenerationRequest, OllamaBackend};
use dualsub::providers::whisper::parse_whisper_json;
use dualsub::providers::{Exclusive, SpeechRecognizer, SpeechSynthesizer, TranslationBackend};

use crate::common;

#[tokio::test]
async fn test_exclusive_withConcurrentCallers_shouldRunOneCallAtATime() {
    let recognizer = MockRecognizer::new(common::hi_bye_segments()).with_delay(20);
    let shared = Arc::new(Exclusive::new(recognizer.clone()));

    let calls = (0..4).map(|_| {
        let shared = Arc::clone(&shared);
        async move { shared.transcribe(Path::new("audio.wav"), "en").await }
    });
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.as_ref().map(|s| s.len() == 2).unwrap_or(false)));
    assert_eq!(recognizer.call_count(), 4);
    assert_eq!(recognizer.max_concurrent_calls(), 1);
}

#[tokio::test]
async fn test_mockRecognizer_withoutExclusive_shouldOverlapCalls() {
    let recognizer = Arc::new(MockRecognizer::new(Vec::new()).with_delay(20));

    let calls = (0..3).map(|_| {
        let recognizer = Arc::clone(&recognizer);
        async move { recognizer.transcribe(Path::new("audio.wav"), "en").await }
    });
    futures::future::join_all(calls).await;

    assert_eq!(recognizer.max_concurrent_calls(), 3);
}

#[tokio::test]
async fn test_exclusive_withTranslationBackend_shouldForwardResults() {
    let backend = MockTranslationBackend::working().with_dictionary([("Hi", "嗨")]);
    let shared = Exclusive::new(backend.clone());

    let out = shared.translate_batch(&["Hi".to_string()], "en", "zh").await.unwrap();

    assert_eq!(out, vec!["嗨".to_string()]);
    assert_eq!(backend.request_count(), 1);
    assert!(shared.test_connection().await.is_ok());
}

#[tokio::test]
async fn test_mockSynthesizer_withFixedDuration_shouldProduceClipOfThatLength() {
    let synthesizer = MockSynthesizer::new(1000).with_duration("嗨", 1600);

    let fixed = synthesizer.synthesize("嗨").await.unwrap();
    let derived = synthesizer.synthesize("再见").await.unwrap();

    assert_eq!(fixed.duration_ms(), 1600);
    assert_eq!(derived.duration_ms(), 200);
    assert_eq!(fixed.sample_rate(), 1000);
    assert_eq!(synthesizer.call_count(), 2);
}

#[tokio::test]
async fn test_mockBackends_whenFailing_shouldReturnProviderErrors() {
    assert!(MockTranslationBackend::failing()
        .translate_batch(&["Hi".to_string()], "en", "zh")
        .await
        .is_err());
    assert!(matches!(
        MockRecognizer::failing().transcribe(Path::new("a.wav"), "en").await,
        Err(ProviderError::CommandFailed(_))
    ));
    assert!(MockSynthesizer::failing(1000).synthesize("嗨").await.is_err());
}

#[test]
fn test_mockRecognizer_blockingCall_shouldReturnSegments() {
    let recognizer = MockRecognizer::new(common::hi_bye_segments());
    let segments = tokio_test::block_on(recognizer.transcribe(Path::new("audio.wav"), "en")).unwrap();
    assert_eq!(segments, common::hi_bye_segments());
}

#[test]
fn test_parseWhisperJson_withSegments_shouldConvertSecondsToMilliseconds() {
    let json = r#"{
        "text": " Hi. Bye.",
        "segments": [
            {"id": 0, "start": 0.0, "end": 1.0, "text": " Hi."},
            {"id": 1, "start": 1.0, "end": 2.25, "text": " Bye."}
        ],
        "language": "en"
    }"#;

    let segments = parse_whisper_json(json).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].source_text, "Hi.");
    assert_eq!(segments[1].start_ms, 1000);
    assert_eq!(segments[1].end_ms, 2250);
}

#[test]
fn test_parseWhisperJson_withNegativeTime_shouldFail() {
    let json = r#"{"segments": [{"start": -1.0, "end": 1.0, "text": "x"}]}"#;
    assert!(matches!(parse_whisper_json(json), Err(ProviderError::ParseError(_))));
}

#[test]
fn test_parseWhisperJson_withGarbage_shouldFail() {
    assert!(parse_whisper_json("not json").is_err());
}

#[test]
fn test_generationRequest_shouldSerializeWithoutStreaming() {
    let request = GenerationRequest::new("llama3.2:3b", "<<ENTRY_0>> Hi")
        .system("translate")
        .temperature(0.3);

    let json = serde_json::to_value(&request).unwrap();

    assert_eq!(json["model"], "llama3.2:3b");
    assert_eq!(json["stream"], false);
    assert_eq!(json["system"], "translate");
    assert!(json["options"]["temperature"].is_number());
}

#[test]
fn test_anthropicRequest_withoutSystem_shouldOmitField() {
    let request = AnthropicRequest::new("claude-3-haiku-20240307", 1024).add_message("user", "Hi");

    let json = serde_json::to_value(&request).unwrap();

    assert!(json.get("system").is_none());
    assert_eq!(json["messages"][0]["role"], "user");
    assert_eq!(json["max_tokens"], 1024);
}

#[test]
fn test_extractTextFromResponse_shouldJoinTextBlocksOnly() {
    let response: AnthropicResponse = serde_json::from_str(
        r#"{"content": [
            {"type": "text", "text": "<<ENTRY_0>> 嗨\n"},
            {"type": "tool_use"},
            {"type": "text", "text": "<<END>>"}
        ]}"#,
    )
    .unwrap();

    assert_eq!(
        AnthropicBackend::extract_text_from_response(&response),
        "<<ENTRY_0>> 嗨\n<<END>>"
    );
}

#[tokio::test]
async fn test_ollamaBackend_withUnreachableServer_shouldFailWithConnectionError() {
    let backend = OllamaBackend::new("127.0.0.1:9", "llama3.2:3b", 5);

    let result = backend.translate_batch(&["Hi".to_string()], "en", "zh").await;

    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
}
