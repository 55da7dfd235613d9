use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_utils::test_utils::TestConfig;
use voice_cell::models::VoiceError;
use voice_cell::services::extraction::ExtractionService;
use voice_cell::services::transcription::TranscriptionService;

fn config_for(server: &MockServer) -> AppConfig {
    let mut config = TestConfig::default().to_app_config();
    config.openai_base_url = server.uri();
    config
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()
}

fn chat_response(content: &str) -> serde_json::Value {
    json!({
        "choices": [
            { "message": { "role": "assistant", "content": content } }
        ]
    })
}

#[tokio::test]
async fn extraction_parses_a_clean_json_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header_exists("authorization"))
        .and(body_partial_json(json!({ "model": "gpt-4o" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
            r#"{"provider": "Dr. Chen", "specialty": null, "date": "2026-09-07",
                "time": "09:30", "intent": "book", "confidence": 0.92}"#,
        )))
        .mount(&server)
        .await;

    let extracted = ExtractionService::new(&config_for(&server))
        .extract("I'd like to see Dr. Chen next Monday at nine thirty", today())
        .await
        .expect("extraction should succeed");

    assert_eq!(extracted.provider.as_deref(), Some("Dr. Chen"));
    assert_eq!(extracted.date.as_deref(), Some("2026-09-07"));
    assert_eq!(extracted.time.as_deref(), Some("09:30"));
    assert_eq!(extracted.intent.as_deref(), Some("book"));
}

#[tokio::test]
async fn extraction_recovers_json_from_fenced_output() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
            "Here you go:\n```json\n{\"intent\": \"book\", \"time\": \"14:00\"}\n```",
        )))
        .mount(&server)
        .await;

    let extracted = ExtractionService::new(&config_for(&server))
        .extract("book me something at two", today())
        .await
        .expect("extraction should recover the object");

    assert_eq!(extracted.time.as_deref(), Some("14:00"));
    assert_eq!(extracted.provider, None);
}

#[tokio::test]
async fn non_json_output_is_an_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
            "Sorry, I could not understand the request.",
        )))
        .mount(&server)
        .await;

    let result = ExtractionService::new(&config_for(&server))
        .extract("mumble", today())
        .await;

    assert_matches!(result, Err(VoiceError::UpstreamServiceError(_)));
}

#[tokio::test]
async fn upstream_failure_is_surfaced_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let result = ExtractionService::new(&config_for(&server))
        .extract("anything", today())
        .await;

    assert_matches!(result, Err(VoiceError::UpstreamServiceError(_)));
}

#[tokio::test]
async fn empty_transcript_is_rejected_locally() {
    let server = MockServer::start().await;

    let result = ExtractionService::new(&config_for(&server))
        .extract("   ", today())
        .await;

    assert_matches!(result, Err(VoiceError::ValidationError(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn transcription_returns_the_trimmed_text_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "  Book me with Doctor Chen on Monday.  "
        })))
        .mount(&server)
        .await;

    let transcript = TranscriptionService::new(&config_for(&server))
        .transcribe(vec![1, 2, 3, 4], "recording.webm")
        .await
        .expect("transcription should succeed");

    assert_eq!(transcript, "Book me with Doctor Chen on Monday.");
}

#[tokio::test]
async fn empty_audio_is_rejected_locally() {
    let server = MockServer::start().await;

    let result = TranscriptionService::new(&config_for(&server))
        .transcribe(vec![], "recording.webm")
        .await;

    assert_matches!(result, Err(VoiceError::ValidationError(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
