//! Webhook and route integration tests

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use intercom_gateway::api::{self, ApiState};
use intercom_gateway::voice::TranscriptStatus;
use intercom_gateway::{AudioCache, RecordingStatus};
use tower::ServiceExt;

mod common;
use common::{FakeTelephony, FakeTranscription, FakeTts, Step, build_call_flow};

const FORM: &str = "application/x-www-form-urlencoded";

/// Build a test router over fake providers
fn build_test_router(
    audio_dir: &Path,
    tts: Arc<FakeTts>,
    telephony: Arc<FakeTelephony>,
    transcription: Arc<FakeTranscription>,
) -> axum::Router {
    let calls = build_call_flow(audio_dir, tts, telephony, transcription);
    api::router(Arc::new(ApiState { calls }), audio_dir)
}

fn default_router(audio_dir: &Path, transcript: &str) -> axum::Router {
    build_test_router(
        audio_dir,
        Arc::new(FakeTts::default()),
        Arc::new(FakeTelephony::completed()),
        Arc::new(FakeTranscription::completing(transcript)),
    )
}

async fn post_form(app: axum::Router, uri: &str, body: &str) -> (StatusCode, String, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, FORM)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

/// Positions of speech verbs (`<Play>` or `<Say>`) in a TwiML document
fn speech_positions(xml: &str) -> Vec<usize> {
    let mut positions: Vec<usize> = xml
        .match_indices("<Play>")
        .chain(xml.match_indices("<Say "))
        .map(|(i, _)| i)
        .collect();
    positions.sort_unstable();
    positions
}

#[tokio::test]
async fn test_liveness_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = default_router(dir.path(), "");

    let response = app
        .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(!body.is_empty());
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = default_router(dir.path(), "");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_incoming_call_plays_greeting_then_records() {
    let dir = tempfile::tempdir().unwrap();
    let tts = Arc::new(FakeTts::default());
    let app = build_test_router(
        dir.path(),
        tts.clone(),
        Arc::new(FakeTelephony::completed()),
        Arc::new(FakeTranscription::completing("")),
    );

    let (status, content_type, xml) =
        post_form(app, "/twilio/incoming", "CallSid=CA1&From=%2B15555550000").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "text/xml");
    assert!(xml.starts_with("<?xml"));

    let speech = speech_positions(&xml);
    assert_eq!(speech.len(), 1, "{xml}");
    assert_eq!(xml.matches("<Record ").count(), 1, "{xml}");
    assert!(speech[0] < xml.find("<Record ").unwrap());
    assert!(xml.contains("<Play>https://door.example.test/audio/"));
    assert!(xml.contains("action=\"/twilio/handle-recording\""));
    assert!(xml.contains("playBeep=\"true\""));
    assert!(!xml.contains("<Hangup/>"));
    assert_eq!(tts.calls(), 1);
}

#[tokio::test]
async fn test_incoming_call_falls_back_to_say() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(
        dir.path(),
        Arc::new(FakeTts::failing()),
        Arc::new(FakeTelephony::completed()),
        Arc::new(FakeTranscription::completing("")),
    );

    let (status, _, xml) = post_form(app, "/twilio/incoming", "CallSid=CA1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!xml.contains("<Play>"));
    assert_eq!(xml.matches("<Say ").count(), 1, "{xml}");
    assert!(xml.contains("Who are you here to see?"));
    assert_eq!(xml.matches("<Record ").count(), 1);
}

#[tokio::test]
async fn test_recording_without_sid_apologizes_and_hangs_up() {
    let dir = tempfile::tempdir().unwrap();
    let telephony = Arc::new(FakeTelephony::completed());
    let app = build_test_router(
        dir.path(),
        Arc::new(FakeTts::default()),
        telephony.clone(),
        Arc::new(FakeTranscription::completing("matt")),
    );

    let (status, _, xml) = post_form(app, "/twilio/handle-recording", "CallSid=CA1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(speech_positions(&xml).len(), 1, "{xml}");
    assert!(xml.ends_with("<Hangup/></Response>"), "{xml}");
    assert!(!xml.contains("<Dial>"));
    assert_eq!(telephony.fetches(), 0);

    let apology = AudioCache::file_name(&intercom_gateway::CallSettings::default().error_response);
    assert!(xml.contains(&apology), "{xml}");
}

#[tokio::test]
async fn test_unparseable_recording_payload_still_returns_twiml() {
    let dir = tempfile::tempdir().unwrap();
    let app = default_router(dir.path(), "matt");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/twilio/handle-recording")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let xml = String::from_utf8(body.to_vec()).unwrap();
    assert!(xml.contains("<Hangup/>"));
    assert!(!xml.contains("<Dial>"));
}

#[tokio::test]
async fn test_recording_for_resident_connects_call() {
    let dir = tempfile::tempdir().unwrap();
    let telephony = Arc::new(FakeTelephony::new(vec![
        Step::Status(RecordingStatus::Processing),
        Step::Status(RecordingStatus::Completed),
    ]));
    let app = build_test_router(
        dir.path(),
        Arc::new(FakeTts::default()),
        telephony.clone(),
        Arc::new(FakeTranscription::completing("Can I speak to Mat?")),
    );

    let (status, _, xml) = post_form(
        app,
        "/twilio/handle-recording",
        "CallSid=CA1&RecordingSid=RE42&RecordingDuration=4",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(speech_positions(&xml).len(), 1, "{xml}");
    assert!(xml.contains("<Dial>+15555550101</Dial>"), "{xml}");
    assert!(xml.ends_with("<Dial>+15555550101</Dial><Hangup/></Response>"), "{xml}");
    assert!(xml.contains(&AudioCache::file_name("Connecting you to Matt.")));

    assert_eq!(telephony.fetches(), 2);
    assert_eq!(
        telephony.downloads.lock().unwrap().as_slice(),
        ["https://api.twilio.test/Recordings/RE42.mp3"]
    );
}

#[tokio::test]
async fn test_resident_is_dialed_even_when_speech_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(
        dir.path(),
        Arc::new(FakeTts::failing()),
        Arc::new(FakeTelephony::completed()),
        Arc::new(FakeTranscription::completing("lindsey please")),
    );

    let (_, _, xml) = post_form(app, "/twilio/handle-recording", "RecordingSid=RE1").await;

    assert!(xml.contains("<Say voice=\"alice\">Connecting you to Lindsay.</Say>"), "{xml}");
    assert!(xml.contains("<Dial>+15555550102</Dial>"));
    assert!(xml.contains("<Hangup/>"));
}

#[tokio::test]
async fn test_delivery_is_granted_without_dialing() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(
        dir.path(),
        Arc::new(FakeTts::failing()),
        Arc::new(FakeTelephony::completed()),
        Arc::new(FakeTranscription::completing("Hi, Amazon delivery for Matt")),
    );

    let (_, _, xml) = post_form(app, "/twilio/handle-recording", "RecordingSid=RE1").await;

    assert!(xml.contains("Access granted"), "{xml}");
    assert!(!xml.contains("<Dial>"));
    assert!(xml.contains("<Hangup/>"));
}

#[tokio::test]
async fn test_unknown_visitor_is_told_no_match() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(
        dir.path(),
        Arc::new(FakeTts::failing()),
        Arc::new(FakeTelephony::completed()),
        Arc::new(FakeTranscription::completing("xyzzyplugh please")),
    );

    let (_, _, xml) = post_form(app, "/twilio/handle-recording", "RecordingSid=RE1").await;

    assert!(xml.contains("couldn&apos;t find who you&apos;re looking for"), "{xml}");
    assert!(!xml.contains("<Dial>"));
    assert!(xml.contains("<Hangup/>"));
}

#[tokio::test]
async fn test_transcription_failure_apologizes() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(
        dir.path(),
        Arc::new(FakeTts::failing()),
        Arc::new(FakeTelephony::completed()),
        Arc::new(FakeTranscription::new(vec![TranscriptStatus::Error(
            "no speech".to_string(),
        )])),
    );

    let (status, _, xml) = post_form(app, "/twilio/handle-recording", "RecordingSid=RE1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(xml.contains("had trouble understanding"), "{xml}");
    assert!(!xml.contains("<Dial>"));
    assert!(xml.contains("<Hangup/>"));
}

#[tokio::test]
async fn test_failed_recording_apologizes() {
    let dir = tempfile::tempdir().unwrap();
    let transcription = Arc::new(FakeTranscription::completing("matt"));
    let app = build_test_router(
        dir.path(),
        Arc::new(FakeTts::failing()),
        Arc::new(FakeTelephony::new(vec![Step::Status(RecordingStatus::Failed)])),
        transcription.clone(),
    );

    let (_, _, xml) = post_form(app, "/twilio/handle-recording", "RecordingSid=RE1").await;

    assert!(xml.contains("had trouble understanding"), "{xml}");
    assert!(!xml.contains("<Dial>"));
    assert_eq!(transcription.uploads(), 0);
}

#[tokio::test]
async fn test_rendered_audio_is_served() {
    let dir = tempfile::tempdir().unwrap();
    let app = default_router(dir.path(), "");

    let (_, _, _) = post_form(app.clone(), "/twilio/incoming", "CallSid=CA1").await;

    let file_name = AudioCache::file_name(&intercom_gateway::CallSettings::default().greeting);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/audio/{file_name}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.starts_with(b"mp3:Hello!"));
}
