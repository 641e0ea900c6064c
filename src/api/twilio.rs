//! Twilio voice webhooks
//!
//! Both handlers always answer with a TwiML document, even when the payload
//! cannot be parsed, so the call never hangs on an HTTP error.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::{Form, Router, extract::State, routing::post};
use serde::Deserialize;

use super::ApiState;
use crate::telephony::VoiceResponse;

/// Build Twilio webhook router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/incoming", post(incoming_call))
        .route("/handle-recording", post(handle_recording))
        .with_state(state)
}

/// Call-initiation webhook payload (subset)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncomingCall {
    pub call_sid: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Recording-completion webhook payload (subset)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordingCallback {
    pub call_sid: Option<String>,
    pub recording_sid: Option<String>,
    pub recording_url: Option<String>,
    pub recording_duration: Option<String>,
}

fn payload_or_default<T: Default>(payload: Result<Form<T>, FormRejection>, route: &str) -> T {
    match payload {
        Ok(Form(payload)) => payload,
        Err(e) => {
            tracing::warn!(route, error = %e, "unparseable webhook payload");
            T::default()
        }
    }
}

/// Greet the caller and start recording
async fn incoming_call(
    State(state): State<Arc<ApiState>>,
    payload: Result<Form<IncomingCall>, FormRejection>,
) -> VoiceResponse {
    let call = payload_or_default(payload, "incoming");
    tracing::debug!(from = ?call.from, to = ?call.to, "incoming call payload");

    state.calls.greet(call.call_sid.as_deref()).await
}

/// Respond to the finished recording and end the call
async fn handle_recording(
    State(state): State<Arc<ApiState>>,
    payload: Result<Form<RecordingCallback>, FormRejection>,
) -> VoiceResponse {
    let recording = payload_or_default(payload, "handle-recording");
    tracing::debug!(
        recording_url = ?recording.recording_url,
        duration = ?recording.recording_duration,
        "recording payload"
    );

    state
        .calls
        .handle_recording(
            recording.call_sid.as_deref(),
            recording.recording_sid.as_deref(),
        )
        .await
}
