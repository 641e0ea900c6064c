//! Waiting for a call recording to finish processing

use std::sync::Arc;
use std::time::Duration;

use super::{RecordingInfo, RecordingStatus, TelephonyProvider};
use crate::retry::{self, RetryPolicy};
use crate::{Error, Result};

/// Polls the telephony provider until a recording is downloadable
pub struct RecordingRetriever {
    provider: Arc<dyn TelephonyProvider>,
    policy: RetryPolicy,
}

impl RecordingRetriever {
    /// Default schedule: wait 1s, then back off from 500ms up to 2s, 6 checks
    ///
    /// At most 8.5s of waiting, leaving room for transcription inside
    /// Twilio's 15s webhook timeout.
    #[must_use]
    pub const fn default_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 6,
            initial_delay: Duration::from_secs(1),
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
        }
    }

    #[must_use]
    pub fn new(provider: Arc<dyn TelephonyProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// Wait until the recording reaches `completed`
    ///
    /// # Errors
    ///
    /// Returns `RecordingFailed` as soon as the provider reports `failed`,
    /// `RecordingTimeout` once every attempt is spent, or the last fetch error
    /// if the final attempt itself fails
    pub async fn wait_for_recording(&self, recording_sid: &str) -> Result<RecordingInfo> {
        for attempt in 0..self.policy.max_attempts {
            retry::wait_for_attempt(&self.policy, attempt).await;

            let recording = match self.provider.fetch_recording(recording_sid).await {
                Ok(recording) => recording,
                Err(e) if !self.policy.is_final(attempt) => {
                    tracing::warn!(recording_sid, attempt, error = %e, "recording lookup failed, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            };

            match recording.status {
                RecordingStatus::Completed => {
                    tracing::info!(recording_sid, attempt, duration = ?recording.duration, "recording ready");
                    return Ok(recording);
                }
                RecordingStatus::Failed => {
                    tracing::error!(recording_sid, "recording failed");
                    return Err(Error::RecordingFailed(recording_sid.to_string()));
                }
                status => {
                    tracing::debug!(recording_sid, attempt, ?status, "recording not ready");
                }
            }
        }

        Err(Error::RecordingTimeout {
            sid: recording_sid.to_string(),
            attempts: self.policy.max_attempts,
        })
    }
}
