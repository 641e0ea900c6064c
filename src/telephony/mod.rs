//! Telephony provider integration
//!
//! Recording metadata and media are fetched from Twilio's REST API. Call
//! control is expressed as TwiML documents returned from webhook handlers.

mod recording;
pub mod twiml;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

pub use recording::RecordingRetriever;
pub use twiml::VoiceResponse;

use crate::{Error, Result};

/// Default Twilio REST API base URL
pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Processing state of a call recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    Processing,
    Completed,
    Absent,
    Failed,
    Deleted,
    /// Any state not listed above (`in-progress`, `paused`, ...)
    #[serde(other)]
    Other,
}

/// Recording metadata as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingInfo {
    pub sid: String,
    pub status: RecordingStatus,
    /// Duration in seconds, once known
    pub duration: Option<String>,
    /// Media URL without a format suffix
    pub media_url: String,
}

/// Operations the call pipeline needs from the telephony provider
#[async_trait]
pub trait TelephonyProvider: Send + Sync {
    /// Fetch current metadata for a recording
    async fn fetch_recording(&self, recording_sid: &str) -> Result<RecordingInfo>;

    /// Download access-controlled media (recordings) as raw bytes
    async fn download_media(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Deserialize)]
struct TwilioRecording {
    sid: String,
    status: RecordingStatus,
    duration: Option<String>,
    media_url: Option<String>,
}

/// Twilio REST API client
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: SecretString,
    api_base: String,
}

impl TwilioClient {
    /// Create a new Twilio client
    ///
    /// # Errors
    ///
    /// Returns error if the account SID or auth token is empty
    pub fn new(account_sid: String, auth_token: SecretString) -> Result<Self> {
        Self::with_api_base(account_sid, auth_token, TWILIO_API_BASE.to_string())
    }

    /// Create a client against a non-default API base URL
    ///
    /// # Errors
    ///
    /// Returns error if the account SID or auth token is empty
    pub fn with_api_base(
        account_sid: String,
        auth_token: SecretString,
        api_base: String,
    ) -> Result<Self> {
        if account_sid.is_empty() || auth_token.expose_secret().is_empty() {
            return Err(Error::Config(
                "Twilio account SID and auth token required".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            account_sid,
            auth_token,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn recording_url(&self, recording_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Recordings/{}",
            self.api_base,
            self.account_sid,
            urlencoding::encode(recording_sid)
        )
    }
}

#[async_trait]
impl TelephonyProvider for TwilioClient {
    async fn fetch_recording(&self, recording_sid: &str) -> Result<RecordingInfo> {
        let url = format!("{}.json", self.recording_url(recording_sid));

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Telephony(format!(
                "Twilio recording lookup error {status}: {body}"
            )));
        }

        let recording: TwilioRecording = response.json().await?;
        let media_url = recording
            .media_url
            .unwrap_or_else(|| self.recording_url(&recording.sid));

        Ok(RecordingInfo {
            sid: recording.sid,
            status: recording.status,
            duration: recording.duration,
            media_url,
        })
    }

    async fn download_media(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Telephony(format!(
                "Twilio media download error {status}: {body}"
            )));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}
