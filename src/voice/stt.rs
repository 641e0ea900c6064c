//! Speech-to-text (STT) processing
//!
//! Recordings are downloaded from the telephony provider, uploaded to
//! AssemblyAI and transcribed as an asynchronous job that is polled until it
//! settles.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::retry::{self, RetryPolicy};
use crate::telephony::TelephonyProvider;
use crate::{Error, Result};

/// Default AssemblyAI API base URL
pub const ASSEMBLYAI_API_BASE: &str = "https://api.assemblyai.com";

/// State of a transcription job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptStatus {
    Queued,
    Processing,
    Completed(String),
    /// Provider-side failure with its detail message
    Error(String),
}

/// Asynchronous transcription job API
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Upload raw audio, returning a URL the provider can read it from
    async fn upload(&self, audio: &[u8]) -> Result<String>;

    /// Start a transcription job, returning its ID
    async fn submit(&self, audio_url: &str) -> Result<String>;

    /// Fetch the current state of a job
    async fn status(&self, transcript_id: &str) -> Result<TranscriptStatus>;
}

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Deserialize)]
struct TranscriptResponse {
    id: String,
    status: String,
    text: Option<String>,
    error: Option<String>,
}

/// AssemblyAI transcription client
pub struct AssemblyAiClient {
    client: reqwest::Client,
    api_key: SecretString,
    api_base: String,
}

impl AssemblyAiClient {
    /// Create a new AssemblyAI client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: SecretString) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("AssemblyAI API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            api_base: ASSEMBLYAI_API_BASE.to_string(),
        })
    }

    /// Override the API base URL
    #[must_use]
    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "AssemblyAI {what} error");
        Err(Error::Stt(format!("AssemblyAI {what} error {status}: {body}")))
    }
}

#[async_trait]
impl TranscriptionProvider for AssemblyAiClient {
    async fn upload(&self, audio: &[u8]) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/v2/upload", self.api_base))
            .header("Authorization", self.api_key.expose_secret())
            .header("Content-Type", "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await?;

        let result: UploadResponse = Self::check(response, "upload").await?.json().await?;
        Ok(result.upload_url)
    }

    async fn submit(&self, audio_url: &str) -> Result<String> {
        #[derive(Serialize)]
        struct TranscriptRequest<'a> {
            audio_url: &'a str,
            language_detection: bool,
        }

        let response = self
            .client
            .post(format!("{}/v2/transcript", self.api_base))
            .header("Authorization", self.api_key.expose_secret())
            .json(&TranscriptRequest {
                audio_url,
                language_detection: true,
            })
            .send()
            .await?;

        let result: TranscriptResponse = Self::check(response, "submit").await?.json().await?;
        Ok(result.id)
    }

    async fn status(&self, transcript_id: &str) -> Result<TranscriptStatus> {
        let response = self
            .client
            .get(format!("{}/v2/transcript/{transcript_id}", self.api_base))
            .header("Authorization", self.api_key.expose_secret())
            .send()
            .await?;

        let result: TranscriptResponse = Self::check(response, "status").await?.json().await?;
        Ok(parse_status(result))
    }
}

fn parse_status(response: TranscriptResponse) -> TranscriptStatus {
    match response.status.as_str() {
        "completed" => TranscriptStatus::Completed(response.text.unwrap_or_default()),
        "error" => TranscriptStatus::Error(
            response
                .error
                .unwrap_or_else(|| "unknown error".to_string()),
        ),
        "queued" => TranscriptStatus::Queued,
        _ => TranscriptStatus::Processing,
    }
}

/// Timing parameters for the transcription pipeline
#[derive(Debug, Clone)]
pub struct TranscriberSettings {
    /// Downloads smaller than this are suspected to be incomplete
    pub min_audio_bytes: usize,
    /// Extra wait before uploading a suspiciously small download
    pub small_audio_delay: Duration,
    /// Upload attempts and backoff
    pub upload: RetryPolicy,
    /// Wait between job status checks
    pub poll_interval: Duration,
    /// Job status checks before giving up
    pub max_polls: u32,
}

impl Default for TranscriberSettings {
    fn default() -> Self {
        Self {
            min_audio_bytes: 1024,
            small_audio_delay: Duration::from_secs(1),
            upload: RetryPolicy {
                max_attempts: 3,
                initial_delay: Duration::from_millis(250),
                base_delay: Duration::from_millis(500),
                max_delay: Duration::from_secs(1),
            },
            poll_interval: Duration::from_millis(500),
            max_polls: 20,
        }
    }
}

/// Turns a recording URL into text
pub struct Transcriber {
    provider: Arc<dyn TranscriptionProvider>,
    media: Arc<dyn TelephonyProvider>,
    settings: TranscriberSettings,
}

impl Transcriber {
    #[must_use]
    pub fn new(
        provider: Arc<dyn TranscriptionProvider>,
        media: Arc<dyn TelephonyProvider>,
        settings: TranscriberSettings,
    ) -> Self {
        Self {
            provider,
            media,
            settings,
        }
    }

    /// Download, upload, submit and poll until the transcript is ready
    ///
    /// # Errors
    ///
    /// Returns the download error, the final upload error, the submit error,
    /// `TranscriptionFailed` when the job errors, or `TranscriptionTimeout`
    /// after `max_polls` unfinished status checks
    pub async fn transcribe(&self, audio_url: &str) -> Result<String> {
        let audio = self.media.download_media(audio_url).await?;
        tracing::debug!(audio_bytes = audio.len(), "downloaded recording");

        if audio.len() < self.settings.min_audio_bytes {
            tracing::warn!(
                audio_bytes = audio.len(),
                threshold = self.settings.min_audio_bytes,
                "recording unusually small, waiting before upload"
            );
            tokio::time::sleep(self.settings.small_audio_delay).await;
        }

        let upload_url = self.upload_with_retry(&audio).await?;
        let transcript_id = self.provider.submit(&upload_url).await?;
        tracing::info!(transcript_id = %transcript_id, "transcription submitted");

        self.poll(&transcript_id).await
    }

    async fn upload_with_retry(&self, audio: &[u8]) -> Result<String> {
        let policy = &self.settings.upload;
        let mut attempt = 0;
        loop {
            retry::wait_for_attempt(policy, attempt).await;

            match self.provider.upload(audio).await {
                Ok(url) => return Ok(url),
                Err(e) if !policy.is_final(attempt) => {
                    tracing::warn!(attempt, error = %e, "audio upload failed, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "audio upload failed");
                    return Err(e);
                }
            }
        }
    }

    async fn poll(&self, transcript_id: &str) -> Result<String> {
        for poll in 1..=self.settings.max_polls {
            tokio::time::sleep(self.settings.poll_interval).await;

            match self.provider.status(transcript_id).await? {
                TranscriptStatus::Completed(text) => {
                    tracing::info!(transcript = %text, poll, "transcription complete");
                    return Ok(text);
                }
                TranscriptStatus::Error(detail) => {
                    tracing::error!(transcript_id, error = %detail, "transcription failed");
                    return Err(Error::TranscriptionFailed(detail));
                }
                status => tracing::debug!(transcript_id, poll, ?status, "transcription pending"),
            }
        }

        Err(Error::TranscriptionTimeout {
            id: transcript_id.to_string(),
            polls: self.settings.max_polls,
        })
    }
}
