//! Error types for the intercom gateway

use thiserror::Error;

/// Result type alias for intercom operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the intercom gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Telephony provider error
    #[error("telephony error: {0}")]
    Telephony(String),

    /// Recording ended in a failed state on the provider side
    #[error("recording {0} failed")]
    RecordingFailed(String),

    /// Recording was not ready within the polling budget
    #[error("recording {sid} not ready after {attempts} attempts")]
    RecordingTimeout {
        /// Recording SID
        sid: String,
        /// Number of status checks made
        attempts: u32,
    },

    /// Transcription job ended with an error
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    /// Transcription job did not complete within the polling budget
    #[error("transcription {id} not completed after {polls} polls")]
    TranscriptionTimeout {
        /// Transcript job ID
        id: String,
        /// Number of status checks made
        polls: u32,
    },

    /// Webhook payload is missing a required field
    #[error("missing webhook field: {0}")]
    MissingField(&'static str),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
