//! Text-to-speech (TTS) processing

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default ElevenLabs API base URL
pub const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io";

/// Renders text into playable audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize text to audio bytes (MP3)
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Fixed voice parameters sent with every request
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// ElevenLabs model identifier
    pub model: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            model: "eleven_monolingual_v1".to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
        }
    }
}

/// Synthesizes speech through ElevenLabs
pub struct ElevenLabsTts {
    client: reqwest::Client,
    api_key: SecretString,
    voice_id: String,
    settings: VoiceSettings,
    api_base: String,
}

impl ElevenLabsTts {
    /// Create a new ElevenLabs TTS instance
    ///
    /// # Errors
    ///
    /// Returns error if API key or voice ID is missing
    pub fn new(api_key: SecretString, voice_id: String, settings: VoiceSettings) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }
        if voice_id.is_empty() {
            return Err(Error::Config(
                "ElevenLabs voice ID required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice_id,
            settings,
            api_base: ELEVENLABS_API_BASE.to_string(),
        })
    }

    /// Override the API base URL
    #[must_use]
    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct Settings {
            stability: f32,
            similarity_boost: f32,
        }

        #[derive(Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
            voice_settings: Settings,
        }

        let url = format!("{}/v1/text-to-speech/{}", self.api_base, self.voice_id);

        let request = ElevenLabsRequest {
            text,
            model_id: &self.settings.model,
            voice_settings: Settings {
                stability: self.settings.stability,
                similarity_boost: self.settings.similarity_boost,
            },
        };

        tracing::debug!(chars = text.len(), voice = %self.voice_id, "requesting speech synthesis");

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", self.api_key.expose_secret())
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}
