//! Call flow for the intercom
//!
//! Two webhook events drive a call: the inbound call is greeted and recorded,
//! then the finished recording is transcribed, matched and answered. Every
//! path ends in a spoken response, and the recording path always hangs up.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::matcher::{MatchOutcome, PersonMatcher};
use crate::telephony::twiml::RecordOptions;
use crate::telephony::{RecordingRetriever, TelephonyProvider, TwilioClient, VoiceResponse};
use crate::voice::{AssemblyAiClient, AudioCache, ElevenLabsTts, Transcriber, TranscriberSettings};
use crate::{Config, Error, Result};

/// Path Twilio posts finished recordings to
pub const RECORDING_ACTION: &str = "/twilio/handle-recording";

/// Phrases and recording parameters for the call flow
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CallSettings {
    pub greeting: String,
    pub delivery_response: String,
    /// `{name}` is replaced with the resident's name
    pub resident_response: String,
    pub not_found_response: String,
    pub error_response: String,

    /// Twilio built-in voice used when rendered audio is unavailable
    pub fallback_voice: String,

    /// Maximum recording length in seconds
    pub record_max_length: u32,
    /// Seconds of silence that end the recording
    pub record_timeout: u32,
    pub play_beep: bool,

    /// Suffix appended to the recording media URL to pick its format
    pub recording_format: String,

    /// Seconds the recording webhook may spend before answering with
    /// `error_response`; Twilio abandons webhooks after 15s
    pub processing_deadline_secs: u64,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            greeting: "Hello! Who are you here to see?".to_string(),
            delivery_response: "Access granted. Please leave the package inside the door."
                .to_string(),
            resident_response: "Connecting you to {name}.".to_string(),
            not_found_response: "Sorry, I couldn't find who you're looking for.".to_string(),
            error_response: "Sorry, I had trouble understanding you. Please try again later."
                .to_string(),
            fallback_voice: "alice".to_string(),
            record_max_length: 5,
            record_timeout: 3,
            play_beep: true,
            recording_format: ".mp3".to_string(),
            processing_deadline_secs: 12,
        }
    }
}

/// Components shared by every call
pub struct CallFlow {
    audio: Arc<AudioCache>,
    recordings: RecordingRetriever,
    transcriber: Transcriber,
    matcher: PersonMatcher,
    settings: CallSettings,
}

impl CallFlow {
    #[must_use]
    pub fn new(
        audio: Arc<AudioCache>,
        recordings: RecordingRetriever,
        transcriber: Transcriber,
        matcher: PersonMatcher,
        settings: CallSettings,
    ) -> Self {
        Self {
            audio,
            recordings,
            transcriber,
            matcher,
            settings,
        }
    }

    /// Wire the production providers from configuration
    ///
    /// # Errors
    ///
    /// Returns error if any provider client rejects its credentials
    pub fn from_config(config: Config) -> Result<Self> {
        let creds = config.credentials;

        let twilio: Arc<dyn TelephonyProvider> = Arc::new(TwilioClient::new(
            creds.twilio_account_sid,
            creds.twilio_auth_token,
        )?);
        let tts = Arc::new(ElevenLabsTts::new(
            creds.elevenlabs_api_key,
            creds.elevenlabs_voice_id,
            config.voice,
        )?);
        let stt = Arc::new(AssemblyAiClient::new(creds.assemblyai_api_key)?);

        let audio = Arc::new(AudioCache::new(
            tts,
            config.server.audio_dir,
            &config.server.public_url,
        ));

        Ok(Self::new(
            audio,
            RecordingRetriever::new(twilio.clone(), RecordingRetriever::default_policy()),
            Transcriber::new(stt, twilio, TranscriberSettings::default()),
            PersonMatcher::new(config.directory, config.matcher),
            config.call,
        ))
    }

    #[must_use]
    pub const fn settings(&self) -> &CallSettings {
        &self.settings
    }

    /// Greet an inbound caller and record their answer
    pub async fn greet(&self, call_sid: Option<&str>) -> VoiceResponse {
        tracing::info!(call_sid = ?call_sid, "incoming call");

        let mut response = VoiceResponse::new();
        self.speak(&mut response, &self.settings.greeting).await;
        response.record(RecordOptions {
            action: RECORDING_ACTION.to_string(),
            max_length: self.settings.record_max_length,
            timeout: self.settings.record_timeout,
            play_beep: self.settings.play_beep,
        });
        response
    }

    /// Answer a finished recording: respond, optionally connect, hang up
    pub async fn handle_recording(
        &self,
        call_sid: Option<&str>,
        recording_sid: Option<&str>,
    ) -> VoiceResponse {
        tracing::info!(call_sid = ?call_sid, recording_sid = ?recording_sid, "recording received");

        let deadline = Duration::from_secs(self.settings.processing_deadline_secs);
        let processing = tokio::time::timeout(deadline, self.identify(recording_sid)).await;
        let (phrase, dial_to) = match processing {
            Ok(Ok(outcome)) => {
                let dial_to = outcome.resident().map(|r| r.phone_number.clone());
                (self.response_phrase(&outcome), dial_to)
            }
            Ok(Err(e)) => {
                tracing::error!(call_sid = ?call_sid, error = %e, "failed to process recording");
                (self.settings.error_response.clone(), None)
            }
            Err(_) => {
                tracing::error!(
                    call_sid = ?call_sid,
                    deadline_secs = deadline.as_secs(),
                    "recording processing timed out"
                );
                (self.settings.error_response.clone(), None)
            }
        };

        let mut response = VoiceResponse::new();
        self.speak(&mut response, &phrase).await;
        if let Some(number) = dial_to {
            tracing::info!(call_sid = ?call_sid, number = %number, "connecting caller");
            response.dial(number);
        }
        response.hangup();
        response
    }

    /// Recording -> transcript -> match
    async fn identify(&self, recording_sid: Option<&str>) -> Result<MatchOutcome> {
        let recording_sid = recording_sid
            .filter(|s| !s.is_empty())
            .ok_or(Error::MissingField("RecordingSid"))?;

        let recording = self.recordings.wait_for_recording(recording_sid).await?;
        let audio_url = format!("{}{}", recording.media_url, self.settings.recording_format);

        let transcript = self.transcriber.transcribe(&audio_url).await?;
        Ok(self.matcher.match_transcript(&transcript))
    }

    fn response_phrase(&self, outcome: &MatchOutcome) -> String {
        match outcome {
            MatchOutcome::Delivery(_) => self.settings.delivery_response.clone(),
            MatchOutcome::Resident(resident) => self
                .settings
                .resident_response
                .replace("{name}", &resident.name),
            MatchOutcome::NoMatch => self.settings.not_found_response.clone(),
        }
    }

    /// Play rendered audio for `text`, or fall back to built-in speech
    async fn speak(&self, response: &mut VoiceResponse, text: &str) {
        match self.audio.get_or_create(text).await {
            Ok(url) => {
                response.play(url);
            }
            Err(e) => {
                tracing::warn!(error = %e, "speech synthesis failed, using built-in voice");
                response.say(text, &self.settings.fallback_voice);
            }
        }
    }
}
