//! Intercom Gateway - answers the building's phone line
//!
//! A visitor calls, says who they are here for, and is either connected to a
//! resident, told to leave a delivery, or politely turned away.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Twilio webhooks                     │
//! │        /twilio/incoming  │  /twilio/handle-recording │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Call flow                         │
//! │  Recording retriever │ Transcriber │ Person matcher  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Providers                          │
//! │    Twilio REST  │  AssemblyAI  │  ElevenLabs + cache │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod call;
pub mod config;
pub mod directory;
pub mod error;
pub mod matcher;
pub mod retry;
pub mod telephony;
pub mod voice;

pub use call::{CallFlow, CallSettings};
pub use config::Config;
pub use directory::{DeliveryPerson, Directory, Resident};
pub use error::{Error, Result};
pub use matcher::{MatchOutcome, MatcherConfig, PersonMatcher};
pub use retry::RetryPolicy;
pub use telephony::{RecordingInfo, RecordingRetriever, RecordingStatus, TelephonyProvider, TwilioClient, VoiceResponse};
pub use voice::{AudioCache, SpeechSynthesizer, Transcriber, TranscriptionProvider};
