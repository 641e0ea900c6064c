//! Voice processing module
//!
//! Speech synthesis with an on-disk audio cache, and recording transcription.

mod cache;
pub mod stt;
pub mod tts;

pub use cache::{AUDIO_ROUTE, AudioCache};
pub use stt::{AssemblyAiClient, TranscriberSettings, Transcriber, TranscriptStatus, TranscriptionProvider};
pub use tts::{ElevenLabsTts, SpeechSynthesizer, VoiceSettings};
