//! Shared test utilities
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use intercom_gateway::voice::TranscriberSettings;
use intercom_gateway::{
    AudioCache, CallFlow, CallSettings, Directory, Error, MatcherConfig, PersonMatcher,
    RecordingInfo, RecordingRetriever, RecordingStatus, Result, RetryPolicy, SpeechSynthesizer,
    TelephonyProvider, Transcriber, TranscriptionProvider,
};
use intercom_gateway::voice::TranscriptStatus;

pub const PUBLIC_URL: &str = "https://door.example.test";

/// TTS stand-in that counts calls and can be told to fail
#[derive(Default)]
pub struct FakeTts {
    pub calls: AtomicU32,
    pub fail: bool,
}

impl FakeTts {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Tts("quota exceeded".to_string()));
        }
        Ok(format!("mp3:{text}").into_bytes())
    }
}

/// One scripted answer from the recording status endpoint
#[derive(Clone, Copy, Debug)]
pub enum Step {
    Status(RecordingStatus),
    Fail,
}

/// Telephony stand-in replaying a status script; the last step repeats
pub struct FakeTelephony {
    script: Vec<Step>,
    pub fetches: AtomicU32,
    pub downloads: Mutex<Vec<String>>,
    audio: Vec<u8>,
}

impl FakeTelephony {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            fetches: AtomicU32::new(0),
            downloads: Mutex::new(Vec::new()),
            audio: vec![7; 4096],
        }
    }

    /// Recording that is complete on the first check
    pub fn completed() -> Self {
        Self::new(vec![Step::Status(RecordingStatus::Completed)])
    }

    pub fn with_audio(mut self, audio: Vec<u8>) -> Self {
        self.audio = audio;
        self
    }

    pub fn fetches(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelephonyProvider for FakeTelephony {
    async fn fetch_recording(&self, recording_sid: &str) -> Result<RecordingInfo> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) as usize;
        let step = self.script[n.min(self.script.len() - 1)];
        match step {
            Step::Status(status) => Ok(RecordingInfo {
                sid: recording_sid.to_string(),
                status,
                duration: Some("4".to_string()),
                media_url: format!("https://api.twilio.test/Recordings/{recording_sid}"),
            }),
            Step::Fail => Err(Error::Telephony("503 Service Unavailable".to_string())),
        }
    }

    async fn download_media(&self, url: &str) -> Result<Vec<u8>> {
        self.downloads.lock().unwrap().push(url.to_string());
        Ok(self.audio.clone())
    }
}

/// Transcription stand-in with scripted upload failures and job states
pub struct FakeTranscription {
    upload_failures: u32,
    statuses: Vec<TranscriptStatus>,
    pub uploads: AtomicU32,
    pub polls: AtomicU32,
}

impl FakeTranscription {
    pub fn new(statuses: Vec<TranscriptStatus>) -> Self {
        Self {
            upload_failures: 0,
            statuses,
            uploads: AtomicU32::new(0),
            polls: AtomicU32::new(0),
        }
    }

    /// Job that completes with `text` on the first poll
    pub fn completing(text: &str) -> Self {
        Self::new(vec![TranscriptStatus::Completed(text.to_string())])
    }

    pub fn failing_uploads(mut self, failures: u32) -> Self {
        self.upload_failures = failures;
        self
    }

    pub fn uploads(&self) -> u32 {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionProvider for FakeTranscription {
    async fn upload(&self, _audio: &[u8]) -> Result<String> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        if n < self.upload_failures {
            return Err(Error::Stt("upload error 502".to_string()));
        }
        Ok("https://cdn.assembly.test/upload/1".to_string())
    }

    async fn submit(&self, _audio_url: &str) -> Result<String> {
        Ok("transcript-1".to_string())
    }

    async fn status(&self, _transcript_id: &str) -> Result<TranscriptStatus> {
        let n = self.polls.fetch_add(1, Ordering::SeqCst) as usize;
        Ok(self.statuses[n.min(self.statuses.len() - 1)].clone())
    }
}

/// Transcriber timings with no waiting
pub fn fast_transcriber_settings(max_polls: u32) -> TranscriberSettings {
    TranscriberSettings {
        min_audio_bytes: 1024,
        small_audio_delay: Duration::ZERO,
        upload: RetryPolicy::immediate(3),
        poll_interval: Duration::ZERO,
        max_polls,
    }
}

/// Call flow over fakes, writing audio into `audio_dir`
pub fn build_call_flow(
    audio_dir: &Path,
    tts: Arc<FakeTts>,
    telephony: Arc<FakeTelephony>,
    transcription: Arc<FakeTranscription>,
) -> CallFlow {
    let audio = Arc::new(AudioCache::new(tts, audio_dir.to_path_buf(), PUBLIC_URL));

    CallFlow::new(
        audio,
        RecordingRetriever::new(telephony.clone(), RetryPolicy::immediate(5)),
        Transcriber::new(transcription, telephony, fast_transcriber_settings(5)),
        PersonMatcher::new(Directory::default(), MatcherConfig::default()),
        CallSettings::default(),
    )
}
