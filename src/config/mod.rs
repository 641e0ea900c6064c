//! Configuration management for the intercom gateway

pub mod file;

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use crate::call::CallSettings;
use crate::directory::Directory;
use crate::matcher::MatcherConfig;
use crate::voice::VoiceSettings;
use crate::{Error, Result};

pub use file::IntercomConfigFile;

/// Port used when neither the CLI, env nor file sets one
pub const DEFAULT_PORT: u16 = 3000;

/// Default directory for rendered audio
pub const DEFAULT_AUDIO_DIR: &str = "public/audio";

/// Intercom gateway configuration
#[derive(Debug)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Provider credentials
    pub credentials: Credentials,

    /// TTS voice parameters
    pub voice: VoiceSettings,

    /// Transcript matching heuristics
    pub matcher: MatcherConfig,

    /// Call flow phrases and recording parameters
    pub call: CallSettings,

    /// Resident roster
    pub directory: Directory,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Externally reachable base URL (`PUBLIC_URL`)
    pub public_url: String,

    /// Directory rendered audio is written to and served from
    pub audio_dir: PathBuf,
}

/// Credentials for the external providers
#[derive(Debug)]
pub struct Credentials {
    pub twilio_account_sid: String,
    pub twilio_auth_token: SecretString,
    pub elevenlabs_api_key: SecretString,
    pub elevenlabs_voice_id: String,
    pub assemblyai_api_key: SecretString,
}

impl Config {
    /// Load configuration from the config file and process environment
    ///
    /// # Errors
    ///
    /// Returns error if the config file is invalid or a required credential
    /// is missing
    pub fn load(config_path: Option<&Path>, port_override: Option<u16>) -> Result<Self> {
        let fc = file::load_config_file(config_path)?;
        Self::from_sources(fc, |key| std::env::var(key).ok(), port_override)
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// Precedence is CLI override > env > file > default.
    ///
    /// # Errors
    ///
    /// Returns error naming the first missing required credential
    pub fn from_sources<F>(fc: IntercomConfigFile, env: F, port_override: Option<u16>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let directory = fc.directory();

        let port = port_override
            .or_else(|| env("PORT").and_then(|s| s.parse().ok()))
            .or(fc.server.port)
            .unwrap_or(DEFAULT_PORT);

        let server = ServerConfig {
            port,
            public_url: env("PUBLIC_URL")
                .or(fc.server.public_url)
                .unwrap_or_else(|| format!("http://localhost:{port}")),
            audio_dir: env("INTERCOM_AUDIO_DIR")
                .map(PathBuf::from)
                .or(fc.server.audio_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_AUDIO_DIR)),
        };

        // Credentials (env > toml), all required
        let creds = fc.credentials;
        let required = |key: &str, file_value: Option<String>| -> Result<String> {
            env(key)
                .or(file_value)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("missing required credential {key}")))
        };

        let credentials = Credentials {
            twilio_account_sid: required("TWILIO_ACCOUNT_SID", creds.twilio_account_sid)?,
            twilio_auth_token: SecretString::from(required(
                "TWILIO_AUTH_TOKEN",
                creds.twilio_auth_token,
            )?),
            elevenlabs_api_key: SecretString::from(required(
                "ELEVENLABS_API_KEY",
                creds.elevenlabs_api_key,
            )?),
            elevenlabs_voice_id: required("ELEVENLABS_VOICE_ID", creds.elevenlabs_voice_id)?,
            assemblyai_api_key: SecretString::from(required(
                "ASSEMBLYAI_API_KEY",
                creds.assemblyai_api_key,
            )?),
        };

        Ok(Self {
            server,
            credentials,
            voice: fc.voice,
            matcher: fc.matcher,
            call: fc.call,
            directory,
        })
    }
}
