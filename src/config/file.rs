//! TOML configuration file loading
//!
//! Supports `~/.config/intercom/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::call::CallSettings;
use crate::directory::{Directory, Resident};
use crate::matcher::MatcherConfig;
use crate::voice::VoiceSettings;
use crate::{Error, Result};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct IntercomConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Provider credentials (environment variables take precedence)
    #[serde(default)]
    pub credentials: CredentialsFileConfig,

    /// TTS voice parameters
    #[serde(default)]
    pub voice: VoiceSettings,

    /// Transcript matching heuristics
    #[serde(default)]
    pub matcher: MatcherConfig,

    /// Call flow phrases and recording parameters
    #[serde(default)]
    pub call: CallSettings,

    /// Resident roster; the built-in roster is used when absent
    #[serde(default)]
    pub residents: Option<Vec<Resident>>,
}

impl IntercomConfigFile {
    /// Resident directory described by this file
    #[must_use]
    pub fn directory(&self) -> Directory {
        self.residents
            .clone()
            .map_or_else(Directory::default, Directory::new)
    }
}

/// Server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub port: Option<u16>,
    /// Externally reachable base URL used in `<Play>` links
    pub public_url: Option<String>,
    /// Directory rendered audio is written to and served from
    pub audio_dir: Option<PathBuf>,
}

/// Credentials configuration
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsFileConfig {
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: Option<String>,
    pub assemblyai_api_key: Option<String>,
}

/// Parse a config file from TOML text
///
/// # Errors
///
/// Returns error if the text is not valid for the schema
pub fn parse_config_file(content: &str) -> Result<IntercomConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the config file
///
/// An explicit `path` must exist and parse. Without one, the default location
/// is tried and any problem there falls back to defaults.
///
/// # Errors
///
/// Returns error if an explicit path cannot be read or parsed
pub fn load_config_file(path: Option<&Path>) -> Result<IntercomConfigFile> {
    if let Some(path) = path {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = parse_config_file(&content)?;
        tracing::info!(path = %path.display(), "loaded config file");
        return Ok(config);
    }

    let Some(path) = config_file_path() else {
        return Ok(IntercomConfigFile::default());
    };

    if !path.exists() {
        return Ok(IntercomConfigFile::default());
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                Ok(config)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                Ok(IntercomConfigFile::default())
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            Ok(IntercomConfigFile::default())
        }
    }
}

/// Return the config file path: `~/.config/intercom/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "intercom", "intercom")
        .map(|d| d.config_dir().join("config.toml"))
}
