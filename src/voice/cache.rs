//! Content-addressed cache of rendered speech
//!
//! Audio is written to a directory served over HTTP under `/audio`. File names
//! are the SHA-256 of the text, so a phrase rendered before a restart is
//! reused as long as its file is still on disk. Files are written under a
//! temporary name and renamed into place, so a reader never sees a partial
//! file; empty files are treated as missing.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use super::SpeechSynthesizer;
use crate::{Error, Result};

/// Route prefix the audio directory is served under
pub const AUDIO_ROUTE: &str = "/audio";

/// Maps text to the URL of its rendered audio
pub struct AudioCache {
    tts: Arc<dyn SpeechSynthesizer>,
    dir: PathBuf,
    public_url: String,
    entries: RwLock<HashMap<String, String>>,
    writes: AtomicU64,
}

impl AudioCache {
    /// Create a cache writing into `dir` and linking under `public_url`
    #[must_use]
    pub fn new(tts: Arc<dyn SpeechSynthesizer>, dir: PathBuf, public_url: &str) -> Self {
        Self {
            tts,
            dir,
            public_url: public_url.trim_end_matches('/').to_string(),
            entries: RwLock::new(HashMap::new()),
            writes: AtomicU64::new(0),
        }
    }

    /// Directory holding rendered audio
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic file name for a phrase
    #[must_use]
    pub fn file_name(text: &str) -> String {
        format!("{}.mp3", hex::encode(Sha256::digest(text.as_bytes())))
    }

    /// Return the URL of `text`'s audio, synthesizing it on a miss
    ///
    /// Concurrent misses for the same text both synthesize; each writes its own
    /// temporary file and the last rename wins.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails, yields no audio, or the file cannot be
    /// written
    pub async fn get_or_create(&self, text: &str) -> Result<String> {
        if let Some(url) = self.entries.read().await.get(text) {
            tracing::debug!(url = %url, "audio cache hit");
            return Ok(url.clone());
        }

        let file_name = Self::file_name(text);
        let path = self.dir.join(&file_name);
        let url = format!("{}{AUDIO_ROUTE}/{file_name}", self.public_url);

        if Self::usable_on_disk(&path).await? {
            tracing::debug!(path = %path.display(), "audio found on disk");
        } else {
            let audio = self.tts.synthesize(text).await?;
            if audio.is_empty() {
                return Err(Error::Tts("provider returned no audio".to_string()));
            }
            self.write_atomically(&file_name, &audio).await?;
            tracing::info!(path = %path.display(), bytes = audio.len(), "rendered new audio");
        }

        self.entries
            .write()
            .await
            .insert(text.to_string(), url.clone());
        Ok(url)
    }

    /// Whether `path` holds a non-empty file
    async fn usable_on_disk(path: &Path) -> Result<bool> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.len() > 0 => Ok(true),
            Ok(_) => {
                tracing::warn!(path = %path.display(), "ignoring empty audio file");
                Ok(false)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a per-write temporary file, then rename over the final name
    async fn write_atomically(&self, file_name: &str, audio: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let seq = self.writes.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!("{file_name}.{}-{seq}.tmp", std::process::id()));

        let written = async {
            tokio::fs::write(&tmp, audio).await?;
            tokio::fs::rename(&tmp, self.dir.join(file_name)).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}
