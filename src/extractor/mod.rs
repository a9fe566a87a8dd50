//! Audio extraction via ffmpeg.
//!
//! Normalizes arbitrary media containers into the canonical audio format
//! (mono-compatible PCM16 at 16kHz) all later pipeline stages assume. Files
//! that are already audio-only are passed through without re-encoding.

use crate::error::{Result, VodscribeError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Audio-only containers that skip extraction entirely.
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "ogg", "flac"];

/// Capability interface for producing canonical audio from a media file.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Produce a canonical audio file for the session's media.
    ///
    /// Returns the input path unchanged when the file is already a
    /// recognized audio-only container.
    async fn extract(&self, session_id: Uuid, media_path: &Path) -> Result<PathBuf>;
}

/// ffmpeg-backed extractor writing `<audio_dir>/<session_id>.wav`.
pub struct FfmpegExtractor {
    audio_dir: PathBuf,
}

impl FfmpegExtractor {
    /// Create an extractor targeting the given audio output directory.
    pub fn new(audio_dir: PathBuf) -> Self {
        Self { audio_dir }
    }

    /// Check if path is a recognized audio-only container.
    fn is_audio_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn extract(&self, session_id: Uuid, media_path: &Path) -> Result<PathBuf> {
        // Already pure audio: no re-encoding, hand the original back.
        if Self::is_audio_file(media_path) {
            debug!("Audio container detected, skipping extraction");
            return Ok(media_path.to_path_buf());
        }

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let audio_path = self.audio_dir.join(format!("{}.wav", session_id));

        info!("Extracting audio from {:?}", media_path);

        let result = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i").arg(media_path)
            .arg("-vn")
            .arg("-acodec").arg("pcm_s16le")
            .arg("-ar").arg("16000")
            .arg(&audio_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VodscribeError::ToolNotFound("ffmpeg".into()));
            }
            Err(e) => {
                return Err(VodscribeError::ExtractionFailed(format!(
                    "ffmpeg execution failed: {e}"
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VodscribeError::ExtractionFailed(stderr.into_owned()));
        }

        info!("Extracted audio to {:?}", audio_path);
        Ok(audio_path)
    }
}
