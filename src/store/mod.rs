//! Session store abstraction for Vodscribe.
//!
//! Provides a trait-based interface for session and chunk persistence so the
//! pipeline and API receive an injected store rather than an ambient handle.

mod memory;
mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Lifecycle state of a session.
///
/// Advances monotonically: `created` -> `uploaded` -> `ready`. Only a new
/// media upload moves a session backwards (`ready` -> `uploaded`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Created,
    Uploaded,
    Ready,
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(SessionStatus::Created),
            "uploaded" => Ok(SessionStatus::Uploaded),
            "ready" => Ok(SessionStatus::Ready),
            _ => Err(format!("Unknown session status: {}", s)),
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Created => write!(f, "created"),
            SessionStatus::Uploaded => write!(f, "uploaded"),
            SessionStatus::Ready => write!(f, "ready"),
        }
    }
}

/// A session pairing one media upload with its derived audio and chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID, generated at creation.
    pub id: Uuid,
    /// Optional user-supplied title.
    pub title: Option<String>,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// Optional source URL the media was captured from.
    pub youtube_url: Option<String>,
    /// Path to the originally uploaded media file.
    pub media_path: Option<PathBuf>,
    /// Path to the canonical extracted audio; cleared by a new upload.
    pub audio_path: Option<PathBuf>,
    /// Creation timestamp, immutable.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session in the `created` state.
    pub fn new(title: Option<String>, youtube_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            status: SessionStatus::Created,
            youtube_url,
            media_path: None,
            audio_path: None,
            created_at: Utc::now(),
        }
    }
}

/// A timestamped transcript segment belonging to a session's audio timeline.
///
/// `start_ms..end_ms` is a half-open millisecond interval; chunks of one
/// session are non-overlapping and ordered by `start_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID.
    pub id: Uuid,
    /// Owning session.
    pub session_id: Uuid,
    /// Interval start, in milliseconds.
    pub start_ms: i64,
    /// Interval end, in milliseconds.
    pub end_ms: i64,
    /// Transcript content for the interval.
    pub text: String,
}

impl Chunk {
    /// Create a new chunk with a fresh ID.
    pub fn new(session_id: Uuid, start_ms: i64, end_ms: i64, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            start_ms,
            end_ms,
            text,
        }
    }

    /// Format the chunk's start position for display.
    ///
    /// Starts before zero never enter the store, but display clamps to
    /// 00:00 rather than wrapping.
    pub fn format_timestamp(&self) -> String {
        let total_seconds = (self.start_ms.max(0) / 1000) as u32;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{:02}:{:02}", minutes, secs)
        }
    }
}

/// Trait for session store implementations.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new session in the `created` state.
    async fn create_session(
        &self,
        title: Option<String>,
        youtube_url: Option<String>,
    ) -> Result<Session>;

    /// Fetch a session by ID.
    async fn get_session(&self, id: Uuid) -> Result<Session>;

    /// List all sessions, most recently created first.
    async fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Record a new media upload: sets status to `uploaded`, stores the media
    /// path, and clears any stale audio path.
    async fn update_session_media(&self, id: Uuid, media_path: &Path) -> Result<()>;

    /// Atomically replace all chunks for a session and mark it `ready` with
    /// the given audio path. All-or-nothing: a failure leaves the session's
    /// prior chunks and status untouched.
    async fn replace_chunks_and_mark_ready(
        &self,
        id: Uuid,
        audio_path: &Path,
        chunks: &[Chunk],
    ) -> Result<()>;

    /// List all chunks for a session, ordered ascending by start time.
    async fn list_chunks(&self, session_id: Uuid) -> Result<Vec<Chunk>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            SessionStatus::Created,
            SessionStatus::Uploaded,
            SessionStatus::Ready,
        ] {
            let parsed: SessionStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }

        assert!("processing".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new(Some("Ranked VOD".to_string()), None);
        assert_eq!(session.status, SessionStatus::Created);
        assert!(session.media_path.is_none());
        assert!(session.audio_path.is_none());
    }

    #[test]
    fn test_chunk_timestamp_format() {
        let chunk = Chunk::new(Uuid::new_v4(), 125_000, 130_000, "content".to_string());
        assert_eq!(chunk.format_timestamp(), "02:05");

        let long = Chunk::new(Uuid::new_v4(), 3_725_000, 3_730_000, "content".to_string());
        assert_eq!(long.format_timestamp(), "01:02:05");

        // A negative start clamps to zero instead of wrapping.
        let negative = Chunk::new(Uuid::new_v4(), -5_000, 1_000, "content".to_string());
        assert_eq!(negative.format_timestamp(), "00:00");
    }
}
