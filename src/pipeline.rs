//! Session processing pipeline for Vodscribe.
//!
//! Coordinates the session state machine: media ingestion, audio extraction,
//! transcription, and atomic persistence of the resulting chunk timeline.

use crate::config::Settings;
use crate::error::{Result, VodscribeError};
use crate::extractor::{AudioExtractor, FfmpegExtractor};
use crate::media::MediaStore;
use crate::store::{Chunk, MemorySessionStore, Session, SessionStore, SqliteSessionStore};
use crate::transcription::{validate_segments, PlaceholderEngine, TranscriptionEngine};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::{info, instrument};
use uuid::Uuid;

/// The session processing pipeline.
///
/// All collaborators are injected capabilities; `new` wires the defaults
/// from settings, `with_components` lets callers substitute any of them.
pub struct Pipeline {
    store: Arc<dyn SessionStore>,
    media: MediaStore,
    extractor: Arc<dyn AudioExtractor>,
    engine: Arc<dyn TranscriptionEngine>,
}

impl Pipeline {
    /// Create a pipeline with default components from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let store: Arc<dyn SessionStore> = match settings.storage.provider.as_str() {
            "memory" => Arc::new(MemorySessionStore::new()),
            _ => Arc::new(SqliteSessionStore::new(&settings.sqlite_path())?),
        };

        Ok(Self {
            store,
            media: MediaStore::new(settings.upload_dir()),
            extractor: Arc::new(FfmpegExtractor::new(settings.audio_dir())),
            engine: Arc::new(PlaceholderEngine::new()),
        })
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        store: Arc<dyn SessionStore>,
        media: MediaStore,
        extractor: Arc<dyn AudioExtractor>,
        engine: Arc<dyn TranscriptionEngine>,
    ) -> Self {
        Self {
            store,
            media,
            extractor,
            engine,
        }
    }

    /// Get a reference to the session store.
    pub fn store(&self) -> Arc<dyn SessionStore> {
        self.store.clone()
    }

    /// Create a new session in the `created` state.
    pub async fn create_session(
        &self,
        title: Option<String>,
        youtube_url: Option<String>,
    ) -> Result<Session> {
        self.store.create_session(title, youtube_url).await
    }

    /// Store an uploaded media stream and move the session to `uploaded`.
    ///
    /// The reader is spooled to disk incrementally, never buffered whole.
    /// A re-upload resets a `ready` session back to `uploaded` and clears its
    /// audio path; chunks from the prior media remain queryable until the
    /// next `process` call replaces them.
    #[instrument(skip(self, reader), fields(session_id = %session_id))]
    pub async fn upload_media<R>(
        &self,
        session_id: Uuid,
        filename: &str,
        reader: R,
    ) -> Result<Session>
    where
        R: AsyncRead + Unpin + Send,
    {
        // Fail on unknown sessions before anything touches the disk.
        self.store.get_session(session_id).await?;

        let stored_path = self.media.save_upload(session_id, filename, reader).await?;
        self.store
            .update_session_media(session_id, &stored_path)
            .await?;

        info!("Uploaded {:?} for session {}", filename, session_id);
        self.store.get_session(session_id).await
    }

    /// Process an uploaded session: extract audio, transcribe, and atomically
    /// persist the chunk timeline, moving the session to `ready`.
    ///
    /// Re-running on an already processed session fully replaces its chunks;
    /// with a deterministic engine the result is idempotent. Extraction and
    /// transcription failures are surfaced verbatim and leave the session's
    /// status and chunks untouched.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn process(&self, session_id: Uuid) -> Result<ProcessResult> {
        let session = self.store.get_session(session_id).await?;

        let media_path = session.media_path.as_deref().ok_or_else(|| {
            VodscribeError::InvalidState("Upload a media file before processing.".to_string())
        })?;

        // The file can disappear out of band (moved or deleted on disk);
        // never proceed against a stale path.
        if !media_path.exists() {
            return Err(VodscribeError::InvalidState(
                "Stored media file is missing.".to_string(),
            ));
        }

        info!("Extracting audio for session {}", session_id);
        let audio_path = self.extractor.extract(session_id, media_path).await?;

        info!("Transcribing {:?}", audio_path);
        let segments = self.engine.transcribe(&audio_path).await?;
        validate_segments(&segments)?;

        let chunks: Vec<Chunk> = segments
            .into_iter()
            .map(|s| Chunk::new(session_id, s.start_ms, s.end_ms, s.text))
            .collect();

        self.store
            .replace_chunks_and_mark_ready(session_id, &audio_path, &chunks)
            .await?;

        info!("Session {} ready with {} chunks", session_id, chunks.len());

        let session = self.store.get_session(session_id).await?;
        let chunks = self.store.list_chunks(session_id).await?;

        Ok(ProcessResult { session, chunks })
    }

    /// Load the final session + chunks view without processing.
    pub async fn session_view(&self, session_id: Uuid) -> Result<ProcessResult> {
        let session = self.store.get_session(session_id).await?;
        let chunks = self.store.list_chunks(session_id).await?;
        Ok(ProcessResult { session, chunks })
    }
}

/// Result of processing a session.
#[derive(Debug)]
pub struct ProcessResult {
    /// The session after the operation.
    pub session: Session,
    /// The session's chunks, ordered by start time.
    pub chunks: Vec<Chunk>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SessionStatus;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    /// Extractor stub returning the media path untouched.
    struct EchoExtractor;

    #[async_trait]
    impl AudioExtractor for EchoExtractor {
        async fn extract(&self, _session_id: Uuid, media_path: &Path) -> Result<PathBuf> {
            Ok(media_path.to_path_buf())
        }
    }

    /// Extractor stub that always fails like a decoder crash.
    struct FailingExtractor;

    #[async_trait]
    impl AudioExtractor for FailingExtractor {
        async fn extract(&self, _session_id: Uuid, _media_path: &Path) -> Result<PathBuf> {
            Err(VodscribeError::ExtractionFailed(
                "moov atom not found".to_string(),
            ))
        }
    }

    fn test_pipeline(
        store: Arc<dyn SessionStore>,
        upload_root: &Path,
        extractor: Arc<dyn AudioExtractor>,
    ) -> Pipeline {
        Pipeline::with_components(
            store,
            MediaStore::new(upload_root.to_path_buf()),
            extractor,
            Arc::new(PlaceholderEngine::new()),
        )
    }

    #[tokio::test]
    async fn test_process_unknown_session() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(
            Arc::new(MemorySessionStore::new()),
            dir.path(),
            Arc::new(EchoExtractor),
        );

        let err = pipeline.process(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, VodscribeError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_process_without_upload_fails() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(
            Arc::new(MemorySessionStore::new()),
            dir.path(),
            Arc::new(EchoExtractor),
        );

        let session = pipeline.create_session(None, None).await.unwrap();
        let err = pipeline.process(session.id).await.unwrap_err();
        assert!(matches!(err, VodscribeError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_process_with_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(
            Arc::new(MemorySessionStore::new()),
            dir.path(),
            Arc::new(EchoExtractor),
        );

        let session = pipeline.create_session(None, None).await.unwrap();
        let uploaded = pipeline
            .upload_media(session.id, "clip.mp4", &b"bytes"[..])
            .await
            .unwrap();

        // Simulate the stored file disappearing out of band.
        std::fs::remove_file(uploaded.media_path.unwrap()).unwrap();

        let err = pipeline.process(session.id).await.unwrap_err();
        assert!(matches!(err, VodscribeError::InvalidState(_)));

        let after = pipeline.store().get_session(session.id).await.unwrap();
        assert_eq!(after.status, SessionStatus::Uploaded);
    }

    #[tokio::test]
    async fn test_full_flow_yields_placeholder_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(
            Arc::new(MemorySessionStore::new()),
            dir.path(),
            Arc::new(EchoExtractor),
        );

        let session = pipeline
            .create_session(Some("Ranked round 7".to_string()), None)
            .await
            .unwrap();
        let uploaded = pipeline
            .upload_media(session.id, "clip.mp4", &b"fake mp4 bytes"[..])
            .await
            .unwrap();
        assert_eq!(uploaded.status, SessionStatus::Uploaded);

        let result = pipeline.process(session.id).await.unwrap();
        assert_eq!(result.session.status, SessionStatus::Ready);
        assert!(result.session.audio_path.is_some());

        let intervals: Vec<(i64, i64, &str)> = result
            .chunks
            .iter()
            .map(|c| (c.start_ms, c.end_ms, c.text.as_str()))
            .collect();
        assert_eq!(
            intervals,
            vec![
                (0, 15_000, "Intro and setup for the round."),
                (15_000, 30_000, "Key play-by-play comms."),
                (30_000, 45_000, "Post-round recap and callouts."),
            ]
        );
    }

    #[tokio::test]
    async fn test_process_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(
            Arc::new(MemorySessionStore::new()),
            dir.path(),
            Arc::new(EchoExtractor),
        );

        let session = pipeline.create_session(None, None).await.unwrap();
        pipeline
            .upload_media(session.id, "clip.mp4", &b"bytes"[..])
            .await
            .unwrap();

        let first = pipeline.process(session.id).await.unwrap();
        let second = pipeline.process(session.id).await.unwrap();

        // Same chunk set, fully replaced, no accumulation.
        assert_eq!(second.chunks.len(), 3);
        let as_tuples = |chunks: &[Chunk]| {
            chunks
                .iter()
                .map(|c| (c.start_ms, c.end_ms, c.text.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(as_tuples(&first.chunks), as_tuples(&second.chunks));
    }

    #[tokio::test]
    async fn test_extraction_failure_leaves_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());

        let ok_pipeline = test_pipeline(store.clone(), dir.path(), Arc::new(EchoExtractor));
        let session = ok_pipeline.create_session(None, None).await.unwrap();
        ok_pipeline
            .upload_media(session.id, "clip.mp4", &b"bytes"[..])
            .await
            .unwrap();
        ok_pipeline.process(session.id).await.unwrap();

        // Same store, but the decoder now fails: nothing may change.
        let failing = test_pipeline(store.clone(), dir.path(), Arc::new(FailingExtractor));
        let err = failing.process(session.id).await.unwrap_err();
        assert!(matches!(err, VodscribeError::ExtractionFailed(_)));

        let after = store.get_session(session.id).await.unwrap();
        assert_eq!(after.status, SessionStatus::Ready);
        assert_eq!(store.list_chunks(session.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_wav_upload_passes_through_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let audio_dir = dir.path().join("audio");
        let pipeline = Pipeline::with_components(
            Arc::new(MemorySessionStore::new()),
            MediaStore::new(dir.path().join("uploads")),
            Arc::new(FfmpegExtractor::new(audio_dir)),
            Arc::new(PlaceholderEngine::new()),
        );

        let session = pipeline.create_session(None, None).await.unwrap();
        pipeline
            .upload_media(session.id, "clip.wav", &b"RIFF"[..])
            .await
            .unwrap();

        let result = pipeline.process(session.id).await.unwrap();
        assert_eq!(result.session.audio_path, result.session.media_path);
    }

    #[tokio::test]
    async fn test_reupload_resets_state_keeping_stale_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(
            Arc::new(MemorySessionStore::new()),
            dir.path(),
            Arc::new(EchoExtractor),
        );

        let session = pipeline.create_session(None, None).await.unwrap();
        pipeline
            .upload_media(session.id, "clip.mp4", &b"bytes"[..])
            .await
            .unwrap();
        pipeline.process(session.id).await.unwrap();

        let reuploaded = pipeline
            .upload_media(session.id, "other.mkv", &b"different bytes"[..])
            .await
            .unwrap();
        assert_eq!(reuploaded.status, SessionStatus::Uploaded);
        assert!(reuploaded.audio_path.is_none());

        // Chunks from the previous media stay queryable until the next
        // process call replaces them.
        let view = pipeline.session_view(session.id).await.unwrap();
        assert_eq!(view.chunks.len(), 3);
    }
}
