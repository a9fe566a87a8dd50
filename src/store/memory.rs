//! In-memory session store implementation.
//!
//! Useful for testing and throwaway setups.

use super::{Chunk, Session, SessionStatus, SessionStore};
use crate::error::{Result, VodscribeError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory session store.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    chunks: RwLock<Vec<Chunk>>,
}

impl MemorySessionStore {
    /// Create a new in-memory session store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            chunks: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(
        &self,
        title: Option<String>,
        youtube_url: Option<String>,
    ) -> Result<Session> {
        let session = Session::new(title, youtube_url);
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> Result<Session> {
        let sessions = self.sessions.read().unwrap();
        sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| VodscribeError::SessionNotFound(id.to_string()))
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().unwrap();
        let mut result: Vec<Session> = sessions.values().cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update_session_media(&self, id: Uuid, media_path: &Path) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| VodscribeError::SessionNotFound(id.to_string()))?;

        session.status = SessionStatus::Uploaded;
        session.media_path = Some(media_path.to_path_buf());
        session.audio_path = None;
        Ok(())
    }

    async fn replace_chunks_and_mark_ready(
        &self,
        id: Uuid,
        audio_path: &Path,
        chunks: &[Chunk],
    ) -> Result<()> {
        // Hold both locks so the swap is atomic with the status change.
        let mut sessions = self.sessions.write().unwrap();
        let mut stored = self.chunks.write().unwrap();

        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| VodscribeError::SessionNotFound(id.to_string()))?;

        stored.retain(|c| c.session_id != id);
        stored.extend_from_slice(chunks);

        session.status = SessionStatus::Ready;
        session.audio_path = Some(audio_path.to_path_buf());
        Ok(())
    }

    async fn list_chunks(&self, session_id: Uuid) -> Result<Vec<Chunk>> {
        let stored = self.chunks.read().unwrap();
        let mut result: Vec<Chunk> = stored
            .iter()
            .filter(|c| c.session_id == session_id)
            .cloned()
            .collect();
        result.sort_by_key(|c| c.start_ms);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_session_store() {
        let store = MemorySessionStore::new();

        let session = store
            .create_session(Some("Test VOD".to_string()), None)
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Created);

        store
            .update_session_media(session.id, Path::new("/tmp/clip.mp4"))
            .await
            .unwrap();

        let chunks = vec![
            Chunk::new(session.id, 15_000, 30_000, "second".to_string()),
            Chunk::new(session.id, 0, 15_000, "first".to_string()),
        ];
        store
            .replace_chunks_and_mark_ready(session.id, Path::new("/tmp/out.wav"), &chunks)
            .await
            .unwrap();

        let fetched = store.get_session(session.id).await.unwrap();
        assert_eq!(fetched.status, SessionStatus::Ready);

        let listed = store.list_chunks(session.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].text, "first");
    }

    #[tokio::test]
    async fn test_memory_store_not_found() {
        let store = MemorySessionStore::new();
        let err = store.get_session(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, VodscribeError::SessionNotFound(_)));
    }
}
