//! SQLite-based session store implementation.
//!
//! Uses a single connection behind a mutex; the replace-and-mark-ready step
//! runs in one transaction so a session is never `ready` with stale chunks.

use super::{Chunk, Session, SessionStatus, SessionStore};
use crate::error::{Result, VodscribeError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

/// SQLite-based session store.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    title TEXT,
    status TEXT NOT NULL DEFAULT 'created',
    youtube_url TEXT,
    media_path TEXT,
    audio_path TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id),
    start_ms INTEGER NOT NULL,
    end_ms INTEGER NOT NULL,
    text TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_session ON chunks(session_id, start_ms);
"#;

impl SqliteSessionStore {
    /// Create a new SQLite session store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite session store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite session store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VodscribeError::Storage(format!("Failed to acquire lock: {}", e)))
    }

    /// Timestamp encoding used in the database. Fixed-width UTC with a
    /// trailing Z, so lexicographic order matches chronological order.
    fn encode_timestamp(ts: DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
        let id_str: String = row.get(0)?;
        let status_str: String = row.get(2)?;
        let media_path: Option<String> = row.get(4)?;
        let audio_path: Option<String> = row.get(5)?;
        let created_at_str: String = row.get(6)?;

        Ok(Session {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            title: row.get(1)?,
            status: status_str.parse().unwrap_or(SessionStatus::Created),
            youtube_url: row.get(3)?,
            media_path: media_path.map(Into::into),
            audio_path: audio_path.map(Into::into),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    fn chunk_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chunk> {
        let id_str: String = row.get(0)?;
        let session_id_str: String = row.get(1)?;

        Ok(Chunk {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            session_id: uuid::Uuid::parse_str(&session_id_str).unwrap_or_default(),
            start_ms: row.get(2)?,
            end_ms: row.get(3)?,
            text: row.get(4)?,
        })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    #[instrument(skip(self))]
    async fn create_session(
        &self,
        title: Option<String>,
        youtube_url: Option<String>,
    ) -> Result<Session> {
        let session = Session::new(title, youtube_url);
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO sessions (id, title, status, youtube_url, media_path, audio_path, created_at)
            VALUES (?1, ?2, ?3, ?4, NULL, NULL, ?5)
            "#,
            params![
                session.id.to_string(),
                session.title,
                session.status.to_string(),
                session.youtube_url,
                Self::encode_timestamp(session.created_at),
            ],
        )?;

        debug!("Created session {}", session.id);
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn get_session(&self, id: uuid::Uuid) -> Result<Session> {
        let conn = self.lock()?;

        let session = conn.query_row(
            r#"
            SELECT id, title, status, youtube_url, media_path, audio_path, created_at
            FROM sessions
            WHERE id = ?1
            "#,
            params![id.to_string()],
            Self::session_from_row,
        );

        match session {
            Ok(s) => Ok(s),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(VodscribeError::SessionNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, title, status, youtube_url, media_path, audio_path, created_at
            FROM sessions
            ORDER BY created_at DESC
            "#,
        )?;

        let sessions = stmt.query_map([], Self::session_from_row)?;
        let result: Vec<Session> = sessions.filter_map(|s| s.ok()).collect();

        debug!("Listed {} sessions", result.len());
        Ok(result)
    }

    #[instrument(skip(self, media_path))]
    async fn update_session_media(&self, id: uuid::Uuid, media_path: &Path) -> Result<()> {
        let conn = self.lock()?;

        let updated = conn.execute(
            r#"
            UPDATE sessions
            SET status = 'uploaded', media_path = ?1, audio_path = NULL
            WHERE id = ?2
            "#,
            params![media_path.to_string_lossy().into_owned(), id.to_string()],
        )?;

        if updated == 0 {
            return Err(VodscribeError::SessionNotFound(id.to_string()));
        }

        info!("Recorded media upload for session {}", id);
        Ok(())
    }

    #[instrument(skip(self, audio_path, chunks))]
    async fn replace_chunks_and_mark_ready(
        &self,
        id: uuid::Uuid,
        audio_path: &Path,
        chunks: &[Chunk],
    ) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let updated = tx.execute(
            "UPDATE sessions SET status = 'ready', audio_path = ?1 WHERE id = ?2",
            params![audio_path.to_string_lossy().into_owned(), id.to_string()],
        )?;

        if updated == 0 {
            // Dropping the uncommitted transaction rolls everything back.
            return Err(VodscribeError::SessionNotFound(id.to_string()));
        }

        tx.execute(
            "DELETE FROM chunks WHERE session_id = ?1",
            params![id.to_string()],
        )?;

        for chunk in chunks {
            tx.execute(
                r#"
                INSERT INTO chunks (id, session_id, start_ms, end_ms, text)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    chunk.id.to_string(),
                    chunk.session_id.to_string(),
                    chunk.start_ms,
                    chunk.end_ms,
                    chunk.text,
                ],
            )?;
        }

        tx.commit()?;
        info!("Stored {} chunks and marked session {} ready", chunks.len(), id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_chunks(&self, session_id: uuid::Uuid) -> Result<Vec<Chunk>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, session_id, start_ms, end_ms, text
            FROM chunks
            WHERE session_id = ?1
            ORDER BY start_ms
            "#,
        )?;

        let chunks = stmt.query_map(params![session_id.to_string()], Self::chunk_from_row)?;
        let result: Vec<Chunk> = chunks.filter_map(|c| c.ok()).collect();

        debug!("Found {} chunks for session {}", result.len(), session_id);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_create_and_get_session() {
        let store = SqliteSessionStore::in_memory().unwrap();

        let session = store
            .create_session(Some("Scrim VOD".to_string()), Some("https://youtu.be/x".to_string()))
            .await
            .unwrap();

        assert_eq!(session.status, SessionStatus::Created);

        let fetched = store.get_session(session.id).await.unwrap();
        assert_eq!(fetched.id, session.id);
        assert_eq!(fetched.title.as_deref(), Some("Scrim VOD"));
        assert!(fetched.media_path.is_none());
        assert!(fetched.audio_path.is_none());
    }

    #[tokio::test]
    async fn test_get_session_not_found() {
        let store = SqliteSessionStore::in_memory().unwrap();

        let err = store.get_session(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, VodscribeError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_sessions_newest_first() {
        let store = SqliteSessionStore::in_memory().unwrap();

        let first = store.create_session(Some("first".to_string()), None).await.unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store.create_session(Some("second".to_string()), None).await.unwrap();

        let sessions = store.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, second.id);
        assert_eq!(sessions[1].id, first.id);
    }

    #[tokio::test]
    async fn test_update_session_media() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let session = store.create_session(None, None).await.unwrap();

        store
            .update_session_media(session.id, Path::new("/data/uploads/clip.mp4"))
            .await
            .unwrap();

        let fetched = store.get_session(session.id).await.unwrap();
        assert_eq!(fetched.status, SessionStatus::Uploaded);
        assert_eq!(
            fetched.media_path.as_deref(),
            Some(Path::new("/data/uploads/clip.mp4"))
        );
    }

    #[tokio::test]
    async fn test_update_session_media_not_found() {
        let store = SqliteSessionStore::in_memory().unwrap();

        let err = store
            .update_session_media(Uuid::new_v4(), Path::new("/data/clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, VodscribeError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_replace_chunks_marks_ready_and_orders() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let session = store.create_session(None, None).await.unwrap();
        store
            .update_session_media(session.id, Path::new("/data/clip.mp4"))
            .await
            .unwrap();

        // Insert out of order; list_chunks must come back sorted by start_ms.
        let chunks = vec![
            Chunk::new(session.id, 30_000, 45_000, "third".to_string()),
            Chunk::new(session.id, 0, 15_000, "first".to_string()),
            Chunk::new(session.id, 15_000, 30_000, "second".to_string()),
        ];

        store
            .replace_chunks_and_mark_ready(session.id, Path::new("/data/audio/out.wav"), &chunks)
            .await
            .unwrap();

        let fetched = store.get_session(session.id).await.unwrap();
        assert_eq!(fetched.status, SessionStatus::Ready);
        assert_eq!(
            fetched.audio_path.as_deref(),
            Some(Path::new("/data/audio/out.wav"))
        );

        let listed = store.list_chunks(session.id).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].text, "first");
        assert_eq!(listed[1].text, "second");
        assert_eq!(listed[2].text, "third");
    }

    #[tokio::test]
    async fn test_replace_chunks_fully_replaces() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let session = store.create_session(None, None).await.unwrap();

        let first_run = vec![
            Chunk::new(session.id, 0, 10_000, "old a".to_string()),
            Chunk::new(session.id, 10_000, 20_000, "old b".to_string()),
        ];
        store
            .replace_chunks_and_mark_ready(session.id, Path::new("/a.wav"), &first_run)
            .await
            .unwrap();

        let second_run = vec![Chunk::new(session.id, 0, 30_000, "new".to_string())];
        store
            .replace_chunks_and_mark_ready(session.id, Path::new("/a.wav"), &second_run)
            .await
            .unwrap();

        let listed = store.list_chunks(session.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].text, "new");
    }

    #[tokio::test]
    async fn test_replace_chunks_unknown_session_rolls_back() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let missing = Uuid::new_v4();

        let chunks = vec![Chunk::new(missing, 0, 15_000, "orphan".to_string())];
        let err = store
            .replace_chunks_and_mark_ready(missing, Path::new("/a.wav"), &chunks)
            .await
            .unwrap_err();
        assert!(matches!(err, VodscribeError::SessionNotFound(_)));

        let listed = store.list_chunks(missing).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_reupload_clears_audio_path() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let session = store.create_session(None, None).await.unwrap();

        store
            .update_session_media(session.id, Path::new("/uploads/clip.mp4"))
            .await
            .unwrap();
        store
            .replace_chunks_and_mark_ready(session.id, Path::new("/audio/out.wav"), &[])
            .await
            .unwrap();

        store
            .update_session_media(session.id, Path::new("/uploads/other.mkv"))
            .await
            .unwrap();

        let fetched = store.get_session(session.id).await.unwrap();
        assert_eq!(fetched.status, SessionStatus::Uploaded);
        assert!(fetched.audio_path.is_none());
        assert_eq!(
            fetched.media_path.as_deref(),
            Some(Path::new("/uploads/other.mkv"))
        );
    }
}
