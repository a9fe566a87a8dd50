//! Upload handling and on-disk media layout.
//!
//! Each session gets its own subdirectory under the upload root. Only the
//! final path component of an uploaded filename is trusted; traversal
//! components are stripped before the path is derived.

use crate::error::{Result, VodscribeError};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{info, instrument};
use uuid::Uuid;

/// Stores uploaded media files per session.
pub struct MediaStore {
    upload_dir: PathBuf,
}

impl MediaStore {
    /// Create a media store rooted at the given upload directory.
    pub fn new(upload_dir: PathBuf) -> Self {
        Self { upload_dir }
    }

    /// Directory holding a session's uploads.
    pub fn session_dir(&self, session_id: Uuid) -> PathBuf {
        self.upload_dir.join(session_id.to_string())
    }

    /// Spool an uploaded byte stream to the session's directory.
    ///
    /// The reader is copied to disk incrementally, so memory use stays flat
    /// no matter how large the upload is. The file is fully written and
    /// synced before this returns, so any subsequent reader sees a complete
    /// file. An existing file with the same name is overwritten.
    #[instrument(skip(self, reader), fields(session_id = %session_id))]
    pub async fn save_upload<R>(
        &self,
        session_id: Uuid,
        filename: &str,
        mut reader: R,
    ) -> Result<PathBuf>
    where
        R: AsyncRead + Unpin + Send,
    {
        let safe_name = sanitize_filename(filename)?;

        let dest_dir = self.session_dir(session_id);
        tokio::fs::create_dir_all(&dest_dir).await?;

        let dest_path = dest_dir.join(safe_name);

        let mut file = tokio::fs::File::create(&dest_path).await?;
        let bytes = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;

        info!("Stored {} byte upload at {:?}", bytes, dest_path);
        Ok(dest_path)
    }
}

/// Reduce an untrusted filename to its final path component.
///
/// Rejects names that leave nothing usable after stripping (empty strings,
/// bare separators, `.` and `..`).
fn sanitize_filename(filename: &str) -> Result<String> {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    // Windows-style separators are not path separators on Unix; strip them too.
    let base = base.rsplit('\\').next().unwrap_or("");

    if base.is_empty() || base == "." || base == ".." {
        return Err(VodscribeError::InvalidInput(format!(
            "Filename is not usable: {:?}",
            filename
        )));
    }

    Ok(base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_filename() {
        assert_eq!(sanitize_filename("clip.mp4").unwrap(), "clip.mp4");
    }

    #[test]
    fn test_sanitize_strips_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("/var/log/clip.mp4").unwrap(), "clip.mp4");
        assert_eq!(sanitize_filename("..\\..\\clip.mp4").unwrap(), "clip.mp4");
    }

    #[test]
    fn test_sanitize_rejects_degenerate_names() {
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename(".").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("/").is_err());
    }

    #[tokio::test]
    async fn test_save_upload_writes_per_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf());
        let session_id = Uuid::new_v4();

        let path = store
            .save_upload(session_id, "clip.mp4", &b"fake media bytes"[..])
            .await
            .unwrap();

        assert!(path.starts_with(dir.path().join(session_id.to_string())));
        assert_eq!(std::fs::read(&path).unwrap(), b"fake media bytes");
    }

    #[tokio::test]
    async fn test_save_upload_overwrites_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf());
        let session_id = Uuid::new_v4();

        store
            .save_upload(session_id, "clip.mp4", &b"old"[..])
            .await
            .unwrap();
        let path = store
            .save_upload(session_id, "clip.mp4", &b"new"[..])
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_save_upload_confines_traversal_payload() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf());
        let session_id = Uuid::new_v4();

        let path = store
            .save_upload(session_id, "../../escape.mp4", &b"data"[..])
            .await
            .unwrap();

        assert!(path.starts_with(dir.path().join(session_id.to_string())));
        assert_eq!(path.file_name().unwrap(), "escape.mp4");
    }

    #[tokio::test]
    async fn test_save_upload_spools_from_file_reader() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().join("uploads"));
        let session_id = Uuid::new_v4();

        // Larger than any single copy buffer, so the content crosses
        // multiple read/write iterations.
        let payload = vec![0xABu8; 256 * 1024];
        let src_path = dir.path().join("source.mp4");
        std::fs::write(&src_path, &payload).unwrap();

        let src = tokio::fs::File::open(&src_path).await.unwrap();
        let path = store
            .save_upload(session_id, "source.mp4", src)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), payload);
    }
}
