//! Upload command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::VodscribeError;
use crate::pipeline::Pipeline;
use anyhow::Result;
use std::path::Path;
use uuid::Uuid;

/// Run the upload command.
pub async fn run_upload(session: &str, file: &str, settings: Settings) -> Result<()> {
    let session_id: Uuid = session
        .parse()
        .map_err(|_| VodscribeError::InvalidInput(format!("Not a session ID: {}", session)))?;

    let path = Path::new(file);
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| VodscribeError::InvalidInput(format!("Not a usable file path: {}", file)))?;

    // Hand the file handle to the pipeline so the VOD streams to its
    // destination instead of being read into memory first.
    let media_file = tokio::fs::File::open(path)
        .await
        .map_err(|e| VodscribeError::InvalidInput(format!("Cannot read {}: {}", file, e)))?;
    let size = media_file.metadata().await?.len();

    let pipeline = Pipeline::new(&settings)?;
    let updated = pipeline.upload_media(session_id, filename, media_file).await?;

    Output::success(&format!("Uploaded {} ({} bytes).", filename, size));
    Output::kv("Session", &updated.id.to_string());
    Output::kv("Status", &updated.status.to_string());
    if let Some(media_path) = &updated.media_path {
        Output::kv("Stored at", &media_path.display().to_string());
    }
    println!();
    Output::info(&format!(
        "Generate the transcript with: vodscribe process {}",
        updated.id
    ));

    Ok(())
}
