//! Show command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::VodscribeError;
use crate::pipeline::Pipeline;
use anyhow::Result;
use uuid::Uuid;

/// Run the show command.
pub async fn run_show(session: &str, settings: Settings) -> Result<()> {
    let session_id: Uuid = session
        .parse()
        .map_err(|_| VodscribeError::InvalidInput(format!("Not a session ID: {}", session)))?;

    let pipeline = Pipeline::new(&settings)?;
    let view = pipeline.session_view(session_id).await?;

    Output::header(view.session.title.as_deref().unwrap_or("(untitled)"));
    println!();
    Output::kv("ID", &view.session.id.to_string());
    Output::kv("Status", &view.session.status.to_string());
    if let Some(url) = &view.session.youtube_url {
        Output::kv("Source URL", url);
    }
    if let Some(media_path) = &view.session.media_path {
        Output::kv("Media", &media_path.display().to_string());
    }
    if let Some(audio_path) = &view.session.audio_path {
        Output::kv("Audio", &audio_path.display().to_string());
    }
    Output::kv("Created", &view.session.created_at.to_rfc3339());

    println!();
    if view.chunks.is_empty() {
        Output::info("No transcript chunks yet. Run 'vodscribe process' after uploading media.");
    } else {
        Output::header(&format!("Transcript ({} chunks)", view.chunks.len()));
        println!();
        for chunk in &view.chunks {
            Output::chunk_line(&chunk.format_timestamp(), &chunk.text);
        }
    }

    Ok(())
}
