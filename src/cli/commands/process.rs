//! Process command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::error::VodscribeError;
use crate::pipeline::Pipeline;
use anyhow::Result;
use uuid::Uuid;

/// Run the process command.
pub async fn run_process(session: &str, settings: Settings) -> Result<()> {
    let session_id: Uuid = session
        .parse()
        .map_err(|_| VodscribeError::InvalidInput(format!("Not a session ID: {}", session)))?;

    // Audio-only uploads pass through without the decoder, so a missing
    // ffmpeg is only worth a warning here; the extractor reports it as a
    // hard error if it is actually needed.
    if let Err(e) = preflight::check(preflight::Operation::Process) {
        Output::warning(&format!("{}", e));
    }

    let pipeline = Pipeline::new(&settings)?;

    let spinner = Output::spinner("Processing session...");
    let result = pipeline.process(session_id).await;
    spinner.finish_and_clear();

    let result = result?;

    Output::success(&format!(
        "Session is {} with {} chunks.",
        result.session.status,
        result.chunks.len()
    ));
    if let Some(audio_path) = &result.session.audio_path {
        Output::kv("Audio", &audio_path.display().to_string());
    }
    println!();

    for chunk in &result.chunks {
        Output::chunk_line(&chunk.format_timestamp(), &chunk.text);
    }

    Ok(())
}
