//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let pipeline = Pipeline::new(&settings)?;

    match pipeline.store().list_sessions().await {
        Ok(sessions) => {
            if sessions.is_empty() {
                Output::info("No sessions yet. Use 'vodscribe create' to start one.");
            } else {
                Output::header(&format!("Sessions ({})", sessions.len()));
                println!();

                for session in &sessions {
                    Output::session_line(
                        session.title.as_deref().unwrap_or("(untitled)"),
                        &session.id.to_string(),
                        &session.status.to_string(),
                        &session.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list sessions: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
