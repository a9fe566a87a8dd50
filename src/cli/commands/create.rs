//! Create command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the create command.
pub async fn run_create(
    title: Option<String>,
    youtube_url: Option<String>,
    settings: Settings,
) -> Result<()> {
    let pipeline = Pipeline::new(&settings)?;

    let session = pipeline.create_session(title, youtube_url).await?;

    Output::success("Session created.");
    Output::kv("ID", &session.id.to_string());
    if let Some(title) = &session.title {
        Output::kv("Title", title);
    }
    Output::kv("Status", &session.status.to_string());
    Output::kv("Created", &session.created_at.to_rfc3339());
    println!();
    Output::info(&format!(
        "Upload media with: vodscribe upload {} <file>",
        session.id
    ));

    Ok(())
}
