//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for the full session lifecycle: create, upload,
//! process, and read back sessions with their transcript chunks.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::VodscribeError;
use crate::pipeline::Pipeline;
use crate::store::{Chunk, Session};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::StreamReader;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Maximum accepted upload size (media files can be large).
const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024 * 1024;

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(&settings)?;

    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/chunks", get(get_chunks))
        .route("/sessions/{id}/media", post(upload_media))
        .route("/sessions/{id}/process", post(process_session))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Vodscribe API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Create Session", "POST /sessions");
    Output::kv("List Sessions", "GET  /sessions");
    Output::kv("Get Session", "GET  /sessions/:id");
    Output::kv("Get Chunks", "GET  /sessions/:id/chunks");
    Output::kv("Upload Media", "POST /sessions/:id/media");
    Output::kv("Process", "POST /sessions/:id/process");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize, Default)]
struct SessionCreateRequest {
    title: Option<String>,
    youtube_url: Option<String>,
}

#[derive(Serialize)]
struct SessionResponse {
    id: Uuid,
    title: Option<String>,
    status: String,
    youtube_url: Option<String>,
    media_path: Option<String>,
    audio_path: Option<String>,
    created_at: String,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            title: session.title,
            status: session.status.to_string(),
            youtube_url: session.youtube_url,
            media_path: session.media_path.map(|p| p.display().to_string()),
            audio_path: session.audio_path.map(|p| p.display().to_string()),
            created_at: session.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct ChunkResponse {
    id: Uuid,
    session_id: Uuid,
    start_ms: i64,
    end_ms: i64,
    text: String,
}

impl From<Chunk> for ChunkResponse {
    fn from(chunk: Chunk) -> Self {
        Self {
            id: chunk.id,
            session_id: chunk.session_id,
            start_ms: chunk.start_ms,
            end_ms: chunk.end_ms,
            text: chunk.text,
        }
    }
}

#[derive(Serialize)]
struct SessionDetailResponse {
    session: SessionResponse,
    chunks: Vec<ChunkResponse>,
}

#[derive(Serialize)]
struct UploadResponse {
    session: SessionResponse,
    stored_path: String,
    original_filename: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Map the error taxonomy onto HTTP status codes.
fn error_response(err: VodscribeError) -> Response {
    let status = match &err {
        VodscribeError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        VodscribeError::InvalidState(_) | VodscribeError::InvalidInput(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionCreateRequest>,
) -> Response {
    match state
        .pipeline
        .create_session(req.title, req.youtube_url)
        .await
    {
        Ok(session) => Json(SessionResponse::from(session)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_sessions(State(state): State<Arc<AppState>>) -> Response {
    match state.pipeline.store().list_sessions().await {
        Ok(sessions) => Json(
            sessions
                .into_iter()
                .map(SessionResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.pipeline.session_view(id).await {
        Ok(view) => Json(SessionDetailResponse {
            session: view.session.into(),
            chunks: view.chunks.into_iter().map(ChunkResponse::from).collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_chunks(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    // Resolve the session first so an unknown ID is a 404, not an empty list.
    match state.pipeline.session_view(id).await {
        Ok(view) => Json(
            view.chunks
                .into_iter()
                .map(ChunkResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn upload_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Response {
    while let Some(field) = match multipart.next_field().await {
        Ok(field) => field,
        Err(e) => {
            return error_response(VodscribeError::InvalidInput(format!(
                "Malformed multipart body: {}",
                e
            )))
        }
    } {
        if field.name() != Some("file") {
            continue;
        }

        let Some(filename) = field.file_name().map(str::to_string) else {
            return error_response(VodscribeError::InvalidInput(
                "Filename is required".to_string(),
            ));
        };

        // Spool the field to disk as it arrives; never buffer the whole
        // upload in memory.
        let reader = StreamReader::new(field.map_err(std::io::Error::other));

        return match state.pipeline.upload_media(id, &filename, reader).await {
            Ok(session) => {
                let stored_path = session
                    .media_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                Json(UploadResponse {
                    session: session.into(),
                    stored_path,
                    original_filename: filename,
                })
                .into_response()
            }
            Err(e) => error_response(e),
        };
    }

    error_response(VodscribeError::InvalidInput(
        "Multipart field 'file' is required".to_string(),
    ))
}

async fn process_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.pipeline.process(id).await {
        Ok(result) => Json(SessionDetailResponse {
            session: result.session.into(),
            chunks: result.chunks.into_iter().map(ChunkResponse::from).collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}
