//! Vodscribe - VOD Transcript Sessions
//!
//! A local-first tool for managing sessions that pair a media upload with
//! extracted audio and time-stamped transcript chunks.
//!
//! # Overview
//!
//! Vodscribe allows you to:
//! - Create sessions for VOD recordings and upload their media files
//! - Extract canonical mono 16kHz audio from arbitrary media containers
//! - Generate and persist an ordered transcript chunk timeline per session
//! - Serve the whole lifecycle over an HTTP API for frontend integration
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `store` - Session and chunk persistence abstraction
//! - `media` - Upload handling and on-disk media layout
//! - `extractor` - Audio extraction via ffmpeg (with pass-through)
//! - `transcription` - Pluggable transcription engine interface
//! - `pipeline` - Session state machine and processing coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use vodscribe::config::Settings;
//! use vodscribe::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(&settings)?;
//!
//!     let session = pipeline.create_session(Some("Scrim VOD".into()), None).await?;
//!     println!("Created session {}", session.id);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod media;
pub mod pipeline;
pub mod store;
pub mod transcription;

pub use error::{Result, VodscribeError};
