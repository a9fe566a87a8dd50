//! CLI module for Vodscribe.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Vodscribe - VOD Transcript Sessions
///
/// A local-first tool for managing sessions that pair a media upload with
/// extracted audio and time-stamped transcript chunks.
#[derive(Parser, Debug)]
#[command(name = "vodscribe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Vodscribe and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Create a new session
    Create {
        /// Session title
        #[arg(short, long)]
        title: Option<String>,

        /// Source URL the VOD was captured from
        #[arg(long)]
        youtube_url: Option<String>,
    },

    /// Upload a media file into a session
    Upload {
        /// Session ID
        session: String,

        /// Path to the media file
        file: String,
    },

    /// Process a session: extract audio and generate transcript chunks
    Process {
        /// Session ID
        session: String,
    },

    /// List sessions
    List,

    /// Show a session and its transcript chunks
    Show {
        /// Session ID
        session: String,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
