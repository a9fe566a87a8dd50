//! Configuration module for Vodscribe.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{GeneralSettings, MediaSettings, ServerSettings, Settings, StorageSettings};
