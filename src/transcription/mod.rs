//! Transcription engine interface for Vodscribe.
//!
//! The pipeline's contract with an engine: given an audio file path, return
//! an ordered, non-overlapping sequence of timed segments covering the
//! file's duration. Any speech-to-text backend can be plugged in behind this
//! trait; the placeholder engine ships as the deterministic default.

mod placeholder;

pub use placeholder::PlaceholderEngine;

use crate::error::{Result, VodscribeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A timed transcript segment produced by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Segment start, in milliseconds.
    pub start_ms: i64,
    /// Segment end, in milliseconds (half-open interval).
    pub end_ms: i64,
    /// Transcript text for the interval.
    pub text: String,
}

/// Trait for transcription engines.
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Transcribe an audio file into ordered, non-overlapping segments.
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<TranscriptSegment>>;
}

/// Validate the segment sequence contract: every interval starts at or after
/// zero, is non-empty, and segments are ordered without overlap.
pub fn validate_segments(segments: &[TranscriptSegment]) -> Result<()> {
    for (i, segment) in segments.iter().enumerate() {
        if segment.start_ms < 0 {
            return Err(VodscribeError::InvalidInput(format!(
                "Segment {} starts before zero ({})",
                i, segment.start_ms
            )));
        }

        if segment.start_ms >= segment.end_ms {
            return Err(VodscribeError::InvalidInput(format!(
                "Segment {} has an empty interval ({}..{})",
                i, segment.start_ms, segment.end_ms
            )));
        }

        if let Some(prev) = i.checked_sub(1).and_then(|j| segments.get(j)) {
            if segment.start_ms < prev.end_ms {
                return Err(VodscribeError::InvalidInput(format!(
                    "Segment {} overlaps its predecessor ({} < {})",
                    i, segment.start_ms, prev.end_ms
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start_ms: i64, end_ms: i64) -> TranscriptSegment {
        TranscriptSegment {
            start_ms,
            end_ms,
            text: "text".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_ordered_segments() {
        assert!(validate_segments(&[]).is_ok());
        assert!(validate_segments(&[seg(0, 15_000)]).is_ok());
        assert!(validate_segments(&[seg(0, 15_000), seg(15_000, 30_000)]).is_ok());
        // Gaps between segments are allowed.
        assert!(validate_segments(&[seg(0, 10_000), seg(20_000, 30_000)]).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_interval() {
        assert!(validate_segments(&[seg(15_000, 15_000)]).is_err());
        assert!(validate_segments(&[seg(20_000, 10_000)]).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_start() {
        assert!(validate_segments(&[seg(-5_000, 10_000)]).is_err());
        assert!(validate_segments(&[seg(0, 15_000), seg(-1, 30_000)]).is_err());
    }

    #[test]
    fn test_validate_rejects_overlap() {
        assert!(validate_segments(&[seg(0, 20_000), seg(15_000, 30_000)]).is_err());
        assert!(validate_segments(&[seg(15_000, 30_000), seg(0, 15_000)]).is_err());
    }
}
