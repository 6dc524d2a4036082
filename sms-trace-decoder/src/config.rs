//! Decoder configuration types
//!
//! This module defines the minimal configuration needed by the decoder library:
//! what to do with undecodable frames and which part of a capture to keep.
//! Everything about capture discovery and reporting lives in the CLI.

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

/// What batch decoding does when a frame fails to decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameErrorPolicy {
    /// Log the failing frame and continue with the next one
    #[default]
    Skip,
    /// Stop the batch and return the frame error
    Abort,
}

/// Configuration for the decoder library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Policy for frames that fail to decode
    #[serde(default)]
    pub error_policy: FrameErrorPolicy,

    /// Optional: drop events captured before this instant
    #[serde(default)]
    pub since: Option<Timestamp>,

    /// Optional: drop events captured after this instant
    #[serde(default)]
    pub until: Option<Timestamp>,

    /// Optional: stop after this many frames per batch (for testing)
    #[serde(default)]
    pub max_frames: Option<usize>,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the frame error policy
    pub fn with_error_policy(mut self, policy: FrameErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Builder method: keep only events inside `[since, until]`
    pub fn with_time_window(mut self, since: Timestamp, until: Timestamp) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    /// Builder method: limit the number of frames per batch
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Check if an event time falls inside the configured window (inclusive)
    pub fn is_within_window(&self, time: &Timestamp) -> bool {
        let after_start = self.since.map_or(true, |since| *time >= since);
        let before_end = self.until.map_or(true, |until| *time <= until);
        after_start && before_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_decoder_config_builder() {
        let since = Utc.with_ymd_and_hms(2025, 6, 25, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2025, 6, 26, 0, 0, 0).unwrap();
        let config = DecoderConfig::new()
            .with_error_policy(FrameErrorPolicy::Abort)
            .with_time_window(since, until)
            .with_max_frames(100);

        assert_eq!(config.error_policy, FrameErrorPolicy::Abort);
        assert_eq!(config.since, Some(since));
        assert_eq!(config.until, Some(until));
        assert_eq!(config.max_frames, Some(100));
    }

    #[test]
    fn test_window_logic() {
        let since = Utc.with_ymd_and_hms(2025, 6, 25, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2025, 6, 26, 0, 0, 0).unwrap();
        let config = DecoderConfig::new().with_time_window(since, until);

        assert!(config.is_within_window(&since));
        assert!(config.is_within_window(&until));
        assert!(config.is_within_window(&Utc.with_ymd_and_hms(2025, 6, 25, 12, 0, 0).unwrap()));
        assert!(!config.is_within_window(&Utc.with_ymd_and_hms(2025, 6, 24, 23, 59, 59).unwrap()));
    }

    #[test]
    fn test_no_window() {
        let config = DecoderConfig::new();

        // Without a window, everything should pass
        assert!(config.is_within_window(&Utc.timestamp_opt(0, 0).unwrap()));
        assert_eq!(config.error_policy, FrameErrorPolicy::Skip);
    }

    #[test]
    fn test_config_deserialization() {
        let config: DecoderConfig = serde_json::from_str(
            r#"{"error_policy": "abort", "since": "2025-06-25T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(config.error_policy, FrameErrorPolicy::Abort);
        assert!(config.since.is_some());
        assert_eq!(config.until, None);
    }
}
