//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct reads tshark JSON exports, decodes every frame into a
//! Signaling Event and applies the batch policy from [`DecoderConfig`].

use crate::config::{DecoderConfig, FrameErrorPolicy};
use crate::frame_decoder::FrameDecoder;
use crate::store::EventStore;
use crate::types::{DecodeError, FrameError, Result, SignalingEvent, TraceError};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Borrow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder with the default configuration
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with an explicit configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a single tshark frame
    ///
    /// # Example
    /// ```
    /// use sms_trace_decoder::{Decoder, Operation};
    /// use serde_json::json;
    ///
    /// let frame = json!({
    ///     "frame": {"frame.time_epoch": "1750825516.923860000"},
    ///     "mtp3": {"mtp3.opc": "2057", "mtp3.dpc": "6211"},
    ///     "tcap": {"tcap.end_element": {"tcap.tid": "09:eb:27:bb"}}
    /// });
    ///
    /// let event = Decoder::new().decode_frame(&frame).unwrap();
    /// assert_eq!(event.operation, Operation::ResultLast);
    /// ```
    pub fn decode_frame(&self, frame: &Value) -> std::result::Result<SignalingEvent, DecodeError> {
        FrameDecoder::decode(frame)
    }

    /// Lazily decode a sequence of frames
    ///
    /// Each item is either a decoded event or the [`FrameError`] of the frame
    /// at that position. `max_frames` from the configuration caps how many
    /// frames are read; the error policy and time window are not applied here.
    pub fn decode_frames<I>(&self, frames: I) -> DecodingIterator<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Borrow<Value>,
    {
        DecodingIterator::new(frames.into_iter(), self.config.max_frames)
    }

    /// Parse a tshark `-T json` export from a reader
    pub fn parse_frames<R: Read>(reader: R) -> Result<Vec<Value>> {
        match serde_json::from_reader(BufReader::new(reader))? {
            Value::Array(frames) => Ok(frames),
            _ => Err(TraceError::NotAFrameArray),
        }
    }

    /// Read a tshark `-T json` export from disk
    pub fn read_frames(path: &Path) -> Result<Vec<Value>> {
        log::debug!("Reading tshark export: {:?}", path);
        let file = File::open(path)?;
        Self::parse_frames(file)
    }

    /// Decode a batch of frames, applying error policy and time window
    ///
    /// # Returns
    /// * `Ok(DecodedBatch)` - events in frame order plus decode statistics
    /// * `Err(TraceError::Frame)` - first failing frame under [`FrameErrorPolicy::Abort`]
    pub fn decode_batch<I>(&self, frames: I) -> Result<DecodedBatch>
    where
        I: IntoIterator,
        I::Item: Borrow<Value>,
    {
        let mut batch = DecodedBatch::default();

        for decoded in self.decode_frames(frames) {
            batch.stats.frames += 1;

            match decoded {
                Ok(event) if self.config.is_within_window(&event.time) => {
                    batch.stats.decoded += 1;
                    batch.events.push(event);
                }
                Ok(event) => {
                    log::trace!("Event {} outside time window: {}", event.transaction_id, event.time);
                    batch.stats.filtered += 1;
                }
                Err(e) => match self.config.error_policy {
                    FrameErrorPolicy::Skip => {
                        log::debug!("Skipping {}", e);
                        batch.stats.skipped += 1;
                    }
                    FrameErrorPolicy::Abort => return Err(e.into()),
                },
            }
        }

        if batch.stats.skipped > 0 {
            log::warn!(
                "{} of {} frames could not be decoded",
                batch.stats.skipped,
                batch.stats.frames
            );
        }

        Ok(batch)
    }

    /// Read and decode a tshark JSON export
    ///
    /// # Example
    /// ```no_run
    /// use sms_trace_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let batch = Decoder::new().decode_file(Path::new("trace.json")).unwrap();
    /// println!("{} events", batch.events.len());
    /// ```
    pub fn decode_file(&self, path: &Path) -> Result<DecodedBatch> {
        log::info!("Decoding tshark export: {:?}", path);
        let frames = Self::read_frames(path)?;
        let batch = self.decode_batch(&frames)?;
        log::info!(
            "Decoded {} events from {} frames in {:?}",
            batch.stats.decoded,
            batch.stats.frames,
            path
        );
        Ok(batch)
    }

    /// Decode frames straight into an event store
    pub fn ingest<I>(&self, frames: I, store: &mut EventStore) -> Result<DecodeStats>
    where
        I: IntoIterator,
        I::Item: Borrow<Value>,
    {
        let batch = self.decode_batch(frames)?;
        store.extend(batch.events);
        Ok(batch.stats)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters for one decoded batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    /// Frames read from the input
    pub frames: usize,
    /// Frames that produced a kept event
    pub decoded: usize,
    /// Frames that failed to decode and were skipped
    pub skipped: usize,
    /// Events dropped by the time window
    pub filtered: usize,
}

impl DecodeStats {
    /// Add the counters of another batch
    pub fn merge(&mut self, other: &DecodeStats) {
        self.frames += other.frames;
        self.decoded += other.decoded;
        self.skipped += other.skipped;
        self.filtered += other.filtered;
    }
}

/// Events of one batch in frame order
#[derive(Debug, Default)]
pub struct DecodedBatch {
    pub events: Vec<SignalingEvent>,
    pub stats: DecodeStats,
}

/// Iterator that decodes tshark frames into Signaling Events
pub struct DecodingIterator<I> {
    frames: I,
    position: usize,
    limit: Option<usize>,
}

impl<I> DecodingIterator<I>
where
    I: Iterator,
    I::Item: Borrow<Value>,
{
    fn new(frames: I, limit: Option<usize>) -> Self {
        Self {
            frames,
            position: 0,
            limit,
        }
    }

    /// Decode one frame, tagging failures with its position
    fn process_frame(&self, frame: &Value) -> std::result::Result<SignalingEvent, FrameError> {
        FrameDecoder::decode(frame).map_err(|source| FrameError {
            position: self.position,
            frame_number: FrameDecoder::frame_number(frame),
            source,
        })
    }
}

impl<I> Iterator for DecodingIterator<I>
where
    I: Iterator,
    I::Item: Borrow<Value>,
{
    type Item = std::result::Result<SignalingEvent, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.limit.is_some_and(|limit| self.position >= limit) {
            return None;
        }

        let frame = self.frames.next()?;
        let decoded = self.process_frame(frame.borrow());
        self.position += 1;
        Some(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::Operation;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::io::Write;

    fn end_frame(epoch: &str, tid: &str) -> Value {
        json!({
            "_source": {
                "layers": {
                    "frame": {"frame.time_epoch": epoch},
                    "mtp3": {"mtp3.opc": "1", "mtp3.dpc": "2"},
                    "tcap": {"tcap.end_element": {"tcap.tid": tid}}
                }
            }
        })
    }

    fn broken_frame() -> Value {
        json!({"_source": {"layers": {"frame": {"frame.time_epoch": "5", "frame.number": "9"}}}})
    }

    #[test]
    fn test_decoder_creation() {
        let decoder = Decoder::new();
        assert_eq!(decoder.config(), &DecoderConfig::default());
    }

    #[test]
    fn test_decode_frames_tags_position() {
        let frames = vec![end_frame("1", "aa"), broken_frame(), end_frame("3", "bb")];
        let results: Vec<_> = Decoder::new().decode_frames(&frames).collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.position, 1);
        assert_eq!(err.frame_number, Some(9));
        assert_eq!(err.source, DecodeError::MissingTransaction);
        assert_eq!(results[2].as_ref().unwrap().transaction_id, "bb");
    }

    #[test]
    fn test_decode_frames_owned_values() {
        let frames = vec![end_frame("1", "aa")];
        let events: Vec<_> = Decoder::new().decode_frames(frames).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_skip_policy_counts() {
        let frames = vec![end_frame("1", "aa"), broken_frame(), end_frame("3", "bb")];
        let batch = Decoder::new().decode_batch(&frames).unwrap();

        assert_eq!(batch.events.len(), 2);
        assert_eq!(
            batch.stats,
            DecodeStats { frames: 3, decoded: 2, skipped: 1, filtered: 0 }
        );
    }

    #[test]
    fn test_abort_policy() {
        let decoder = Decoder::with_config(DecoderConfig::new().with_error_policy(FrameErrorPolicy::Abort));
        let frames = vec![end_frame("1", "aa"), broken_frame()];

        match decoder.decode_batch(&frames) {
            Err(TraceError::Frame(e)) => assert_eq!(e.position, 1),
            other => panic!("expected frame error, got {:?}", other),
        }
    }

    #[test]
    fn test_time_window_and_max_frames() {
        let config = DecoderConfig::new().with_time_window(
            Utc.timestamp_opt(2, 0).unwrap(),
            Utc.timestamp_opt(10, 0).unwrap(),
        );
        let frames = vec![end_frame("1", "a"), end_frame("2", "b"), end_frame("11", "c")];

        let batch = Decoder::with_config(config.clone()).decode_batch(&frames).unwrap();
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].transaction_id, "b");
        assert_eq!(batch.stats.filtered, 2);

        let limited = Decoder::with_config(config.with_max_frames(1)).decode_batch(&frames).unwrap();
        assert_eq!(limited.stats.frames, 1);
    }

    #[test]
    fn test_parse_frames_requires_array() {
        assert!(matches!(
            Decoder::parse_frames("{\"a\": 1}".as_bytes()),
            Err(TraceError::NotAFrameArray)
        ));
        assert!(matches!(Decoder::parse_frames("[".as_bytes()), Err(TraceError::Json(_))));
        assert_eq!(Decoder::parse_frames("[]".as_bytes()).unwrap().len(), 0);
    }

    #[test]
    fn test_decode_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let frames = json!([end_frame("1750825516.924632000", "09:eb:27:bb")]);
        write!(file, "{}", frames).unwrap();

        let batch = Decoder::new().decode_file(file.path()).unwrap();
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].operation, Operation::ResultLast);
    }

    #[test]
    fn test_missing_file() {
        let result = Decoder::new().decode_file(Path::new("/nonexistent/trace.json"));
        assert!(matches!(result, Err(TraceError::Io(_))));
    }

    #[test]
    fn test_ingest_into_store() {
        let mut store = EventStore::new();
        let frames = vec![end_frame("1", "aa"), end_frame("2", "aa")];

        let stats = Decoder::new().ingest(&frames, &mut store).unwrap();
        assert_eq!(stats.decoded, 2);
        assert_eq!(store.by_transaction_id("aa").len(), 2);
    }

    #[test]
    fn test_stats_merge() {
        let mut total = DecodeStats { frames: 2, decoded: 1, skipped: 1, filtered: 0 };
        total.merge(&DecodeStats { frames: 3, decoded: 2, skipped: 0, filtered: 1 });
        assert_eq!(total, DecodeStats { frames: 5, decoded: 3, skipped: 1, filtered: 1 });
    }
}
