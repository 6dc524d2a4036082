//! `frame` layer: capture timestamp and frame number

use super::{child, scalar_str};
use crate::types::{DecodeError, Timestamp};
use chrono::DateTime;
use serde_json::{Map, Value};

pub(crate) const LAYER: &str = "frame";
const TIME_EPOCH: &str = "frame.time_epoch";
const NUMBER: &str = "frame.number";

/// Read the capture timestamp of a frame
pub(crate) fn timestamp(layers: &Map<String, Value>) -> Result<Timestamp, DecodeError> {
    let raw = layers
        .get(LAYER)
        .and_then(|frame| child(frame, TIME_EPOCH))
        .and_then(scalar_str)
        .ok_or(DecodeError::MissingTimestamp)?;

    parse_epoch(raw).ok_or_else(|| DecodeError::InvalidField {
        field: TIME_EPOCH,
        value: raw.to_string(),
    })
}

/// Read `frame.number`, if present and numeric
pub(crate) fn frame_number(layers: &Map<String, Value>) -> Option<u64> {
    layers
        .get(LAYER)
        .and_then(|frame| child(frame, NUMBER))
        .and_then(scalar_str)
        .and_then(|n| n.trim().parse().ok())
}

/// Parse an epoch string such as `1750825516.923860000`
///
/// The fractional part is read digit by digit (up to nanoseconds) rather than
/// through `f64`, so microsecond timestamps survive unchanged.
pub fn parse_epoch(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    let (secs, frac) = raw.split_once('.').unwrap_or((raw, ""));

    let secs: i64 = secs.parse().ok()?;
    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let digits: String = frac.chars().take(9).collect();
    let nanos: u32 = format!("{:0<9}", digits).parse().ok()?;

    DateTime::from_timestamp(secs, nanos)
}
