//! Core types for the SMS trace decoder library
//!
//! This module defines the Signaling Event the frame decoder emits for every
//! tshark frame, and the errors raised while producing it. Events are plain
//! values: the decoder builds them stage by stage and the event store only
//! indexes them.

use crate::codes::{DestinationAddressKind, ErrorCode, Operation, TransactionPhase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for batch-level operations
pub type Result<T> = std::result::Result<T, TraceError>;

/// Signaling point code of the link routing layer (M3UA / MTP3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointCode(pub u32);

impl PointCode {
    /// Get raw value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for PointCode {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl fmt::Display for PointCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subscriber identity payload of an event
///
/// Error outcomes reuse the identity slot for the symbolic error name, so
/// callers must check the variant before treating the value as an IMSI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriberIdentity {
    #[default]
    None,
    Imsi(String),
    ErrorName(String),
}

impl SubscriberIdentity {
    /// The IMSI, if this identity is one
    pub fn imsi(&self) -> Option<&str> {
        match self {
            SubscriberIdentity::Imsi(imsi) => Some(imsi),
            _ => None,
        }
    }

    /// The error name carried by an Error outcome
    pub fn error_name(&self) -> Option<&str> {
        match self {
            SubscriberIdentity::ErrorName(name) => Some(name),
            _ => None,
        }
    }

    /// Raw value regardless of variant
    pub fn value(&self) -> Option<&str> {
        match self {
            SubscriberIdentity::None => None,
            SubscriberIdentity::Imsi(v) | SubscriberIdentity::ErrorName(v) => Some(v),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SubscriberIdentity::None)
    }
}

impl fmt::Display for SubscriberIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriberIdentity::None => write!(f, "-"),
            SubscriberIdentity::Imsi(imsi) => write!(f, "IMSI={}", imsi),
            SubscriberIdentity::ErrorName(name) => write!(f, "ERROR={}", name),
        }
    }
}

/// One decoded TCAP/MAP exchange - the unit of correlation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalingEvent {
    /// Capture timestamp (monotonic only within one capture file)
    pub time: Timestamp,
    /// `frame.number` of the source frame, when the export carries it
    pub frame_number: Option<u64>,
    /// TCAP transaction id (opaque, e.g. "09:eb:27:bb")
    pub transaction_id: String,
    /// TCAP dialogue phase
    pub phase: TransactionPhase,
    /// MAP operation or outcome
    pub operation: Operation,
    /// Originating point code from the routing layer
    pub origin_point_code: Option<PointCode>,
    /// Destination point code from the routing layer
    pub destination_point_code: Option<PointCode>,
    /// Subscriber MSISDN (SRI-for-SM target or MO SMS destination)
    pub msisdn: Option<String>,
    /// IMSI, or the error name on Error outcomes
    pub identity: SubscriberIdentity,
    /// Decoded failure reason, only on Error outcomes
    pub error_code: Option<ErrorCode>,
    /// SM-RP-DA kind of a forward short message invoke
    pub destination_kind: Option<DestinationAddressKind>,
}

impl SignalingEvent {
    /// Create an event from its required transaction framing
    pub fn new(time: Timestamp, transaction_id: impl Into<String>, phase: TransactionPhase) -> Self {
        Self {
            time,
            frame_number: None,
            transaction_id: transaction_id.into(),
            phase,
            operation: Operation::Unknown,
            origin_point_code: None,
            destination_point_code: None,
            msisdn: None,
            identity: SubscriberIdentity::None,
            error_code: None,
            destination_kind: None,
        }
    }

    pub fn with_frame_number(mut self, frame_number: Option<u64>) -> Self {
        self.frame_number = frame_number;
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    pub fn with_msisdn(mut self, msisdn: impl Into<String>) -> Self {
        self.msisdn = Some(msisdn.into());
        self
    }

    pub fn with_imsi(self, imsi: impl Into<String>) -> Self {
        self.with_identity(SubscriberIdentity::Imsi(imsi.into()))
    }

    pub fn with_identity(mut self, identity: SubscriberIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Mark the event as an Error outcome; the error name goes to `identity`
    pub fn with_error(mut self, code: ErrorCode) -> Self {
        self.operation = Operation::Error;
        self.error_code = Some(code);
        self.identity = SubscriberIdentity::ErrorName(code.name().to_string());
        self
    }

    pub fn with_destination_kind(mut self, kind: DestinationAddressKind) -> Self {
        self.destination_kind = Some(kind);
        self
    }

    pub fn with_point_codes(mut self, origin: Option<PointCode>, destination: Option<PointCode>) -> Self {
        self.origin_point_code = origin;
        self.destination_point_code = destination;
        self
    }

    /// Subscriber IMSI; `None` on Error outcomes even though `identity` is set
    pub fn imsi(&self) -> Option<&str> {
        self.identity.imsi()
    }

    /// True when this event is a mobile-terminated short message delivery
    ///
    /// MAP v1/v2 `forwardSM` travels as opcode 46 in both directions; when it
    /// is addressed to an IMSI it is the MT leg.
    pub fn is_mt_delivery(&self) -> bool {
        match self.operation {
            Operation::MtForwardSm => true,
            op if op.is_forward_sm() => self.destination_kind == Some(DestinationAddressKind::Imsi),
            _ => false,
        }
    }
}

/// Errors that make a single frame undecodable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("frame has no _source.layers tree")]
    MissingLayers,

    #[error("frame has no frame.time_epoch timestamp")]
    MissingTimestamp,

    #[error("no TCAP begin/continue/end element with a transaction id")]
    MissingTransaction,

    #[error("Begin/Continue component has no invoke element")]
    MissingInvoke,

    #[error("unknown MAP operation code: {0}")]
    UnknownOperation(u32),

    #[error("unsupported SM-RP-DA address kind: {0}")]
    UnknownDestinationAddressKind(u32),

    #[error("frame has no M3UA or MTP3 routing layer")]
    MissingRouting,

    #[error("malformed SMS transport layer: {0}")]
    MalformedSmsTransport(String),

    #[error("required field missing: {0}")]
    MissingField(&'static str),

    #[error("invalid value {value} for field {field}")]
    InvalidField { field: &'static str, value: String },
}

impl DecodeError {
    /// Recoverable errors are logged and skipped inside the decoder
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DecodeError::MalformedSmsTransport(_))
    }
}

/// A decode failure tied to the frame that caused it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("frame #{position} (frame.number {}): {source}", display_number(.frame_number))]
pub struct FrameError {
    /// Zero-based position of the frame in its batch
    pub position: usize,
    /// `frame.number` from the capture layer, when readable
    pub frame_number: Option<u64>,
    pub source: DecodeError,
}

fn display_number(number: &Option<u64>) -> String {
    number.map_or_else(|| "?".to_string(), |n| n.to_string())
}

/// Errors raised while reading or decoding a whole batch
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid tshark JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tshark export is not a JSON array of frames")]
    NotAFrameArray,

    #[error(transparent)]
    Frame(#[from] FrameError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_identity_accessors() {
        let imsi = SubscriberIdentity::Imsi("250991234567890".to_string());
        assert_eq!(imsi.imsi(), Some("250991234567890"));
        assert_eq!(imsi.error_name(), None);

        let error = SubscriberIdentity::ErrorName("AbsentSubscriberSm".to_string());
        assert_eq!(error.imsi(), None);
        assert_eq!(error.value(), Some("AbsentSubscriberSm"));
        assert!(SubscriberIdentity::None.is_none());
    }

    #[test]
    fn test_with_error_overloads_identity() {
        let event = SignalingEvent::new(at(1), "aa:bb", TransactionPhase::End)
            .with_error(ErrorCode::AbsentSubscriberSm);

        assert_eq!(event.operation, Operation::Error);
        assert_eq!(event.error_code, Some(ErrorCode::AbsentSubscriberSm));
        assert_eq!(event.identity.error_name(), Some("AbsentSubscriberSm"));
        assert_eq!(event.imsi(), None);
    }

    #[test]
    fn test_mt_delivery_classification() {
        let base = SignalingEvent::new(at(1), "t", TransactionPhase::Begin);
        assert!(base.clone().with_operation(Operation::MtForwardSm).is_mt_delivery());
        assert!(!base.clone().with_operation(Operation::MoForwardSm).is_mt_delivery());
        assert!(base
            .clone()
            .with_operation(Operation::MoForwardSm)
            .with_destination_kind(DestinationAddressKind::Imsi)
            .is_mt_delivery());
        assert!(!base.with_operation(Operation::SendRoutingInfoForSm).is_mt_delivery());
    }

    #[test]
    fn test_frame_error_display() {
        let err = FrameError {
            position: 3,
            frame_number: Some(118),
            source: DecodeError::MissingInvoke,
        };
        assert_eq!(
            err.to_string(),
            "frame #3 (frame.number 118): Begin/Continue component has no invoke element"
        );

        let err = FrameError { position: 0, frame_number: None, source: DecodeError::MissingRouting };
        assert!(err.to_string().contains("frame.number ?"));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(DecodeError::MalformedSmsTransport("x".into()).is_recoverable());
        assert!(!DecodeError::MissingRouting.is_recoverable());
    }
}
