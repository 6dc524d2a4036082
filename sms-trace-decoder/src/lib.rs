//! SMS Trace Decoder Library
//!
//! A stateless, reusable library for correlating GSM MAP short message
//! signaling captured with tshark (`tshark -T json`).
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on correlation:
//! - Decodes each tshark frame into one [`SignalingEvent`] (TCAP + MAP + SMS
//!   transport + M3UA/MTP3 routing)
//! - Stores events in an append-only [`EventStore`] indexed by transaction id,
//!   MSISDN, IMSI and operation
//! - Builds the delivery [`Chain`] of one MSISDN: SRI-for-SM / MO forward, their
//!   responses, and the MT forwards to the returned IMSI
//!
//! The library does NOT:
//! - Run tshark or capinfos, or discover capture files
//! - Render reports
//!
//! All higher-level functionality is in the application layer (sms-trace-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use sms_trace_decoder::{ChainBuilder, Decoder, DecoderConfig, EventStore};
//! use std::path::Path;
//!
//! let decoder = Decoder::with_config(DecoderConfig::new());
//! let batch = decoder.decode_file(Path::new("trace.json")).unwrap();
//!
//! let mut store = EventStore::new();
//! store.extend(batch.events);
//!
//! let chain = ChainBuilder::new(&store).build("79003350829");
//! for event in chain.events() {
//!     println!("{} {} {} {}", event.time, event.phase, event.operation, event.identity);
//! }
//! ```

// Public modules
pub mod chain;
pub mod codes;
pub mod config;
pub mod decoder;
pub mod schema;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use chain::{Chain, ChainBuilder};
pub use codes::{DestinationAddressKind, ErrorCode, MessageTypeIndicator, Operation, TransactionPhase};
pub use config::{DecoderConfig, FrameErrorPolicy};
pub use decoder::{DecodeStats, DecodedBatch, Decoder, DecodingIterator};
pub use layers::capture::parse_epoch;
pub use store::{EventId, EventStore, StoreStats};
pub use types::{
    DecodeError, FrameError, PointCode, Result, SignalingEvent, SubscriberIdentity, Timestamp, TraceError,
};

// Internal modules (not exposed in public API)
mod frame_decoder;
mod layers;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
