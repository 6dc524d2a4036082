//! Report generation
//!
//! Renders a correlated chain as plain text (ASCII) or Markdown.

pub mod ascii;
pub mod markdown;

use crate::config::ReportFormat;
use sms_trace_decoder::{Chain, PointCode, Timestamp};

pub use ascii::AsciiReporter;
pub use markdown::MarkdownReporter;

/// A chain report format
pub trait Renderer {
    fn render(&self, chain: &Chain) -> String;
}

/// Renderer for a configured report format
pub fn renderer_for(format: ReportFormat, width: usize) -> Box<dyn Renderer> {
    match format {
        ReportFormat::Ascii => Box::new(AsciiReporter::new(width)),
        ReportFormat::Md => Box::new(MarkdownReporter),
    }
}

fn format_time(time: &Timestamp) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

fn format_point_code(pc: Option<PointCode>) -> String {
    pc.map_or_else(|| "-".to_string(), |pc| pc.to_string())
}

/// `OPC x -> DPC y` of the chain's first event
fn format_route(chain: &Chain) -> Option<String> {
    chain.route().map(|(opc, dpc)| {
        format!("OPC {} -> DPC {}", format_point_code(opc), format_point_code(dpc))
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use sms_trace_decoder::{
        ChainBuilder, ErrorCode, EventStore, Operation, PointCode, SignalingEvent, TransactionPhase,
    };
    use chrono::{TimeZone, Utc};

    pub const MSISDN: &str = "79003350829";

    /// Store holding an SRI that failed with AbsentSubscriberSm, then a successful retry
    pub fn store() -> EventStore {
        let at = |ms: i64| Utc.timestamp_millis_opt(1_750_825_516_000 + ms).unwrap();
        let mut store = EventStore::new();
        store.add(
            SignalingEvent::new(at(0), "09:eb:27:bb", TransactionPhase::Begin)
                .with_operation(Operation::SendRoutingInfoForSm)
                .with_msisdn(MSISDN)
                .with_point_codes(Some(PointCode(2057)), Some(PointCode(6211))),
        );
        store.add(
            SignalingEvent::new(at(1), "09:eb:27:bb", TransactionPhase::End)
                .with_error(ErrorCode::AbsentSubscriberSm)
                .with_point_codes(Some(PointCode(6211)), Some(PointCode(2057))),
        );
        store.add(
            SignalingEvent::new(at(5_000), "0a:00:00:01", TransactionPhase::Begin)
                .with_operation(Operation::SendRoutingInfoForSm)
                .with_msisdn(MSISDN),
        );
        store.add(
            SignalingEvent::new(at(5_002), "0a:00:00:01", TransactionPhase::End)
                .with_operation(Operation::ResultLast)
                .with_imsi("250991234567890"),
        );
        store
    }

    pub fn chain() -> sms_trace_decoder::Chain {
        ChainBuilder::new(&store()).build(MSISDN)
    }
}
