//! Plain text report

use super::{format_route, format_time, Renderer};
use sms_trace_decoder::{Chain, SignalingEvent};
use std::fmt::Write;

/// Fixed-width text report framed by `=` rules
pub struct AsciiReporter {
    width: usize,
}

impl AsciiReporter {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    fn rule(&self) -> String {
        "=".repeat(self.width)
    }

    fn event_line(event: &SignalingEvent) -> String {
        format!(
            "{}  {:<8}  {:<16}  TID={:<12}  MSISDN={:<14}  {}",
            format_time(&event.time),
            event.phase.to_string(),
            event.operation.name(),
            event.transaction_id,
            event.msisdn.as_deref().unwrap_or("-"),
            event.identity
        )
    }
}

impl Default for AsciiReporter {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Renderer for AsciiReporter {
    fn render(&self, chain: &Chain) -> String {
        if chain.is_empty() {
            return format!("No events found for MSISDN {}\n", chain.msisdn());
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.rule());
        let _ = write!(out, "SMS trace for {}: {} events", chain.msisdn(), chain.len());
        if let Some(route) = format_route(chain) {
            let _ = write!(out, " ({})", route);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.rule());

        for event in chain.events() {
            let _ = writeln!(out, "{}", Self::event_line(event));
        }

        let _ = writeln!(out, "{}", self.rule());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;
    use sms_trace_decoder::{ChainBuilder, EventStore};

    #[test]
    fn test_render_chain() {
        let report = AsciiReporter::new(40).render(&fixtures::chain());
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "=".repeat(40));
        assert_eq!(
            lines[1],
            "SMS trace for 79003350829: 4 events (OPC 2057 -> DPC 6211)"
        );
        assert_eq!(lines.len(), 3 + 4 + 1);
        assert!(lines[3].starts_with("2025-06-25 04:25:16.000  Begin"));
        assert!(lines[4].contains("ERROR=AbsentSubscriberSm"));
        assert!(lines[6].ends_with("IMSI=250991234567890"));
        assert_eq!(lines[7], "=".repeat(40));
    }

    #[test]
    fn test_render_empty_chain() {
        let store = EventStore::new();
        let chain = ChainBuilder::new(&store).build("79990000000");
        assert_eq!(
            AsciiReporter::default().render(&chain),
            "No events found for MSISDN 79990000000\n"
        );
    }
}
