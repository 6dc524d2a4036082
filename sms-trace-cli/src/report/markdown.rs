//! Markdown report

use super::{format_point_code, format_route, format_time, Renderer};
use sms_trace_decoder::{Chain, Operation, SignalingEvent};
use std::fmt::Write;

const HEADER: &str = "| Time | Phase | Operation | TID | OPC | DPC | MSISDN | IMSI / error |";
const DIVIDER: &str = "|---|---|---|---|---|---|---|---|";

pub struct MarkdownReporter;

/// Operation name with its MAP opcode, e.g. `SRI (45)`
fn format_operation(operation: Operation) -> String {
    match operation.opcode() {
        Some(code) => format!("{} ({})", operation, code),
        None => operation.to_string(),
    }
}

/// IMSI, or error name with its wire value
fn format_identity(event: &SignalingEvent) -> String {
    match (event.identity.value(), event.error_code.and_then(|e| e.code())) {
        (Some(name), Some(code)) => format!("{} ({})", name, code),
        (Some(value), None) => value.to_string(),
        (None, _) => "-".to_string(),
    }
}

impl Renderer for MarkdownReporter {
    fn render(&self, chain: &Chain) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# SMS trace for {}", chain.msisdn());
        let _ = writeln!(out);

        let (Some(first), Some(last)) = (chain.first(), chain.events().last()) else {
            let _ = writeln!(out, "_No events found._");
            return out;
        };

        let _ = writeln!(out, "- Events: {}", chain.len());
        if let Some(route) = format_route(chain) {
            let _ = writeln!(out, "- Route: {}", route);
        }
        let _ = writeln!(out, "- First: {}", format_time(&first.time));
        let _ = writeln!(out, "- Last: {}", format_time(&last.time));
        let _ = writeln!(out);

        let _ = writeln!(out, "{}", HEADER);
        let _ = writeln!(out, "{}", DIVIDER);
        for event in chain.events() {
            let _ = writeln!(
                out,
                "| {} | {} | {} | `{}` | {} | {} | {} | {} |",
                format_time(&event.time),
                event.phase,
                format_operation(event.operation),
                event.transaction_id,
                format_point_code(event.origin_point_code),
                format_point_code(event.destination_point_code),
                event.msisdn.as_deref().unwrap_or("-"),
                format_identity(event)
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;
    use sms_trace_decoder::{ChainBuilder, EventStore};

    #[test]
    fn test_render_table() {
        let report = MarkdownReporter.render(&fixtures::chain());
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "# SMS trace for 79003350829");
        assert!(lines.contains(&"- Events: 4"));
        assert!(lines.contains(&"- Route: OPC 2057 -> DPC 6211"));
        assert!(lines.contains(&HEADER));
        assert!(lines.contains(&DIVIDER));
        assert!(lines.contains(
            &"| 2025-06-25 04:25:16.001 | End | Error | `09:eb:27:bb` | 6211 | 2057 | - | AbsentSubscriberSm (6) |"
        ));
        assert!(lines.contains(
            &"| 2025-06-25 04:25:16.000 | Begin | SRI (45) | `09:eb:27:bb` | 2057 | 6211 | 79003350829 | - |"
        ));
        assert_eq!(lines.last().map(|l| l.ends_with("| 250991234567890 |")), Some(true));
    }

    #[test]
    fn test_format_operation() {
        assert_eq!(format_operation(Operation::MtForwardSm), "MT_Forward_SM (44)");
        assert_eq!(format_operation(Operation::ResultLast), "ResultLast");
    }

    #[test]
    fn test_render_empty_chain() {
        let store = EventStore::new();
        let chain = ChainBuilder::new(&store).build("79990000000");
        assert_eq!(
            MarkdownReporter.render(&chain),
            "# SMS trace for 79990000000\n\n_No events found._\n"
        );
    }
}
