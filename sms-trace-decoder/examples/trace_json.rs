//! Standalone tshark JSON tracer
//!
//! Decodes one or more tshark `-T json` exports, prints decoding statistics
//! and, when an MSISDN is given, the delivery chain of that subscriber.
//!
//! Usage:
//!   trace_json <export.json>... [--msisdn <number>] [--limit <frames>] [--verbose]
//!
//! Example:
//!   tshark -r dump.pcap -Y gsm_map -T json > dump.json
//!   trace_json dump.json --msisdn 79003350829

use sms_trace_decoder::{ChainBuilder, DecodeStats, Decoder, DecoderConfig, EventStore, Operation, SignalingEvent};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

fn print_event(event: &SignalingEvent) {
    println!(
        "[{}] {:<8} {:<16} tid={:<12} msisdn={:<14} {}",
        event.time.format("%Y-%m-%d %H:%M:%S%.6f"),
        event.phase,
        event.operation,
        event.transaction_id,
        event.msisdn.as_deref().unwrap_or("-"),
        event.identity
    );
}

fn print_summary(stats: &DecodeStats, store: &EventStore) {
    println!("\n=== DECODING SUMMARY ===");
    println!("Frames read: {}", stats.frames);
    println!("Events decoded: {}", stats.decoded);
    println!("Frames skipped: {}", stats.skipped);
    println!("Events outside window: {}", stats.filtered);

    let store_stats = store.stats();
    println!("Transactions: {}", store_stats.num_transactions);
    println!("MSISDNs: {}", store_stats.num_msisdns);
    println!("IMSIs: {}", store_stats.num_imsis);

    let mut per_operation: BTreeMap<Operation, usize> = BTreeMap::new();
    for event in store.all() {
        *per_operation.entry(event.operation).or_default() += 1;
    }

    if !per_operation.is_empty() {
        println!("\nEvents per operation:");
        for (operation, count) in per_operation {
            println!("  {}: {}", operation, count);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <export.json>... [--msisdn <number>] [--limit <frames>] [--verbose]", args[0]);
        eprintln!("\nExample:");
        eprintln!("  {} dump.json --msisdn 79003350829", args[0]);
        std::process::exit(1);
    }

    let mut exports = Vec::new();
    let mut msisdn: Option<String> = None;
    let mut limit: Option<usize> = None;
    let mut verbose = false;

    // Parse arguments
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--msisdn" => {
                i += 1;
                msisdn = args.get(i).cloned();
            }
            "--limit" => {
                i += 1;
                limit = args.get(i).and_then(|s| s.parse().ok());
            }
            "--verbose" | "-v" => verbose = true,
            path => exports.push(PathBuf::from(path)),
        }
        i += 1;
    }

    env_logger::Builder::from_default_env()
        .filter_level(if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();

    let mut config = DecoderConfig::new();
    if let Some(limit) = limit {
        config = config.with_max_frames(limit);
    }
    let decoder = Decoder::with_config(config);

    let mut store = EventStore::new();
    let mut stats = DecodeStats::default();
    for export in &exports {
        let batch = decoder.decode_file(export)?;
        stats.merge(&batch.stats);
        store.extend(batch.events);
    }

    if verbose {
        for (id, event) in store.entries() {
            print!("#{:<6} ", id.index());
            print_event(event);
        }
    }

    print_summary(&stats, &store);

    if let Some(msisdn) = msisdn {
        let chain = ChainBuilder::new(&store).build(&msisdn);
        println!("\n=== CHAIN FOR {} ({} events) ===", msisdn, chain.len());
        for event in chain.events() {
            print_event(event);
        }
    }

    Ok(())
}
