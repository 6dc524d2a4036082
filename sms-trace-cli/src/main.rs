//! SMS Trace CLI Application
//!
//! This is the command-line interface for the SMS signaling tracer.
//! It uses the sms-trace-decoder library and adds:
//! - Capture discovery in a dump folder (capinfos)
//! - Frame extraction with tshark, in parallel per capture
//! - Configuration file handling
//! - Report generation (ASCII/Markdown)

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use rayon::prelude::*;
use sms_trace_decoder::{ChainBuilder, DecodeStats, DecodedBatch, Decoder, EventStore, FrameErrorPolicy, Timestamp};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

mod capture;
mod config;
mod extractor;
mod report;

use capture::FilePool;
use config::{AppConfig, ReportFormat};
use extractor::TsharkExtractor;

/// SMS Trace - Correlate GSM MAP short message signaling for one subscriber
#[derive(Parser, Debug)]
#[command(name = "sms-trace")]
#[command(about = "Trace SMS delivery for an MSISDN through tshark captures", long_about = None)]
#[command(version)]
struct Args {
    /// Subscriber MSISDN to trace
    #[arg(short, long)]
    msisdn: String,

    /// First day to search (YYYY-MM-DD, UTC)
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    since: Option<NaiveDate>,

    /// Last day to search, inclusive (YYYY-MM-DD, UTC)
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    to: Option<NaiveDate>,

    /// Folder with pcap/pcapng captures
    #[arg(short, long, value_name = "DIR")]
    dump_folder: Option<PathBuf>,

    /// Existing tshark JSON export(s) to read instead of running tshark (can be repeated)
    #[arg(long = "json", value_name = "FILE")]
    json: Vec<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    report: Option<ReportFormat>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the tshark executable
    #[arg(long, value_name = "PATH")]
    tshark: Option<PathBuf>,

    /// Path to the capinfos executable
    #[arg(long, value_name = "PATH")]
    capinfos: Option<PathBuf>,

    /// Keep tshark output as cached_<capture>.json in the working directory
    #[arg(long)]
    save_json: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("SMS Trace CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", sms_trace_decoder::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    apply_args(&mut config, &args)?;

    let started = Instant::now();
    let mut store = EventStore::new();
    let stats = if !args.json.is_empty() {
        ingest_exports(&args.json, &config, &mut store)?
    } else {
        ingest_captures(&config, &mut store)?
    };

    let store_stats = store.stats();
    log::info!(
        "Ingested {} events ({} frames, {} skipped, {} outside window) in {:.2?}: {} transactions, {} MSISDNs, {} IMSIs",
        stats.decoded,
        stats.frames,
        stats.skipped,
        stats.filtered,
        started.elapsed(),
        store_stats.num_transactions,
        store_stats.num_msisdns,
        store_stats.num_imsis
    );

    let chain = ChainBuilder::new(&store).build(&args.msisdn);
    let renderer = report::renderer_for(config.report.format, config.report.width);
    print!("{}", renderer.render(&chain));

    Ok(())
}

/// Command-line flags override the configuration file
fn apply_args(config: &mut AppConfig, args: &Args) -> Result<()> {
    if let Some(tshark) = &args.tshark {
        config.tools.tshark = tshark.clone();
    }
    if let Some(capinfos) = &args.capinfos {
        config.tools.capinfos = capinfos.clone();
    }
    if let Some(folder) = &args.dump_folder {
        config.input.dump_folder = Some(folder.clone());
    }
    if args.save_json {
        config.input.save_json = true;
    }
    if let Some(format) = args.report {
        config.report.format = format;
    }
    if let Some((since, until)) = time_window(args.since, args.to)? {
        config.decoder.since = Some(since);
        config.decoder.until = Some(until);
    }
    Ok(())
}

/// `[since 00:00:00, to 23:59:59.999999999]` in UTC
fn time_window(since: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Option<(Timestamp, Timestamp)>> {
    let (since, to) = match (since, to) {
        (None, None) => return Ok(None),
        (Some(since), Some(to)) => (since, to),
        _ => anyhow::bail!("--since and --to must be given together"),
    };
    anyhow::ensure!(since <= to, "--since {} is after --to {}", since, to);

    let start = since
        .and_hms_opt(0, 0, 0)
        .context("Invalid --since date")?
        .and_utc();
    let end = to
        .and_hms_nano_opt(23, 59, 59, 999_999_999)
        .context("Invalid --to date")?
        .and_utc();
    Ok(Some((start, end)))
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

/// Decode existing tshark JSON exports
fn ingest_exports(exports: &[PathBuf], config: &AppConfig, store: &mut EventStore) -> Result<DecodeStats> {
    let decoder = Decoder::with_config(config.decoder.clone());
    let sources: Vec<&Path> = exports.iter().map(PathBuf::as_path).collect();

    ingest_parallel(&sources, config.decoder.error_policy, store, |path| {
        decoder
            .decode_file(path)
            .with_context(|| format!("Failed to decode tshark export: {:?}", path))
    })
}

/// Discover captures overlapping the window and decode them with tshark
fn ingest_captures(config: &AppConfig, store: &mut EventStore) -> Result<DecodeStats> {
    let folder = config
        .input
        .dump_folder
        .as_deref()
        .context("No input: pass --json FILE or --dump-folder DIR (or set input.dump_folder)")?;
    let (since, until) = config
        .decoder
        .since
        .zip(config.decoder.until)
        .context("--since and --to are required when scanning a dump folder")?;

    let pool = FilePool::scan(folder, &config.input.extensions, &config.tools.capinfos)?;
    let selected = pool.select(&since, &until);
    if selected.is_empty() {
        log::warn!("No capture in {:?} overlaps {} .. {}", folder, since, until);
    }

    let extractor = TsharkExtractor::new(config.tools.tshark.clone())
        .with_window(since, until)
        .with_cache_dir(config.input.save_json.then(|| PathBuf::from(".")));
    let decoder = Decoder::with_config(config.decoder.clone());
    let sources: Vec<&Path> = selected.iter().map(|info| info.path.as_path()).collect();

    ingest_parallel(&sources, config.decoder.error_policy, store, |path| {
        let frames = extractor
            .scan(path)
            .with_context(|| format!("Failed to extract frames from {:?}", path))?;
        decoder
            .decode_batch(&frames)
            .with_context(|| format!("Failed to decode frames from {:?}", path))
    })
}

/// Load every source in parallel, then add events to the store in source order
fn ingest_parallel<F>(
    sources: &[&Path],
    policy: FrameErrorPolicy,
    store: &mut EventStore,
    load: F,
) -> Result<DecodeStats>
where
    F: Fn(&Path) -> Result<DecodedBatch> + Sync,
{
    let loaded: Vec<(&Path, Result<DecodedBatch>, Duration)> = sources
        .par_iter()
        .map(|path| {
            let started = Instant::now();
            let batch = load(*path);
            (*path, batch, started.elapsed())
        })
        .collect();

    let mut total = DecodeStats::default();
    for (path, batch, elapsed) in loaded {
        match batch {
            Ok(batch) => {
                log::info!(
                    "{:?}: {} events decoded, {} frames skipped in {:.2?}",
                    path,
                    batch.stats.decoded,
                    batch.stats.skipped,
                    elapsed
                );
                total.merge(&batch.stats);
                store.extend(batch.events);
            }
            Err(e) if policy == FrameErrorPolicy::Skip => log::warn!("{:#}", e),
            Err(e) => return Err(e),
        }
    }

    Ok(total)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "sms-trace",
            "--msisdn",
            "79003350829",
            "--since",
            "2025-06-25",
            "--to",
            "2025-06-26",
            "-r",
            "md",
            "--json",
            "a.json",
            "--json",
            "b.json",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.msisdn, "79003350829");
        assert_eq!(args.since, NaiveDate::from_ymd_opt(2025, 6, 25));
        assert_eq!(args.report, Some(ReportFormat::Md));
        assert_eq!(args.json.len(), 2);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_args_reject_bad_date() {
        assert!(Args::try_parse_from(["sms-trace", "-m", "1", "--since", "25.06.2025"]).is_err());
        assert!(Args::try_parse_from(["sms-trace", "--since", "2025-06-25"]).is_err());
    }

    #[test]
    fn test_time_window_covers_whole_days() {
        let since = NaiveDate::from_ymd_opt(2025, 6, 25);
        let to = NaiveDate::from_ymd_opt(2025, 6, 25);

        let (start, end) = time_window(since, to).unwrap().unwrap();
        assert_eq!(start.timestamp(), 1_750_809_600);
        assert_eq!(end.timestamp(), 1_750_895_999);
        assert_eq!(end.timestamp_subsec_nanos(), 999_999_999);

        assert!(time_window(None, None).unwrap().is_none());
        assert!(time_window(since, None).is_err());
        assert!(time_window(NaiveDate::from_ymd_opt(2025, 6, 26), to).is_err());
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::try_parse_from([
            "sms-trace",
            "-m",
            "79003350829",
            "--tshark",
            "/opt/wireshark/tshark",
            "--dump-folder",
            "/var/dumps",
            "--save-json",
            "-r",
            "md",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        apply_args(&mut config, &args).unwrap();
        assert_eq!(config.tools.tshark, PathBuf::from("/opt/wireshark/tshark"));
        assert_eq!(config.tools.capinfos, PathBuf::from("capinfos"));
        assert_eq!(config.input.dump_folder, Some(PathBuf::from("/var/dumps")));
        assert!(config.input.save_json);
        assert_eq!(config.report.format, ReportFormat::Md);
        assert!(config.decoder.since.is_none());
    }

    #[test]
    fn test_ingest_exports_in_order() {
        let end = |epoch: &str, tid: &str| {
            json!({
                "frame": {"frame.time_epoch": epoch},
                "mtp3": {"mtp3.opc": "1", "mtp3.dpc": "2"},
                "tcap": {"tcap.end_element": {"tcap.tid": tid}}
            })
        };

        let mut first = tempfile::NamedTempFile::new().unwrap();
        write!(first, "{}", json!([end("2", "b")])).unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        write!(second, "{}", json!([end("1", "a"), end("3", "c")])).unwrap();

        let exports = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let mut store = EventStore::new();
        let stats = ingest_exports(&exports, &AppConfig::default(), &mut store).unwrap();

        assert_eq!(stats.decoded, 3);
        let tids: Vec<_> = store.all().map(|e| e.transaction_id.as_str()).collect();
        assert_eq!(tids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_missing_export_policy() {
        let exports = vec![PathBuf::from("/nonexistent/trace.json")];

        let mut store = EventStore::new();
        let stats = ingest_exports(&exports, &AppConfig::default(), &mut store).unwrap();
        assert_eq!(stats, DecodeStats::default());

        let mut strict = AppConfig::default();
        strict.decoder.error_policy = FrameErrorPolicy::Abort;
        assert!(ingest_exports(&exports, &strict, &mut store).is_err());
    }

    #[test]
    fn test_captures_require_input() {
        let mut store = EventStore::new();
        assert!(ingest_captures(&AppConfig::default(), &mut store).is_err());
    }
}
