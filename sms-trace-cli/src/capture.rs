//! Capture file discovery
//!
//! A dump folder holds many rotating pcap/pcapng files. `capinfos` gives each
//! file's frame count and first/last packet time, so only captures that
//! overlap the requested window are handed to tshark.

use crate::extractor::ExtractError;
use anyhow::{Context, Result};
use rayon::prelude::*;
use sms_trace_decoder::{parse_epoch, Timestamp};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// `-S` epoch times, `-a`/`-e` first/last packet, `-c` packet count,
/// `-T -r -m` headerless comma separated table
const CAPINFOS_ARGS: [&str; 7] = ["-S", "-a", "-e", "-T", "-r", "-m", "-c"];

/// Metadata of one capture file
#[derive(Debug, Clone, PartialEq)]
pub struct CapInfo {
    pub path: PathBuf,
    pub frames: u64,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl CapInfo {
    /// Run capinfos on a capture file
    pub fn probe(capinfos: &Path, capture: &Path) -> std::result::Result<Self, ExtractError> {
        let output = Command::new(capinfos)
            .args(CAPINFOS_ARGS)
            .arg(capture)
            .output()
            .map_err(|source| ExtractError::Spawn {
                tool: capinfos.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExtractError::Failed {
                tool: capinfos.to_path_buf(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut info = parse_capinfos_line(stdout.trim())?;
        // capinfos echoes the path it was given; keep ours
        info.path = capture.to_path_buf();
        Ok(info)
    }

    /// True when `[start, end]` intersects `[since, to]`
    pub fn overlaps(&self, since: &Timestamp, to: &Timestamp) -> bool {
        !(self.end < *since || self.start > *to)
    }
}

/// Parse one `path,frames,start,end` capinfos table row
///
/// Split from the right so paths containing commas survive.
pub fn parse_capinfos_line(line: &str) -> std::result::Result<CapInfo, ExtractError> {
    let invalid = || ExtractError::CapinfosOutput(line.to_string());

    let mut fields = line.rsplitn(4, ',');
    let end = fields.next().and_then(parse_epoch).ok_or_else(invalid)?;
    let start = fields.next().and_then(parse_epoch).ok_or_else(invalid)?;
    let frames = fields
        .next()
        .and_then(|f| f.trim().parse().ok())
        .ok_or_else(invalid)?;
    let path = fields.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;

    Ok(CapInfo {
        path: PathBuf::from(path),
        frames,
        start,
        end,
    })
}

/// The capture files of one dump folder
#[derive(Debug, Default)]
pub struct FilePool {
    files: Vec<CapInfo>,
}

impl FilePool {
    /// Probe every capture in `folder` whose extension is in `extensions`
    ///
    /// Files capinfos cannot read are logged and left out of the pool.
    pub fn scan(folder: &Path, extensions: &[String], capinfos: &Path) -> Result<Self> {
        let folder = expand_home(folder);
        log::info!("Scanning dump folder: {:?}", folder);

        let mut paths = Vec::new();
        for entry in fs::read_dir(&folder).with_context(|| format!("Failed to read dump folder: {:?}", folder))? {
            let path = entry.with_context(|| format!("Failed to list dump folder: {:?}", folder))?.path();
            if path.is_file() && has_extension(&path, extensions) {
                paths.push(path);
            }
        }
        paths.sort();

        let files: Vec<CapInfo> = paths
            .par_iter()
            .filter_map(|path| match CapInfo::probe(capinfos, path) {
                Ok(info) => {
                    log::debug!("{:?}: {} frames, {} .. {}", path, info.frames, info.start, info.end);
                    Some(info)
                }
                Err(e) => {
                    log::warn!("Skipping {:?}: {}", path, e);
                    None
                }
            })
            .collect();

        log::info!("Found {} capture files in {:?}", files.len(), folder);
        Ok(Self { files })
    }

    #[cfg(test)]
    fn from_files(files: Vec<CapInfo>) -> Self {
        Self { files }
    }

    /// Captures overlapping `[since, to]`, oldest first
    pub fn select(&self, since: &Timestamp, to: &Timestamp) -> Vec<&CapInfo> {
        let mut selected: Vec<&CapInfo> = self
            .files
            .iter()
            .filter(|info| info.overlaps(since, to))
            .collect();
        selected.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.path.cmp(&b.path)));
        selected
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
}

/// Expand a leading `~` to `$HOME`
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}
