//! tshark invocation
//!
//! Runs tshark over one capture with a two-pass read filter on the time
//! window and a display filter on `gsm_map`, and returns the JSON frames.

use serde_json::Value;
use sms_trace_decoder::{Decoder, Timestamp, TraceError};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Errors from the external Wireshark tools
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to run {tool:?}: {source}")]
    Spawn {
        tool: PathBuf,
        source: std::io::Error,
    },

    #[error("{tool:?} exited with status {}: {stderr}", display_status(.status))]
    Failed {
        tool: PathBuf,
        status: Option<i32>,
        stderr: String,
    },

    #[error("unexpected capinfos output: {0:?}")]
    CapinfosOutput(String),

    #[error("invalid tshark output: {0}")]
    Output(#[from] TraceError),

    #[error("failed to write JSON cache {path:?}: {source}")]
    Cache {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn display_status(status: &Option<i32>) -> String {
    status.map_or_else(|| "signal".to_string(), |code| code.to_string())
}

/// Extracts GSM MAP frames from captures with tshark
#[derive(Debug, Clone)]
pub struct TsharkExtractor {
    tshark: PathBuf,
    window: Option<(Timestamp, Timestamp)>,
    cache_dir: Option<PathBuf>,
}

impl TsharkExtractor {
    pub fn new(tshark: impl Into<PathBuf>) -> Self {
        Self {
            tshark: tshark.into(),
            window: None,
            cache_dir: None,
        }
    }

    /// Only read frames captured inside `[since, to]`
    pub fn with_window(mut self, since: Timestamp, to: Timestamp) -> Self {
        self.window = Some((since, to));
        self
    }

    /// Save each capture's raw tshark output as `cached_<file>.json` in `dir`
    pub fn with_cache_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.cache_dir = dir;
        self
    }

    /// Arguments passed to tshark for one capture
    pub fn command_args(&self, capture: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-r".into(), capture.as_os_str().to_owned()];

        if let Some((since, to)) = &self.window {
            args.push("-2".into());
            args.push("-R".into());
            args.push(
                format!(
                    "frame.time_epoch >= {} and frame.time_epoch <= {}",
                    epoch(since),
                    epoch(to)
                )
                .into(),
            );
        }

        args.extend(["-Y", "gsm_map", "-T", "json"].map(OsString::from));
        args
    }

    /// Run tshark on a capture and parse its JSON output
    pub fn scan(&self, capture: &Path) -> Result<Vec<Value>, ExtractError> {
        log::debug!("Running {:?} on {:?}", self.tshark, capture);

        let output = Command::new(&self.tshark)
            .args(self.command_args(capture))
            .output()
            .map_err(|source| ExtractError::Spawn {
                tool: self.tshark.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExtractError::Failed {
                tool: self.tshark.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if let Some(dir) = &self.cache_dir {
            let path = dir.join(Self::cache_name(capture));
            fs::write(&path, &output.stdout).map_err(|source| ExtractError::Cache {
                path: path.clone(),
                source,
            })?;
            log::info!("Saved tshark output to {:?}", path);
        }

        // tshark prints nothing at all when no frame passes the filters
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        Ok(Decoder::parse_frames(output.stdout.as_slice())?)
    }

    /// File name of the JSON cache for a capture
    pub fn cache_name(capture: &Path) -> String {
        let name = capture
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "capture".to_string());
        format!("cached_{}.json", name)
    }
}

/// `seconds.nanoseconds`, the form tshark uses for `frame.time_epoch`
fn epoch(time: &Timestamp) -> String {
    format!("{}.{:09}", time.timestamp(), time.timestamp_subsec_nanos())
}
