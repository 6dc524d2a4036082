//! Configuration loading and parsing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sms_trace_decoder::DecoderConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
///
/// Every section is optional; command-line flags override file values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
}

/// External Wireshark tools
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_tshark")]
    pub tshark: PathBuf,
    #[serde(default = "default_capinfos")]
    pub capinfos: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            tshark: default_tshark(),
            capinfos: default_capinfos(),
        }
    }
}

fn default_tshark() -> PathBuf {
    PathBuf::from("tshark")
}

fn default_capinfos() -> PathBuf {
    PathBuf::from("capinfos")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Folder scanned for capture files
    pub dump_folder: Option<PathBuf>,
    /// Capture file extensions, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Keep tshark output as `cached_<file>.json` next to the capture
    #[serde(default)]
    pub save_json: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dump_folder: None,
            extensions: default_extensions(),
            save_json: false,
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["pcap".to_string(), "pcapng".to_string()]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,
    /// Width of the ASCII report rules
    #[serde(default = "default_width")]
    pub width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            width: default_width(),
        }
    }
}

fn default_width() -> usize {
    100
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Ascii,
    Md,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let (Some(since), Some(until)) = (config.decoder.since, config.decoder.until) {
        anyhow::ensure!(
            since <= until,
            "Invalid decoder window in {:?}: since {} is after until {}",
            path,
            since,
            until
        );
    }

    Ok(config)
}
