use anyhow::{Context, Result};
use engine::{DEFAULT_FILE_TIMEOUT, DEFAULT_MAX_FILE_SIZE};
use ir::{AnalysisMode, DEFAULT_SNIPPET_MAX_LEN};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

#[cfg(windows)]
pub fn config_dir() -> PathBuf {
    std::env::var("APPDATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("wp-ajax-audit")
}

#[cfg(not(windows))]
pub fn config_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".config")
        .join("wp-ajax-audit")
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_timeout_file_ms() -> u64 {
    DEFAULT_FILE_TIMEOUT.as_millis() as u64
}

fn default_snippet_max_len() -> usize {
    DEFAULT_SNIPPET_MAX_LEN
}

/// `[scan]` table. Command-line flags win over these values.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// `0` disables the per-file budget.
    #[serde(default = "default_timeout_file_ms")]
    pub timeout_file_ms: u64,
    #[serde(default = "default_snippet_max_len")]
    pub snippet_max_len: usize,
    #[serde(default)]
    pub mode: AnalysisMode,
    /// Extra exclusion globs, added to the command-line ones.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Project-specific functions treated as side effects in ordered mode.
    #[serde(default)]
    pub sensitive_functions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            timeout_file_ms: default_timeout_file_ms(),
            snippet_max_len: default_snippet_max_len(),
            mode: AnalysisMode::default(),
            exclude: Vec::new(),
            sensitive_functions: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
}

pub fn load_config() -> Result<Config> {
    let path = config_file_path();
    if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse_config(&content).with_context(|| format!("failed to parse {}", path.display()))
    } else {
        Ok(Config::default())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}
