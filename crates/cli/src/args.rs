use clap::{Args as ClapArgs, Parser, Subcommand};
use ir::{AnalysisMode, Severity};
use regex::Regex;
use std::path::PathBuf;

use crate::output::Format;

fn parse_severity(s: &str) -> Result<Severity, String> {
    s.parse()
}

fn parse_mode(s: &str) -> Result<AnalysisMode, String> {
    s.parse()
}

fn default_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

fn parse_threads(s: &str) -> Result<usize, String> {
    let v: usize = s
        .parse()
        .map_err(|e: std::num::ParseIntError| e.to_string())?;
    if v == 0 {
        Err("threads must be greater than 0".into())
    } else {
        Ok(v)
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Audits WordPress plugin AJAX handlers for missing permission and nonce checks",
    long_about = "wp-ajax-audit finds every `wp_ajax_*` and `wp_ajax_nopriv_*` hook a WordPress plugin registers, resolves the PHP callback behind it and reports whether the callback calls `current_user_can` and a nonce check (`wp_verify_nonce`, `check_ajax_referer`, `check_admin_referer`).

Each hook is rated secure (both checks), warning (one of them), vulnerable (neither) or unknown (the callback could not be found).

Examples:
  wp-ajax-audit scan my-plugin/                  # Scan a plugin directory
  wp-ajax-audit scan my-plugin.zip --format json # Scan an archive, JSON output
  wp-ajax-audit scan . --fail-on vulnerable      # Fail CI on vulnerable hooks
  wp-ajax-audit tokens includes/ajax.php         # Dump the token stream",
    subcommand_required = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Show version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    pub version: Option<bool>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a plugin directory, PHP file or zip archive
    Scan(ScanArgs),
    /// Print the tokens, hooks and declarations of one PHP file as JSON
    Tokens(TokensArgs),
}

#[derive(ClapArgs)]
pub struct ScanArgs {
    /// Plugin directory, PHP file or `.zip` archive
    pub path: PathBuf,
    /// Plugin name shown in reports (defaults to the directory or archive name)
    #[arg(long = "plugin-name")]
    pub plugin_name: Option<String>,
    /// Output format for scan results
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// `baseline` counts any check in the callback, `ordered` only checks
    /// reached before the first side effect
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<AnalysisMode>,
    /// Exit with code 1 if a hook of this severity or worse is found
    #[arg(long = "fail-on", value_parser = parse_severity)]
    pub fail_on: Option<Severity>,
    /// Number of parallel threads used for parsing
    #[arg(long, default_value_t = default_threads(), value_parser = parse_threads)]
    pub threads: usize,
    /// Exclude paths matching these globs (relative to the plugin root)
    #[arg(long, value_parser = crate::parse_exclude, value_delimiter = ',')]
    pub exclude: Vec<Regex>,
    /// Don't use default exclusion patterns
    #[arg(long)]
    pub no_default_exclude: bool,
    /// Skip files larger than this many bytes (0 disables the limit)
    #[arg(long)]
    pub max_file_size: Option<u64>,
    /// Tokenizing budget per file in milliseconds
    #[arg(long)]
    pub timeout_file_ms: Option<u64>,
    /// Maximum length of the callback snippet in bytes
    #[arg(long = "snippet-len")]
    pub snippet_len: Option<usize>,
    /// Write performance metrics to file (`-` for stderr)
    #[arg(long)]
    pub metrics: Option<PathBuf>,
    /// Disable colored text output
    #[arg(long = "no-color")]
    pub no_color: bool,
    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
    /// Suppress non-essential output
    #[arg(long)]
    pub quiet: bool,
}

#[derive(ClapArgs)]
pub struct TokensArgs {
    /// PHP file to tokenize
    pub file: PathBuf,
    /// Include hooks and declarations in the dump
    #[arg(long)]
    pub full: bool,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
