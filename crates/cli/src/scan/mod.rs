use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};

use crate::args::ScanArgs;
use crate::config::{load_config, Config};
use crate::output;
use crate::{default_excludes, is_excluded, load_ignore_patterns, parse_exclude, ui};

use engine::{EngineConfig, EngineMetrics, Progress, ProgressFn};
use ir::{ScanResult, ScanStatus, Severity};
use loader::LoadOptions;

/// Exit status for a scan that could not produce findings.
pub const EXIT_SCAN_FAILED: i32 = 2;
/// Exit status when a hook meets the `--fail-on` threshold.
pub const EXIT_THRESHOLD: i32 = 1;

pub fn init_logging(quiet: bool, debug: bool) {
    let level = if quiet {
        LevelFilter::OFF
    } else if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    if debug && !quiet {
        debug!("Debug mode enabled");
    }
}

/// Merges command-line flags over the `[scan]` table of the config file.
pub fn engine_config(args: &ScanArgs, cfg: &Config) -> EngineConfig {
    let timeout_ms = args.timeout_file_ms.unwrap_or(cfg.scan.timeout_file_ms);
    EngineConfig {
        max_file_size: args.max_file_size.unwrap_or(cfg.scan.max_file_size),
        file_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        scan_timeout: None,
        snippet_max_len: args.snippet_len.unwrap_or(cfg.scan.snippet_max_len),
        mode: args.mode.unwrap_or(cfg.scan.mode),
        extra_sensitive: cfg.scan.sensitive_functions.clone(),
    }
}

/// The process exit status a finished scan maps to, `None` for success.
///
/// # Example
/// ```
/// use ir::{AnalysisMode, ScanResult};
/// use std::time::Duration;
/// use wp_ajax_audit::scan::exit_code;
///
/// let mut result = ScanResult::new("id", "demo", AnalysisMode::Baseline);
/// result.fail("no PHP files found", Duration::ZERO).unwrap();
/// assert_eq!(exit_code(&result, None), Some(2));
/// ```
pub fn exit_code(result: &ScanResult, fail_on: Option<Severity>) -> Option<i32> {
    if result.status() == ScanStatus::Failed {
        return Some(EXIT_SCAN_FAILED);
    }
    let threshold = fail_on?;
    result
        .hooks()
        .iter()
        .any(|f| f.severity().meets(threshold))
        .then_some(EXIT_THRESHOLD)
}

pub fn run_scan(args: ScanArgs) -> Result<()> {
    let user_cfg = load_config().context("failed to load configuration")?;
    init_logging(args.quiet, args.debug);
    if args.no_color {
        colored::control::set_override(false);
    }
    if !args.quiet {
        ui::print_header();
    }

    let path = args
        .path
        .canonicalize()
        .with_context(|| format!("cannot access {}", args.path.display()))?;
    debug!(target = %path.display(), "Target resolved");
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
    {
        error!("Failed to build global thread pool: {e}");
    }

    let cfg = engine_config(&args, &user_cfg);
    let mut patterns = args.exclude.clone();
    for glob in &user_cfg.scan.exclude {
        match parse_exclude(glob) {
            Ok(re) => patterns.push(re),
            Err(e) => warn!(pattern = %glob, error = %e, "Invalid exclude in config"),
        }
    }
    if !args.no_default_exclude {
        patterns.extend(default_excludes());
    }
    if path.is_dir() {
        patterns.extend(load_ignore_patterns(&path));
    }
    debug!(
        path = %path.display(),
        max_file_size = cfg.max_file_size,
        excludes = patterns.len(),
        mode = %cfg.mode,
        "Scan configured"
    );

    let exclude = |rel: &str| is_excluded(rel, &patterns);
    let include = |p: &Path| parsers::detect_type(p).is_some();
    let opts = LoadOptions {
        plugin_name: args.plugin_name.clone(),
        max_file_size: cfg.max_file_size,
        exclude: &exclude,
        include: &include,
    };
    let corpus = loader::load_path(&path, &opts)?;

    let bar = Mutex::new(if args.quiet {
        None
    } else {
        ui::ProgressBar::new(corpus.len())
    });
    let on_progress = |p: Progress| {
        if let Ok(mut guard) = bar.lock() {
            if let Some(bar) = guard.as_mut() {
                bar.set_completed(p.files_processed);
            }
        }
    };
    let report: ProgressFn<'_> = &on_progress;

    let mut metrics = EngineMetrics::default();
    let metrics_opt = if args.metrics.is_some() {
        Some(&mut metrics)
    } else {
        None
    };
    let result = engine::scan_with_metrics(&corpus, &cfg, Some(report), None, metrics_opt)?;
    if let Ok(mut guard) = bar.lock() {
        if let Some(bar) = guard.as_mut() {
            bar.finish();
        }
    }

    output::write_report(&result, args.format, args.output.as_deref(), args.no_color)?;
    if let Some(out) = &args.output {
        info!(path = %out.display(), "Report written");
    }
    if let Some(path) = &args.metrics {
        let data = serde_json::to_string_pretty(&metrics)?;
        if path.as_os_str() == "-" {
            if !args.quiet {
                eprintln!("{data}");
            }
        } else {
            fs::write(path, data)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }
    if !args.quiet {
        eprintln!("{}", ui::status_line(&result));
    }
    debug!(status = ?result.status(), "Report finished");
    if let Some(code) = exit_code(&result, args.fail_on) {
        std::process::exit(code);
    }
    Ok(())
}
