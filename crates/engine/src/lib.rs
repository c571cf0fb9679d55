//! Analysis engine: parses a plugin corpus in parallel, resolves every AJAX
//! hook callback and records which security primitives it calls.

use ir::{Diagnostic, DiagnosticKind, FileIR, ScanResult, DEFAULT_SNIPPET_MAX_LEN};
use loader::{Corpus, SourceContent, SourceFile};
use parsers::catalog::Catalog;
use parsers::php::LexTimeout;
use parsers::ParserMetrics;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub mod aggregate;
pub mod analyzer;
pub mod cancel;
pub mod index;
pub mod resolver;

pub use aggregate::aggregate;
pub use analyzer::analyze;
pub use cancel::CancellationToken;
pub use index::{DeclarationIndex, Located};
pub use ir::AnalysisMode;
pub use resolver::{resolve, CallbackDefinition, Resolved};

/// Files above this size are skipped unless configured otherwise.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
pub const DEFAULT_FILE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// `0` disables the cap.
    pub max_file_size: u64,
    /// Tokenizing budget per file.
    pub file_timeout: Option<Duration>,
    /// Budget of the whole scan, only honoured by [`scan_async`].
    pub scan_timeout: Option<Duration>,
    pub snippet_max_len: usize,
    pub mode: AnalysisMode,
    /// Extra function names treated as sensitive effects in ordered mode.
    pub extra_sensitive: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            file_timeout: Some(DEFAULT_FILE_TIMEOUT),
            scan_timeout: None,
            snippet_max_len: DEFAULT_SNIPPET_MAX_LEN,
            mode: AnalysisMode::default(),
            extra_sensitive: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct EngineMetrics {
    pub file_times_ms: HashMap<String, u128>,
    pub files_skipped: usize,
    pub declarations: usize,
    pub findings: usize,
    pub parser: ParserMetrics,
}

/// Reported after every file of phase 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub files_processed: usize,
    pub files_total: usize,
}

pub type ProgressFn<'a> = &'a (dyn Fn(Progress) + Sync);

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scan cancelled")]
    Cancelled,
    #[error("scan did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("scan worker failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    State(#[from] anyhow::Error),
}

enum FileOutcome {
    Parsed(FileIR),
    Skipped(Diagnostic),
    Cancelled,
}

/// Scans `corpus` and always returns a frozen result. Errors that stop the
/// scan are reported as a failed result.
///
/// # Example
/// ```
/// use engine::{scan, EngineConfig};
/// use ir::{ScanStatus, Severity};
/// use loader::Corpus;
///
/// let corpus = Corpus::from_pairs(
///     "demo",
///     [("demo.php", "<?php add_action('wp_ajax_go', 'go'); function go() { echo 1; }")],
/// );
/// let result = scan(&corpus, &EngineConfig::default());
/// assert_eq!(result.status(), ScanStatus::Completed);
/// assert_eq!(result.hooks()[0].severity(), Severity::Vulnerable);
/// ```
pub fn scan(corpus: &Corpus, cfg: &EngineConfig) -> ScanResult {
    let start = Instant::now();
    match scan_with(corpus, cfg, None, None) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Scan aborted");
            let mut result = ScanResult::new(scan_id(corpus), &corpus.plugin_name, cfg.mode);
            // A fresh result is never frozen.
            let _ = result.fail(e.to_string(), start.elapsed());
            result
        }
    }
}

/// Scans `corpus`, reporting progress and honouring `cancel`.
pub fn scan_with(
    corpus: &Corpus,
    cfg: &EngineConfig,
    progress: Option<ProgressFn<'_>>,
    cancel: Option<&CancellationToken>,
) -> Result<ScanResult, ScanError> {
    scan_with_metrics(corpus, cfg, progress, cancel, None)
}

pub fn scan_with_metrics(
    corpus: &Corpus,
    cfg: &EngineConfig,
    progress: Option<ProgressFn<'_>>,
    cancel: Option<&CancellationToken>,
    mut metrics: Option<&mut EngineMetrics>,
) -> Result<ScanResult, ScanError> {
    let start = Instant::now();
    let cancelled = || cancel.is_some_and(CancellationToken::is_cancelled);
    let mut result = ScanResult::new(scan_id(corpus), &corpus.plugin_name, cfg.mode);
    result.begin()?;
    info!(
        plugin = %corpus.plugin_name,
        files = corpus.len(),
        mode = %cfg.mode,
        "Scan started"
    );

    let php: Vec<&SourceFile> = corpus
        .files()
        .iter()
        .filter(|f| parsers::detect_type(Path::new(&f.path)).is_some())
        .collect();
    if php.is_empty() {
        let reason = if corpus.is_empty() && corpus.ignored == 0 {
            "plugin contains no files"
        } else {
            "no PHP files found"
        };
        result.set_file_counts(0, 0, 0)?;
        result.fail(reason, start.elapsed())?;
        warn!(plugin = %corpus.plugin_name, reason, "Scan failed");
        return Ok(result);
    }
    info!(files = php.len(), "Files queued");

    let total = php.len();
    let processed = AtomicUsize::new(0);
    let outcomes: Vec<(FileOutcome, Duration)> = php
        .par_iter()
        .map(|file| {
            if cancelled() {
                return (FileOutcome::Cancelled, Duration::ZERO);
            }
            let file_start = Instant::now();
            let outcome = prepare_file(file, cfg);
            let n = processed.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("Parsed file {}/{}: {}", n, total, file.path);
            if let Some(report) = progress {
                report(Progress {
                    files_processed: n,
                    files_total: total,
                });
            }
            (outcome, file_start.elapsed())
        })
        .collect();
    if cancelled() {
        info!("Scan cancelled");
        return Err(ScanError::Cancelled);
    }

    let mut files = Vec::with_capacity(outcomes.len());
    let mut skipped = 0;
    for ((outcome, elapsed), source) in outcomes.into_iter().zip(&php) {
        if let Some(m) = metrics.as_deref_mut() {
            m.file_times_ms.insert(source.path.clone(), elapsed.as_millis());
        }
        match outcome {
            FileOutcome::Parsed(fir) => {
                for diag in &fir.diagnostics {
                    result.push_diagnostic(diag.clone())?;
                }
                if let Some(m) = metrics.as_deref_mut() {
                    m.parser.record(&fir);
                }
                files.push(fir);
            }
            FileOutcome::Skipped(diag) => {
                skipped += 1;
                result.push_diagnostic(diag)?;
            }
            FileOutcome::Cancelled => return Err(ScanError::Cancelled),
        }
    }
    result.set_file_counts(total, files.len(), skipped)?;
    if files.is_empty() {
        result.fail("every PHP file was skipped", start.elapsed())?;
        warn!(plugin = %corpus.plugin_name, skipped, "Scan failed");
        return Ok(result);
    }

    let index = DeclarationIndex::build(&files);
    debug!(declarations = index.len(), "Declarations indexed");
    let mut catalog = Catalog::php();
    catalog.extend(&cfg.extra_sensitive);
    aggregate(&files, &index, cfg, &catalog, &mut result)?;
    result.complete(start.elapsed())?;

    if let Some(m) = metrics {
        m.files_skipped = skipped;
        m.declarations = index.len();
        m.findings = result.hooks().len();
    }
    info!(
        hooks = result.summary().total_hooks,
        vulnerable = result.summary().vulnerable,
        duration_ms = result.duration_ms(),
        "Scan completed"
    );
    Ok(result)
}

/// Runs [`scan_with`] on tokio's blocking pool. When the configuration
/// sets a scan timeout the scan is cancelled once it expires.
pub async fn scan_async(corpus: Corpus, cfg: EngineConfig) -> Result<ScanResult, ScanError> {
    let token = CancellationToken::new();
    let worker = token.clone();
    let budget = cfg.scan_timeout;
    let task = tokio::task::spawn_blocking(move || scan_with(&corpus, &cfg, None, Some(&worker)));
    let joined = match budget {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                token.cancel();
                warn!(timeout_ms = limit.as_millis() as u64, "Scan timed out");
                return Err(ScanError::TimedOut(limit));
            }
        },
        None => task.await,
    };
    joined.map_err(|e| ScanError::Runtime(e.to_string()))?
}

fn prepare_file(file: &SourceFile, cfg: &EngineConfig) -> FileOutcome {
    let too_large = |size: u64| {
        warn!(path = %file.path, size, "File skipped: too large");
        FileOutcome::Skipped(Diagnostic::new(
            DiagnosticKind::FileTooLarge,
            &file.path,
            format!(
                "file is {size} bytes, above the limit of {} bytes",
                cfg.max_file_size
            ),
        ))
    };
    let bytes = match &file.content {
        SourceContent::Loaded(bytes)
            if cfg.max_file_size > 0 && bytes.len() as u64 > cfg.max_file_size =>
        {
            return too_large(bytes.len() as u64)
        }
        SourceContent::Loaded(bytes) => bytes,
        SourceContent::TooLarge(size) => return too_large(*size),
        SourceContent::Unreadable(reason) => {
            warn!(path = %file.path, reason = %reason, "File skipped: unreadable");
            return FileOutcome::Skipped(Diagnostic::new(
                DiagnosticKind::Unreadable,
                &file.path,
                format!("cannot read file: {reason}"),
            ));
        }
    };
    let deadline = cfg.file_timeout.map(|t| Instant::now() + t);
    match parsers::parse_source(&file.path, bytes, deadline) {
        Ok(fir) => FileOutcome::Parsed(fir),
        Err(e) if e.downcast_ref::<LexTimeout>().is_some() => {
            warn!(path = %file.path, "File skipped: timeout");
            let budget = cfg.file_timeout.unwrap_or_default();
            FileOutcome::Skipped(Diagnostic::new(
                DiagnosticKind::Timeout,
                &file.path,
                format!("tokenizing took longer than {} ms", budget.as_millis()),
            ))
        }
        Err(e) => FileOutcome::Skipped(Diagnostic::new(
            DiagnosticKind::Unreadable,
            &file.path,
            format!("{e:#}"),
        )),
    }
}

/// Stable id of a scan: blake3 of the plugin name and every file.
pub fn scan_id(corpus: &Corpus) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(corpus.plugin_name.as_bytes());
    for file in corpus.files() {
        hasher.update(b"\0");
        hasher.update(file.path.as_bytes());
        hasher.update(b"\0");
        match &file.content {
            SourceContent::Loaded(bytes) => hasher.update(bytes),
            SourceContent::TooLarge(size) => hasher.update(&size.to_le_bytes()),
            SourceContent::Unreadable(reason) => hasher.update(reason.as_bytes()),
        };
    }
    hasher.finalize().to_hex()[..16].to_string()
}
