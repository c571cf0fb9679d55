//! Terminal decorations written to stderr: header, progress bar and the
//! closing status line. The report itself goes to stdout or `--output`.

use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};

use colored::Colorize;
use ir::{ScanResult, ScanStatus};

pub fn print_header() {
    let version = env!("CARGO_PKG_VERSION");
    let spaces = " ".repeat(24usize.saturating_sub(version.len()));
    eprintln!(
        r#"
    ╭──────────────────────────────────────╮
    │                                      │
    │          WP  AJAX  AUDIT             │
    │                                      │
    │     Permission & nonce checks        │
    │     for WordPress AJAX hooks         │
    │     Version: {version}{spaces}│
    │                                      │
    ╰──────────────────────────────────────╯
"#
    );
}

/// One line summarizing the scan, colored by its worst outcome.
pub fn status_line(result: &ScanResult) -> String {
    let summary = result.summary();
    match result.status() {
        ScanStatus::Failed => format!(
            "✘ Scan of {} failed: {}",
            result.plugin_name(),
            result.failure_reason().unwrap_or("unknown error")
        )
        .red()
        .to_string(),
        _ if summary.vulnerable > 0 => format!(
            "✘ {} of {} hook(s) vulnerable in {} ({} ms)",
            summary.vulnerable,
            summary.total_hooks,
            result.plugin_name(),
            result.duration_ms()
        )
        .red()
        .bold()
        .to_string(),
        _ if summary.warning + summary.unknown > 0 => format!(
            "⚠ {} of {} hook(s) need review in {} ({} ms)",
            summary.warning + summary.unknown,
            summary.total_hooks,
            result.plugin_name(),
            result.duration_ms()
        )
        .yellow()
        .to_string(),
        _ => format!(
            "✔ {} hook(s) checked in {} ({} ms)",
            summary.total_hooks,
            result.plugin_name(),
            result.duration_ms()
        )
        .green()
        .to_string(),
    }
}

/// The bar renders only when stderr is attached to a terminal. For
/// non-interactive environments (CI, redirections), progress updates
/// are skipped to avoid noisy logs.
pub struct ProgressBar {
    total_files: usize,
    files_completed: usize,
    width: usize,
    last_line_len: usize,
    min_interval: Duration,
    last_draw: Instant,
    start: Instant,
}

impl ProgressBar {
    /// Returns `None` when there is nothing to track or when stderr is
    /// not attached to a terminal.
    pub fn new(total_files: usize) -> Option<Self> {
        if total_files == 0 || !io::stderr().is_terminal() {
            return None;
        }
        let min_interval = Duration::from_millis(75);
        let start = Instant::now();
        let mut bar = Self {
            total_files,
            files_completed: 0,
            width: 28,
            last_line_len: 0,
            min_interval,
            last_draw: start,
            start,
        };
        bar.draw(true);
        if let Some(adjusted) = bar.last_draw.checked_sub(bar.min_interval) {
            bar.last_draw = adjusted;
        }
        Some(bar)
    }

    /// Moves the bar to `completed` files. Redraws are throttled.
    pub fn set_completed(&mut self, completed: usize) {
        self.files_completed = completed.min(self.total_files);
        self.draw(false);
    }

    /// Forces a final draw and moves the cursor to the next line.
    pub fn finish(&mut self) {
        self.files_completed = self.total_files;
        self.draw(true);
        let mut stderr = io::stderr();
        let _ = writeln!(stderr);
        self.last_line_len = 0;
    }

    fn draw(&mut self, force: bool) {
        let now = Instant::now();
        if !force
            && self.last_line_len != 0
            && now.duration_since(self.last_draw) < self.min_interval
        {
            return;
        }
        self.last_draw = now;

        let percent = (self.files_completed as f64 / self.total_files as f64).clamp(0.0, 1.0);
        let filled = ((self.width as f64) * percent).round() as usize;
        let filled = filled.min(self.width);
        let bar = format!(
            "{}{}",
            "█".repeat(filled),
            "░".repeat(self.width - filled)
        );
        let eta = estimate_eta(self.start.elapsed(), self.files_completed, self.total_files)
            .map(format_duration)
            .unwrap_or_else(|| "--:--".to_string());
        let message = format!(
            "▸ Parsing |{bar}| {:6.2}% | files {}/{} | ETA {eta}",
            percent * 100.0,
            self.files_completed,
            self.total_files,
        );

        let mut stderr = io::stderr();
        let padding = " ".repeat(self.last_line_len.saturating_sub(message.len()));
        let _ = write!(stderr, "\r{message}{padding}");
        let _ = stderr.flush();
        self.last_line_len = message.len();
    }
}

fn estimate_eta(elapsed: Duration, done: usize, total: usize) -> Option<Duration> {
    if done == 0 || elapsed.is_zero() {
        return None;
    }
    if done >= total {
        return Some(Duration::ZERO);
    }
    let per_file = elapsed.as_secs_f64() / done as f64;
    Some(Duration::from_secs_f64(per_file * (total - done) as f64))
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
