//! Formatters for scan results in text, JSON, SARIF and CSV.
//! Provide human and tool-friendly output.

use ir::{Finding, ScanResult, ScanStatus, Severity};
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use tracing::debug;

mod csv;
mod sarif;

pub use csv::CSV_HEADER;
pub use sarif::to_sarif;

/// Returns the severity label, colored with ANSI codes when `color` is set.
fn severity_label(sev: Severity, color: bool) -> String {
    let (code, text) = match sev {
        Severity::Secure => ("\x1b[32m", "SECURE"),
        Severity::Warning => ("\x1b[33m", "WARNING"),
        Severity::Vulnerable => ("\x1b[31m", "VULNERABLE"),
        Severity::Unknown => ("\x1b[90m", "UNKNOWN"),
    };
    if color {
        format!("{code}{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

/// Draws a one-line title box.
fn simple_box(title: &str) -> String {
    let width = title.chars().count() + 2;
    format!(
        "╭{}╮\n│ {} │\n╰{}╯\n",
        "─".repeat(width),
        title,
        "─".repeat(width)
    )
}

const RULE: &str =
    "    ──────────────────────────────────────────────────────────────────────────────\n";

fn summary_section(result: &ScanResult) -> String {
    let mut output = simple_box("Scan Summary");
    output.push('\n');
    output.push_str(&format!("    Plugin            {}\n", result.plugin_name()));
    output.push_str(&format!("    Scan id           {}\n", result.id()));
    output.push_str(&format!("    Status            {}\n", result.status()));
    output.push_str(&format!("    Mode              {}\n", result.mode()));
    output.push_str(&format!(
        "    Files             {} analyzed, {} skipped, {} total\n",
        result.files_analyzed(),
        result.files_skipped(),
        result.files_total()
    ));
    output.push_str(&format!("    Duration          {}ms\n", result.duration_ms()));
    if let Some(reason) = result.failure_reason() {
        output.push_str(&format!("    Failure           {reason}\n"));
        return output;
    }

    let s = result.summary();
    output.push('\n');
    output.push_str("    HOOKS\n");
    output.push_str(RULE);
    output.push_str("    Total   Secure   Warning   Vulnerable   Unknown   Nopriv\n");
    output.push_str(RULE);
    output.push_str(&format!(
        "    {:<7} {:<8} {:<9} {:<12} {:<9} {}\n",
        s.total_hooks, s.secure, s.warning, s.vulnerable, s.unknown, s.nopriv_hooks
    ));
    output.push('\n');
    output.push_str(&format!(
        "    Missing permission check  {}\n",
        s.missing_permission
    ));
    output.push_str(&format!("    Missing nonce check       {}\n", s.missing_nonce));
    output
}

fn mark(present: bool) -> &'static str {
    if present {
        "✔"
    } else {
        "✘"
    }
}

fn write_finding<W: Write>(out: &mut W, f: &Finding, color: bool) -> io::Result<()> {
    writeln!(
        out,
        "{} {}:{} {}",
        severity_label(f.severity(), color),
        f.file_path,
        f.line_number,
        f.hook_name
    )?;
    match (&f.handler_file, f.handler_line) {
        (Some(file), Some(line)) => writeln!(
            out,
            "    callback: {} ({file}:{line})",
            f.callback_function
        )?,
        _ => writeln!(out, "    callback: {} (not resolved)", f.callback_function)?,
    }
    if f.severity() != Severity::Unknown {
        let checks = f.security_checks();
        writeln!(
            out,
            "    checks: permission {}  nonce {}",
            mark(checks.has_permission_check()),
            mark(checks.has_nonce_check())
        )?;
    }
    if let Some(first) = f.code_snippet.lines().find(|l| !l.trim().is_empty()) {
        writeln!(out, "    ↳  {}", first.trim())?;
    }
    if f.partial {
        writeln!(out, "    • Partial: the source could not be fully parsed")?;
    }
    writeln!(out)
}

fn write_text<W: Write>(out: &mut W, result: &ScanResult, color: bool) -> io::Result<()> {
    writeln!(out, "{}", summary_section(result))?;
    if result.status() == ScanStatus::Failed {
        writeln!(out, "{}", simple_box("Results"))?;
        writeln!(
            out,
            "✘ Scan failed: {}",
            result.failure_reason().unwrap_or("unknown reason")
        )?;
    } else if result.hooks().is_empty() {
        writeln!(out, "{}", simple_box("Results"))?;
        writeln!(out, "✔ No AJAX hooks found.")?;
    } else {
        writeln!(out, "{}", simple_box("Results"))?;
        let attention = result
            .hooks()
            .iter()
            .filter(|f| f.severity() != Severity::Secure)
            .count();
        if attention == 0 {
            writeln!(out, "✔ All {} hook(s) are secure.\n", result.hooks().len())?;
        } else {
            writeln!(out, "⚠ {attention} hook(s) need attention:\n")?;
        }
        for f in result.hooks() {
            write_finding(out, f, color)?;
        }
        writeln!(out, "Total: {}", result.hooks().len())?;
    }
    if !result.diagnostics().is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", simple_box("Diagnostics"))?;
        for d in result.diagnostics() {
            writeln!(out, "    {d}")?;
        }
    }
    Ok(())
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable output in plain text.
    #[default]
    Text,
    /// The full result as JSON, field names as the dashboard expects them.
    Json,
    /// Report conforming to the SARIF specification.
    Sarif,
    /// One row per hook.
    Csv,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Text => "text",
            Format::Json => "json",
            Format::Sarif => "sarif",
            Format::Csv => "csv",
        })
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            "sarif" => Ok(Format::Sarif),
            "csv" => Ok(Format::Csv),
            other => Err(format!("unknown format '{other}'")),
        }
    }
}

/// Prints a result to stdout in the selected format.
///
/// # Example
/// ```
/// use ir::{AnalysisMode, ScanResult};
/// use reporters::{print_result, Format};
/// use std::time::Duration;
///
/// let mut result = ScanResult::new("id", "demo", AnalysisMode::Baseline);
/// result.begin().unwrap();
/// result.complete(Duration::from_millis(3)).unwrap();
/// print_result(&result, Format::Text, false).unwrap();
/// ```
pub fn print_result(result: &ScanResult, fmt: Format, color: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_result(&mut out, result, fmt, color)
}

/// Writes a result to any `Write`. `color` only affects [`Format::Text`].
pub fn write_result<W: Write>(
    out: &mut W,
    result: &ScanResult,
    fmt: Format,
    color: bool,
) -> io::Result<()> {
    debug!(format = %fmt, hooks = result.hooks().len(), "Writing report");
    match fmt {
        Format::Text => write_text(out, result, color)?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut *out, result)?;
            writeln!(out)?;
        }
        Format::Sarif => {
            let sarif = sarif::to_sarif(result);
            serde_json::to_writer_pretty(&mut *out, &sarif)?;
            writeln!(out)?;
        }
        Format::Csv => csv::write_csv(out, result.hooks())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests;
