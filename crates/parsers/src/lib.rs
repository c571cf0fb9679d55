//! Converters of PHP source files to the intermediate representation
//! used by the engine.

use anyhow::{Context, Result};
use ir::{Diagnostic, DiagnosticKind, FileIR};
use serde::Serialize;
use std::{fs, path::Path, time::Instant};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct ParserMetrics {
    pub files_parsed: usize,
    /// Files parsed with recoverable problems.
    pub partial_files: usize,
    /// Diagnostics that made a file partial, summed over all files.
    pub parse_errors: usize,
}

impl ParserMetrics {
    pub fn record(&mut self, fir: &FileIR) {
        self.files_parsed += 1;
        let errors = fir
            .diagnostics
            .iter()
            .filter(|d| d.kind.marks_partial())
            .count();
        if errors > 0 {
            self.partial_files += 1;
            self.parse_errors += errors;
        }
    }
}

pub mod catalog;
pub mod languages;
pub use languages::*;

/// Determines the supported file type from the name/extension.
///
/// # Example
/// ```
/// use parsers::detect_type;
/// assert_eq!(detect_type(std::path::Path::new("admin/ajax.php")), Some("php"));
/// assert_eq!(detect_type(std::path::Path::new("readme.txt")), None);
/// ```
pub fn detect_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension().map(|e| e.to_string_lossy().to_lowercase());
    let detected = match ext.as_deref() {
        Some("php" | "php3" | "php4" | "php5" | "php7" | "php8" | "phtml" | "inc") => Some("php"),
        _ => None,
    };
    if let Some(t) = detected {
        debug!(file = %path.display(), file_type = t, "File type detected");
    } else {
        debug!(file = %path.display(), "Unsupported file type");
    }
    detected
}

/// Parses raw file bytes. Invalid UTF-8 is replaced and reported with an
/// `InvalidEncoding` diagnostic; the file is still analyzed.
///
/// Fails only when `deadline` passes while tokenizing.
pub fn parse_source(file_path: &str, content: &[u8], deadline: Option<Instant>) -> Result<FileIR> {
    let text = String::from_utf8_lossy(content);
    let mut fir = FileIR::new(file_path.to_string(), "php".to_string(), String::new());
    if let std::borrow::Cow::Owned(_) = text {
        fir.diagnostics.push(Diagnostic::new(
            DiagnosticKind::InvalidEncoding,
            file_path,
            "file is not valid UTF-8; invalid bytes were replaced",
        ));
    }
    parse_php_with_deadline(&text, &mut fir, deadline)?;
    Ok(fir)
}

/// Reads a file and produces its intermediate representation [`FileIR`].
/// Returns `Ok(None)` for files that are not PHP.
///
/// # Example
/// ```
/// use parsers::parse_file;
/// use std::fs;
/// let path = std::env::temp_dir().join("wp_ajax_audit_doc.php");
/// fs::write(&path, "<?php add_action('wp_ajax_go', 'go');").unwrap();
/// let ir = parse_file(&path, None).unwrap().unwrap();
/// assert_eq!(ir.hooks[0].hook_name, "wp_ajax_go");
/// ```
pub fn parse_file(path: &Path, metrics: Option<&mut ParserMetrics>) -> Result<Option<FileIR>> {
    let Some(ftype) = detect_type(path) else {
        return Ok(None);
    };
    debug!(file = %path.display(), file_type = ftype, "Parsing file");
    let content =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let fir = parse_source(&path.to_string_lossy(), &content, None)?;
    if let Some(m) = metrics {
        m.record(&fir);
    }
    Ok(Some(fir))
}
