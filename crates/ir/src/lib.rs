//! Shared data model of the audit pipeline.
//!
//! The PHP front end fills a [`FileIR`] per source file (tokens, hook
//! registrations, declarations and diagnostics). The engine turns those
//! into [`Finding`]s collected on a [`ScanResult`], which is what every
//! reporter consumes.

pub mod diagnostic;
pub mod finding;
pub mod hook;
pub mod scan;
pub mod token;

use serde::{Deserialize, Serialize};

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use finding::{
    finding_id, truncate_snippet, Finding, Resolution, SecurityChecks, Severity,
    DEFAULT_SNIPPET_MAX_LEN,
};
pub use hook::{CallbackRef, ClassRef, Declaration, HookRegistration, HookType};
pub use scan::{AnalysisMode, ScanResult, ScanStatus, ScanSummary};
pub use token::{Token, TokenKind, TokenRange};

/// Source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Meta {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Meta {
    pub fn at(file: impl Into<String>, token: &Token) -> Self {
        Self {
            file: file.into(),
            line: token.line,
            column: token.column,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Everything the front end learned about one file.
pub struct FileIR {
    pub file_path: String,
    pub file_type: String, // php
    /// Decoded source text the token offsets refer to.
    pub source: String,
    pub tokens: Vec<Token>,
    pub hooks: Vec<HookRegistration>,
    pub declarations: Vec<Declaration>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileIR {
    /// Creates an empty instance for the specified file.
    ///
    /// # Example
    /// ```
    /// use ir::FileIR;
    /// let fir = FileIR::new("plugin.php".into(), "php".into(), "<?php".into());
    /// assert!(fir.tokens.is_empty());
    /// assert!(!fir.is_partial());
    /// ```
    pub fn new(file_path: String, file_type: String, source: String) -> Self {
        Self {
            file_path,
            file_type,
            source,
            tokens: Vec::new(),
            hooks: Vec::new(),
            declarations: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// True when a diagnostic says part of the file may have been misread.
    pub fn is_partial(&self) -> bool {
        self.diagnostics.iter().any(|d| d.kind.marks_partial())
    }

    /// Source text spanned by `range`, from the first token's start to the
    /// last token's end. Empty for an empty or out-of-bounds range.
    pub fn text(&self, range: TokenRange) -> &str {
        if range.is_empty() || range.end > self.tokens.len() {
            return "";
        }
        let start = self.tokens[range.start].offset;
        let end = self.tokens[range.end - 1].end();
        self.source.get(start..end).unwrap_or("")
    }
}

#[cfg(test)]
mod tests;
