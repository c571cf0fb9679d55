//! Non-fatal problems collected during a scan.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnterminatedString,
    UnterminatedComment,
    UnterminatedHeredoc,
    UnexpectedCharacter,
    /// An `add_action` call whose argument list could not be parsed.
    MalformedHookCall,
    /// Bytes that were not valid UTF-8 were replaced before lexing.
    InvalidEncoding,
    FileTooLarge,
    Timeout,
    Unreadable,
    AmbiguousCallback,
    UnresolvedCallback,
    DynamicCallback,
}

impl DiagnosticKind {
    /// The file was analyzed but some of it may have been misread.
    pub fn marks_partial(self) -> bool {
        matches!(
            self,
            DiagnosticKind::UnterminatedString
                | DiagnosticKind::UnterminatedComment
                | DiagnosticKind::UnterminatedHeredoc
                | DiagnosticKind::UnexpectedCharacter
                | DiagnosticKind::MalformedHookCall
                | DiagnosticKind::InvalidEncoding
        )
    }

    /// The file was not analyzed at all.
    pub fn skips_file(self) -> bool {
        matches!(
            self,
            DiagnosticKind::FileTooLarge | DiagnosticKind::Timeout | DiagnosticKind::Unreadable
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::UnterminatedString => "unterminated_string",
            DiagnosticKind::UnterminatedComment => "unterminated_comment",
            DiagnosticKind::UnterminatedHeredoc => "unterminated_heredoc",
            DiagnosticKind::UnexpectedCharacter => "unexpected_character",
            DiagnosticKind::MalformedHookCall => "malformed_hook_call",
            DiagnosticKind::InvalidEncoding => "invalid_encoding",
            DiagnosticKind::FileTooLarge => "file_too_large",
            DiagnosticKind::Timeout => "timeout",
            DiagnosticKind::Unreadable => "unreadable",
            DiagnosticKind::AmbiguousCallback => "ambiguous_callback",
            DiagnosticKind::UnresolvedCallback => "unresolved_callback",
            DiagnosticKind::DynamicCallback => "dynamic_callback",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: String,
    /// `None` for problems that concern the whole file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
            line: None,
            message: message.into(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{} [{}] {}", self.file, line, self.kind, self.message),
            None => write!(f, "{} [{}] {}", self.file, self.kind, self.message),
        }
    }
}
