//! Per-hook findings and the severity model.

use crate::{HookRegistration, HookType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of the four WordPress security primitives a callback calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityChecks {
    pub current_user_can: bool,
    pub wp_verify_nonce: bool,
    pub check_ajax_referer: bool,
    pub check_admin_referer: bool,
}

impl SecurityChecks {
    pub fn has_permission_check(&self) -> bool {
        self.current_user_can
    }

    pub fn has_nonce_check(&self) -> bool {
        self.wp_verify_nonce || self.check_ajax_referer || self.check_admin_referer
    }

    /// Records a call to `name`. Returns `false` if it is not a primitive.
    pub fn record(&mut self, name: &str) -> bool {
        let slot = match name.to_ascii_lowercase().as_str() {
            "current_user_can" => &mut self.current_user_can,
            "wp_verify_nonce" => &mut self.wp_verify_nonce,
            "check_ajax_referer" => &mut self.check_ajax_referer,
            "check_admin_referer" => &mut self.check_admin_referer,
            _ => return false,
        };
        *slot = true;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Secure,
    Warning,
    Vulnerable,
    Unknown,
}

impl Severity {
    /// Severity of a hook given what its callback checks and whether the
    /// callback body could be found at all.
    ///
    /// # Example
    /// ```
    /// use ir::{Resolution, SecurityChecks, Severity};
    /// let checks = SecurityChecks { current_user_can: true, ..Default::default() };
    /// assert_eq!(Severity::derive(&checks, &Resolution::Resolved), Severity::Warning);
    /// assert_eq!(Severity::derive(&checks, &Resolution::NotFound), Severity::Unknown);
    /// ```
    pub fn derive(checks: &SecurityChecks, resolution: &Resolution) -> Self {
        if !resolution.has_body() {
            return Severity::Unknown;
        }
        match (checks.has_permission_check(), checks.has_nonce_check()) {
            (true, true) => Severity::Secure,
            (false, false) => Severity::Vulnerable,
            _ => Severity::Warning,
        }
    }

    /// Whether a finding of this severity trips a `--fail-on` threshold.
    /// `secure < warning < vulnerable`; `unknown` only matches itself.
    pub fn meets(self, threshold: Severity) -> bool {
        match (self.rank(), threshold.rank()) {
            (Some(s), Some(t)) => s >= t,
            _ => self == threshold,
        }
    }

    fn rank(self) -> Option<u8> {
        match self {
            Severity::Secure => Some(0),
            Severity::Warning => Some(1),
            Severity::Vulnerable => Some(2),
            Severity::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Secure => "secure",
            Severity::Warning => "warning",
            Severity::Vulnerable => "vulnerable",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "secure" => Ok(Severity::Secure),
            "warning" => Ok(Severity::Warning),
            "vulnerable" => Ok(Severity::Vulnerable),
            "unknown" => Ok(Severity::Unknown),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// Outcome of looking up a hook's callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved,
    /// The callback is an inline closure.
    Closure,
    NotFound,
    Dynamic,
    /// Several declarations matched; the first one was analyzed.
    Ambiguous { candidates: Vec<String> },
}

impl Resolution {
    pub fn has_body(&self) -> bool {
        matches!(
            self,
            Resolution::Resolved | Resolution::Closure | Resolution::Ambiguous { .. }
        )
    }
}

/// Stable identifier of a finding: blake3 of file, position and hook name.
/// Two registrations on one line differ by column.
pub fn finding_id(file: &str, line: usize, column: usize, hook_name: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(file.as_bytes());
    hasher.update(b"\0");
    hasher.update(format!("{line}:{column}").as_bytes());
    hasher.update(b"\0");
    hasher.update(hook_name.as_bytes());
    hasher.finalize().to_hex()[..16].to_string()
}

/// One analyzed hook registration.
///
/// Severity is derived from the checks and the resolution when the finding
/// is built and cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub hook_name: String,
    pub hook_type: HookType,
    pub file_path: String,
    pub line_number: usize,
    pub callback_function: String,
    pub handler_file: Option<String>,
    pub handler_line: Option<usize>,
    resolution: Resolution,
    security_checks: SecurityChecks,
    vulnerability_level: Severity,
    pub code_snippet: String,
    pub partial: bool,
}

/// Default cap for [`Finding::code_snippet`], in bytes.
pub const DEFAULT_SNIPPET_MAX_LEN: usize = 2000;

impl Finding {
    pub fn new(reg: &HookRegistration, resolution: Resolution, checks: SecurityChecks) -> Self {
        let checks = if resolution.has_body() {
            checks
        } else {
            SecurityChecks::default()
        };
        let vulnerability_level = Severity::derive(&checks, &resolution);
        Self {
            id: finding_id(&reg.meta.file, reg.meta.line, reg.meta.column, &reg.hook_name),
            hook_name: reg.hook_name.clone(),
            hook_type: reg.hook_type,
            file_path: reg.meta.file.clone(),
            line_number: reg.meta.line,
            callback_function: reg.callback_name(),
            handler_file: None,
            handler_line: None,
            resolution,
            security_checks: checks,
            vulnerability_level,
            code_snippet: String::new(),
            partial: false,
        }
    }

    pub fn with_handler(mut self, file: impl Into<String>, line: usize) -> Self {
        self.handler_file = Some(file.into());
        self.handler_line = Some(line);
        self
    }

    /// Stores `text`, cut to at most `max_len` bytes on a char boundary and
    /// suffixed with `…` when cut.
    pub fn with_snippet(mut self, text: &str, max_len: usize) -> Self {
        self.code_snippet = truncate_snippet(text, max_len);
        self
    }

    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn severity(&self) -> Severity {
        self.vulnerability_level
    }

    pub fn security_checks(&self) -> &SecurityChecks {
        &self.security_checks
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn is_nopriv(&self) -> bool {
        self.hook_type == HookType::WpAjaxNopriv
    }
}

pub fn truncate_snippet(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &text[..cut])
}
