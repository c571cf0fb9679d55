//! Scan result value handed to reporters and other consumers.

use crate::{Diagnostic, Finding, Severity};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How the analyzer decides whether a security primitive counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Any call anywhere in the callback body counts.
    #[default]
    Baseline,
    /// Only calls made before the first sensitive effect count.
    Ordered,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Baseline => f.write_str("baseline"),
            AnalysisMode::Ordered => f.write_str("ordered"),
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" => Ok(AnalysisMode::Baseline),
            "ordered" => Ok(AnalysisMode::Ordered),
            other => Err(format!("unknown analysis mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_hooks: usize,
    pub secure: usize,
    pub warning: usize,
    pub vulnerable: usize,
    pub unknown: usize,
    pub vulnerable_hooks: usize,
    pub missing_permission: usize,
    pub missing_nonce: usize,
    pub nopriv_hooks: usize,
}

impl ScanSummary {
    /// Counts everything in a single pass over `findings`.
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut s = ScanSummary {
            total_hooks: findings.len(),
            ..Default::default()
        };
        for f in findings {
            match f.severity() {
                Severity::Secure => s.secure += 1,
                Severity::Warning => s.warning += 1,
                Severity::Vulnerable => s.vulnerable += 1,
                Severity::Unknown => s.unknown += 1,
            }
            if f.severity() != Severity::Unknown {
                if !f.security_checks().has_permission_check() {
                    s.missing_permission += 1;
                }
                if !f.security_checks().has_nonce_check() {
                    s.missing_nonce += 1;
                }
            }
            if f.is_nopriv() {
                s.nopriv_hooks += 1;
            }
        }
        s.vulnerable_hooks = s.vulnerable;
        s
    }
}

/// Result of scanning one plugin.
///
/// Starts `Pending`, moves to `Running` with [`ScanResult::begin`] and is
/// frozen by [`ScanResult::complete`] or [`ScanResult::fail`]. A frozen
/// result rejects every further mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    id: String,
    plugin_name: String,
    status: ScanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_reason: Option<String>,
    mode: AnalysisMode,
    summary: ScanSummary,
    hooks: Vec<Finding>,
    diagnostics: Vec<Diagnostic>,
    files_total: usize,
    files_analyzed: usize,
    files_skipped: usize,
    duration_ms: u64,
}

impl ScanResult {
    pub fn new(id: impl Into<String>, plugin_name: impl Into<String>, mode: AnalysisMode) -> Self {
        Self {
            id: id.into(),
            plugin_name: plugin_name.into(),
            status: ScanStatus::Pending,
            failure_reason: None,
            mode,
            summary: ScanSummary::default(),
            hooks: Vec::new(),
            diagnostics: Vec::new(),
            files_total: 0,
            files_analyzed: 0,
            files_skipped: 0,
            duration_ms: 0,
        }
    }

    fn ensure_open(&self, action: &str) -> Result<()> {
        if self.is_frozen() {
            bail!("cannot {action}: scan {} is already {}", self.id, self.status);
        }
        Ok(())
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.status != ScanStatus::Pending {
            bail!("cannot begin scan {}: status is {}", self.id, self.status);
        }
        self.status = ScanStatus::Running;
        Ok(())
    }

    pub fn push_finding(&mut self, finding: Finding) -> Result<()> {
        if self.status != ScanStatus::Running {
            bail!("cannot add finding: scan {} is {}", self.id, self.status);
        }
        self.hooks.push(finding);
        Ok(())
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) -> Result<()> {
        self.ensure_open("add diagnostic")?;
        self.diagnostics.push(diagnostic);
        Ok(())
    }

    pub fn set_file_counts(&mut self, total: usize, analyzed: usize, skipped: usize) -> Result<()> {
        self.ensure_open("set file counts")?;
        self.files_total = total;
        self.files_analyzed = analyzed;
        self.files_skipped = skipped;
        Ok(())
    }

    /// Computes the summary and freezes the result.
    pub fn complete(&mut self, elapsed: Duration) -> Result<()> {
        if self.status != ScanStatus::Running {
            bail!("cannot complete scan {}: status is {}", self.id, self.status);
        }
        self.summary = ScanSummary::from_findings(&self.hooks);
        self.duration_ms = elapsed.as_millis() as u64;
        self.status = ScanStatus::Completed;
        Ok(())
    }

    /// Discards findings, records `reason` and freezes the result.
    pub fn fail(&mut self, reason: impl Into<String>, elapsed: Duration) -> Result<()> {
        self.ensure_open("fail")?;
        self.hooks.clear();
        self.summary = ScanSummary::default();
        self.failure_reason = Some(reason.into());
        self.duration_ms = elapsed.as_millis() as u64;
        self.status = ScanStatus::Failed;
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.status, ScanStatus::Completed | ScanStatus::Failed)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    pub fn hooks(&self) -> &[Finding] {
        &self.hooks
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn files_total(&self) -> usize {
        self.files_total
    }

    pub fn files_analyzed(&self) -> usize {
        self.files_analyzed
    }

    pub fn files_skipped(&self) -> usize {
        self.files_skipped
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}
