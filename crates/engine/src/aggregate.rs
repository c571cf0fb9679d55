//! Turns hook registrations into findings.

use crate::analyzer::analyze;
use crate::index::DeclarationIndex;
use crate::resolver::resolve;
use crate::EngineConfig;
use ir::{FileIR, Finding, ScanResult, SecurityChecks};
use parsers::catalog::Catalog;
use tracing::debug;

/// Appends one finding per registration to `result`, files in the given
/// order and registrations in source order. Resolution diagnostics are
/// appended as well.
pub fn aggregate(
    files: &[FileIR],
    index: &DeclarationIndex<'_>,
    cfg: &EngineConfig,
    catalog: &Catalog,
    result: &mut ScanResult,
) -> anyhow::Result<()> {
    for file in files {
        for reg in &file.hooks {
            let resolved = resolve(reg, file, index);
            if let Some(diag) = resolved.diagnostic {
                result.push_diagnostic(diag)?;
            }
            let finding = match resolved.definition {
                Some(def) => {
                    let checks = analyze(&def.file.tokens, def.body, cfg.mode, catalog);
                    Finding::new(reg, resolved.resolution, checks)
                        .with_handler(&def.file.file_path, def.line)
                        .with_snippet(def.file.text(def.source).trim(), cfg.snippet_max_len)
                        .with_partial(file.is_partial() || def.file.is_partial())
                }
                None => Finding::new(reg, resolved.resolution, SecurityChecks::default())
                    .with_partial(file.is_partial()),
            };
            debug!(
                hook = %finding.hook_name,
                callback = %finding.callback_function,
                severity = %finding.severity(),
                "Hook analyzed"
            );
            result.push_finding(finding)?;
        }
    }
    Ok(())
}
