//! Conversion of scan results to SARIF 2.1.0 specification.

use ir::{Finding, ScanResult, Severity};
use serde_sarif::sarif;

/// Rule id and message for a finding. Secure hooks have none.
fn describe(f: &Finding) -> Option<(&'static str, String)> {
    let hook = &f.hook_name;
    let cb = &f.callback_function;
    let checks = f.security_checks();
    match f.severity() {
        Severity::Secure => None,
        Severity::Vulnerable => Some((
            "wp-ajax/missing-checks",
            format!("AJAX hook {hook} (callback {cb}) checks neither capability nor nonce"),
        )),
        Severity::Warning if !checks.has_permission_check() => Some((
            "wp-ajax/missing-permission-check",
            format!("AJAX hook {hook} (callback {cb}) verifies a nonce but not a capability"),
        )),
        Severity::Warning => Some((
            "wp-ajax/missing-nonce-check",
            format!("AJAX hook {hook} (callback {cb}) checks a capability but no nonce"),
        )),
        Severity::Unknown => Some((
            "wp-ajax/unresolved-callback",
            format!("callback {cb} of AJAX hook {hook} could not be analyzed"),
        )),
    }
}

pub fn to_sarif(result: &ScanResult) -> sarif::Sarif {
    let results: Vec<sarif::Result> = result
        .hooks()
        .iter()
        .filter_map(|f| {
            let (rule_id, message) = describe(f)?;
            let location = sarif::Location::builder()
                .physical_location(
                    sarif::PhysicalLocation::builder()
                        .artifact_location(
                            sarif::ArtifactLocation::builder()
                                .uri(f.file_path.clone())
                                .build(),
                        )
                        .region(
                            sarif::Region::builder()
                                .start_line(f.line_number as i64)
                                .build(),
                        )
                        .build(),
                )
                .build();

            let level = match f.severity() {
                Severity::Vulnerable => sarif::ResultLevel::Error,
                Severity::Warning => sarif::ResultLevel::Warning,
                _ => sarif::ResultLevel::Note,
            };

            Some(
                sarif::Result::builder()
                    .rule_id(rule_id.to_string())
                    .message(sarif::Message::builder().text(message).build())
                    .level(level)
                    .locations(vec![location])
                    .build(),
            )
        })
        .collect();

    sarif::Sarif::builder()
        .version(serde_json::json!("2.1.0"))
        .schema(sarif::SCHEMA_URL.to_string())
        .runs(vec![sarif::Run::builder()
            .tool(
                sarif::Tool::builder()
                    .driver(
                        sarif::ToolComponent::builder()
                            .name("wp-ajax-audit")
                            .build(),
                    )
                    .build(),
            )
            .results(results)
            .build()])
        .build()
}
