use ir::{
    AnalysisMode, CallbackRef, Diagnostic, DiagnosticKind, Finding, HookRegistration, Meta,
    Resolution, ScanResult, SecurityChecks,
};
use std::time::Duration;


fn registration(hook: &str, callback: &str, line: usize) -> HookRegistration {
    HookRegistration::new(
        hook.into(),
        CallbackRef::Function {
            name: callback.into(),
        },
        Meta {
            file: "plugin.php".into(),
            line,
            column: 1,
        },
        None,
    )
    .expect("ajax hook")
}

/// One hook of every severity, in line order.
pub(super) fn sample_result() -> ScanResult {
    let mut result = ScanResult::new("abc123", "demo", AnalysisMode::Baseline);
    result.begin().unwrap();
    let secure = Finding::new(
        &registration("wp_ajax_secure", "ok", 3),
        Resolution::Resolved,
        SecurityChecks {
            current_user_can: true,
            check_ajax_referer: true,
            ..Default::default()
        },
    )
    .with_handler("plugin.php", 10)
    .with_snippet("check_ajax_referer('a');\ncurrent_user_can('x');", 2000);
    let warning = Finding::new(
        &registration("wp_ajax_nopriv_contact", "say \"hi\"", 4),
        Resolution::Resolved,
        SecurityChecks {
            wp_verify_nonce: true,
            ..Default::default()
        },
    )
    .with_handler("contact.php", 2);
    let vulnerable = Finding::new(
        &registration("wp_ajax_save", "save", 5),
        Resolution::Resolved,
        SecurityChecks::default(),
    )
    .with_handler("plugin.php", 20)
    .with_snippet("\n   update_option('a', $_POST['a']);", 2000)
    .with_partial(true);
    let unknown = Finding::new(
        &registration("wp_ajax_missing", "missing", 6),
        Resolution::NotFound,
        SecurityChecks::default(),
    );
    for f in [secure, warning, vulnerable, unknown] {
        result.push_finding(f).unwrap();
    }
    result
        .push_diagnostic(
            Diagnostic::new(
                DiagnosticKind::UnresolvedCallback,
                "plugin.php",
                "no function named missing for wp_ajax_missing",
            )
            .at_line(6),
        )
        .unwrap();
    result.set_file_counts(2, 2, 0).unwrap();
    result.complete(Duration::from_millis(5)).unwrap();
    result
}

pub(super) fn render(result: &ScanResult, fmt: crate::Format, color: bool) -> String {
    let mut buf = Vec::new();
    crate::write_result(&mut buf, result, fmt, color).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn format_names_round_trip() {
    use crate::Format;
    for f in [Format::Text, Format::Json, Format::Sarif, Format::Csv] {
        assert_eq!(f.to_string().parse::<Format>(), Ok(f));
    }
    assert_eq!("SARIF".parse::<Format>(), Ok(Format::Sarif));
    assert!("xml".parse::<Format>().is_err());
}
