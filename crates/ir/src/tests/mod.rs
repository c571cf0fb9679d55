use super::*;
use serde_json::Value as JsonValue;
use std::time::Duration;

fn registration(hook: &str, callback: CallbackRef) -> HookRegistration {
    HookRegistration::new(
        hook.into(),
        callback,
        Meta {
            file: "plugin.php".into(),
            line: 7,
            column: 1,
        },
        None,
    )
    .unwrap()
}

fn finding(checks: SecurityChecks) -> Finding {
    let reg = registration(
        "wp_ajax_save",
        CallbackRef::Function {
            name: "save".into(),
        },
    );
    Finding::new(&reg, Resolution::Resolved, checks)
}

fn checks(perm: bool, nonce: bool) -> SecurityChecks {
    SecurityChecks {
        current_user_can: perm,
        wp_verify_nonce: nonce,
        ..Default::default()
    }
}

#[test]
fn severity_table_covers_boolean_space() {
    let cases = [
        (true, true, Severity::Secure),
        (true, false, Severity::Warning),
        (false, true, Severity::Warning),
        (false, false, Severity::Vulnerable),
    ];
    for (perm, nonce, expected) in cases {
        let f = finding(checks(perm, nonce));
        assert_eq!(f.severity(), expected, "perm={perm} nonce={nonce}");
        assert_eq!(
            Severity::derive(f.security_checks(), f.resolution()),
            f.severity()
        );
    }
}

#[test]
fn any_referer_check_counts_as_nonce() {
    for c in [
        SecurityChecks {
            current_user_can: true,
            check_ajax_referer: true,
            ..Default::default()
        },
        SecurityChecks {
            current_user_can: true,
            check_admin_referer: true,
            ..Default::default()
        },
    ] {
        assert_eq!(finding(c).severity(), Severity::Secure);
    }
}

#[test]
fn unresolved_callback_is_unknown_and_checks_cleared() {
    let reg = registration(
        "wp_ajax_x",
        CallbackRef::Function {
            name: "missing".into(),
        },
    );
    let f = Finding::new(&reg, Resolution::NotFound, checks(true, true));
    assert_eq!(f.severity(), Severity::Unknown);
    assert_eq!(*f.security_checks(), SecurityChecks::default());
    let f = Finding::new(&reg, Resolution::Dynamic, SecurityChecks::default());
    assert_eq!(f.severity(), Severity::Unknown);
}

#[test]
fn ambiguous_resolution_is_still_analyzed() {
    let reg = registration(
        "wp_ajax_x",
        CallbackRef::Function {
            name: "dup".into(),
        },
    );
    let res = Resolution::Ambiguous {
        candidates: vec!["a.php:3".into(), "b.php:9".into()],
    };
    assert_eq!(
        Finding::new(&reg, res, checks(true, true)).severity(),
        Severity::Secure
    );
}

#[test]
fn hook_type_is_derived_from_name() {
    let reg = registration(
        "wp_ajax_nopriv_contact",
        CallbackRef::Function {
            name: "contact".into(),
        },
    );
    assert_eq!(reg.hook_type, HookType::WpAjaxNopriv);
    assert!(HookRegistration::new(
        "admin_init".into(),
        CallbackRef::Function { name: "x".into() },
        Meta::default(),
        None
    )
    .is_none());
}

#[test]
fn callback_display_names() {
    let this = CallbackRef::Method {
        class: ClassRef::This,
        method: "handle".into(),
    };
    assert_eq!(this.display_name(Some("Plugin")), "Plugin::handle");
    assert_eq!(this.display_name(None), "$this::handle");
    let named = CallbackRef::Method {
        class: ClassRef::Named("\\Acme\\Ajax".into()),
        method: "run".into(),
    };
    assert_eq!(named.display_name(None), "\\Acme\\Ajax::run");
    let closure = CallbackRef::Closure {
        body: TokenRange::new(3, 9),
    };
    assert_eq!(closure.display_name(None), "{closure}");
}

#[test]
fn snippet_is_cut_on_char_boundary() {
    let f = finding(checks(true, true)).with_snippet("héllo wörld", 2);
    assert_eq!(f.code_snippet, "h…");
    let f = finding(checks(true, true)).with_snippet("short", 2000);
    assert_eq!(f.code_snippet, "short");
}

#[test]
fn finding_id_is_stable() {
    let a = finding(checks(false, false));
    let b = finding(checks(true, true));
    assert_eq!(a.id, b.id);
    assert_eq!(a.id, finding_id("plugin.php", 7, 1, "wp_ajax_save"));
    assert_ne!(a.id, finding_id("plugin.php", 8, 1, "wp_ajax_save"));
    assert_ne!(a.id, finding_id("plugin.php", 7, 40, "wp_ajax_save"));
}

#[test]
fn finding_serializes_with_dashboard_names() {
    let f = finding(checks(true, false)).with_handler("inc/ajax.php", 12);
    let v: JsonValue = serde_json::to_value(&f).unwrap();
    assert_eq!(v["hookName"], "wp_ajax_save");
    assert_eq!(v["hookType"], "wp_ajax");
    assert_eq!(v["filePath"], "plugin.php");
    assert_eq!(v["lineNumber"], 7);
    assert_eq!(v["callbackFunction"], "save");
    assert_eq!(v["handlerFile"], "inc/ajax.php");
    assert_eq!(v["securityChecks"]["currentUserCan"], true);
    assert_eq!(v["securityChecks"]["wpVerifyNonce"], false);
    assert_eq!(v["vulnerabilityLevel"], "warning");
    assert_eq!(v["resolution"]["status"], "resolved");
}

#[test]
fn severity_parse_and_threshold() {
    assert_eq!("Vulnerable".parse::<Severity>().unwrap(), Severity::Vulnerable);
    assert!("high".parse::<Severity>().is_err());
    assert!(Severity::Vulnerable.meets(Severity::Warning));
    assert!(!Severity::Warning.meets(Severity::Vulnerable));
    assert!(!Severity::Unknown.meets(Severity::Warning));
    assert!(Severity::Unknown.meets(Severity::Unknown));
    assert!(!Severity::Vulnerable.meets(Severity::Unknown));
}

#[test]
fn result_lifecycle_and_summary() {
    let mut result = ScanResult::new("s1", "demo", AnalysisMode::Baseline);
    assert_eq!(result.status(), ScanStatus::Pending);
    assert!(result.push_finding(finding(checks(true, true))).is_err());
    result.begin().unwrap();
    result.push_finding(finding(checks(true, true))).unwrap();
    result.push_finding(finding(checks(false, false))).unwrap();
    result.push_finding(finding(checks(true, false))).unwrap();
    let nopriv = registration(
        "wp_ajax_nopriv_x",
        CallbackRef::Dynamic {
            expr: "$cb".into(),
        },
    );
    result
        .push_finding(Finding::new(
            &nopriv,
            Resolution::Dynamic,
            SecurityChecks::default(),
        ))
        .unwrap();
    result.complete(Duration::from_millis(5)).unwrap();

    let s = result.summary();
    assert_eq!(s.total_hooks, 4);
    assert_eq!((s.secure, s.warning, s.vulnerable, s.unknown), (1, 1, 1, 1));
    assert_eq!(s.vulnerable_hooks, 1);
    assert_eq!(s.missing_permission, 1);
    assert_eq!(s.missing_nonce, 2);
    assert_eq!(s.nopriv_hooks, 1);
    assert_eq!(result.duration_ms(), 5);
}

#[test]
fn frozen_result_rejects_mutation() {
    let mut result = ScanResult::new("s2", "demo", AnalysisMode::Ordered);
    result.begin().unwrap();
    result.complete(Duration::ZERO).unwrap();
    assert!(result.push_finding(finding(checks(true, true))).is_err());
    assert!(result
        .push_diagnostic(Diagnostic::new(DiagnosticKind::Timeout, "a.php", "late"))
        .is_err());
    assert!(result.fail("late", Duration::ZERO).is_err());
    assert!(result.begin().is_err());
}

#[test]
fn failed_result_has_no_findings() {
    let mut result = ScanResult::new("s3", "demo", AnalysisMode::Baseline);
    result.begin().unwrap();
    result.push_finding(finding(checks(true, true))).unwrap();
    result.fail("no PHP files found", Duration::ZERO).unwrap();
    assert_eq!(result.status(), ScanStatus::Failed);
    assert!(result.hooks().is_empty());
    assert_eq!(result.failure_reason(), Some("no PHP files found"));
    let v: JsonValue = serde_json::to_value(&result).unwrap();
    assert_eq!(v["status"], "failed");
    assert_eq!(v["pluginName"], "demo");
}

#[test]
fn file_ir_text_maps_token_range_to_source() {
    let source = "<?php foo();".to_string();
    let mut fir = FileIR::new("a.php".into(), "php".into(), source);
    let tok = |kind, text: &str, offset| Token {
        kind,
        text: text.into(),
        offset,
        line: 1,
        column: offset + 1,
    };
    fir.tokens = vec![
        tok(TokenKind::OpenTag, "<?php", 0),
        tok(TokenKind::Identifier, "foo", 6),
        tok(TokenKind::Punct, "(", 9),
        tok(TokenKind::Punct, ")", 10),
        tok(TokenKind::Punct, ";", 11),
    ];
    assert_eq!(fir.text(TokenRange::new(1, 5)), "foo();");
    assert_eq!(fir.text(TokenRange::new(2, 2)), "");
    assert_eq!(fir.text(TokenRange::new(1, 50)), "");
    fir.diagnostics.push(Diagnostic::new(
        DiagnosticKind::UnexpectedCharacter,
        "a.php",
        "`",
    ));
    assert!(fir.is_partial());
}

#[test]
fn string_value_rejects_interpolation() {
    let s = |text: &str| Token {
        kind: TokenKind::String,
        text: text.into(),
        offset: 0,
        line: 1,
        column: 1,
    };
    assert_eq!(s("'it\\'s'").string_value().as_deref(), Some("it's"));
    assert_eq!(s("\"wp_ajax_go\"").string_value().as_deref(), Some("wp_ajax_go"));
    assert_eq!(s("\"wp_ajax_{$name}\"").string_value(), None);
    assert_eq!(s("\"wp_ajax_$name\"").string_value(), None);
    assert_eq!(s("\"cost: 5$\"").string_value().as_deref(), Some("cost: 5$"));
}
