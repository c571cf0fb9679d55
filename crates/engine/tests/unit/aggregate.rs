use super::*;
use ir::{DiagnosticKind, Resolution, ScanStatus, Severity};

#[test]
fn one_finding_per_registration_in_file_then_line_order() {
    let result = scan_pairs(&[
        (
            "b.php",
            "<?php\nadd_action('wp_ajax_x', 'first');\nadd_action('wp_ajax_x', 'second');\nfunction first() {}\nfunction second() {}",
        ),
        ("a.php", "<?php add_action('wp_ajax_nopriv_a', 'first');"),
    ]);
    assert_eq!(result.status(), ScanStatus::Completed);
    let order: Vec<_> = result
        .hooks()
        .iter()
        .map(|f| (f.file_path.as_str(), f.line_number, f.callback_function.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![("a.php", 1, "first"), ("b.php", 2, "first"), ("b.php", 3, "second")]
    );
    assert_ne!(result.hooks()[1].id, result.hooks()[2].id);
}

#[test]
fn registrations_sharing_a_line_get_distinct_ids() {
    let result = scan_pairs(&[(
        "p.php",
        "<?php add_action('wp_ajax_x', 'a'); add_action('wp_ajax_x', 'b');\nfunction a() {}\nfunction b() { current_user_can('x'); check_ajax_referer('n'); }",
    )]);
    let hooks = result.hooks();
    assert_eq!(hooks.len(), 2);
    assert_eq!(hooks[0].line_number, hooks[1].line_number);
    assert_eq!(hooks[0].severity(), Severity::Vulnerable);
    assert_eq!(hooks[1].severity(), Severity::Secure);
    assert_ne!(hooks[0].id, hooks[1].id);
}

#[test]
fn severity_follows_the_checks_of_the_callback() {
    let result = scan_pairs(&[(
        "p.php",
        r#"<?php
add_action('wp_ajax_both', 'both');
add_action('wp_ajax_cap', 'cap');
add_action('wp_ajax_nonce', 'nonce');
add_action('wp_ajax_none', 'none');
add_action('wp_ajax_missing', 'missing');
function both() { current_user_can('x'); check_admin_referer('y'); }
function cap() { current_user_can('x'); }
function nonce() { wp_verify_nonce($n, 'a'); }
function none() { }
"#,
    )]);
    let levels: Vec<_> = result.hooks().iter().map(|f| f.severity()).collect();
    assert_eq!(
        levels,
        vec![
            Severity::Secure,
            Severity::Warning,
            Severity::Warning,
            Severity::Vulnerable,
            Severity::Unknown,
        ]
    );
    for f in result.hooks() {
        assert_eq!(
            f.severity(),
            Severity::derive(f.security_checks(), f.resolution())
        );
    }
}

#[test]
fn undefined_callback_is_unknown_with_a_diagnostic() {
    let result = scan_pairs(&[("p.php", "<?php add_action('wp_ajax_foo', 'bar');")]);
    assert_eq!(result.status(), ScanStatus::Completed);
    let finding = &result.hooks()[0];
    assert_eq!(finding.severity(), Severity::Unknown);
    assert_eq!(finding.resolution(), &Resolution::NotFound);
    assert_eq!(finding.handler_file, None);
    assert!(finding.code_snippet.is_empty());
    assert!(result
        .diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::UnresolvedCallback));
    assert_eq!(result.summary().unknown, 1);
}

#[test]
fn findings_carry_handler_location_and_snippet() {
    let result = scan_pairs(&[
        ("hooks.php", "<?php add_action('wp_ajax_go', 'go');"),
        ("lib/handlers.php", "<?php\n\nfunction go() {\n    echo 'hi';\n}\n"),
    ]);
    let finding = &result.hooks()[0];
    assert_eq!(finding.handler_file.as_deref(), Some("lib/handlers.php"));
    assert_eq!(finding.handler_line, Some(3));
    assert_eq!(finding.code_snippet, "function go() {\n    echo 'hi';\n}");
    assert!(!finding.partial);
}

#[test]
fn snippets_are_bounded() {
    let cfg = EngineConfig {
        snippet_max_len: 12,
        ..EngineConfig::default()
    };
    let result = scan_pairs_with(
        &[(
            "p.php",
            "<?php add_action('wp_ajax_s', function () { $value = 'a long body'; echo $value; });",
        )],
        &cfg,
    );
    assert_eq!(result.hooks()[0].code_snippet, "$value = 'a …");
}

#[test]
fn closure_callbacks_are_analyzed_in_place() {
    let result = scan_pairs(&[(
        "p.php",
        "<?php add_action('wp_ajax_c', fn () => check_ajax_referer('c') && current_user_can('x'));",
    )]);
    let finding = &result.hooks()[0];
    assert_eq!(finding.callback_function, "{closure}");
    assert_eq!(finding.resolution(), &Resolution::Closure);
    assert_eq!(finding.severity(), Severity::Secure);
}

#[test]
fn parse_problems_mark_findings_partial() {
    let result = scan_pairs(&[
        ("a.php", "<?php add_action('wp_ajax_p', 'p');"),
        ("b.php", "<?php function p() { current_user_can('x'); } $s = 'never closed"),
    ]);
    assert_eq!(result.status(), ScanStatus::Completed);
    let finding = &result.hooks()[0];
    assert!(finding.partial);
    assert!(finding.security_checks().current_user_can);
    assert!(result
        .diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::UnterminatedString && d.file == "b.php"));
}

#[test]
fn summary_counts_every_category() {
    let result = scan_pairs(&[(
        "p.php",
        r#"<?php
add_action('wp_ajax_a', 'ok');
add_action('wp_ajax_nopriv_b', 'open');
add_action('wp_ajax_nopriv_c', 'cap_only');
add_action('wp_ajax_d', $dynamic);
function ok() { current_user_can('x'); wp_verify_nonce($n); }
function open() { }
function cap_only() { current_user_can('x'); }
"#,
    )]);
    let s = result.summary();
    assert_eq!(s.total_hooks, 4);
    assert_eq!((s.secure, s.warning, s.vulnerable, s.unknown), (1, 1, 1, 1));
    assert_eq!(s.vulnerable_hooks, 1);
    assert_eq!(s.missing_permission, 1);
    assert_eq!(s.missing_nonce, 2);
    assert_eq!(s.nopriv_hooks, 2);
}

#[test]
fn ordered_mode_is_recorded_on_the_result() {
    let code = "<?php add_action('wp_ajax_o', 'o'); function o() { update_option('a', 1); current_user_can('x'); check_ajax_referer('n'); }";
    let baseline = scan_pairs(&[("p.php", code)]);
    assert_eq!(baseline.mode(), AnalysisMode::Baseline);
    assert_eq!(baseline.hooks()[0].severity(), Severity::Secure);

    let cfg = EngineConfig {
        mode: AnalysisMode::Ordered,
        ..EngineConfig::default()
    };
    let ordered = scan_pairs_with(&[("p.php", code)], &cfg);
    assert_eq!(ordered.mode(), AnalysisMode::Ordered);
    assert_eq!(ordered.hooks()[0].severity(), Severity::Vulnerable);
}

#[test]
fn empty_corpus_fails_without_findings() {
    let result = scan_pairs(&[]);
    assert_eq!(result.status(), ScanStatus::Failed);
    assert_eq!(result.failure_reason(), Some("plugin contains no files"));
    assert!(result.hooks().is_empty());
    assert!(result.is_frozen());
}

#[test]
fn corpus_without_php_fails() {
    let result = scan_pairs(&[("readme.txt", "add_action('wp_ajax_x', 'y');")]);
    assert_eq!(result.status(), ScanStatus::Failed);
    assert_eq!(result.failure_reason(), Some("no PHP files found"));
}

#[test]
fn plugin_without_hooks_completes_empty() {
    let result = scan_pairs(&[("p.php", "<?php function nothing() {}")]);
    assert_eq!(result.status(), ScanStatus::Completed);
    assert!(result.hooks().is_empty());
    assert_eq!(result.summary().total_hooks, 0);
    assert_eq!(
        (result.files_total(), result.files_analyzed(), result.files_skipped()),
        (1, 1, 0)
    );
}

#[test]
fn scan_id_depends_on_content_only() {
    let pairs = [("p.php", "<?php add_action('wp_ajax_x', 'y');")];
    let a = scan_pairs(&pairs);
    let b = scan_pairs(&pairs);
    assert_eq!(a.id(), b.id());
    let c = scan_pairs(&[("p.php", "<?php add_action('wp_ajax_z', 'y');")]);
    assert_ne!(a.id(), c.id());
    assert_eq!(a.plugin_name(), "test-plugin");
}

#[test]
fn by_reference_this_callback_is_analyzed() {
    let result = scan_pairs(&[(
        "legacy.php",
        r#"<?php
class Legacy {
    function Legacy() {
        add_action('wp_ajax_legacy_save', array(&$this, 'save'));
    }
    function save() {
        check_ajax_referer('legacy');
        if (!current_user_can('manage_options')) { die(); }
        update_option('legacy', $_POST['v']);
    }
}
"#,
    )]);
    let hook = &result.hooks()[0];
    assert_eq!(hook.resolution(), &Resolution::Resolved);
    assert_eq!(hook.severity(), Severity::Secure);
}
