use super::*;
use ir::{AnalysisMode, SecurityChecks};
use parsers::catalog::Catalog;

/// Checks found in the body of the first declaration of `code`.
fn checks_in(code: &str, mode: AnalysisMode) -> SecurityChecks {
    checks_with(code, mode, &Catalog::php())
}

fn checks_with(code: &str, mode: AnalysisMode, catalog: &Catalog) -> SecurityChecks {
    let fir = parse("cb.php", code);
    let body = fir.declarations[0].body;
    analyze(&fir.tokens, body, mode, catalog)
}

fn baseline(code: &str) -> SecurityChecks {
    checks_in(code, AnalysisMode::Baseline)
}

fn ordered(code: &str) -> SecurityChecks {
    checks_in(code, AnalysisMode::Ordered)
}

#[test]
fn detects_each_primitive() {
    let checks = baseline(
        r#"<?php function cb() {
    current_user_can('manage_options');
    wp_verify_nonce($_POST['n'], 'a');
    check_ajax_referer('b');
    check_admin_referer('c');
}"#,
    );
    assert_eq!(
        checks,
        SecurityChecks {
            current_user_can: true,
            wp_verify_nonce: true,
            check_ajax_referer: true,
            check_admin_referer: true,
        }
    );
}

#[test]
fn primitives_in_comments_and_strings_do_not_count() {
    let checks = baseline(
        r#"<?php function cb() {
    // current_user_can('delete_posts')
    # wp_verify_nonce($n)
    /* check_ajax_referer('x') */
    $msg = "check_admin_referer('y')";
    $other = 'current_user_can()';
}"#,
    );
    assert_eq!(checks, SecurityChecks::default());
}

#[test]
fn method_calls_and_declarations_are_not_primitives() {
    let checks = baseline(
        r#"<?php function cb() {
    $auth->current_user_can('x');
    $auth?->wp_verify_nonce('x');
    Auth::check_ajax_referer('x');
    $f = function check_admin_referer() {};
    $o = new current_user_can();
}"#,
    );
    assert_eq!(checks, SecurityChecks::default());
}

#[test]
fn qualified_and_mixed_case_names_count() {
    let checks = baseline(
        r#"<?php function cb() {
    \current_user_can('edit_posts');
    Check_Ajax_Referer('nonce');
}"#,
    );
    assert!(checks.current_user_can);
    assert!(checks.check_ajax_referer);
}

#[test]
fn a_bare_name_without_call_does_not_count() {
    let checks = baseline("<?php function cb() { $f = 'x'; $g = current_user_can; }");
    assert!(!checks.current_user_can);
}

#[test]
fn baseline_counts_checks_in_any_nesting() {
    let checks = baseline(
        r#"<?php function cb() {
    if (isset($_POST['x'])) {
        foreach ($items as $i) {
            if (!wp_verify_nonce($i, 'n')) { wp_die(); }
        }
    }
    $later = function () { return current_user_can('read'); };
}"#,
    );
    assert!(checks.wp_verify_nonce);
    assert!(checks.current_user_can);
}

#[test]
fn ordered_ignores_checks_after_a_sensitive_call() {
    let code = r#"<?php function cb() {
    update_option('plugin_setting', $_POST['value']);
    current_user_can('manage_options');
    check_ajax_referer('save');
}"#;
    assert!(baseline(code).has_permission_check());
    assert_eq!(ordered(code), SecurityChecks::default());
}

#[test]
fn ordered_keeps_checks_before_the_first_effect() {
    let checks = ordered(
        r#"<?php function cb() {
    check_ajax_referer('save');
    update_option('plugin_setting', $_POST['value']);
    current_user_can('manage_options');
}"#,
    );
    assert!(checks.check_ajax_referer);
    assert!(!checks.current_user_can);
}

#[test]
fn ordered_treats_db_methods_output_and_json_as_effects() {
    let db = ordered("<?php function cb() { $wpdb->query('DELETE'); current_user_can('x'); }");
    assert!(!db.current_user_can);
    let echo = ordered("<?php function cb() { echo 'ok'; wp_verify_nonce($n); }");
    assert!(!echo.wp_verify_nonce);
    let json = ordered("<?php function cb() { wp_send_json_success([]); check_ajax_referer('a'); }");
    assert!(!json.check_ajax_referer);
}

#[test]
fn ordered_without_effects_equals_baseline() {
    let code = "<?php function cb() { if ($a) { current_user_can('x'); } wp_verify_nonce($n); }";
    assert_eq!(ordered(code), baseline(code));
}

#[test]
fn user_supplied_sensitive_functions_end_the_checked_prefix() {
    let code = "<?php function cb() { acme_store($_POST); current_user_can('x'); }";
    assert!(ordered(code).current_user_can);
    let mut catalog = Catalog::php();
    catalog.extend(["Acme_Store"]);
    assert!(!checks_with(code, AnalysisMode::Ordered, &catalog).current_user_can);
}

#[test]
fn empty_and_out_of_range_bodies_find_nothing() {
    let fir = parse("cb.php", "<?php function cb() {}");
    let catalog = Catalog::php();
    let empty = fir.declarations[0].body;
    assert!(empty.is_empty());
    assert_eq!(
        analyze(&fir.tokens, empty, AnalysisMode::Baseline, &catalog),
        SecurityChecks::default()
    );
    let beyond = ir::TokenRange::new(fir.tokens.len() + 5, fir.tokens.len() + 10);
    assert_eq!(
        analyze(&fir.tokens, beyond, AnalysisMode::Baseline, &catalog),
        SecurityChecks::default()
    );
}
