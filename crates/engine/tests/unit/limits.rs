use super::*;
use ir::{DiagnosticKind, ScanStatus};
use loader::{SourceContent, SourceFile};
use std::sync::Mutex;
use std::time::Duration;

fn long_source(statements: usize) -> String {
    format!(
        "<?php add_action('wp_ajax_big', 'big'); function big() {{ {} }}",
        "$a = 1;\n".repeat(statements)
    )
}

#[test]
fn oversized_files_are_skipped() {
    let cfg = EngineConfig {
        max_file_size: 64,
        ..EngineConfig::default()
    };
    let result = scan_pairs_with(
        &[
            ("big.php", long_source(100).as_str()),
            ("small.php", "<?php add_action('wp_ajax_s', 's');"),
        ],
        &cfg,
    );
    assert_eq!(result.status(), ScanStatus::Completed);
    assert_eq!(
        (result.files_total(), result.files_analyzed(), result.files_skipped()),
        (2, 1, 1)
    );
    let diag = &result.diagnostics()[0];
    assert_eq!(diag.kind, DiagnosticKind::FileTooLarge);
    assert_eq!(diag.file, "big.php");
    assert_eq!(result.hooks().len(), 1);
}

#[test]
fn files_too_large_for_the_loader_are_skipped() {
    let corpus = Corpus::new(
        "p",
        vec![
            SourceFile {
                path: "huge.php".into(),
                content: SourceContent::TooLarge(10 * 1024 * 1024),
            },
            SourceFile {
                path: "locked.php".into(),
                content: SourceContent::Unreadable("permission denied".into()),
            },
        ],
    );
    let result = scan(&corpus, &EngineConfig::default());
    assert_eq!(result.status(), ScanStatus::Failed);
    assert_eq!(result.failure_reason(), Some("every PHP file was skipped"));
    let kinds: Vec<_> = result.diagnostics().iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![DiagnosticKind::FileTooLarge, DiagnosticKind::Unreadable]
    );
    assert_eq!(result.files_skipped(), 2);
}

#[test]
fn slow_files_time_out() {
    let cfg = EngineConfig {
        file_timeout: Some(Duration::ZERO),
        ..EngineConfig::default()
    };
    let result = scan_pairs_with(
        &[
            ("slow.php", long_source(2000).as_str()),
            ("quick.php", "<?php add_action('wp_ajax_q', 'q');"),
        ],
        &cfg,
    );
    assert_eq!(result.status(), ScanStatus::Completed);
    assert!(result
        .diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::Timeout && d.file == "slow.php"));
    assert_eq!(result.files_skipped(), 1);
    assert_eq!(result.hooks()[0].hook_name, "wp_ajax_q");
}

#[test]
fn cancelled_scan_returns_cancelled() {
    let corpus = Corpus::from_pairs("p", [("a.php", "<?php add_action('wp_ajax_a', 'a');")]);
    let token = CancellationToken::new();
    token.cancel();
    let err = scan_with(&corpus, &EngineConfig::default(), None, Some(&token)).unwrap_err();
    assert!(matches!(err, ScanError::Cancelled));
    assert_eq!(err.to_string(), "scan cancelled");
}

#[test]
fn cancelling_from_the_progress_callback_stops_the_scan() {
    let pairs: Vec<(String, String)> = (0..50)
        .map(|i| (format!("f{i:02}.php"), "<?php echo 1;".to_string()))
        .collect();
    let corpus = Corpus::from_pairs("p", pairs);
    let token = CancellationToken::new();
    let stop = |_: Progress| token.cancel();
    let report: ProgressFn<'_> = &stop;
    let res = scan_with(&corpus, &EngineConfig::default(), Some(report), Some(&token));
    assert!(matches!(res, Err(ScanError::Cancelled)));
}

#[test]
fn progress_reaches_the_total() {
    let pairs: Vec<(String, String)> = (0..8)
        .map(|i| (format!("f{i}.php"), "<?php echo 1;".to_string()))
        .collect();
    let corpus = Corpus::from_pairs("p", pairs);
    let seen = Mutex::new(Vec::new());
    let record = |p: Progress| seen.lock().unwrap().push(p);
    let report: ProgressFn<'_> = &record;
    let result = scan_with(&corpus, &EngineConfig::default(), Some(report), None).unwrap();
    assert_eq!(result.status(), ScanStatus::Completed);
    let mut seen = seen.into_inner().unwrap();
    seen.sort_by_key(|p| p.files_processed);
    assert_eq!(seen.len(), 8);
    assert!(seen.iter().all(|p| p.files_total == 8));
    assert_eq!(seen.last().map(|p| p.files_processed), Some(8));
}

#[test]
fn metrics_are_collected() {
    let corpus = Corpus::from_pairs(
        "p",
        [
            ("a.php", "<?php add_action('wp_ajax_a', 'a'); function a() {}"),
            ("b.php", "<?php $x = 'oops"),
        ],
    );
    let mut metrics = EngineMetrics::default();
    let result = scan_with_metrics(
        &corpus,
        &EngineConfig::default(),
        None,
        None,
        Some(&mut metrics),
    )
    .unwrap();
    assert_eq!(result.status(), ScanStatus::Completed);
    assert_eq!(metrics.findings, 1);
    assert_eq!(metrics.declarations, 1);
    assert_eq!(metrics.parser.files_parsed, 2);
    assert_eq!(metrics.parser.partial_files, 1);
    assert_eq!(metrics.parser.parse_errors, 1);
    assert!(metrics.file_times_ms.contains_key("b.php"));
}

#[test]
fn async_scan_matches_the_blocking_scan() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let corpus = Corpus::from_pairs("p", [("a.php", "<?php add_action('wp_ajax_a', 'a');")]);
    let blocking = scan(&corpus, &EngineConfig::default());
    let result = rt
        .block_on(scan_async(corpus, EngineConfig::default()))
        .unwrap();
    assert_eq!(result.id(), blocking.id());
    assert_eq!(result.hooks(), blocking.hooks());
}

#[test]
fn async_scan_past_its_budget_times_out() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let pairs: Vec<(String, String)> = (0..500)
        .map(|i| (format!("f{i:03}.php"), long_source(500)))
        .collect();
    let corpus = Corpus::from_pairs("p", pairs);
    let cfg = EngineConfig {
        scan_timeout: Some(Duration::ZERO),
        ..EngineConfig::default()
    };
    let err = rt.block_on(scan_async(corpus, cfg)).unwrap_err();
    assert!(matches!(err, ScanError::TimedOut(d) if d == Duration::ZERO));
    assert!(err.to_string().starts_with("scan did not finish within"));
}
