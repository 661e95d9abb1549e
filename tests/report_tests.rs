use app_crawler::explorer::policy::StopReason;
use app_crawler::explorer::recovery::{UiException, UiExceptionKind};
use app_crawler::report::console::format_console_report;
use app_crawler::report::report_model::CrawlReport;
use app_crawler::trace::performance::PerformanceSummary;

// ============================================================================
// Helper builders
// ============================================================================

fn report(stop_reason: Option<StopReason>) -> CrawlReport {
    CrawlReport {
        target_package: "com.example.notes".to_string(),
        steps: 42,
        depth_peak: 3,
        screens_discovered: 9,
        foreign_screens: 2,
        screenshots: 11,
        launches: 2,
        stop_reason,
        root_finished: stop_reason == Some(StopReason::RootFinished),
        duration_ms: 12_300,
        performance: PerformanceSummary::default(),
        ui_exceptions: Vec::new(),
    }
}

// ============================================================================
// Report model
// ============================================================================

#[test]
fn only_root_finished_counts_as_completed() {
    assert!(report(Some(StopReason::RootFinished)).completed());
    assert!(!report(Some(StopReason::MaxSteps)).completed());
    assert!(!report(None).completed());
}

#[test]
fn relaunches_exclude_the_first_launch() {
    assert_eq!(report(None).relaunches(), 1);
    let mut never = report(None);
    never.launches = 0;
    assert_eq!(never.relaunches(), 0);
}

#[test]
fn report_serializes_without_missing_stop_reason() {
    let json = serde_json::to_value(report(None)).unwrap();
    assert!(json.get("stop_reason").is_none());

    let json = serde_json::to_value(report(Some(StopReason::MaxRuntime))).unwrap();
    assert_eq!(json["stop_reason"], "MaxRuntime");
}

// ============================================================================
// Console output
// ============================================================================

#[test]
fn console_report_for_completed_crawl() {
    let output = format_console_report(&report(Some(StopReason::RootFinished)));

    assert!(output.contains("=== Crawl: com.example.notes ==="));
    assert!(output.contains("\u{2713} DONE  root screen finished"));
    assert!(output.contains(
        "steps: 42, peak depth: 3, screens: 9 (+2 foreign), screenshots: 11, relaunches: 1"
    ));
    assert!(output.contains("=== Finished in 12.3s ==="));
    // no samples, no performance line
    assert!(!output.contains("cpu avg"));
}

#[test]
fn console_report_for_budget_stop_with_exceptions() {
    let mut r = report(Some(StopReason::MaxScreenshots));
    r.performance = PerformanceSummary {
        samples: 4,
        cpu_average: 12.5,
        cpu_peak: 30.0,
        memory_average_kb: 81_234,
        memory_peak_kb: 90_210,
    };
    r.ui_exceptions.push(UiException {
        kind: UiExceptionKind::Crash,
        step: 17,
        text: Some("Notes has stopped".to_string()),
    });
    r.ui_exceptions.push(UiException {
        kind: UiExceptionKind::Anr,
        step: 20,
        text: None,
    });

    let output = format_console_report(&r);

    assert!(output.contains("\u{2717} STOP  reached max screenshot files"));
    assert!(output.contains("cpu avg 12.5% / peak 30.0%, memory avg 81234 KB / peak 90210 KB (4 samples)"));
    assert!(output.contains("[CRASH] step 17: Notes has stopped"));
    assert!(output.contains("[ANR] step 20: (no message)"));
}
