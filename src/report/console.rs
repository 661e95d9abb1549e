use crate::report::report_model::CrawlReport;

// ============================================================================
// Console reporter: terminal output
// ============================================================================

/// Format a crawl report for terminal output.
///
/// Produces output like:
/// ```text
/// === Crawl: com.example.app ===
///
/// ✓ DONE  root screen finished
///   steps: 42, peak depth: 3, screens: 9 (+2 foreign), screenshots: 11, relaunches: 1
///   cpu avg 12.5% / peak 30.0%, memory avg 81234 KB / peak 90210 KB (40 samples)
///   [CRASH] step 17: Example has stopped
///
/// === Finished in 12.3s ===
/// ```
pub fn format_console_report(report: &CrawlReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Crawl: {} ===\n\n", report.target_package));

    let marker = if report.completed() {
        "\u{2713} DONE"
    } else {
        "\u{2717} STOP"
    };
    let reason = report
        .stop_reason
        .map(|r| r.to_string())
        .unwrap_or_else(|| "not finished".to_string());
    out.push_str(&format!("{}  {}\n", marker, reason));

    out.push_str(&format!(
        "  steps: {}, peak depth: {}, screens: {} (+{} foreign), screenshots: {}, relaunches: {}\n",
        report.steps,
        report.depth_peak,
        report.screens_discovered,
        report.foreign_screens,
        report.screenshots,
        report.relaunches()
    ));

    let perf = &report.performance;
    if perf.samples > 0 {
        out.push_str(&format!(
            "  cpu avg {:.1}% / peak {:.1}%, memory avg {} KB / peak {} KB ({} samples)\n",
            perf.cpu_average, perf.cpu_peak, perf.memory_average_kb, perf.memory_peak_kb, perf.samples
        ));
    }

    for exception in &report.ui_exceptions {
        out.push_str(&format!(
            "  {} step {}: {}\n",
            exception.kind.label(),
            exception.step,
            exception.text.as_deref().unwrap_or("(no message)")
        ));
    }

    let secs = report.duration_ms as f64 / 1000.0;
    out.push_str(&format!("\n=== Finished in {:.1}s ===\n", secs));

    out
}
