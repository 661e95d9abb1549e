use serde::Serialize;

use crate::explorer::policy::StopReason;
use crate::explorer::recovery::UiException;
use crate::trace::performance::PerformanceSummary;

// ============================================================================
// Crawl report: outcome of one run
// ============================================================================

/// Counters and outcome of a finished (or interrupted) crawl.
///
/// Built by `Crawler::report()`. Written as `report.json` next to the crawl
/// log and rendered for the terminal by `format_console_report`.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Package of the application under test
    pub target_package: String,

    /// Steps executed, foreign ones included
    pub steps: u32,

    /// Deepest screen depth reached
    pub depth_peak: usize,

    /// Distinct screens of the target package
    pub screens_discovered: usize,

    /// Distinct screens of other packages (closed on sight)
    pub foreign_screens: usize,

    pub screenshots: usize,

    /// Launches of the target, the initial one included
    pub launches: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,

    pub root_finished: bool,

    pub duration_ms: u128,

    pub performance: PerformanceSummary,

    /// ANR and crash dialogs met on the way
    pub ui_exceptions: Vec<UiException>,
}

impl CrawlReport {
    /// The root's whole reachable subtree was tested.
    pub fn completed(&self) -> bool {
        self.stop_reason == Some(StopReason::RootFinished)
    }

    pub fn relaunches(&self) -> u32 {
        self.launches.saturating_sub(1)
    }
}
