use std::time::Instant;

use crate::explorer::policy::StopReason;
use crate::screen::screen_model::{ScreenId, WidgetId};

/// How the current step classified the live screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Foreign,
    NewScreen,
    KnownScreen,
    /// Target app in front but its UI tree could not be read
    Missing,
}

/// Mutable counters and pointers of one crawl, owned by the crawler.
#[derive(Debug)]
pub struct RunState {
    pub started: Instant,
    pub steps: u32,
    pub depth: usize,
    pub depth_peak: usize,

    /// Consecutive steps that landed on an already-known screen
    pub known_streak: u32,

    pub root: Option<ScreenId>,
    /// Next target screen seen becomes the root (set by every launch)
    pub root_pending: bool,
    /// Signatures that already reopened the root once
    pub root_reopened_by: Vec<String>,

    /// Screen and widget of the last activation, parents of the next new screen
    pub last_screen: Option<ScreenId>,
    pub last_widget: Option<WidgetId>,
    pub last_action: String,

    pub stop_reason: Option<StopReason>,
    /// Launches of the target, the initial one included
    pub launches: u32,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            steps: 0,
            depth: 0,
            depth_peak: 0,
            known_streak: 0,
            root: None,
            root_pending: true,
            root_reopened_by: Vec::new(),
            last_screen: None,
            last_widget: None,
            last_action: String::new(),
            stop_reason: None,
            launches: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.stop_reason.is_some()
    }

    /// Forget the last activation; the next screen has no parent widget.
    pub fn clear_last_action(&mut self) {
        self.last_action.clear();
        self.last_widget = None;
    }

    /// State after the target app was (re)started from scratch.
    pub fn reset_after_launch(&mut self) {
        self.depth = 0;
        self.known_streak = 0;
        self.root_pending = true;
        self.last_screen = None;
        self.clear_last_action();
    }

    pub fn enter_depth(&mut self, depth: usize) {
        self.depth = depth;
        self.depth_peak = self.depth_peak.max(depth);
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
