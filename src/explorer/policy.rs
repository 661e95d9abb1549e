use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::explorer::config::CrawlerConfig;

/// Why a run ended. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// Every reachable widget of the root's subtree was tested
    RootFinished,
    MaxRuntime,
    MaxScreenshots,
    MaxSteps,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::RootFinished => write!(f, "root screen finished"),
            StopReason::MaxRuntime => write!(f, "reached max run-time"),
            StopReason::MaxScreenshots => write!(f, "reached max screenshot files"),
            StopReason::MaxSteps => write!(f, "reached max steps"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum PolicyDecision {
    Continue,
    Stop(StopReason),
}

/// Budget checks run after every step.
pub fn check_termination(
    config: &CrawlerConfig,
    elapsed: Duration,
    screenshots: usize,
    steps: u32,
) -> PolicyDecision {
    // ---- Runtime budget ----
    if elapsed.as_secs() >= config.max_runtime_secs {
        return PolicyDecision::Stop(StopReason::MaxRuntime);
    }

    // ---- Screenshot budget ----
    if screenshots >= config.max_screenshots {
        return PolicyDecision::Stop(StopReason::MaxScreenshots);
    }

    // ---- Step budget ----
    if steps >= config.max_steps {
        return PolicyDecision::Stop(StopReason::MaxSteps);
    }

    PolicyDecision::Continue
}
