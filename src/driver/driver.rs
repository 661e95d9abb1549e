use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

// ============================================================================
// Handles and selectors
// ============================================================================

/// Opaque handle to a live UI element (or tree node).
///
/// The backend owns the meaning of the id. A handle may go stale at any
/// moment; callers re-check `exists()` before acting on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        ElementRef(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Screen rectangle of an element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Compact `[l,t][r,b]` form used in action descriptions.
    pub fn to_short_string(&self) -> String {
        format!("[{},{}][{},{}]", self.left, self.top, self.right, self.bottom)
    }
}

/// Element query used by the dialog handlers and text injection.
///
/// All set fields must match. Mirrors the subset of accessibility selectors
/// the crawler needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default)]
    pub enabled_only: bool,
}

impl Selector {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn class_name(class_name: &str) -> Self {
        Self {
            class_name: Some(class_name.to_string()),
            ..Default::default()
        }
    }

    pub fn text_contains(package: &str, needle: &str) -> Self {
        Self {
            text_contains: Some(needle.to_string()),
            package: Some(package.to_string()),
            ..Default::default()
        }
    }

    pub fn enabled(mut self) -> Self {
        self.enabled_only = true;
        self
    }
}

/// One CPU/memory reading for the target process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerfSample {
    pub cpu_percent: f32,
    pub memory_kb: u64,
}

// ============================================================================
// AutomationDriver trait
// ============================================================================

/// Everything the crawler needs from a UI-automation backend.
///
/// All calls are blocking. Reads that may legitimately find nothing return
/// `Option`/`bool`; only transport or launch failures are errors.
pub trait AutomationDriver {
    /// Package that owns the foreground window.
    fn foreground_package(&mut self) -> Result<String, DriverError>;

    /// Human-readable name of the foreground screen (activity name), if known.
    fn foreground_screen_name(&mut self) -> Option<String>;

    /// Root node of the foreground UI tree, `None` if nothing is on screen.
    fn snapshot_root(&mut self) -> Result<Option<ElementRef>, DriverError>;

    /// Fully-qualified class name of a node, `None` once it is gone.
    fn class_name(&mut self, node: &ElementRef) -> Option<String>;

    /// Children of a node in native order.
    fn children(&mut self, node: &ElementRef) -> Vec<ElementRef>;

    /// Clickable elements under `root`, in live query order.
    fn enumerate_clickable(&mut self, root: &ElementRef) -> Vec<ElementRef>;

    /// All elements on screen matching `selector`.
    fn find_elements(&mut self, selector: &Selector) -> Vec<ElementRef>;

    fn exists(&mut self, element: &ElementRef) -> bool;

    fn text(&mut self, element: &ElementRef) -> Option<String>;

    fn description(&mut self, element: &ElementRef) -> Option<String>;

    fn bounds(&mut self, element: &ElementRef) -> Option<Bounds>;

    fn activate(&mut self, element: &ElementRef) -> Result<(), DriverError>;

    fn input_text(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError>;

    fn press_back(&mut self) -> Result<(), DriverError>;

    /// Start `package` as a fresh task. `NotLaunchable` if it has no entry point.
    fn launch_app(&mut self, package: &str) -> Result<(), DriverError>;

    /// Block until `package` is in the foreground or the timeout expires.
    fn wait_for_foreground(&mut self, package: &str, timeout_ms: u64) -> bool;

    fn wait_for_idle(&mut self, timeout_ms: u64);

    /// Capture the screen into `path` (PNG).
    fn take_screenshot(&mut self, path: &Path) -> Result<(), DriverError>;

    /// CPU and memory of `package`, `None` if it is not running.
    fn sample_performance(&mut self, package: &str) -> Option<PerfSample>;
}

/// First element matching `selector`, if any.
pub fn find_first(driver: &mut dyn AutomationDriver, selector: &Selector) -> Option<ElementRef> {
    driver.find_elements(selector).into_iter().next()
}

/// Whether the foreground package is `package` (case-insensitive).
pub fn is_in_package(driver: &mut dyn AutomationDriver, package: &str) -> bool {
    driver
        .foreground_package()
        .map(|pkg| pkg.eq_ignore_ascii_case(package))
        .unwrap_or(false)
}
