use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CrawlError;
use crate::screen::signature::SignatureConfig;

// ============================================================================
// Crawler configuration
// ============================================================================

/// Everything the crawler reads once at run start.
///
/// Every field has a default so a YAML file may set any subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Package of the application under test
    #[serde(default)]
    pub target_package: String,

    /// Directory receiving screenshots, the crawl log and the performance log
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_launch_timeout")]
    pub launch_timeout_ms: u64,

    #[serde(default = "default_wait_idle_timeout")]
    pub wait_idle_timeout_ms: u64,

    /// Screens discovered at this depth or deeper are closed, not explored
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    #[serde(default = "default_max_runtime")]
    pub max_runtime_secs: u64,

    #[serde(default = "default_max_screenshots")]
    pub max_screenshots: usize,

    /// Bound for both consecutive known-screen steps and per-screen visits
    #[serde(default = "default_max_screen_loop")]
    pub max_screen_loop: u32,

    #[serde(default)]
    pub signature: SignatureConfig,

    /// Screenshot every step instead of only new screens
    #[serde(default)]
    pub capture_steps: bool,

    /// Type a random word into every text field of a target screen
    #[serde(default = "default_true")]
    pub random_text: bool,

    /// Screen names that are never explored
    #[serde(default = "default_ignored_screens")]
    pub ignored_screens: Vec<String>,

    /// Button labels the common-dialog handler may press
    #[serde(default = "default_dialog_buttons")]
    pub dialog_buttons: Vec<String>,

    #[serde(default = "default_random_words")]
    pub random_words: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            target_package: String::new(),
            output_dir: default_output_dir(),
            launch_timeout_ms: default_launch_timeout(),
            wait_idle_timeout_ms: default_wait_idle_timeout(),
            max_depth: default_max_depth(),
            max_steps: default_max_steps(),
            max_runtime_secs: default_max_runtime(),
            max_screenshots: default_max_screenshots(),
            max_screen_loop: default_max_screen_loop(),
            signature: SignatureConfig::default(),
            capture_steps: false,
            random_text: true,
            ignored_screens: default_ignored_screens(),
            dialog_buttons: default_dialog_buttons(),
            random_words: default_random_words(),
        }
    }
}

impl CrawlerConfig {
    /// Default configuration for `package`.
    pub fn for_package(package: &str) -> Self {
        Self {
            target_package: package.to_string(),
            ..Default::default()
        }
    }

    /// Reject settings the crawler cannot run with.
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.target_package.trim().is_empty() {
            return Err(CrawlError::Config("target package is empty".into()));
        }
        if !is_package_name(&self.target_package) {
            return Err(CrawlError::Config(format!(
                "target package '{}' is not a package name",
                self.target_package
            )));
        }
        if self.max_depth == 0 {
            return Err(CrawlError::Config("max_depth must be at least 1".into()));
        }
        if self.max_steps == 0 {
            return Err(CrawlError::Config("max_steps must be at least 1".into()));
        }
        if self.max_screen_loop == 0 {
            return Err(CrawlError::Config("max_screen_loop must be at least 1".into()));
        }
        if self.signature.max_length == 0 {
            return Err(CrawlError::Config(
                "signature max_length must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn is_ignored_screen(&self, name: &str) -> bool {
        self.ignored_screens.iter().any(|ignored| ignored == name)
    }
}

/// Dot-separated identifier segments (`com.example.app`). Anything else,
/// path separators and `..` included, is rejected.
pub fn is_package_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

// Serde default helpers
fn default_output_dir() -> PathBuf { PathBuf::from("crawl-output") }
fn default_launch_timeout() -> u64 { 5000 }
fn default_wait_idle_timeout() -> u64 { 100 }
fn default_max_depth() -> usize { 30 }
fn default_max_steps() -> u32 { 999 }
fn default_max_runtime() -> u64 { 3600 }
fn default_max_screenshots() -> usize { 999 }
fn default_max_screen_loop() -> u32 { 20 }
fn default_true() -> bool { true }

fn default_ignored_screens() -> Vec<String> {
    ["Feedback & Help", "意見與協助"].map(String::from).to_vec()
}

fn default_dialog_buttons() -> Vec<String> {
    ["OK", "Cancel", "Yes", "No", "確定", "取消", "是", "否"]
        .map(String::from)
        .to_vec()
}

fn default_random_words() -> Vec<String> {
    [
        "LOVE", "Latte", "Coffee", "Beer", "Taiwan", "Taipei", "Saturday", "Morning",
        "December", "Steve", "Jordan", "Michael",
    ]
    .map(String::from)
    .to_vec()
}
