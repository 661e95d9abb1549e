use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::explorer::config::CrawlerConfig;
use crate::screen::signature::SignatureStrategy;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "app-crawler",
    version,
    about = "Depth-first UI explorer for mobile applications"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: app-crawler.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl an application depth-first until its root screen is finished
    Crawl(CrawlArgs),

    /// Print what the crawler sees on the live screen
    Inspect {
        /// Automation server endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Signature length bound
        #[arg(long)]
        signature_length: Option<usize>,
    },
}

/// Flags of `crawl`; every one overrides the config file when given.
#[derive(Args, Debug, Default)]
pub struct CrawlArgs {
    /// Package of the application under test
    #[arg(long)]
    pub target: Option<String>,

    /// Automation server endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Root of the output; results land in <output-dir>/<package>/
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub max_steps: Option<u32>,

    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Runtime budget in seconds
    #[arg(long)]
    pub max_runtime: Option<u64>,

    #[arg(long)]
    pub max_screenshots: Option<usize>,

    #[arg(long)]
    pub max_screen_loop: Option<u32>,

    #[arg(long)]
    pub signature_length: Option<usize>,

    /// Signature strategy: raw or sha1
    #[arg(long)]
    pub signature_strategy: Option<SignatureStrategy>,

    /// Screenshot every step, not only new screens
    #[arg(long)]
    pub capture_steps: bool,

    /// Type random words into text fields
    #[arg(long, action = clap::ArgAction::Set)]
    pub random_text: Option<bool>,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `app-crawler.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub crawl: CrawlerConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout of the automation server
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_ms: default_timeout(),
        }
    }
}

// Serde default helpers
fn default_endpoint() -> String { "http://127.0.0.1:9008".to_string() }
fn default_timeout() -> u64 { 30_000 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("app-crawler.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring malformed config '{}': {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Overlay the given flags on the file's crawl section.
pub fn build_crawler_config(file: &CrawlerConfig, args: &CrawlArgs) -> CrawlerConfig {
    let mut config = file.clone();
    if let Some(target) = &args.target {
        config.target_package = target.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(n) = args.max_steps {
        config.max_steps = n;
    }
    if let Some(n) = args.max_depth {
        config.max_depth = n;
    }
    if let Some(secs) = args.max_runtime {
        config.max_runtime_secs = secs;
    }
    if let Some(n) = args.max_screenshots {
        config.max_screenshots = n;
    }
    if let Some(n) = args.max_screen_loop {
        config.max_screen_loop = n;
    }
    if let Some(n) = args.signature_length {
        config.signature.max_length = n;
    }
    if let Some(strategy) = args.signature_strategy {
        config.signature.strategy = strategy;
    }
    if args.capture_steps {
        config.capture_steps = true;
    }
    if let Some(enabled) = args.random_text {
        config.random_text = enabled;
    }
    config
}

/// Endpoint from the flag, else the file.
pub fn resolve_endpoint(flag: Option<&str>, file: &DriverConfig) -> String {
    flag.map(str::to_string)
        .unwrap_or_else(|| file.endpoint.clone())
}
