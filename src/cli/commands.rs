use std::path::{Path, PathBuf};

use crate::cli::config::{AppConfig, CrawlArgs, build_crawler_config, resolve_endpoint};
use crate::driver::driver::AutomationDriver;
use crate::driver::http::HttpDriver;
use crate::error::{CrawlError, DriverError};
use crate::explorer::config::{CrawlerConfig, is_package_name};
use crate::explorer::crawler::Crawler;
use crate::report::console::format_console_report;
use crate::report::report_model::CrawlReport;
use crate::screen::signature::{SignatureConfig, build_signature};

pub const REPORT_FILE: &str = "report.json";

// ============================================================================
// crawl subcommand
// ============================================================================

/// Crawl through the automation server and print the report. Budget stops
/// are a normal outcome; only fatal failures are errors.
pub fn cmd_crawl(
    args: &CrawlArgs,
    file: &AppConfig,
    verbose: u8,
) -> Result<CrawlReport, Box<dyn std::error::Error>> {
    let config = build_crawler_config(&file.crawl, args);

    let endpoint = resolve_endpoint(args.endpoint.as_deref(), &file.driver);
    let driver = HttpDriver::new(&endpoint, file.driver.timeout_ms)?;

    if verbose > 0 {
        eprintln!(
            "Crawling {} via {} (max_steps={}, max_depth={})...",
            config.target_package, endpoint, config.max_steps, config.max_depth
        );
    }

    let report = crawl_with(config, driver)?;
    print!("{}", format_console_report(&report));
    Ok(report)
}

/// Run a full crawl with any driver: prepare `<output_dir>/<package>/`,
/// crawl, write `report.json` there.
pub fn crawl_with<D: AutomationDriver>(
    mut config: CrawlerConfig,
    driver: D,
) -> Result<CrawlReport, CrawlError> {
    config.validate()?;
    config.output_dir = prepare_output_dir(&config.output_dir, &config.target_package)?;

    let report_path = config.output_dir.join(REPORT_FILE);
    let mut crawler = Crawler::new(config, driver)?;
    let report = crawler.run()?;

    write_report(&report, &report_path)?;
    Ok(report)
}

/// Empty (or create) the per-package output directory.
/// Only a plain package name is accepted, so the directory removed is
/// always a direct child of `root`.
pub fn prepare_output_dir(root: &Path, package: &str) -> Result<PathBuf, CrawlError> {
    if !is_package_name(package) {
        return Err(CrawlError::Config(format!(
            "refusing to prepare output for package '{}'",
            package
        )));
    }
    let dir = root.join(package);
    if dir.parent() != Some(root) {
        return Err(CrawlError::Config(format!(
            "output dir '{}' escapes '{}'",
            dir.display(),
            root.display()
        )));
    }
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn write_report(report: &CrawlReport, path: &Path) -> Result<(), CrawlError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

// ============================================================================
// inspect subcommand
// ============================================================================

pub fn cmd_inspect(
    endpoint: Option<&str>,
    signature_length: Option<usize>,
    file: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = resolve_endpoint(endpoint, &file.driver);
    let mut driver = HttpDriver::new(&endpoint, file.driver.timeout_ms)?;

    let mut signature = file.crawl.signature.clone();
    if let Some(n) = signature_length {
        signature.max_length = n;
    }

    print!("{}", describe_live_screen(&mut driver, &signature)?);
    Ok(())
}

/// Package, screen name, signature and clickable count of the live screen.
pub fn describe_live_screen(
    driver: &mut dyn AutomationDriver,
    signature: &SignatureConfig,
) -> Result<String, DriverError> {
    let package = driver.foreground_package()?;
    let name = driver
        .foreground_screen_name()
        .unwrap_or_else(|| "<unknown>".to_string());
    let root = driver.snapshot_root()?;
    let sig = build_signature(driver, root.as_ref(), signature);
    let clickable = root
        .as_ref()
        .map(|r| driver.enumerate_clickable(r).len())
        .unwrap_or(0);

    Ok(format!(
        "package:   {}\nscreen:    {}\nsignature: {}\nclickable: {}\n",
        package, name, sig, clickable
    ))
}
