//! Depth-first UI exploration of a mobile application.
//!
//! The [`explorer::crawler::Crawler`] drives an [`driver::driver::AutomationDriver`]
//! one step at a time: it fingerprints the live screen, tests one widget,
//! and walks back up once a screen has nothing left to test.

pub mod cli;
pub mod driver;
pub mod error;
pub mod explorer;
pub mod report;
pub mod screen;
pub mod trace;

pub use error::{CrawlError, DriverError};
pub use explorer::config::CrawlerConfig;
pub use explorer::crawler::Crawler;
pub use report::report_model::CrawlReport;
