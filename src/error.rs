use thiserror::Error;

/// Errors reported by an `AutomationDriver` implementation.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The element vanished between query and use
    #[error("Element '{0}' not found")]
    NotFound(String),

    /// The package has no launchable entry point
    #[error("({0}) No launchable activity")]
    NotLaunchable(String),

    /// The automation server answered with ok=false or an unexpected payload
    #[error("Automation command '{command}' failed: {error}")]
    Protocol { command: String, error: String },

    /// Transport failure talking to the automation server
    #[error("Automation server request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound(_))
    }
}

/// Run-level failures. Everything else the crawler meets is recovered locally.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Failed to launch target package '{package}': {source}")]
    Launch {
        package: String,
        #[source]
        source: DriverError,
    },

    #[error("Automation driver failure: {0}")]
    Driver(#[from] DriverError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Output I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}
