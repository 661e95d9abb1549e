use std::{fs::OpenOptions, io::Write, path::Path, sync::Mutex};

use crate::trace::trace::{CrawlEvent, EventKind};

/// Append-only JSON-lines event log, mirrored to `tracing`.
///
/// Never fails the caller: open/serialize/write errors are reported once
/// through `tracing::warn!` and the event is dropped.
pub struct EventLogger {
    file: Option<Mutex<std::fs::File>>,
}

impl EventLogger {
    pub fn new(path: &Path) -> Self {
        let file = OpenOptions::new().create(true).append(true).open(path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
            },
            Err(e) => {
                tracing::warn!("could not open crawl log '{}': {}", path.display(), e);
                Self { file: None }
            }
        }
    }

    /// Logger that only mirrors to `tracing`.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn log(&self, event: &CrawlEvent) {
        match event.kind {
            EventKind::UiException => {
                tracing::warn!(step = event.step, kind = ?event.kind, "{}", event.message)
            }
            _ => tracing::info!(step = event.step, kind = ?event.kind, "{}", event.message),
        }

        let file_mutex = match &self.file {
            Some(f) => f,
            None => return,
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("failed to serialize crawl event: {}", e);
                return;
            }
        };

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("crawl log lock poisoned: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            tracing::warn!("failed to write crawl event: {}", e);
        }
    }
}
