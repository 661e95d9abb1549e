use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::screen::screen_model::ScreenId;

/// Category of a notable crawl event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    Launch,
    Inspect,
    Screenshot,
    Click,
    Back,
    Input,
    UiException,
    Dialog,
    Performance,
    Stop,
    Summary,
}

/// One line of the crawl log.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlEvent {
    pub timestamp_ms: u128,
    pub step: u32,
    pub kind: EventKind,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
}

impl CrawlEvent {
    pub fn now(step: u32, kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            step,
            kind,
            message: message.into(),
            screen: None,
            depth: None,
        }
    }

    pub fn with_screen(mut self, id: ScreenId) -> Self {
        self.screen = Some(id.0 + 1);
        self
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }
}
