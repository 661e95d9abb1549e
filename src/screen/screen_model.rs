use std::fmt;

use serde::Serialize;

use crate::driver::driver::ElementRef;

// ============================================================================
// Identifiers
// ============================================================================

/// Stable index of a screen in the `ScreenRegistry` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScreenId(pub usize);

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-based, as printed in the crawl log
        write!(f, "{}", self.0 + 1)
    }
}

/// A widget is addressed by its screen and its position in that screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WidgetId {
    pub screen: ScreenId,
    pub index: usize,
}

// ============================================================================
// Widget
// ============================================================================

/// One interactive element of a screen.
#[derive(Debug, Clone)]
pub struct Widget {
    /// Handle to the live element; may be stale
    pub element: ElementRef,
    finished: bool,
}

impl Widget {
    pub fn new(element: ElementRef) -> Self {
        Self {
            element,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn set_finished(&mut self, finished: bool) {
        self.finished = finished;
    }
}

// ============================================================================
// Screen
// ============================================================================

/// One observed UI state, identified by its signature.
#[derive(Debug, Clone)]
pub struct Screen {
    pub signature: String,
    pub package: String,
    pub name: String,
    pub depth: usize,
    pub parent: Option<ScreenId>,
    pub parent_widget: Option<WidgetId>,
    pub widgets: Vec<Widget>,
    pub visit_count: u32,
    finished: bool,
}

impl Screen {
    pub fn new(
        signature: String,
        package: String,
        name: String,
        parent: Option<ScreenId>,
        parent_widget: Option<WidgetId>,
        widgets: Vec<Widget>,
    ) -> Self {
        // Nothing testable means nothing left to do
        let finished = widgets.is_empty();
        Self {
            signature,
            package,
            name,
            depth: 0,
            parent,
            parent_widget,
            widgets,
            visit_count: 0,
            finished,
        }
    }

    /// Finished if latched, or if every widget is finished.
    pub fn is_finished(&self) -> bool {
        self.finished || self.widgets.iter().all(Widget::is_finished)
    }

    /// Latch the computed state into the flag and return it.
    pub fn refresh(&mut self) -> bool {
        self.finished = self.is_finished();
        self.finished
    }

    /// Setting cascades to every widget; clearing touches only the screen.
    pub fn set_finished(&mut self, finished: bool) {
        self.finished = finished;
        if finished {
            for widget in &mut self.widgets {
                widget.set_finished(true);
            }
        }
    }

    /// Drop all widgets and close the screen (ignored, too deep, foreign).
    pub fn close(&mut self) {
        self.widgets.clear();
        self.set_finished(true);
    }

    /// Index of the first widget not yet finished.
    pub fn first_unfinished(&self) -> Option<usize> {
        self.widgets.iter().position(|w| !w.is_finished())
    }

    pub fn unfinished_count(&self) -> usize {
        self.widgets.iter().filter(|w| !w.is_finished()).count()
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name:{}, depth:{}, finished:{}, signature:{}, widgets:{}",
            self.name,
            self.depth,
            self.is_finished(),
            self.signature,
            self.widgets.len()
        )?;
        for (i, widget) in self.widgets.iter().enumerate() {
            write!(f, " {}:{}", i, widget.is_finished())?;
        }
        Ok(())
    }
}
