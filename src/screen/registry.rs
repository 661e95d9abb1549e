use crate::screen::screen_model::{Screen, ScreenId, Widget, WidgetId};

/// Append-only arena of every screen discovered during a run.
///
/// Screens are never removed, so a `ScreenId` stays valid for the whole run.
/// Parent links always point at an earlier id, which keeps every ancestor
/// walk finite.
#[derive(Debug, Default)]
pub struct ScreenRegistry {
    screens: Vec<Screen>,
}

impl ScreenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Append a screen and return its id.
    pub fn register(&mut self, screen: Screen) -> ScreenId {
        self.screens.push(screen);
        ScreenId(self.screens.len() - 1)
    }

    /// Screen by id. Ids are only ever handed out by `register`.
    pub fn get(&self, id: ScreenId) -> &Screen {
        &self.screens[id.0]
    }

    pub fn get_mut(&mut self, id: ScreenId) -> &mut Screen {
        &mut self.screens[id.0]
    }

    /// Known screen of `package` with this signature. Screens of different
    /// packages never match each other.
    pub fn find(&self, package: &str, signature: &str) -> Option<ScreenId> {
        self.screens
            .iter()
            .position(|s| s.signature == signature && s.package.eq_ignore_ascii_case(package))
            .map(ScreenId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScreenId, &Screen)> {
        self.screens.iter().enumerate().map(|(i, s)| (ScreenId(i), s))
    }

    pub fn count_in_package(&self, package: &str) -> usize {
        self.screens
            .iter()
            .filter(|s| s.package.eq_ignore_ascii_case(package))
            .count()
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.screens.get(id.screen.0)?.widgets.get(id.index)
    }

    pub fn set_widget_finished(&mut self, id: WidgetId, finished: bool) {
        if let Some(widget) = self
            .screens
            .get_mut(id.screen.0)
            .and_then(|s| s.widgets.get_mut(id.index))
        {
            widget.set_finished(finished);
        }
    }

    /// An unfinished screen keeps its whole ancestor chain open: clear the
    /// connecting widget and the parent screen at every level.
    pub fn reopen_ancestors(&mut self, id: ScreenId) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let (parent, parent_widget) = {
                let screen = self.get(current);
                (screen.parent, screen.parent_widget)
            };
            if let Some(widget) = parent_widget {
                self.set_widget_finished(widget, false);
            }
            if let Some(parent) = parent {
                self.get_mut(parent).set_finished(false);
            }
            cursor = parent;
        }
    }

    /// Mark the widget that led to each finished screen as finished, walking
    /// upward until an ancestor that still has untested widgets.
    pub fn propagate_finished(&mut self, id: ScreenId) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let (parent, parent_widget) = {
                let screen = self.get(current);
                (screen.parent, screen.parent_widget)
            };
            if let Some(widget) = parent_widget {
                self.set_widget_finished(widget, true);
            }
            if let Some(parent) = parent {
                if !self.get_mut(parent).refresh() {
                    break;
                }
            }
            cursor = parent;
        }
    }

    /// `finished` agrees with the widgets for the given screen.
    pub fn invariant_holds(&self, id: ScreenId) -> bool {
        let screen = self.get(id);
        screen.is_finished() == screen.widgets.iter().all(Widget::is_finished)
    }
}
