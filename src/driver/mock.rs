use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::driver::driver::{AutomationDriver, Bounds, ElementRef, PerfSample, Selector};
use crate::error::DriverError;

// ============================================================================
// Scripted application model (for testing without a device)
// ============================================================================

/// Package reported when the back stack of the mock app is empty.
pub const LAUNCHER_PACKAGE: &str = "com.android.launcher3";

/// What happens when a mock widget is activated.
#[derive(Debug, Clone, PartialEq)]
pub enum MockAction {
    /// Nothing visible changes
    Stay,
    /// Push a screen onto the back stack
    Open(String),
    /// Replace the whole back stack with a screen
    Replace(String),
    /// Replace the back stack and make the screen the new launch screen
    /// (a finished first-run wizard)
    Complete(String),
    /// Behave like the back key
    Back,
    /// The element disappears at the moment of activation
    Fail,
}

#[derive(Debug, Clone)]
pub struct MockNode {
    pub class_name: String,
    pub children: Vec<MockNode>,
}

impl MockNode {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, node: MockNode) -> Self {
        self.children.push(node);
        self
    }

    fn resolve(&self, path: &[usize]) -> Option<&MockNode> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => self.children.get(*first)?.resolve(rest),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockWidget {
    pub class_name: String,
    pub text: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    pub clickable: bool,
    pub present: bool,
    pub action: MockAction,
}

impl MockWidget {
    pub fn button(text: &str) -> Self {
        Self {
            class_name: "android.widget.Button".into(),
            text: Some(text.to_string()),
            description: None,
            enabled: true,
            clickable: true,
            present: true,
            action: MockAction::Stay,
        }
    }

    pub fn image(description: &str) -> Self {
        Self {
            class_name: "android.widget.ImageView".into(),
            text: None,
            description: Some(description.to_string()),
            enabled: true,
            clickable: true,
            present: true,
            action: MockAction::Stay,
        }
    }

    pub fn edit_text() -> Self {
        Self {
            class_name: "android.widget.EditText".into(),
            text: None,
            description: None,
            enabled: true,
            clickable: false,
            present: true,
            action: MockAction::Stay,
        }
    }

    pub fn opens(mut self, screen: &str) -> Self {
        self.action = MockAction::Open(screen.to_string());
        self
    }

    pub fn replaces(mut self, screen: &str) -> Self {
        self.action = MockAction::Replace(screen.to_string());
        self
    }

    pub fn completes(mut self, screen: &str) -> Self {
        self.action = MockAction::Complete(screen.to_string());
        self
    }

    pub fn goes_back(mut self) -> Self {
        self.action = MockAction::Back;
        self
    }

    pub fn fails(mut self) -> Self {
        self.action = MockAction::Fail;
        self
    }

    pub fn vanished(mut self) -> Self {
        self.present = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn label(&self) -> String {
        self.text
            .clone()
            .or_else(|| self.description.clone())
            .unwrap_or_else(|| self.class_name.clone())
    }
}

#[derive(Debug, Clone)]
pub struct MockScreen {
    pub package: String,
    pub name: Option<String>,
    pub tree: MockNode,
    pub widgets: Vec<MockWidget>,
    /// False while the accessibility tree cannot be read.
    pub readable: bool,
}

impl MockScreen {
    /// Screen whose tree is `classes[0]` with the remaining classes as
    /// direct children. Distinct class lists give distinct signatures.
    pub fn new(package: &str, name: &str, classes: &[&str]) -> Self {
        let mut tree = MockNode::new(classes.first().copied().unwrap_or("android.widget.FrameLayout"));
        for class in classes.iter().skip(1) {
            tree = tree.child(MockNode::new(class));
        }
        Self {
            package: package.to_string(),
            name: Some(name.to_string()),
            tree,
            widgets: Vec::new(),
            readable: true,
        }
    }

    pub fn with_tree(mut self, tree: MockNode) -> Self {
        self.tree = tree;
        self
    }

    pub fn unnamed(mut self) -> Self {
        self.name = None;
        self
    }

    pub fn widget(mut self, widget: MockWidget) -> Self {
        self.widgets.push(widget);
        self
    }

    pub fn unreadable(mut self) -> Self {
        self.readable = false;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MockApp {
    pub package: String,
    pub launch_screen: String,
    pub screens: HashMap<String, MockScreen>,
    pub launchable: bool,
}

impl MockApp {
    pub fn new(package: &str, launch_screen: &str) -> Self {
        Self {
            package: package.to_string(),
            launch_screen: launch_screen.to_string(),
            screens: HashMap::new(),
            launchable: true,
        }
    }

    pub fn screen(mut self, key: &str, screen: MockScreen) -> Self {
        self.screens.insert(key.to_string(), screen);
        self
    }

    pub fn not_launchable(mut self) -> Self {
        self.launchable = false;
        self
    }
}

/// Everything the mock observed, for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockLog {
    /// `screen:label` of every successful activation
    pub clicks: Vec<String>,
    pub back_presses: usize,
    pub launches: usize,
    pub screenshots: Vec<PathBuf>,
    /// `(screen, text)` for every text input
    pub inputs: Vec<(String, String)>,
}

// ============================================================================
// MockDriver
// ============================================================================

/// In-memory `AutomationDriver` that plays a `MockApp` through a back stack.
pub struct MockDriver {
    pub app: MockApp,
    pub stack: Vec<String>,
    pub log: MockLog,
    pub perf: Option<PerfSample>,
}

impl MockDriver {
    pub fn new(app: MockApp) -> Self {
        Self {
            app,
            stack: Vec::new(),
            log: MockLog::default(),
            perf: None,
        }
    }

    pub fn with_perf(mut self, sample: PerfSample) -> Self {
        self.perf = Some(sample);
        self
    }

    /// Key of the screen on top of the back stack.
    pub fn current_key(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    fn current(&self) -> Option<(&str, &MockScreen)> {
        let key = self.current_key()?;
        self.app.screens.get(key).map(|s| (key, s))
    }

    fn widget_ref(key: &str, index: usize) -> ElementRef {
        ElementRef::new(format!("{}@{}", key, index))
    }

    fn node_ref(key: &str, path: &[usize]) -> ElementRef {
        let path = path
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(".");
        ElementRef::new(format!("{}#{}", key, path))
    }

    /// Live widget behind a handle; `None` unless its screen is on top.
    fn live_widget(&self, element: &ElementRef) -> Option<(&str, usize, &MockWidget)> {
        let (key, index) = element.as_str().split_once('@')?;
        let index: usize = index.parse().ok()?;
        let (current_key, screen) = self.current()?;
        if current_key != key {
            return None;
        }
        let widget = screen.widgets.get(index)?;
        widget.present.then_some((current_key, index, widget))
    }

    /// Live tree node behind a handle; `None` unless its screen is on top.
    fn live_node(&self, node: &ElementRef) -> Option<(&str, Vec<usize>, &MockNode)> {
        let (key, path) = node.as_str().split_once('#')?;
        let path: Vec<usize> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('.').map(|p| p.parse().ok()).collect::<Option<Vec<_>>>()?
        };
        let (current_key, screen) = self.current()?;
        if current_key != key {
            return None;
        }
        let found = screen.tree.resolve(&path)?;
        Some((current_key, path, found))
    }

    fn apply(&mut self, action: MockAction) {
        match action {
            MockAction::Stay | MockAction::Fail => {}
            MockAction::Open(key) => self.stack.push(key),
            MockAction::Replace(key) => self.stack = vec![key],
            MockAction::Complete(key) => {
                self.app.launch_screen = key.clone();
                self.stack = vec![key];
            }
            MockAction::Back => {
                self.stack.pop();
            }
        }
    }
}

impl AutomationDriver for MockDriver {
    fn foreground_package(&mut self) -> Result<String, DriverError> {
        Ok(self
            .current()
            .map(|(_, s)| s.package.clone())
            .unwrap_or_else(|| LAUNCHER_PACKAGE.to_string()))
    }

    fn foreground_screen_name(&mut self) -> Option<String> {
        match self.current() {
            Some((_, screen)) => screen.name.clone(),
            None => Some("Launcher".into()),
        }
    }

    fn snapshot_root(&mut self) -> Result<Option<ElementRef>, DriverError> {
        match self.current() {
            Some((_, screen)) if !screen.readable => Ok(None),
            _ => Ok(self.current_key().map(|key| Self::node_ref(key, &[]))),
        }
    }

    fn class_name(&mut self, node: &ElementRef) -> Option<String> {
        if let Some((_, _, widget)) = self.live_widget(node) {
            return Some(widget.class_name.clone());
        }
        self.live_node(node).map(|(_, _, n)| n.class_name.clone())
    }

    fn children(&mut self, node: &ElementRef) -> Vec<ElementRef> {
        let Some((key, path, found)) = self.live_node(node) else {
            return Vec::new();
        };
        (0..found.children.len())
            .map(|i| {
                let mut child = path.clone();
                child.push(i);
                Self::node_ref(key, &child)
            })
            .collect()
    }

    fn enumerate_clickable(&mut self, root: &ElementRef) -> Vec<ElementRef> {
        let Some((key, _, _)) = self.live_node(root) else {
            return Vec::new();
        };
        let Some(screen) = self.app.screens.get(key) else {
            return Vec::new();
        };
        screen
            .widgets
            .iter()
            .enumerate()
            .filter(|(_, w)| w.clickable && w.present)
            .map(|(i, _)| Self::widget_ref(key, i))
            .collect()
    }

    fn find_elements(&mut self, selector: &Selector) -> Vec<ElementRef> {
        let Some((key, screen)) = self.current() else {
            return Vec::new();
        };
        if let Some(package) = &selector.package {
            if !screen.package.eq_ignore_ascii_case(package) {
                return Vec::new();
            }
        }
        screen
            .widgets
            .iter()
            .enumerate()
            .filter(|(_, w)| w.present)
            .filter(|(_, w)| !selector.enabled_only || w.enabled)
            .filter(|(_, w)| selector.class_name.as_ref().is_none_or(|c| &w.class_name == c))
            .filter(|(_, w)| selector.text.as_ref().is_none_or(|t| w.text.as_ref() == Some(t)))
            .filter(|(_, w)| {
                selector
                    .text_contains
                    .as_ref()
                    .is_none_or(|t| w.text.as_deref().is_some_and(|text| text.contains(t.as_str())))
            })
            .map(|(i, _)| Self::widget_ref(key, i))
            .collect()
    }

    fn exists(&mut self, element: &ElementRef) -> bool {
        self.live_widget(element).is_some() || self.live_node(element).is_some()
    }

    fn text(&mut self, element: &ElementRef) -> Option<String> {
        self.live_widget(element).and_then(|(_, _, w)| w.text.clone())
    }

    fn description(&mut self, element: &ElementRef) -> Option<String> {
        self.live_widget(element)
            .and_then(|(_, _, w)| w.description.clone())
    }

    fn bounds(&mut self, element: &ElementRef) -> Option<Bounds> {
        self.live_widget(element).map(|(_, index, _)| {
            let top = index as i32 * 100;
            Bounds::new(0, top, 1080, top + 100)
        })
    }

    fn activate(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        let (key, widget) = match self.live_widget(element) {
            Some((key, _, widget)) => (key.to_string(), widget.clone()),
            None => return Err(DriverError::NotFound(element.to_string())),
        };
        if widget.action == MockAction::Fail {
            return Err(DriverError::NotFound(element.to_string()));
        }
        self.log.clicks.push(format!("{}:{}", key, widget.label()));
        self.apply(widget.action);
        Ok(())
    }

    fn input_text(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        let key = match self.live_widget(element) {
            Some((key, _, _)) => key.to_string(),
            None => return Err(DriverError::NotFound(element.to_string())),
        };
        self.log.inputs.push((key, text.to_string()));
        Ok(())
    }

    fn press_back(&mut self) -> Result<(), DriverError> {
        self.log.back_presses += 1;
        self.stack.pop();
        Ok(())
    }

    fn launch_app(&mut self, package: &str) -> Result<(), DriverError> {
        if !self.app.launchable || !self.app.package.eq_ignore_ascii_case(package) {
            return Err(DriverError::NotLaunchable(package.to_string()));
        }
        self.log.launches += 1;
        self.stack = vec![self.app.launch_screen.clone()];
        Ok(())
    }

    fn wait_for_foreground(&mut self, package: &str, _timeout_ms: u64) -> bool {
        self.foreground_package()
            .map(|p| p.eq_ignore_ascii_case(package))
            .unwrap_or(false)
    }

    fn wait_for_idle(&mut self, _timeout_ms: u64) {}

    fn take_screenshot(&mut self, path: &Path) -> Result<(), DriverError> {
        std::fs::write(path, b"")?;
        self.log.screenshots.push(path.to_path_buf());
        Ok(())
    }

    fn sample_performance(&mut self, package: &str) -> Option<PerfSample> {
        if !self.app.package.eq_ignore_ascii_case(package) || self.stack.is_empty() {
            return None;
        }
        self.perf
    }
}
