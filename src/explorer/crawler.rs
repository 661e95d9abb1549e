use std::path::Path;

use crate::driver::driver::{AutomationDriver, ElementRef, is_in_package};
use crate::error::CrawlError;
use crate::explorer::config::CrawlerConfig;
use crate::explorer::policy::{PolicyDecision, StopReason, check_termination};
use crate::explorer::recovery::{
    UiException, detect_ui_exception, dismiss_ui_exception, handle_common_dialog,
    inject_random_text,
};
use crate::explorer::run_state::{RunState, StepKind};
use crate::report::report_model::CrawlReport;
use crate::screen::registry::ScreenRegistry;
use crate::screen::screen_model::{Screen, ScreenId, Widget, WidgetId};
use crate::screen::signature::{build_signature, leaf_class_name};
use crate::trace::logger::EventLogger;
use crate::trace::performance::PerformanceMonitor;
use crate::trace::screenshot::ScreenshotRecorder;
use crate::trace::trace::{CrawlEvent, EventKind};

pub const UNKNOWN_SCREEN: &str = "<unknown>";
pub const CRAWL_LOG_FILE: &str = "crawl.jsonl";
pub const PERFORMANCE_LOG_FILE: &str = "performance.csv";

const MAX_ACTION_TEXT_CHARS: usize = 25;

// ============================================================================
// Depth-first crawler
// ============================================================================

/// Depth-first explorer of an application's screen graph.
///
/// One `step()` observes the live screen, classifies it (foreign, new or
/// known), tests at most one widget and updates completion state up the
/// parent chain. `run()` launches the target and steps until the root is
/// finished or a budget runs out.
pub struct Crawler<D: AutomationDriver> {
    config: CrawlerConfig,
    driver: D,
    registry: ScreenRegistry,
    state: RunState,
    logger: EventLogger,
    performance: PerformanceMonitor,
    screenshots: ScreenshotRecorder,
    ui_exceptions: Vec<UiException>,
}

impl<D: AutomationDriver> Crawler<D> {
    /// Validate `config` and open the logs under `config.output_dir`,
    /// creating the directory if needed.
    pub fn new(config: CrawlerConfig, driver: D) -> Result<Self, CrawlError> {
        config.validate()?;
        let dir: &Path = &config.output_dir;
        std::fs::create_dir_all(dir)?;

        let logger = EventLogger::new(&dir.join(CRAWL_LOG_FILE));
        let performance = PerformanceMonitor::new(&dir.join(PERFORMANCE_LOG_FILE));
        let screenshots = ScreenshotRecorder::new(dir);

        Ok(Self {
            config,
            driver,
            registry: ScreenRegistry::new(),
            state: RunState::new(),
            logger,
            performance,
            screenshots,
            ui_exceptions: Vec::new(),
        })
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    pub fn registry(&self) -> &ScreenRegistry {
        &self.registry
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn ui_exceptions(&self) -> &[UiException] {
        &self.ui_exceptions
    }

    pub fn screenshot_count(&self) -> usize {
        self.screenshots.count()
    }

    // ------------------------------------------------------------------------
    // Run loop
    // ------------------------------------------------------------------------

    /// Launch the target and crawl until a stop condition holds.
    pub fn run(&mut self) -> Result<CrawlReport, CrawlError> {
        self.launch_target()?;

        while !self.state.is_finished() {
            self.step()?;
        }

        let report = self.report();
        self.emit(CrawlEvent::now(
            self.state.steps,
            EventKind::Summary,
            format!(
                "Total executed steps:{}, peak depth:{}, detected screens:{}, screenshot:{}",
                report.steps, report.depth_peak, report.screens_discovered, report.screenshots
            ),
        ));
        let perf = report.performance;
        self.emit(CrawlEvent::now(
            self.state.steps,
            EventKind::Summary,
            format!(
                "CPU average:{:.1}%, CPU peak:{:.1}%, Memory average (KB):{}, Memory peak (KB):{}",
                perf.cpu_average, perf.cpu_peak, perf.memory_average_kb, perf.memory_peak_kb
            ),
        ));
        Ok(report)
    }

    /// Start the target as a fresh task. Failure is fatal for the run.
    pub fn launch_target(&mut self) -> Result<(), CrawlError> {
        let package = self.config.target_package.clone();
        self.emit(CrawlEvent::now(
            self.state.steps,
            EventKind::Launch,
            format!("{{Launch}} {}", package),
        ));

        self.driver
            .launch_app(&package)
            .map_err(|source| CrawlError::Launch {
                package: package.clone(),
                source,
            })?;

        if !self
            .driver
            .wait_for_foreground(&package, self.config.launch_timeout_ms)
        {
            tracing::warn!("{} not in foreground after {} ms", package, self.config.launch_timeout_ms);
        }

        self.state.launches += 1;
        self.state.reset_after_launch();
        Ok(())
    }

    /// Snapshot of the run so far.
    pub fn report(&self) -> CrawlReport {
        let target = &self.config.target_package;
        CrawlReport {
            target_package: target.clone(),
            steps: self.state.steps,
            depth_peak: self.state.depth_peak,
            screens_discovered: self.registry.count_in_package(target),
            foreign_screens: self.registry.len() - self.registry.count_in_package(target),
            screenshots: self.screenshots.count(),
            launches: self.state.launches,
            stop_reason: self.state.stop_reason,
            root_finished: self
                .state
                .root
                .is_some_and(|root| self.registry.get(root).is_finished()),
            duration_ms: self.state.started.elapsed().as_millis(),
            performance: self.performance.summary(),
            ui_exceptions: self.ui_exceptions.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // One step
    // ------------------------------------------------------------------------

    /// Observe, classify, act once, propagate completion, apply policies.
    pub fn step(&mut self) -> Result<StepKind, CrawlError> {
        self.state.steps += 1;

        let candidate = self.capture_candidate()?;

        let kind = if !candidate
            .package
            .eq_ignore_ascii_case(&self.config.target_package)
        {
            self.handle_foreign(candidate)?;
            StepKind::Foreign
        } else if candidate.signature.is_empty() {
            self.emit(CrawlEvent::now(
                self.state.steps,
                EventKind::Inspect,
                "{Inspect} screen root missing, waiting",
            ));
            self.driver.wait_for_idle(self.config.wait_idle_timeout_ms);
            StepKind::Missing
        } else {
            let (id, kind) = self.classify(candidate);
            self.explore(id)?;
            self.check_finished(id)?;
            if !self.state.is_finished() {
                self.apply_termination_policy();
            }
            if !self.state.is_finished() {
                self.avoid_loops(id, kind)?;
            }
            kind
        };

        if kind != StepKind::NewScreen && kind != StepKind::KnownScreen {
            self.apply_termination_policy();
        }

        self.dump_screens();
        Ok(kind)
    }

    /// Build a candidate screen from the live UI, parented on the last action.
    fn capture_candidate(&mut self) -> Result<Screen, CrawlError> {
        let package = self.driver.foreground_package()?;
        let name = self
            .driver
            .foreground_screen_name()
            .unwrap_or_else(|| UNKNOWN_SCREEN.to_string());
        let root = self.driver.snapshot_root()?;
        let signature = build_signature(&mut self.driver, root.as_ref(), &self.config.signature);

        // Foreign screens are never explored, so their widgets are not queried
        let widgets = match &root {
            Some(root) if package.eq_ignore_ascii_case(&self.config.target_package) => self
                .driver
                .enumerate_clickable(root)
                .into_iter()
                .map(Widget::new)
                .collect(),
            _ => Vec::new(),
        };

        Ok(Screen::new(
            signature,
            package,
            name,
            self.state.last_screen,
            self.state.last_widget,
            widgets,
        ))
    }

    // ------------------------------------------------------------------------
    // Foreign package
    // ------------------------------------------------------------------------

    fn handle_foreign(&mut self, mut candidate: Screen) -> Result<(), CrawlError> {
        self.emit(CrawlEvent::now(
            self.state.steps,
            EventKind::Inspect,
            format!("{{Inspect}} screen, in other package: {}", candidate.package),
        ));

        if self
            .registry
            .find(&candidate.package, &candidate.signature)
            .is_none()
        {
            self.screenshot(&format!("({})", candidate.package));
            candidate.parent = None;
            candidate.parent_widget = None;
            candidate.depth = self.state.depth;
            candidate.close();
            self.registry.register(candidate);
        }

        self.state.clear_last_action();

        if let Some((kind, text)) = detect_ui_exception(&mut self.driver) {
            self.screenshot(kind.label());
            self.emit(CrawlEvent::now(
                self.state.steps,
                EventKind::UiException,
                format!("{} {}", kind.label(), text.as_deref().unwrap_or("")),
            ));
            self.ui_exceptions.push(UiException {
                kind,
                step: self.state.steps,
                text,
            });
            if dismiss_ui_exception(&mut self.driver) {
                return Ok(());
            }
        } else if let Some(label) = handle_common_dialog(&mut self.driver, &self.config.dialog_buttons) {
            self.emit(CrawlEvent::now(
                self.state.steps,
                EventKind::Dialog,
                format!("{{Click}} {} Button succeeded", label),
            ));
            return Ok(());
        }

        // Nothing we know how to handle: try back, relaunch on a dead end
        self.press_back();
        if !is_in_package(&mut self.driver, &self.config.target_package) {
            tracing::info!("back did not return to {}, relaunching", self.config.target_package);
            self.launch_target()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Target package
    // ------------------------------------------------------------------------

    /// Match the candidate against the registry, registering it if new.
    fn classify(&mut self, mut candidate: Screen) -> (ScreenId, StepKind) {
        let (id, kind) = match self.registry.find(&candidate.package, &candidate.signature) {
            Some(id) => {
                let depth = {
                    let screen = self.registry.get_mut(id);
                    screen.visit_count += 1;
                    screen.depth
                };
                self.state.enter_depth(depth);
                self.state.known_streak += 1;
                self.emit(
                    CrawlEvent::now(
                        self.state.steps,
                        EventKind::Inspect,
                        format!("{{Inspect}} OLD screen, id:{}, {}", id, self.registry.get(id)),
                    )
                    .with_screen(id)
                    .with_depth(depth),
                );

                if self.config.capture_steps {
                    let label = self.state.last_action.clone();
                    self.screenshot(&label);
                    self.state.clear_last_action();
                }
                (id, StepKind::KnownScreen)
            }
            None => {
                let depth = candidate
                    .parent
                    .map(|p| self.registry.get(p).depth + 1)
                    .unwrap_or(0)
                    .min(self.config.max_depth);
                candidate.depth = depth;
                self.state.enter_depth(depth);
                self.state.known_streak = 0;
                self.state.clear_last_action();

                self.screenshot("");
                let id = self.registry.register(candidate);
                self.emit(
                    CrawlEvent::now(
                        self.state.steps,
                        EventKind::Inspect,
                        format!("{{Inspect}} NEW screen, id:{}, {}", id, self.registry.get(id)),
                    )
                    .with_screen(id)
                    .with_depth(depth),
                );

                self.close_if_out_of_scope(id);
                (id, StepKind::NewScreen)
            }
        };

        let depth = self.registry.get(id).depth;
        if self.state.root_pending || (kind == StepKind::NewScreen && depth == 0) {
            if self.state.root.is_some_and(|root| root != id) {
                tracing::info!("root screen changed to {}, likely a first-run flow", id);
            }
            self.state.root = Some(id);
            self.state.root_pending = false;
        }

        self.record_performance(id);
        (id, kind)
    }

    /// Ignored or too-deep screens are closed untested and backed out of.
    fn close_if_out_of_scope(&mut self, id: ScreenId) {
        let (name, depth) = {
            let screen = self.registry.get(id);
            (screen.name.clone(), screen.depth)
        };

        let ignored = self.config.is_ignored_screen(&name);
        if ignored {
            self.emit(
                CrawlEvent::now(
                    self.state.steps,
                    EventKind::Inspect,
                    format!("{{Inspect}} screen, in ignored list: {}", name),
                )
                .with_screen(id),
            );
        }
        let too_deep = depth >= self.config.max_depth;
        if too_deep {
            tracing::info!("screen {} reached max depth {}", id, self.config.max_depth);
        }

        if ignored || too_deep {
            self.registry.get_mut(id).close();
            self.press_back();
        }
    }

    /// Reopen ancestors, type into text fields and test the next widget.
    fn explore(&mut self, id: ScreenId) -> Result<(), CrawlError> {
        if self.registry.get(id).is_finished() {
            return Ok(());
        }

        self.registry.reopen_ancestors(id);

        if self.config.random_text {
            let typed = inject_random_text(
                &mut self.driver,
                &self.config.random_words,
                &mut rand::thread_rng(),
            );
            if !typed.is_empty() {
                self.emit(
                    CrawlEvent::now(
                        self.state.steps,
                        EventKind::Input,
                        format!("{{Input}} {}", typed.join(", ")),
                    )
                    .with_screen(id),
                );
            }
        }

        self.test_next_widget(id)
    }

    /// First unfinished widget that still exists; vanished ones are closed.
    fn next_widget(&mut self, id: ScreenId) -> Option<usize> {
        if self.registry.get(id).is_finished() {
            return None;
        }

        while let Some(index) = self.registry.get(id).first_unfinished() {
            let element = self.registry.get(id).widgets[index].element.clone();
            if self.driver.exists(&element) {
                return Some(index);
            }
            self.registry
                .set_widget_finished(WidgetId { screen: id, index }, true);
        }
        None
    }

    fn test_next_widget(&mut self, id: ScreenId) -> Result<(), CrawlError> {
        let Some(index) = self.next_widget(id) else {
            return Ok(());
        };
        let widget_id = WidgetId { screen: id, index };
        let element = self.registry.get(id).widgets[index].element.clone();

        let description = describe_action(&mut self.driver, &element);
        self.emit(
            CrawlEvent::now(self.state.steps, EventKind::Click, description.clone())
                .with_screen(id)
                .with_depth(self.state.depth),
        );

        self.state.last_screen = Some(id);
        self.state.last_widget = Some(widget_id);
        self.state.last_action = description;
        self.registry.set_widget_finished(widget_id, true);
        tracing::debug!(
            "Screen[{}] widget {} tested, {} left",
            id,
            index,
            self.registry.get(id).unfinished_count()
        );

        match self.driver.activate(&element) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::warn!("widget on screen {} vanished at activation: {}", id, e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Latch completion, propagate it upward, then stop or back out.
    fn check_finished(&mut self, id: ScreenId) -> Result<(), CrawlError> {
        if !self.registry.get_mut(id).refresh() {
            return Ok(());
        }
        tracing::debug!("Screen[{}] finished", id);
        self.registry.propagate_finished(id);

        if self.state.root == Some(id) {
            if self.reopen_root_for_new_screen(id)? {
                return Ok(());
            }
            self.stop(StopReason::RootFinished, Some(id));
        } else if self.is_showing(id)? {
            self.press_back();
        }
        Ok(())
    }

    /// The root's last widget may lead to an unseen target screen (a
    /// first-run wizard standing in for the real root). Reopen the root and
    /// that widget once per such screen.
    fn reopen_root_for_new_screen(&mut self, root: ScreenId) -> Result<bool, CrawlError> {
        let Some(widget) = self.state.last_widget.filter(|w| w.screen == root) else {
            return Ok(false);
        };
        let Some(signature) = self.live_unseen_target_signature()? else {
            return Ok(false);
        };
        if self.state.root_reopened_by.contains(&signature) {
            return Ok(false);
        }

        self.registry.set_widget_finished(widget, false);
        self.registry.get_mut(root).set_finished(false);
        self.state.root_reopened_by.push(signature);
        tracing::info!("root screen {} reopened, last widget led to an unseen screen", root);
        Ok(true)
    }

    fn live_unseen_target_signature(&mut self) -> Result<Option<String>, CrawlError> {
        let package = self.driver.foreground_package()?;
        if !package.eq_ignore_ascii_case(&self.config.target_package) {
            return Ok(None);
        }
        let root = self.driver.snapshot_root()?;
        let signature = build_signature(&mut self.driver, root.as_ref(), &self.config.signature);
        if signature.is_empty() || self.registry.find(&package, &signature).is_some() {
            return Ok(None);
        }
        Ok(Some(signature))
    }

    /// Whether the live UI still shows the given screen.
    fn is_showing(&mut self, id: ScreenId) -> Result<bool, CrawlError> {
        let package = self.driver.foreground_package()?;
        let screen = self.registry.get(id);
        if !package.eq_ignore_ascii_case(&screen.package) {
            return Ok(false);
        }
        let root = self.driver.snapshot_root()?;
        let signature = build_signature(&mut self.driver, root.as_ref(), &self.config.signature);
        Ok(signature == self.registry.get(id).signature)
    }

    // ------------------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------------------

    fn apply_termination_policy(&mut self) {
        if self.state.is_finished() {
            return;
        }
        let decision = check_termination(
            &self.config,
            self.state.started.elapsed(),
            self.screenshots.count(),
            self.state.steps,
        );
        if let PolicyDecision::Stop(reason) = decision {
            self.stop(reason, None);
        }
    }

    /// Break unproductive cycles: relaunch after too many consecutive known
    /// screens, give up on a screen visited too often.
    fn avoid_loops(&mut self, id: ScreenId, kind: StepKind) -> Result<(), CrawlError> {
        let limit = self.config.max_screen_loop;

        let screen = self.registry.get_mut(id);
        if screen.visit_count > limit && !screen.is_finished() {
            screen.set_finished(true);
            tracing::info!("screen {} visited more than {} times, set finished", id, limit);
        }

        if kind == StepKind::KnownScreen && self.state.known_streak > limit {
            tracing::info!("reached max old screen loop, re-launch target app");
            self.launch_target()?;
        }
        Ok(())
    }

    fn stop(&mut self, reason: StopReason, screen: Option<ScreenId>) {
        let mut event = CrawlEvent::now(
            self.state.steps,
            EventKind::Stop,
            format!("{{Stop}} {}", reason),
        );
        if let Some(id) = screen {
            event = event.with_screen(id);
        }
        self.emit(event);
        self.state.stop_reason = Some(reason);
    }

    // ------------------------------------------------------------------------
    // Side channels
    // ------------------------------------------------------------------------

    fn press_back(&mut self) {
        self.emit(CrawlEvent::now(self.state.steps, EventKind::Back, "{Click} Back"));
        if let Err(e) = self.driver.press_back() {
            tracing::warn!("back failed: {}", e);
        }
        self.driver.wait_for_idle(self.config.wait_idle_timeout_ms);
    }

    fn screenshot(&mut self, label: &str) {
        if let Some(filename) =
            self.screenshots
                .capture(&mut self.driver, self.config.wait_idle_timeout_ms, label)
        {
            self.emit(CrawlEvent::now(
                self.state.steps,
                EventKind::Screenshot,
                format!("{{Screenshot}} {}", filename),
            ));
        }
    }

    fn record_performance(&mut self, id: ScreenId) {
        let Some(sample) = self.driver.sample_performance(&self.config.target_package) else {
            return;
        };
        let name = self.registry.get(id).name.clone();
        self.performance.record(sample, &name);
        self.emit(
            CrawlEvent::now(
                self.state.steps,
                EventKind::Performance,
                format!(
                    "{{Performance}} package:{}, cpu:{:.1}%, memory (KB):{}",
                    self.config.target_package, sample.cpu_percent, sample.memory_kb
                ),
            )
            .with_screen(id),
        );
    }

    fn emit(&self, event: CrawlEvent) {
        self.logger.log(&event);
    }

    fn dump_screens(&self) {
        for (id, screen) in self.registry.iter() {
            tracing::debug!("Screen[{}] {}", id, screen);
        }
        if let Some(root) = self.state.root {
            tracing::debug!("Root Screen id: {}", root);
        }
    }
}

// ============================================================================
// Action descriptions
// ============================================================================

/// Shorten long widget text to 21 characters plus an ellipsis.
pub fn shorten_text(text: &str) -> String {
    if text.chars().count() > MAX_ACTION_TEXT_CHARS {
        let head: String = text.chars().take(MAX_ACTION_TEXT_CHARS - 4).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// `{Click} <text|description> <LeafClass> [l,t][r,b]`; every read is best-effort.
pub fn describe_action(driver: &mut dyn AutomationDriver, element: &ElementRef) -> String {
    let class_name = driver.class_name(element).unwrap_or_default();
    let class_name = leaf_class_name(&class_name).to_string();
    let text = driver
        .text(element)
        .filter(|t| !t.is_empty())
        .map(|t| shorten_text(&t));
    let description = driver.description(element).filter(|d| !d.is_empty());
    let bounds = driver
        .bounds(element)
        .map(|b| b.to_short_string())
        .unwrap_or_default();

    match text.or(description) {
        Some(label) => format!("{{Click}} {} {} {}", label, class_name, bounds),
        None => format!("{{Click}} {} {}", class_name, bounds),
    }
}
