use app_crawler::driver::driver::PerfSample;
use app_crawler::driver::mock::{MockApp, MockScreen, MockWidget};
use app_crawler::error::{CrawlError, DriverError};
use app_crawler::explorer::config::CrawlerConfig;
use app_crawler::explorer::policy::StopReason;
use app_crawler::explorer::recovery::UiExceptionKind;
use app_crawler::explorer::run_state::StepKind;
use app_crawler::screen::screen_model::{ScreenId, WidgetId};
use tempfile::TempDir;

use crate::common::apps::{
    PKG, chain_app, config, crawler, empty_app, home_with_foreign, target, two_leaf_app,
};

mod common;

// ============================================================================
// End-to-end runs
// ============================================================================

#[test]
fn screen_without_widgets_finishes_in_one_step() {
    let dir = TempDir::new().unwrap();
    let mut crawler = crawler(empty_app(), config(&dir));

    let report = crawler.run().unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::RootFinished));
    assert!(report.completed());
    assert!(report.root_finished);
    assert_eq!(report.steps, 1);
    assert_eq!(report.screens_discovered, 1);
    assert_eq!(report.screenshots, 1);
    assert!(crawler.driver().log.clicks.is_empty());
}

#[test]
fn two_leaves_are_both_explored_before_the_root_finishes() {
    let dir = TempDir::new().unwrap();
    let mut crawler = crawler(two_leaf_app(), config(&dir));

    let report = crawler.run().unwrap();

    assert!(report.completed());
    // root, leaf one, root, leaf two, root
    assert_eq!(report.steps, 5);
    assert_eq!(report.screens_discovered, 3);
    assert_eq!(report.depth_peak, 1);
    assert_eq!(
        crawler.driver().log.clicks,
        vec!["home:Leaf one".to_string(), "home:Leaf two".to_string()]
    );
    assert_eq!(crawler.driver().log.back_presses, 2);

    let root = crawler.state().root.unwrap();
    assert_eq!(root, ScreenId(0));
    for (id, _) in crawler.registry().iter() {
        assert!(crawler.registry().get(id).is_finished());
        assert!(crawler.registry().invariant_holds(id));
    }
}

#[test]
fn screens_at_max_depth_are_closed_without_testing() {
    let dir = TempDir::new().unwrap();
    let config = CrawlerConfig {
        max_depth: 2,
        ..config(&dir)
    };
    let mut crawler = crawler(chain_app(), config);

    let report = crawler.run().unwrap();

    assert!(report.completed());
    assert_eq!(report.depth_peak, 2);
    assert_eq!(
        crawler.driver().log.clicks,
        vec!["home:To A".to_string(), "a:To B".to_string()]
    );
    assert!(crawler.registry().iter().all(|(_, s)| s.name != ".CActivity"));

    let b = crawler
        .registry()
        .iter()
        .find(|(_, s)| s.name == ".BActivity")
        .map(|(id, _)| id)
        .unwrap();
    assert!(crawler.registry().get(b).widgets.is_empty());
    assert!(crawler.registry().get(b).is_finished());
}

#[test]
fn common_dialog_in_other_package_is_dismissed_without_changing_depth() {
    let dir = TempDir::new().unwrap();
    let dialog = MockScreen::new("android", "AlertDialog", &["android.widget.FrameLayout"])
        .widget(MockWidget::button("Allow access?"))
        .widget(MockWidget::button("OK").disabled())
        .widget(MockWidget::button("Cancel").goes_back());
    let app = home_with_foreign(MockWidget::button("Share").opens("dialog"), "dialog", dialog);
    let mut crawler = crawler(app, config(&dir));

    let report = crawler.run().unwrap();

    assert!(report.completed());
    assert_eq!(report.steps, 3);
    assert_eq!(report.depth_peak, 0);
    assert_eq!(report.foreign_screens, 1);
    assert_eq!(
        crawler.driver().log.clicks,
        vec![
            "home:Share".to_string(),
            "dialog:Cancel".to_string(),
            "home:About".to_string()
        ]
    );
}

#[test]
fn crash_dialog_is_recorded_and_dismissed() {
    let dir = TempDir::new().unwrap();
    let crash = MockScreen::new("android", "AppErrorDialog", &["android.widget.FrameLayout"])
        .widget(MockWidget::button("Notes has stopped"))
        .widget(MockWidget::button("OK").goes_back());
    let app = home_with_foreign(MockWidget::button("Crash me").opens("crash"), "crash", crash);
    let mut crawler = crawler(app, config(&dir));

    let report = crawler.run().unwrap();

    assert!(report.completed());
    assert_eq!(report.ui_exceptions.len(), 1);
    let exception = &report.ui_exceptions[0];
    assert_eq!(exception.kind, UiExceptionKind::Crash);
    assert_eq!(exception.step, 2);
    assert_eq!(exception.text.as_deref(), Some("Notes has stopped"));

    let shots = &crawler.driver().log.screenshots;
    assert!(shots.iter().any(|p| p.to_string_lossy().contains("[CRASH]")));
}

#[test]
fn leaving_the_app_for_good_relaunches_it() {
    let dir = TempDir::new().unwrap();
    let browser = MockScreen::new("com.android.chrome", "BrowserActivity", &["android.webkit.WebView"]);
    let app = home_with_foreign(MockWidget::button("Website").replaces("web"), "web", browser);
    let mut crawler = crawler(app, config(&dir));

    let report = crawler.run().unwrap();

    assert!(report.completed());
    assert_eq!(report.launches, 2);
    assert_eq!(report.relaunches(), 1);
    assert_eq!(
        crawler.driver().log.clicks,
        vec!["home:Website".to_string(), "home:About".to_string()]
    );
}

#[test]
fn ignored_screen_is_backed_out_of_untested() {
    let dir = TempDir::new().unwrap();
    let app = MockApp::new(PKG, "home")
        .screen(
            "home",
            target(".MainActivity", &["android.widget.FrameLayout", "android.widget.LinearLayout"])
                .widget(MockWidget::button("Help").opens("help"))
                .widget(MockWidget::button("About")),
        )
        .screen(
            "help",
            target("Feedback & Help", &["android.widget.FrameLayout", "android.widget.ScrollView"])
                .widget(MockWidget::button("Send feedback")),
        );
    let mut crawler = crawler(app, config(&dir));

    let report = crawler.run().unwrap();

    assert!(report.completed());
    assert!(
        !crawler
            .driver()
            .log
            .clicks
            .iter()
            .any(|c| c.starts_with("help:"))
    );
    assert!(crawler.driver().log.back_presses >= 1);
}

#[test]
fn unlaunchable_target_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut crawler = crawler(empty_app().not_launchable(), config(&dir));

    let err = crawler.run().unwrap_err();

    assert!(matches!(
        err,
        CrawlError::Launch {
            source: DriverError::NotLaunchable(_),
            ..
        }
    ));
    assert_eq!(crawler.state().steps, 0);
    assert!(crawler.registry().is_empty());
}

#[test]
fn text_fields_receive_random_words() {
    let dir = TempDir::new().unwrap();
    let app = MockApp::new(PKG, "home").screen(
        "home",
        target(".LoginActivity", &["android.widget.FrameLayout", "android.widget.EditText"])
            .widget(MockWidget::edit_text())
            .widget(MockWidget::button("Submit")),
    );
    let config = CrawlerConfig {
        random_text: true,
        random_words: vec!["Latte".to_string()],
        ..config(&dir)
    };
    let mut crawler = crawler(app, config);

    crawler.run().unwrap();

    assert_eq!(
        crawler.driver().log.inputs,
        vec![("home".to_string(), "Latte".to_string())]
    );
}

#[test]
fn capture_steps_screenshots_known_screens_too() {
    let dir = TempDir::new().unwrap();
    let config = CrawlerConfig {
        capture_steps: true,
        ..config(&dir)
    };
    let mut crawler = crawler(two_leaf_app(), config);

    let report = crawler.run().unwrap();

    // three new screens plus two returns to the root
    assert_eq!(report.screenshots, 5);
}

#[test]
fn performance_samples_land_in_report_and_csv() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let driver = app_crawler::driver::mock::MockDriver::new(two_leaf_app()).with_perf(PerfSample {
        cpu_percent: 12.5,
        memory_kb: 2048,
    });
    let mut crawler = app_crawler::Crawler::new(config, driver).unwrap();

    let report = crawler.run().unwrap();

    assert_eq!(report.performance.samples, 5);
    assert_eq!(report.performance.cpu_peak, 12.5);
    assert_eq!(report.performance.memory_peak_kb, 2048);

    let csv = std::fs::read_to_string(dir.path().join("performance.csv")).unwrap();
    assert_eq!(csv.lines().count(), 6);
    assert!(csv.starts_with("Time,CPU%,Memory(KB),Screen"));
}

#[test]
fn unnamed_screen_and_description_only_widget() {
    let dir = TempDir::new().unwrap();
    let app = MockApp::new(PKG, "home").screen(
        "home",
        target(".MainActivity", &["android.widget.FrameLayout", "android.widget.Toolbar"])
            .unnamed()
            .widget(MockWidget::image("Open menu"))
            .widget(MockWidget::button("Hidden").vanished()),
    );
    let mut crawler = crawler(app, config(&dir));

    let report = crawler.run().unwrap();

    assert!(report.completed());
    let home = crawler.registry().get(ScreenId(0));
    assert_eq!(home.name, "<unknown>");
    assert_eq!(home.widgets.len(), 1);
    assert_eq!(crawler.driver().log.clicks, vec!["home:Open menu".to_string()]);
    assert!(dir.path().join("(0) No Activity name.png").exists());

    let log = std::fs::read_to_string(dir.path().join("crawl.jsonl")).unwrap();
    assert!(log.contains("{Click} Open menu ImageView [0,0][1080,100]"));
}

#[test]
fn crawl_log_records_every_step_and_the_stop() {
    let dir = TempDir::new().unwrap();
    let mut crawler = crawler(two_leaf_app(), config(&dir));
    crawler.run().unwrap();

    let log = std::fs::read_to_string(dir.path().join("crawl.jsonl")).unwrap();
    let events: Vec<serde_json::Value> = log
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(events[0]["kind"], "Launch");
    assert!(events.iter().any(|e| e["kind"] == "Stop"));
    let clicks: Vec<_> = events.iter().filter(|e| e["kind"] == "Click").collect();
    assert_eq!(clicks.len(), 2);
    assert!(
        clicks[0]["message"]
            .as_str()
            .unwrap()
            .starts_with("{Click} Leaf one Button [0,0][1080,100]")
    );
    assert_eq!(events.last().unwrap()["kind"], "Summary");
}

// ============================================================================
// Budgets
// ============================================================================

#[test]
fn step_budget_stops_the_run() {
    let dir = TempDir::new().unwrap();
    let config = CrawlerConfig {
        max_steps: 2,
        ..config(&dir)
    };
    let mut crawler = crawler(two_leaf_app(), config);

    let report = crawler.run().unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::MaxSteps));
    assert_eq!(report.steps, 2);
    assert!(!report.completed());
    assert!(!report.root_finished);
}

#[test]
fn root_that_keeps_the_user_in_place_stops_at_the_step_budget() {
    let dir = TempDir::new().unwrap();
    let mut home = target(".MainActivity", &["android.widget.FrameLayout", "android.widget.GridLayout"]);
    for n in 0..10 {
        home = home.widget(MockWidget::button(&format!("Tile {}", n)));
    }
    let config = CrawlerConfig {
        max_steps: 5,
        ..config(&dir)
    };
    let mut crawler = crawler(MockApp::new(PKG, "home").screen("home", home), config);

    let report = crawler.run().unwrap();

    assert_eq!(report.steps, 5);
    assert!(!report.root_finished);
    assert_eq!(report.stop_reason, Some(StopReason::MaxSteps));
    assert_eq!(crawler.driver().log.clicks.len(), 5);
}

#[test]
fn unreadable_target_screen_is_missing_not_registered() {
    let dir = TempDir::new().unwrap();
    let app = MockApp::new(PKG, "home").screen(
        "home",
        target(".MainActivity", &["android.widget.FrameLayout"])
            .widget(MockWidget::button("Hidden"))
            .unreadable(),
    );
    let config = CrawlerConfig {
        max_steps: 3,
        ..config(&dir)
    };
    let mut crawler = crawler(app, config);
    crawler.launch_target().unwrap();

    assert_eq!(crawler.step().unwrap(), StepKind::Missing);
    assert!(crawler.registry().is_empty());
    assert!(crawler.state().root.is_none());

    let report = crawler.run().unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::MaxSteps));
    assert_eq!(report.steps, 3);
    assert_eq!(report.screens_discovered, 0);
    assert!(crawler.registry().is_empty());
    assert!(crawler.driver().log.clicks.is_empty());
}

#[test]
fn screenshot_budget_stops_the_run() {
    let dir = TempDir::new().unwrap();
    let config = CrawlerConfig {
        max_screenshots: 1,
        ..config(&dir)
    };
    let mut crawler = crawler(two_leaf_app(), config);

    let report = crawler.run().unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::MaxScreenshots));
    assert_eq!(report.steps, 1);
}

#[test]
fn runtime_budget_stops_the_run() {
    let dir = TempDir::new().unwrap();
    let config = CrawlerConfig {
        max_runtime_secs: 0,
        ..config(&dir)
    };
    let mut crawler = crawler(two_leaf_app(), config);

    let report = crawler.run().unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::MaxRuntime));
    assert_eq!(report.steps, 1);
}

#[test]
fn invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = CrawlerConfig {
        max_depth: 0,
        ..config(&dir)
    };
    let result = app_crawler::Crawler::new(
        config,
        app_crawler::driver::mock::MockDriver::new(empty_app()),
    );
    assert!(matches!(result, Err(CrawlError::Config(_))));
}

// ============================================================================
// Step-by-step behavior
// ============================================================================

#[test]
fn step_kinds_follow_the_screen_graph() {
    let dir = TempDir::new().unwrap();
    let mut crawler = crawler(two_leaf_app(), config(&dir));
    crawler.launch_target().unwrap();

    assert_eq!(crawler.step().unwrap(), StepKind::NewScreen);
    assert_eq!(crawler.step().unwrap(), StepKind::NewScreen);
    assert_eq!(crawler.step().unwrap(), StepKind::KnownScreen);

    let leaf = crawler.registry().get(ScreenId(1));
    assert_eq!(leaf.parent, Some(ScreenId(0)));
    assert_eq!(
        leaf.parent_widget,
        Some(WidgetId {
            screen: ScreenId(0),
            index: 0
        })
    );
    assert_eq!(leaf.depth, 1);
}

#[test]
fn repeated_known_screens_trigger_a_relaunch() {
    let dir = TempDir::new().unwrap();
    let mut busy = target(".BusyActivity", &["android.widget.FrameLayout", "android.widget.ListView"]);
    for i in 0..10 {
        busy = busy.widget(MockWidget::button(&format!("Item {}", i)));
    }
    let app = MockApp::new(PKG, "home")
        .screen(
            "home",
            target(".MainActivity", &["android.widget.FrameLayout", "android.widget.LinearLayout"])
                .widget(MockWidget::button("Open list").opens("busy")),
        )
        .screen("busy", busy);
    let config = CrawlerConfig {
        max_screen_loop: 3,
        ..config(&dir)
    };
    let mut crawler = crawler(app, config);
    crawler.launch_target().unwrap();

    for _ in 0..5 {
        crawler.step().unwrap();
    }
    assert_eq!(crawler.state().depth, 1);
    assert_eq!(crawler.driver().log.launches, 1);

    // fourth consecutive visit of the list
    crawler.step().unwrap();
    assert_eq!(crawler.driver().log.launches, 2);
    assert_eq!(crawler.state().depth, 0);
    assert_eq!(crawler.state().known_streak, 0);
    assert!(crawler.registry().get(ScreenId(1)).is_finished());

    while !crawler.state().is_finished() && crawler.state().steps < 50 {
        crawler.step().unwrap();
    }
    assert_eq!(crawler.state().stop_reason, Some(StopReason::RootFinished));
}

#[test]
fn first_run_wizard_hands_the_root_over_to_the_real_home() {
    let dir = TempDir::new().unwrap();
    let app = MockApp::new(PKG, "wizard")
        .screen(
            "wizard",
            target(".WelcomeActivity", &["android.widget.FrameLayout", "android.widget.ViewFlipper"])
                .widget(MockWidget::button("Get started").completes("home")),
        )
        .screen(
            "home",
            target(".MainActivity", &["android.widget.FrameLayout", "android.widget.LinearLayout"])
                .widget(MockWidget::button("New note"))
                .widget(MockWidget::button("Settings")),
        );
    let mut crawler = crawler(app, config(&dir));

    let report = crawler.run().unwrap();

    assert!(report.completed());
    assert_eq!(
        crawler.driver().log.clicks,
        vec![
            "wizard:Get started".to_string(),
            "home:New note".to_string(),
            "home:Settings".to_string()
        ]
    );
    let root = crawler.state().root.unwrap();
    assert_eq!(crawler.registry().get(root).name, ".MainActivity");
    assert_eq!(report.launches, 2);
}

#[test]
fn root_is_reopened_once_per_unseen_screen() {
    let dir = TempDir::new().unwrap();
    let app = MockApp::new(PKG, "wizard")
        .screen(
            "wizard",
            target(".WelcomeActivity", &["android.widget.FrameLayout", "android.widget.ViewFlipper"])
                .widget(MockWidget::button("Take the tour").replaces("tour")),
        )
        .screen(
            "tour",
            target(".TourActivity", &["android.widget.FrameLayout", "android.widget.ViewPager"])
                .widget(MockWidget::button("Next")),
        );
    let mut crawler = crawler(app, config(&dir));
    crawler.launch_target().unwrap();

    assert_eq!(crawler.step().unwrap(), StepKind::NewScreen);
    assert_eq!(crawler.state().root_reopened_by.len(), 1);
    assert!(crawler.state().stop_reason.is_none());

    // Back on the wizard with the tour still unregistered
    crawler.driver_mut().stack = vec!["wizard".to_string()];
    assert_eq!(crawler.step().unwrap(), StepKind::KnownScreen);

    assert_eq!(crawler.state().stop_reason, Some(StopReason::RootFinished));
    assert_eq!(crawler.state().root_reopened_by.len(), 1);
    assert_eq!(crawler.registry().len(), 1);
    assert_eq!(
        crawler.driver().log.clicks,
        vec!["wizard:Take the tour".to_string(), "wizard:Take the tour".to_string()]
    );
}

#[test]
fn vanished_widget_is_marked_finished_and_skipped() {
    let dir = TempDir::new().unwrap();
    let mut crawler = crawler(two_leaf_app(), config(&dir));
    crawler.launch_target().unwrap();

    crawler.step().unwrap();
    crawler.step().unwrap();
    if let Some(home) = crawler.driver_mut().app.screens.get_mut("home") {
        home.widgets[1].present = false;
    }
    crawler.step().unwrap();

    assert_eq!(crawler.driver().log.clicks, vec!["home:Leaf one".to_string()]);
    assert_eq!(crawler.state().stop_reason, Some(StopReason::RootFinished));
    assert!(
        crawler
            .registry()
            .widget(WidgetId {
                screen: ScreenId(0),
                index: 1
            })
            .unwrap()
            .is_finished()
    );
}

#[test]
fn widget_lost_at_activation_stays_finished() {
    let dir = TempDir::new().unwrap();
    let app = MockApp::new(PKG, "home").screen(
        "home",
        target(".MainActivity", &["android.widget.FrameLayout", "android.widget.LinearLayout"])
            .widget(MockWidget::button("Broken").fails())
            .widget(MockWidget::button("Next")),
    );
    let mut crawler = crawler(app, config(&dir));

    let report = crawler.run().unwrap();

    assert!(report.completed());
    assert_eq!(crawler.driver().log.clicks, vec!["home:Next".to_string()]);
    assert!(
        crawler
            .registry()
            .widget(WidgetId {
                screen: ScreenId(0),
                index: 0
            })
            .unwrap()
            .is_finished()
    );
}
