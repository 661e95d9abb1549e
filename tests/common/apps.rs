#![allow(dead_code)]

use app_crawler::driver::mock::{MockApp, MockDriver, MockScreen, MockWidget};
use app_crawler::explorer::config::CrawlerConfig;
use app_crawler::explorer::crawler::Crawler;
use tempfile::TempDir;

pub const PKG: &str = "com.example.notes";

/// Quiet config writing into `dir`: no idle waits, no text injection.
pub fn config(dir: &TempDir) -> CrawlerConfig {
    CrawlerConfig {
        output_dir: dir.path().to_path_buf(),
        wait_idle_timeout_ms: 0,
        launch_timeout_ms: 0,
        random_text: false,
        ..CrawlerConfig::for_package(PKG)
    }
}

pub fn crawler(app: MockApp, config: CrawlerConfig) -> Crawler<MockDriver> {
    Crawler::new(config, MockDriver::new(app)).unwrap()
}

pub fn target(name: &str, classes: &[&str]) -> MockScreen {
    MockScreen::new(PKG, name, classes)
}

/// A single screen with nothing to click.
pub fn empty_app() -> MockApp {
    MockApp::new(PKG, "home").screen(
        "home",
        target(".MainActivity", &["android.widget.FrameLayout", "android.widget.TextView"]),
    )
}

/// Home with two buttons, each opening a leaf without widgets.
pub fn two_leaf_app() -> MockApp {
    MockApp::new(PKG, "home")
        .screen(
            "home",
            target(".MainActivity", &["android.widget.FrameLayout", "android.widget.LinearLayout"])
                .widget(MockWidget::button("Leaf one").opens("leaf1"))
                .widget(MockWidget::button("Leaf two").opens("leaf2")),
        )
        .screen(
            "leaf1",
            target(".LeafOneActivity", &["android.widget.FrameLayout", "android.widget.ScrollView"]),
        )
        .screen(
            "leaf2",
            target(".LeafTwoActivity", &["android.widget.FrameLayout", "android.widget.ListView"]),
        )
}

/// home -> a -> b -> c, one button per level.
pub fn chain_app() -> MockApp {
    MockApp::new(PKG, "home")
        .screen(
            "home",
            target(".MainActivity", &["android.widget.FrameLayout", "android.widget.LinearLayout"])
                .widget(MockWidget::button("To A").opens("a")),
        )
        .screen(
            "a",
            target(".AActivity", &["android.widget.FrameLayout", "android.widget.GridView"])
                .widget(MockWidget::button("To B").opens("b")),
        )
        .screen(
            "b",
            target(".BActivity", &["android.widget.FrameLayout", "android.widget.TableLayout"])
                .widget(MockWidget::button("To C").opens("c")),
        )
        .screen(
            "c",
            target(".CActivity", &["android.widget.FrameLayout", "android.widget.WebView"]),
        )
}

/// Home whose first button opens a screen of another package.
pub fn home_with_foreign(widget: MockWidget, key: &str, foreign: MockScreen) -> MockApp {
    MockApp::new(PKG, "home")
        .screen(
            "home",
            target(".MainActivity", &["android.widget.FrameLayout", "android.widget.LinearLayout"])
                .widget(widget)
                .widget(MockWidget::button("About")),
        )
        .screen(key, foreign)
}
