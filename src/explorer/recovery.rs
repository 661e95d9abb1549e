use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::driver::driver::{AutomationDriver, ElementRef, Selector, find_first};

// ============================================================================
// System UI exceptions (ANR / crash dialogs)
// ============================================================================

const SYSTEM_PACKAGE: &str = "android";
const ANR_DIALOG_CLASS: &str = "com.android.server.am.AppNotRespondingDialog";
const CRASH_DIALOG_CLASS: &str = "com.android.server.am.AppErrorDialog";
const ANR_TEXTS: [&str; 2] = ["isn't responding.", "沒有回應"];
const CRASH_TEXTS: [&str; 2] = ["has stopped", "已停止運作"];
const DISMISS_BUTTONS: [&str; 2] = ["OK", "確定"];
pub const TEXT_INPUT_CLASS: &str = "android.widget.EditText";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UiExceptionKind {
    Anr,
    Crash,
}

impl UiExceptionKind {
    /// Screenshot label for the dialog.
    pub fn label(&self) -> &'static str {
        match self {
            UiExceptionKind::Anr => "[ANR]",
            UiExceptionKind::Crash => "[CRASH]",
        }
    }
}

/// An ANR or crash dialog met during the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiException {
    pub kind: UiExceptionKind,
    pub step: u32,
    pub text: Option<String>,
}

fn find_dialog(
    driver: &mut dyn AutomationDriver,
    class_name: &str,
    texts: &[&str],
) -> Option<ElementRef> {
    if let Some(window) = find_first(driver, &Selector::class_name(class_name)) {
        return Some(window);
    }
    texts
        .iter()
        .find_map(|text| find_first(driver, &Selector::text_contains(SYSTEM_PACKAGE, text)))
}

/// Look for an ANR dialog first, then a crash dialog.
pub fn detect_ui_exception(
    driver: &mut dyn AutomationDriver,
) -> Option<(UiExceptionKind, Option<String>)> {
    if let Some(window) = find_dialog(driver, ANR_DIALOG_CLASS, &ANR_TEXTS) {
        return Some((UiExceptionKind::Anr, driver.text(&window)));
    }
    if let Some(window) = find_dialog(driver, CRASH_DIALOG_CLASS, &CRASH_TEXTS) {
        return Some((UiExceptionKind::Crash, driver.text(&window)));
    }
    None
}

/// Press the dialog's OK button. `false` if none could be pressed.
pub fn dismiss_ui_exception(driver: &mut dyn AutomationDriver) -> bool {
    let button = DISMISS_BUTTONS
        .iter()
        .find_map(|label| find_first(driver, &Selector::text(label).enabled()));
    match button {
        Some(button) => match driver.activate(&button) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("failed to dismiss UI exception dialog: {}", e);
                false
            }
        },
        None => false,
    }
}

// ============================================================================
// Common dialogs
// ============================================================================

/// Press the first enabled button whose text is one of `labels`.
/// Returns the label pressed.
pub fn handle_common_dialog(driver: &mut dyn AutomationDriver, labels: &[String]) -> Option<String> {
    for label in labels {
        let Some(button) = find_first(driver, &Selector::text(label).enabled()) else {
            continue;
        };
        match driver.activate(&button) {
            Ok(()) => return Some(label.clone()),
            Err(e) => {
                tracing::warn!("dialog button '{}' disappeared: {}", label, e);
                return None;
            }
        }
    }
    None
}

// ============================================================================
// Text injection
// ============================================================================

/// Type a random word from `words` into every text field on screen.
/// Returns the words typed, in field order.
pub fn inject_random_text<R: Rng + ?Sized>(
    driver: &mut dyn AutomationDriver,
    words: &[String],
    rng: &mut R,
) -> Vec<String> {
    let mut typed = Vec::new();
    for field in driver.find_elements(&Selector::class_name(TEXT_INPUT_CLASS)) {
        let Some(word) = words.choose(rng) else {
            break;
        };
        match driver.input_text(&field, word) {
            Ok(()) => typed.push(word.clone()),
            Err(e) => tracing::debug!("text field {} vanished: {}", field, e),
        }
    }
    typed
}
