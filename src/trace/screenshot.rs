use std::path::{Path, PathBuf};

use crate::driver::driver::AutomationDriver;

const MAX_NAME_CHARS: usize = 30;
const MAX_LABEL_CHARS: usize = 50;

/// Replace characters that are not allowed in file names.
pub fn sanitize_filename(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            ':' | '\\' | '/' | '*' | '"' | '?' | '|' | '<' | '>' | '\'' => '_',
            c => c,
        })
        .collect()
}

fn clip(input: &str, max: usize) -> String {
    input.chars().take(max).collect()
}

/// `(<index>) <screen-name> <label>.png`, label omitted when empty.
pub fn screenshot_filename(index: usize, screen_name: &str, label: &str) -> String {
    let name = sanitize_filename(&clip(screen_name, MAX_NAME_CHARS));
    let label = sanitize_filename(&clip(label, MAX_LABEL_CHARS));
    if label.is_empty() {
        format!("({}) {}.png", index, name)
    } else {
        format!("({}) {} {}.png", index, name, label)
    }
}

/// Numbers and stores screenshots under one directory.
pub struct ScreenshotRecorder {
    dir: PathBuf,
    next_index: usize,
}

impl ScreenshotRecorder {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            next_index: 0,
        }
    }

    /// Screenshots successfully taken so far.
    pub fn count(&self) -> usize {
        self.next_index
    }

    /// Capture the live screen. Returns the file name, or `None` if the
    /// driver failed (the index is not consumed then).
    pub fn capture(
        &mut self,
        driver: &mut dyn AutomationDriver,
        wait_idle_ms: u64,
        label: &str,
    ) -> Option<String> {
        driver.wait_for_idle(wait_idle_ms);
        let screen_name = driver
            .foreground_screen_name()
            .unwrap_or_else(|| "No Activity name".to_string());

        let filename = screenshot_filename(self.next_index, &screen_name, label);
        match driver.take_screenshot(&self.dir.join(&filename)) {
            Ok(()) => {
                self.next_index += 1;
                Some(filename)
            }
            Err(e) => {
                tracing::warn!("screenshot '{}' failed: {}", filename, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_without_label() {
        assert_eq!(screenshot_filename(0, "MainActivity", ""), "(0) MainActivity.png");
    }

    #[test]
    fn filename_sanitizes_and_clips() {
        let name = screenshot_filename(7, "a/b:c", "{Click} OK <x>");
        assert_eq!(name, "(7) a_b_c {Click} OK _x_.png");

        let long = "x".repeat(80);
        let clipped = screenshot_filename(1, &long, &long);
        assert_eq!(clipped, format!("(1) {} {}.png", "x".repeat(30), "x".repeat(50)));
    }
}
