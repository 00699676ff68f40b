//! Progress display utilities.
//!
//! Wraps the `indicatif` crate with consistent styling and an environment
//! kill switch. The CLI drives one bar from the status monitor's overall
//! stream; library code never touches the terminal.
//!
//! # Environment Variables
//!
//! - `PATCHUP_NO_PROGRESS`: set to any value to disable all progress
//!   indicators (useful in CI and when piping output)

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// Resolution of the overall progress bar: percent with one decimal place.
pub const OVERALL_BAR_UNITS: u64 = 1000;

fn is_progress_disabled() -> bool {
    std::env::var("PATCHUP_NO_PROGRESS").is_ok()
}

/// A progress bar with consistent styling and an environment kill switch.
///
/// When `PATCHUP_NO_PROGRESS` is set, construction yields a hidden bar that
/// silently ignores all operations, so call sites never need to branch.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a progress bar tracking `len` work units.
    #[must_use]
    pub fn new(len: u64) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(len);
            bar.set_style(ProgressStyle::default_style());
            bar
        };
        Self { inner: bar }
    }

    /// Creates a spinner for operations without discrete steps.
    #[must_use]
    pub fn new_spinner() -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(ProgressStyle::spinner());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self { inner: bar }
    }

    /// Sets the message displayed alongside the bar.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Sets the prefix displayed before the bar.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Moves the bar to an absolute position.
    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    /// Completes the bar, leaving a final message on screen.
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    /// Completes the bar and removes it from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

/// The styles used by patchup progress indicators.
pub struct ProgressStyle;

impl ProgressStyle {
    /// Percent-style bar used for overall update progress.
    ///
    /// Template: `{prefix} [{bar}] {percent}% {msg}`
    #[must_use]
    pub fn default_style() -> IndicatifStyle {
        IndicatifStyle::default_bar()
            .template("{prefix:.bold} [{bar:40.cyan/blue}] {percent}% {msg}")
            .unwrap()
            .progress_chars("━╸━")
    }

    /// Spinner style for indeterminate steps.
    #[must_use]
    pub fn spinner() -> IndicatifStyle {
        IndicatifStyle::default_spinner()
            .template("{prefix:.bold} {spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }
}

/// Renders a byte count as a human-readable decimal size.
#[must_use]
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
