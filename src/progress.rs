//! Spinners shown while a command is running

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for a command of unknown duration
///
/// Draws to stderr and stays hidden when stderr is not a terminal.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""])
        .template("  {spinner:.cyan} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Remove the spinner line before regular output is printed
pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}
