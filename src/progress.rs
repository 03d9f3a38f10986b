//! Spinner and logging utilities.
//!
//! Provides stage spinners and bracket-tagged stderr logging, with support
//! for log-only mode where spinners are hidden for tail-friendly output.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Global flag for log-only mode (set from args in main)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

/// Set log-only mode globally
pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

/// Check if log-only mode is enabled
pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}

/// Log one line for a pipeline stage: `[reconcile] 212 words`
pub fn log_stage(stage: &str, msg: &str) {
    eprintln!("[{}] {}", stage, msg);
}

/// Create a spinner for a pipeline stage.
/// In log-only mode, the spinner is hidden and the start is logged instead.
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        eprintln!("{}", msg);
    } else {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{msg} {spinner} [{elapsed_precise}]")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(msg.to_string());
    pb
}

/// Finish a stage spinner; in log-only mode the final message is logged.
pub fn finish_spinner(pb: &ProgressBar, msg: String) {
    if is_log_only() {
        eprintln!("{}", msg);
    }
    pb.finish_with_message(msg);
}
