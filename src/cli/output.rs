//! CLI output formatting

use crate::instantiate::TargetKind;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let bar_style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    progress.set_style(bar_style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a training accuracy as a percentage
pub fn format_accuracy(accuracy: f64) -> String {
    let text = format!("{:.1}%", accuracy * 100.0);
    if accuracy >= 0.9 {
        style(text).green().to_string()
    } else if accuracy >= 0.6 {
        style(text).yellow().to_string()
    } else {
        style(text).red().to_string()
    }
}

/// One line per sweep job: `[job] overrides -> accuracy`
pub fn format_job_result(job: usize, overrides: &[String], accuracy: f64) -> String {
    let label = if overrides.is_empty() {
        style("(no overrides)").dim().to_string()
    } else {
        style(overrides.join(" ")).cyan().to_string()
    };
    format!(
        "{} #{} {} → {}",
        CHECK,
        style(job).dim(),
        label,
        format_accuracy(accuracy)
    )
}

/// Line for a failed sweep job
pub fn format_job_failure(job: usize, overrides: &[String], error: &str) -> String {
    format!(
        "{} #{} {}: {}",
        CROSS,
        style(job).dim(),
        style(overrides.join(" ")).red(),
        style(error).dim()
    )
}

/// Format a registered target for the `targets` listing
pub fn format_target(name: &str, kind: TargetKind) -> String {
    let kind = match kind {
        TargetKind::Transformer => style(kind.to_string()).cyan(),
        TargetKind::Estimator => style(kind.to_string()).magenta(),
        TargetKind::Object => style(kind.to_string()).dim(),
    };
    format!("  {} ({})", style(name).bold(), kind)
}

pub fn format_run_dir(path: &Path) -> String {
    format!("{} Run saved to {}", INFO, style(path.display()).dim())
}
