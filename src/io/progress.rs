//! Stage progress tracking for generation and export runs

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::LazyLock;

/// Coordinates progress display for the stages of a run
///
/// One bar is shown per stage; starting a new stage finishes the previous
/// one. Updates take `&self` so export workers can report concurrently.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    stage_bar: Option<ProgressBar>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] {{prefix:>10}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

impl ProgressManager {
    /// Create a progress manager drawing to the terminal
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            stage_bar: None,
        }
    }

    /// Create a progress manager that tracks positions without drawing
    pub fn hidden() -> Self {
        Self {
            multi_progress: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            stage_bar: None,
        }
    }

    /// Begin a new stage of `total` steps, finishing any current stage
    pub fn start_stage(&mut self, label: &str, total: usize) {
        self.finish_stage();

        let bar = ProgressBar::new(total as u64);
        bar.set_style(STAGE_STYLE.clone());
        bar.set_prefix(label.to_string());
        self.stage_bar = Some(self.multi_progress.add(bar));
    }

    /// Report the number of completed steps
    pub fn set_position(&self, done: usize) {
        if let Some(ref bar) = self.stage_bar {
            bar.set_position(done as u64);
        }
    }

    /// Report one more completed step
    pub fn inc(&self) {
        if let Some(ref bar) = self.stage_bar {
            bar.inc(1);
        }
    }

    /// Completed steps of the current stage, if any
    pub fn position(&self) -> Option<usize> {
        self.stage_bar.as_ref().map(|bar| bar.position() as usize)
    }

    /// Mark the current stage as done
    pub fn finish_stage(&mut self) {
        if let Some(bar) = self.stage_bar.take() {
            bar.finish_with_message("done");
        }
    }

    /// Clean up all progress displays
    pub fn finish(&mut self) {
        self.finish_stage();
        let _ = self.multi_progress.clear();
    }
}
