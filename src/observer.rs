use crate::orchestrator::RunResult;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{debug, info};

/// Notifications emitted by a run. All methods default to doing nothing.
pub trait RunObserver: Send + Sync {
    fn on_progress(&self, _completed: usize, _total: usize) {}

    fn on_log_line(&self, _line: &str) {}

    fn on_run_complete(&self, _result: &RunResult) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new(visible: bool) -> Self {
        let bar = ProgressBar::new(0);
        if visible {
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pairs")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
        } else {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self { bar }
    }
}

impl RunObserver for ProgressReporter {
    fn on_progress(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
    }

    fn on_log_line(&self, line: &str) {
        self.bar.suspend(|| debug!(target: "gcontrib::audit", "{line}"));
    }

    fn on_run_complete(&self, result: &RunResult) {
        self.bar.finish_and_clear();
        info!(
            "Run complete: {} pairs, {} skipped",
            result.pairs_total, result.pairs_skipped
        );
    }
}
