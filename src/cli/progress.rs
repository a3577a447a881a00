//! Terminal progress display for pipeline runs
//!
//! [`ProgressBarObserver`] draws one progress bar per stage and leaves a
//! summary line behind when the stage finishes:
//!
//! ```text
//! ✅ [1/4] standardizer: 4 kept, 1 dropped, 0 failed
//! ⏳ [2/4] forcefield (transform) [####>-----] 2/4
//! ```

use crate::cli::output::{create_progress_bar, style, CHECK, SPINNER, WARN};
use crate::core::{ProgressEvent, ProgressObserver};
use indicatif::{ProgressBar, ProgressDrawTarget};
use std::sync::Mutex;

/// Observer that renders stage progress with indicatif
#[derive(Debug)]
pub struct ProgressBarObserver {
    stages: usize,
    hidden: bool,
    current: Mutex<Option<ProgressBar>>,
}

impl ProgressBarObserver {
    /// Create an observer for a pipeline with `stages` stages
    pub fn new(stages: usize) -> Self {
        Self {
            stages,
            hidden: false,
            current: Mutex::new(None),
        }
    }

    /// Create an observer that tracks progress without drawing
    pub fn hidden(stages: usize) -> Self {
        Self {
            hidden: true,
            ..Self::new(stages)
        }
    }

    fn header(&self, index: usize, stage: &str) -> String {
        format!("[{}/{}] {}", index + 1, self.stages, style(stage).cyan())
    }

    fn bar(&self, total: usize) -> ProgressBar {
        if self.hidden {
            ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden())
        } else {
            create_progress_bar(total)
        }
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_event(&self, event: &ProgressEvent) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };

        match event {
            ProgressEvent::StageStarted {
                index,
                stage,
                operation,
                total,
            } => {
                if let Some(previous) = current.take() {
                    previous.abandon();
                }
                let bar = self.bar(*total);
                bar.set_message(format!("{}{} ({})", SPINNER, self.header(*index, stage), operation));
                *current = Some(bar);
            }
            ProgressEvent::ItemProcessed { .. } => {
                if let Some(bar) = current.as_ref() {
                    bar.inc(1);
                }
            }
            ProgressEvent::StageFinished {
                index,
                stage,
                kept,
                dropped,
                failed,
            } => {
                if let Some(bar) = current.take() {
                    let icon = if *failed > 0 { WARN } else { CHECK };
                    bar.finish_with_message(format!(
                        "{}{}: {} kept, {} dropped, {} failed",
                        icon,
                        self.header(*index, stage),
                        kept,
                        dropped,
                        failed
                    ));
                }
            }
        }
    }
}
