//! Throttled progress reporting for long table builds.
//!
//! Emits through `tracing`, so hosts without a subscriber (batch jobs,
//! tests) get nothing, and interactive hosts can surface build progress by
//! installing one. Updates are throttled to roughly 250 per build.

use tracing::{debug, info};

pub(crate) struct Progress {
    label: &'static str,
    total: usize,
    step: usize,
    done: usize,
}

impl Progress {
    pub(crate) fn new(label: &'static str, total: usize) -> Self {
        Self {
            label,
            total,
            step: (total / 250).max(1),
            done: 0,
        }
    }

    pub(crate) fn tick(&mut self) {
        self.done += 1;
        if self.done % self.step == 0 {
            debug!(done = self.done, total = self.total, "{}", self.label);
        }
    }

    pub(crate) fn finish(&self, outs: usize) {
        info!(cells = self.total, outs, "{} complete", self.label);
    }
}
