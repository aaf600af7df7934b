//! Scoped wall-clock timer.
//!
//! [`Timer::start`] returns a value that owns its start instant;
//! [`Timer::stop`] consumes it and reports the elapsed time through
//! `tracing`. There is no process-wide state, so timers may nest or run on
//! different threads freely.

use std::time::{Duration, Instant};

/// A running timer.
#[derive(Debug)]
#[must_use = "a timer measures nothing unless it is stopped"]
pub struct Timer {
    label: &'static str,
    started: Instant,
}

impl Timer {
    /// Start timing `label`.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }

    /// The label this timer was started with.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Time elapsed so far, without stopping.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stop the timer and return the elapsed time.
    pub fn stop(self) -> Duration {
        let elapsed = self.started.elapsed();
        tracing::debug!(
            label = self.label,
            seconds = elapsed.as_secs_f64(),
            "timer stopped"
        );
        elapsed
    }
}
