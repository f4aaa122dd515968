//! Run-scoped statistics.
//!
//! Counters accumulated over one orchestrator run; reset each invocation,
//! never persisted. Reported on both terminal states.

use std::time::{Duration, Instant};

use crate::runner::outcome::ItemOutcome;

#[derive(Debug, Clone)]
pub struct RunStats {
    started: Instant,
    /// Items that reached a graded terminal state.
    pub processed: usize,
    /// Items that failed and stay pending for a future run.
    pub failed: usize,
    pub reviewed: usize,
    pub missing_file: usize,
    pub legacy_document: usize,
    pub invalid_format: usize,
    /// "student - assignment" labels of the failed items.
    pub failed_items: Vec<String>,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            processed: 0,
            failed: 0,
            reviewed: 0,
            missing_file: 0,
            legacy_document: 0,
            invalid_format: 0,
            failed_items: Vec::new(),
        }
    }

    /// Record one item's outcome under its display label.
    pub fn record(&mut self, label: &str, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Reviewed { .. } => {
                self.processed += 1;
                self.reviewed += 1;
            }
            ItemOutcome::MissingFile => {
                self.processed += 1;
                self.missing_file += 1;
            }
            ItemOutcome::LegacyDocument => {
                self.processed += 1;
                self.legacy_document += 1;
            }
            ItemOutcome::InvalidFormat => {
                self.processed += 1;
                self.invalid_format += 1;
            }
            ItemOutcome::Failed(_) => {
                self.failed += 1;
                self.failed_items.push(label.to_string());
            }
        }
    }

    pub fn total(&self) -> usize {
        self.processed + self.failed
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
