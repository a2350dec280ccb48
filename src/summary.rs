//! Run totals.

use crate::convert::ConversionResult;
use serde::Serialize;
use std::fmt;

/// Counters for one batch run.
///
/// `total` is fixed at discovery; the other three grow as results arrive and
/// always sum to `total` once the run is over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, result: &ConversionResult) {
        match result {
            ConversionResult::Converted { .. } => self.converted += 1,
            ConversionResult::Skipped { .. } => self.skipped += 1,
            ConversionResult::Failed { .. } => self.failed += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.converted + self.skipped + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.processed() == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} found, {} converted, {} skipped, {} failed",
            self.total, self.converted, self.skipped, self.failed
        )
    }
}
