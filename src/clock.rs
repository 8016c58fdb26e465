//! Calendar source for the progression engine.
//!
//! Every record is partitioned by local calendar date, so the engine asks a
//! [`Clock`] for "today" instead of reading the system time directly.

use chrono::{Local, NaiveDate};

/// Provides the current local calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock time in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date (tests, `--today` overrides).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
