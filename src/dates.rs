//! Calendar-day range iteration.

use chrono::NaiveDate;

/// Lazy sequence of calendar days from `start` (inclusive) to `stop`
/// (exclusive), advancing one day per step.
///
/// `Clone` makes the range restartable: cloning before iterating keeps an
/// unconsumed copy. An inverted range (`start >= stop`) is simply empty.
#[derive(Debug, Clone)]
pub struct DayRange {
    next: NaiveDate,
    stop: NaiveDate,
}

impl DayRange {
    /// Number of days remaining in the range.
    pub fn num_days(&self) -> u64 {
        (self.stop - self.next).num_days().max(0) as u64
    }
}

impl Iterator for DayRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.next >= self.stop {
            return None;
        }
        let day = self.next;
        self.next = day.succ_opt()?;
        Some(day)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.num_days() as usize;
        (n, Some(n))
    }
}

/// Range of dates, one day per step, `stop` excluded (like `Range`).
pub fn day_range(start: NaiveDate, stop: NaiveDate) -> DayRange {
    DayRange { next: start, stop }
}
