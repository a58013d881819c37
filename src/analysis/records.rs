//! Peak-demand record detection and weekly consumption statistics.

use super::utility;

/// A running consumption record: the sample index where a new all-time
/// high (so far) was reached, and its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakRecord {
    pub index: usize,
    pub value: f64,
}

/// Finds the running records in `series`, ignoring values at or below
/// `floor`. When two records fall closer than `min_separation` samples,
/// only the later one is kept, so one cold snap does not flood the list.
/// `NaN` samples never qualify.
pub fn running_records(series: &[f64], floor: f64, min_separation: usize) -> Vec<PeakRecord> {
    let mut records: Vec<PeakRecord> = Vec::new();
    let mut running = floor;
    for (index, &value) in series.iter().enumerate() {
        if value > running {
            if let Some(last) = records.last() {
                if index - last.index < min_separation {
                    records.pop();
                }
            }
            running = value;
            records.push(PeakRecord { index, value });
        }
    }
    records
}

/// Per-week aggregate of a 15-minute series.
#[derive(Debug, Default)]
pub struct WeeklyStats {
    pub avg: Vec<f64>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

/// Splits `series` into consecutive whole weeks of `samples_per_week`
/// samples (the trailing partial week is dropped) and computes the
/// average, minimum and maximum of each, skipping missing values.
pub fn weekly_stats(series: &[f64], samples_per_week: usize) -> WeeklyStats {
    let mut stats = WeeklyStats::default();
    if samples_per_week == 0 {
        return stats;
    }
    for week in series.chunks_exact(samples_per_week) {
        stats.avg.push(utility::mean(week));
        stats.min.push(utility::min(week));
        stats.max.push(utility::max(week));
    }
    stats
}
