//! Daily-file aggregation: one normalized row per 15-minute slot.
//!
//! For every day in the requested range the aggregator opens the daily
//! file, reconciles its header against the canonical column order, and
//! emits the 96 slot rows reordered into canonical positions. Rows are
//! produced lazily, one buffered day at a time, so arbitrarily long date
//! ranges aggregate in bounded memory.

use std::io::Write;

use chrono::{NaiveDate, NaiveDateTime};

use crate::columns::ColumnOrder;
use crate::daily::{DailyFile, SLOTS_PER_DAY, slot_label, slot_time};
use crate::dates::{DayRange, day_range};
use crate::error::{AggregateError, AggregateResult};

/// Default token written for a measurement that is absent or empty.
pub const DEFAULT_PLACEHOLDER: &str = "NA";

/// A source field counts as "not available" when it is empty or carries
/// the `ND` sentinel some file eras use.
pub fn is_missing(value: &str) -> bool {
    value.is_empty() || value == "ND"
}

/// One aggregated record: a timestamp plus the values in canonical column
/// order, with missing values already rendered as the placeholder token.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub timestamp: NaiveDateTime,
    pub values: Vec<String>,
}

impl AggregateRow {
    /// The row as one comma-joined output line (ISO-8601 timestamp first).
    pub fn to_csv_line(&self) -> String {
        let mut line = self.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string();
        for value in &self.values {
            line.push(',');
            line.push_str(value);
        }
        line
    }
}

/// Reads daily files from a data directory and emits normalized rows.
#[derive(Debug, Clone)]
pub struct Aggregator {
    data_dir: std::path::PathBuf,
    columns: ColumnOrder,
    placeholder: String,
}

impl Aggregator {
    pub fn new(
        data_dir: impl Into<std::path::PathBuf>,
        columns: ColumnOrder,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            columns,
            placeholder: placeholder.into(),
        }
    }

    pub fn columns(&self) -> &ColumnOrder {
        &self.columns
    }

    /// Lazy sequence of aggregated rows over `[start, stop)`.
    ///
    /// The first error aborts the sequence: after yielding an `Err` the
    /// iterator is fused and produces nothing further.
    pub fn rows(&self, start: NaiveDate, stop: NaiveDate) -> Rows<'_> {
        Rows {
            aggregator: self,
            days: day_range(start, stop),
            buffered: Vec::new().into_iter(),
            failed: false,
        }
    }

    /// Writes the output header plus every row of `[start, stop)` to `out`.
    /// Returns the number of data rows written.
    pub fn write_series(
        &self,
        start: NaiveDate,
        stop: NaiveDate,
        out: &mut impl Write,
    ) -> AggregateResult<u64> {
        writeln!(out, "{}", self.columns.header_line())?;
        let mut count = 0u64;
        for row in self.rows(start, stop) {
            writeln!(out, "{}", row?.to_csv_line())?;
            count += 1;
        }
        out.flush()?;
        Ok(count)
    }

    /// Reads and reorders one whole day (96 rows).
    fn emit_day(&self, day: NaiveDate) -> AggregateResult<Vec<AggregateRow>> {
        let mut file = DailyFile::open(&self.data_dir, day)?;
        let mapping = self.columns.reconcile(file.header(), day)?;

        let mut rows = Vec::with_capacity(SLOTS_PER_DAY);
        for slot in 0..SLOTS_PER_DAY {
            let expected = slot_label(slot);
            let line = file.next_data_line();
            let line = line.trim_end();
            let mut fields = line.split('\t');

            let found = fields.next().unwrap_or("");
            if found != expected {
                return Err(AggregateError::TimestampDiscontinuity {
                    day,
                    expected,
                    found: found.to_string(),
                });
            }

            let mut values = vec![self.placeholder.clone(); self.columns.len()];
            for (value, &target) in fields.zip(&mapping) {
                if !is_missing(value) {
                    values[target] = value.to_string();
                }
            }

            rows.push(AggregateRow {
                timestamp: NaiveDateTime::new(day, slot_time(slot)),
                values,
            });
        }
        Ok(rows)
    }
}

/// Pull-based iterator over aggregated rows. See [`Aggregator::rows`].
pub struct Rows<'a> {
    aggregator: &'a Aggregator,
    days: DayRange,
    buffered: std::vec::IntoIter<AggregateRow>,
    failed: bool,
}

impl Iterator for Rows<'_> {
    type Item = AggregateResult<AggregateRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(row) = self.buffered.next() {
                return Some(Ok(row));
            }
            let day = self.days.next()?;
            match self.aggregator.emit_day(day) {
                Ok(rows) => self.buffered = rows.into_iter(),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daily::daily_path;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("eco2mix_aggregate_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Writes a synthetic daily file: given header labels and a closure
    /// producing the value fields for each slot.
    fn write_daily(
        dir: &std::path::Path,
        day: NaiveDate,
        labels: &[&str],
        mut values: impl FnMut(usize) -> Vec<String>,
    ) {
        let mut text = format!("Journée du {}\n", day.format("%d/%m/%Y"));
        text.push_str("Heures");
        for label in labels {
            text.push('\t');
            text.push_str(label);
        }
        text.push('\n');
        for slot in 0..SLOTS_PER_DAY {
            text.push_str(&slot_label(slot));
            for value in values(slot) {
                text.push('\t');
                text.push_str(&value);
            }
            text.push('\n');
        }
        fs::write(daily_path(dir, day), text).unwrap();
    }

    fn two_column_aggregator(dir: &std::path::Path) -> Aggregator {
        Aggregator::new(dir, ColumnOrder::new(["A", "B"]), DEFAULT_PLACEHOLDER)
    }

    #[test]
    fn test_first_row_with_trailing_empty_field() {
        let dir = fixture_dir("first_row");
        let day = d(2015, 1, 1);
        write_daily(&dir, day, &["A", "B"], |slot| {
            if slot == 0 {
                vec!["10".into(), "".into()]
            } else {
                vec!["1".into(), "2".into()]
            }
        });

        let aggregator = two_column_aggregator(&dir);
        let first = aggregator.rows(day, d(2015, 1, 2)).next().unwrap().unwrap();
        assert_eq!(first.to_csv_line(), "2015-01-01T00:00:00,10,NA");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_row_count_is_96_per_day() {
        let dir = fixture_dir("count");
        for day in day_range(d(2015, 1, 1), d(2015, 1, 4)) {
            write_daily(&dir, day, &["A", "B"], |_| vec!["1".into(), "2".into()]);
        }

        let aggregator = two_column_aggregator(&dir);
        let rows: Vec<_> = aggregator
            .rows(d(2015, 1, 1), d(2015, 1, 4))
            .collect::<AggregateResult<_>>()
            .unwrap();
        assert_eq!(rows.len(), 3 * SLOTS_PER_DAY);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_timestamps_strictly_increasing_by_15_minutes() {
        let dir = fixture_dir("spacing");
        for day in day_range(d(2015, 1, 1), d(2015, 1, 3)) {
            write_daily(&dir, day, &["A", "B"], |_| vec!["1".into(), "2".into()]);
        }

        let aggregator = two_column_aggregator(&dir);
        let rows: Vec<_> = aggregator
            .rows(d(2015, 1, 1), d(2015, 1, 3))
            .collect::<AggregateResult<_>>()
            .unwrap();
        for pair in rows.windows(2) {
            let step = pair[1].timestamp - pair[0].timestamp;
            assert_eq!(step, chrono::Duration::minutes(15));
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_column_absent_from_header_stays_placeholder() {
        let dir = fixture_dir("absent_column");
        let day = d(2015, 1, 1);
        // Only B present, in a one-column header.
        write_daily(&dir, day, &["B"], |_| vec!["7".into()]);

        let aggregator = two_column_aggregator(&dir);
        for row in aggregator.rows(day, d(2015, 1, 2)) {
            let row = row.unwrap();
            assert_eq!(row.values[0], "NA");
            assert_eq!(row.values[1], "7");
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_nd_sentinel_renders_as_placeholder() {
        let dir = fixture_dir("nd");
        let day = d(2015, 1, 1);
        write_daily(&dir, day, &["A", "B"], |_| vec!["ND".into(), "3".into()]);

        let aggregator = two_column_aggregator(&dir);
        let first = aggregator.rows(day, d(2015, 1, 2)).next().unwrap().unwrap();
        assert_eq!(first.values, vec!["NA".to_string(), "3".to_string()]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_timestamp_discontinuity_aborts() {
        let dir = fixture_dir("discontinuity");
        let day = d(2015, 1, 1);
        write_daily(&dir, day, &["A"], |_| vec!["1".into()]);
        // Corrupt data line 5: "01:00" becomes "01:30:00".
        let path = daily_path(&dir, day);
        let text = fs::read_to_string(&path)
            .unwrap()
            .replace("\n01:00\t", "\n01:30:00\t");
        fs::write(&path, text).unwrap();

        let aggregator = Aggregator::new(&dir, ColumnOrder::new(["A"]), DEFAULT_PLACEHOLDER);
        let mut rows = aggregator.rows(day, d(2015, 1, 2));
        // Day buffering surfaces the error on the first pull, before any row.
        let first = rows.next().unwrap();
        match first {
            Err(AggregateError::TimestampDiscontinuity {
                expected, found, ..
            }) => {
                assert_eq!(expected, "01:00");
                assert_eq!(found, "01:30:00");
            }
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(rows.next().is_none(), "iterator must fuse after an error");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_day_mid_range_aborts() {
        let dir = fixture_dir("missing_mid");
        write_daily(&dir, d(2015, 1, 1), &["A"], |_| vec!["1".into()]);
        // 2015-01-02 intentionally absent.

        let aggregator = Aggregator::new(&dir, ColumnOrder::new(["A"]), DEFAULT_PLACEHOLDER);
        let items: Vec<_> = aggregator.rows(d(2015, 1, 1), d(2015, 1, 3)).collect();
        assert_eq!(items.len(), SLOTS_PER_DAY + 1);
        assert!(matches!(
            items.last().unwrap(),
            Err(AggregateError::MissingDataFile { .. })
        ));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_series_idempotent() {
        let dir = fixture_dir("idempotent");
        let day = d(2015, 1, 1);
        write_daily(&dir, day, &["B", "A"], |slot| {
            vec![slot.to_string(), (slot * 2).to_string()]
        });

        let aggregator = two_column_aggregator(&dir);
        let mut first = Vec::new();
        let mut second = Vec::new();
        let n1 = aggregator.write_series(day, d(2015, 1, 2), &mut first).unwrap();
        let n2 = aggregator.write_series(day, d(2015, 1, 2), &mut second).unwrap();
        assert_eq!(n1, SLOTS_PER_DAY as u64);
        assert_eq!(n2, n1);
        assert_eq!(first, second);
        assert!(first.starts_with(b"Timestamp,A,B\n"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_permuted_header_lands_in_canonical_order() {
        let dir = fixture_dir("permuted");
        let day = d(2015, 1, 1);
        write_daily(&dir, day, &["B", "A"], |_| vec!["bee".into(), "ay".into()]);

        let aggregator = two_column_aggregator(&dir);
        let first = aggregator.rows(day, d(2015, 1, 2)).next().unwrap().unwrap();
        assert_eq!(first.values, vec!["ay".to_string(), "bee".to_string()]);
        fs::remove_dir_all(&dir).unwrap();
    }
}
