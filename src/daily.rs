//! Reading and validating one daily export file.
//!
//! A daily file carries one calendar day of 15-minute readings: line 1 is
//! the day marker, line 2 the tab-separated header, then 96 data lines
//! (`HH:MM<TAB>value...`). Files are UTF-8, except for legacy exports in
//! ISO-8859-15.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};
use encoding_rs::ISO_8859_15;

use crate::error::{AggregateError, AggregateResult};

/// Prefix of the first line of every valid daily file.
pub const DAY_MARKER: &str = "Journée du";

/// Number of 15-minute slots in one day.
pub const SLOTS_PER_DAY: usize = 96;

/// Path of the daily file for `day` under `data_dir`.
pub fn daily_path(data_dir: &Path, day: NaiveDate) -> PathBuf {
    data_dir.join(format!("RTE_CO2mix_{}.csv", day.format("%Y-%m-%d")))
}

/// Decodes raw daily-file bytes: UTF-8, falling back to ISO-8859-15 for
/// legacy exports.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = ISO_8859_15.decode(bytes);
            Cow::Owned(text.into_owned())
        }
    }
}

/// `HH:MM` label of the `slot`-th 15-minute interval of the day.
pub fn slot_label(slot: usize) -> String {
    format!("{:02}:{:02}", slot / 4, (slot % 4) * 15)
}

/// Time of day of the `slot`-th 15-minute interval.
pub fn slot_time(slot: usize) -> NaiveTime {
    NaiveTime::from_hms_opt((slot / 4) as u32, ((slot % 4) * 15) as u32, 0)
        .unwrap_or(NaiveTime::MIN)
}

/// One decoded, structurally validated daily file.
///
/// Validation is limited to the day-marker line; the data lines are only
/// checked slot by slot as they are consumed.
#[derive(Debug)]
pub struct DailyFile {
    day: NaiveDate,
    header: Vec<String>,
    lines: std::vec::IntoIter<String>,
}

impl DailyFile {
    /// Opens and decodes the daily file for `day` under `data_dir`.
    ///
    /// Fails with [`AggregateError::MissingDataFile`] when the file is
    /// absent and [`AggregateError::InvalidFileFormat`] when the first
    /// line does not start with the day marker.
    pub fn open(data_dir: &Path, day: NaiveDate) -> AggregateResult<Self> {
        let path = daily_path(data_dir, day);
        if !path.exists() {
            return Err(AggregateError::MissingDataFile { day, path });
        }
        let bytes = fs::read(&path)?;
        let text = decode_text(&bytes);

        let mut lines = text.lines();
        let marker = lines.next().unwrap_or("");
        if !marker.starts_with(DAY_MARKER) {
            return Err(AggregateError::InvalidFileFormat { day, path });
        }

        // Header labels, with the leading hour-label column dropped.
        let header: Vec<String> = lines
            .next()
            .unwrap_or("")
            .trim_end()
            .split('\t')
            .skip(1)
            .map(str::to_string)
            .collect();

        let data: Vec<String> = lines.map(str::to_string).collect();
        Ok(Self {
            day,
            header,
            lines: data.into_iter(),
        })
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// The file's value-column labels, in file order.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Next raw data line, or the empty string once exhausted. A short
    /// file therefore surfaces as a slot-label mismatch at the caller.
    pub fn next_data_line(&mut self) -> String {
        self.lines.next().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("eco2mix_daily_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_slot_labels() {
        assert_eq!(slot_label(0), "00:00");
        assert_eq!(slot_label(5), "01:15");
        assert_eq!(slot_label(95), "23:45");
    }

    #[test]
    fn test_daily_path_uses_iso_date() {
        let path = daily_path(Path::new("data"), d(2012, 2, 1));
        assert_eq!(path, Path::new("data").join("RTE_CO2mix_2012-02-01.csv"));
    }

    #[test]
    fn test_missing_file() {
        let dir = fixture_dir("missing");
        let err = DailyFile::open(&dir, d(2012, 2, 1)).unwrap_err();
        assert!(matches!(err, AggregateError::MissingDataFile { .. }));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_bad_day_marker() {
        let dir = fixture_dir("bad_marker");
        let day = d(2012, 2, 1);
        fs::write(daily_path(&dir, day), "Not a daily export\nHeures\tA\n").unwrap();

        let err = DailyFile::open(&dir, day).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidFileFormat { .. }));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_header_drops_hour_column() {
        let dir = fixture_dir("header");
        let day = d(2012, 2, 1);
        fs::write(
            daily_path(&dir, day),
            "Journée du 01/02/2012\nHeures\tConsommation\tEolien\n00:00\t100\t5\n",
        )
        .unwrap();

        let mut file = DailyFile::open(&dir, day).unwrap();
        assert_eq!(file.header(), ["Consommation", "Eolien"]);
        assert_eq!(file.next_data_line(), "00:00\t100\t5");
        assert_eq!(file.next_data_line(), "");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_latin9_fallback() {
        let dir = fixture_dir("latin9");
        let day = d(2005, 7, 1);
        // "Journée du" with an ISO-8859-15 0xE9 'é', plus an accented label.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"Journ\xe9e du 01/07/2005\n");
        bytes.extend_from_slice(b"Heures\tNucl\xe9aire\n");
        bytes.extend_from_slice(b"00:00\t40000\n");
        fs::write(daily_path(&dir, day), bytes).unwrap();

        let file = DailyFile::open(&dir, day).unwrap();
        assert_eq!(file.header(), ["Nucléaire"]);
        fs::remove_dir_all(&dir).unwrap();
    }
}
