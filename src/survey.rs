//! Format survey across downloaded daily files.
//!
//! The portal's export format drifted over the years: a data-status line
//! appeared, header labels changed, and columns went in and out of
//! availability. This diagnostic walks every daily file in a directory and
//! reports each point of change, which is how the canonical column order
//! gets maintained. Unlike the aggregator, invalid files are skipped with
//! a warning rather than aborting the scan.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glob::glob;
use serde::Serialize;
use tracing::warn;

use crate::aggregate::is_missing;
use crate::daily::{DAY_MARKER, decode_text};

/// Data-status lines of the "v2" export format. Files predating the
/// status line go straight from the day marker to the header.
pub const KNOWN_STATUSES: [&str; 3] = [
    "Données temps réel",
    "Données consolidées",
    "Données définitives",
];

/// First file at which a surveyed value changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftPoint {
    pub file: String,
    pub value: String,
}

#[derive(Debug, Default, Serialize)]
pub struct SurveyReport {
    pub file_count: usize,
    pub skipped: usize,
    pub first_file: Option<String>,
    pub last_file: Option<String>,
    /// Drift of the data-status line (empty value = no status line).
    pub status_changes: Vec<DriftPoint>,
    /// Drift of the tab-separated header line.
    pub header_changes: Vec<DriftPoint>,
    /// Every label seen in any header, sorted.
    pub labels: Vec<String>,
    /// Drift of which labels carry data on the first data line.
    pub availability_changes: Vec<DriftPoint>,
}

fn record_drift(changes: &mut Vec<DriftPoint>, file: &str, value: String) {
    if changes.last().map(|p| p.value.as_str()) != Some(value.as_str()) {
        changes.push(DriftPoint {
            file: file.to_string(),
            value,
        });
    }
}

/// Surveys every `*.csv` daily file under `data_dir`, in name order.
pub fn survey_dir(data_dir: &Path) -> Result<SurveyReport> {
    let pattern = data_dir.join("*.csv");
    let pattern = pattern.to_string_lossy();
    let mut files: Vec<_> = glob(&pattern)
        .with_context(|| format!("bad survey pattern {pattern}"))?
        .filter_map(Result::ok)
        .collect();
    files.sort();

    let mut report = SurveyReport::default();
    let mut labels: Vec<String> = Vec::new();

    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let bytes = fs::read(path)?;
        let text = decode_text(&bytes);
        let mut lines = text.lines();

        if !lines.next().unwrap_or("").starts_with(DAY_MARKER) {
            warn!(file = %name, "skipping file without day marker");
            report.skipped += 1;
            continue;
        }

        report.file_count += 1;
        if report.first_file.is_none() {
            report.first_file = Some(name.clone());
        }
        report.last_file = Some(name.clone());

        // Line 2 is either the v2 data-status line or already the header.
        let second = lines.next().unwrap_or("").trim_end();
        let (status, header) = if KNOWN_STATUSES.contains(&second) {
            (second, lines.next().unwrap_or("").trim_end())
        } else {
            ("", second)
        };
        record_drift(&mut report.status_changes, &name, status.to_string());
        record_drift(&mut report.header_changes, &name, header.to_string());

        for label in header.split('\t').skip(1) {
            if !labels.iter().any(|l| l == label) {
                labels.push(label.to_string());
            }
        }

        // Which labelled columns actually carry data on the first line.
        let first_data = lines.next().unwrap_or("").trim_end();
        let available: Vec<&str> = header
            .split('\t')
            .skip(1)
            .zip(first_data.split('\t').skip(1))
            .filter(|(_, value)| !is_missing(value))
            .map(|(label, _)| label)
            .collect();
        record_drift(&mut report.availability_changes, &name, available.join("\t"));
    }

    labels.sort();
    report.labels = labels;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("eco2mix_survey_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_survey_detects_header_and_status_drift() {
        let dir = fixture_dir("drift");
        fs::write(
            dir.join("RTE_CO2mix_2011-01-01.csv"),
            "Journée du 01/01/2011\nHeures\tConsommation\tEolien\n00:00\t60000\t\n",
        )
        .unwrap();
        fs::write(
            dir.join("RTE_CO2mix_2013-01-01.csv"),
            "Journée du 01/01/2013\nDonnées temps réel\nHeures\tConsommation\tEolien\n00:00\t61000\t4000\n",
        )
        .unwrap();

        let report = survey_dir(&dir).unwrap();
        assert_eq!(report.file_count, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(
            report.first_file.as_deref(),
            Some("RTE_CO2mix_2011-01-01.csv")
        );
        assert_eq!(
            report.last_file.as_deref(),
            Some("RTE_CO2mix_2013-01-01.csv")
        );

        // Status appears with the 2013 file.
        assert_eq!(report.status_changes.len(), 2);
        assert_eq!(report.status_changes[0].value, "");
        assert_eq!(report.status_changes[1].value, "Données temps réel");

        // Same header in both files: a single drift point.
        assert_eq!(report.header_changes.len(), 1);
        assert_eq!(report.labels, vec!["Consommation", "Eolien"]);

        // Eolien has no data in 2011, data in 2013.
        assert_eq!(report.availability_changes.len(), 2);
        assert_eq!(report.availability_changes[0].value, "Consommation");
        assert_eq!(report.availability_changes[1].value, "Consommation\tEolien");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_survey_skips_invalid_file() {
        let dir = fixture_dir("invalid");
        fs::write(dir.join("RTE_CO2mix_2011-01-01.csv"), "garbage\n").unwrap();
        fs::write(
            dir.join("RTE_CO2mix_2011-01-02.csv"),
            "Journée du 02/01/2011\nHeures\tConsommation\n00:00\t60000\n",
        )
        .unwrap();

        let report = survey_dir(&dir).unwrap();
        assert_eq!(report.file_count, 1);
        assert_eq!(report.skipped, 1);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_survey_empty_dir() {
        let dir = fixture_dir("empty");
        let report = survey_dir(&dir).unwrap();
        assert_eq!(report.file_count, 0);
        assert!(report.first_file.is_none());
        fs::remove_dir_all(&dir).unwrap();
    }
}
