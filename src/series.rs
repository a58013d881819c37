//! In-memory view of an aggregated series file for analysis.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;

/// An aggregated series loaded column-wise: one `f64` vector per labelled
/// column, with `NaN` standing in for the placeholder token.
#[derive(Debug)]
pub struct Series {
    pub timestamps: Vec<NaiveDateTime>,
    labels: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Series {
    /// Reads an aggregated CSV (`Timestamp,<labels...>` header) produced by
    /// the aggregator. `placeholder` cells load as `NaN`.
    pub fn from_csv(path: &Path, placeholder: &str) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open series file {}", path.display()))?;
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

        let headers = reader.headers()?.clone();
        if headers.get(0) != Some("Timestamp") {
            bail!("{} is not an aggregated series file", path.display());
        }
        let labels: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut timestamps = Vec::new();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];
        for record in reader.records() {
            let record = record?;
            let stamp = record.get(0).unwrap_or("");
            let stamp = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S")
                .with_context(|| format!("bad timestamp {stamp:?} in {}", path.display()))?;
            timestamps.push(stamp);

            for (column, cell) in columns.iter_mut().zip(record.iter().skip(1)) {
                let value = if cell == placeholder {
                    f64::NAN
                } else {
                    cell.parse::<f64>()
                        .with_context(|| format!("bad value {cell:?} at {stamp}"))?
                };
                column.push(value);
            }
        }

        Ok(Self {
            timestamps,
            labels,
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn column(&self, label: &str) -> Option<&[f64]> {
        let idx = self.labels.iter().position(|l| l == label)?;
        Some(&self.columns[idx])
    }

    /// A column scaled by `factor` (for the MW → GW unit change in the
    /// analysis plots). Fails when the label is absent from the file.
    pub fn column_scaled(&self, label: &str, factor: f64) -> Result<Vec<f64>> {
        let column = self
            .column(label)
            .with_context(|| format!("series file has no column {label:?}"))?;
        Ok(column.iter().map(|v| v * factor).collect())
    }
}
