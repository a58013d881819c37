//! Canonical column ordering and header reconciliation.
//!
//! Daily files name the same quantities in varying header orders depending
//! on the file's era. The canonical order fixes where each labelled series
//! lands in the aggregated output, independent of any single day's header.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;

use crate::error::{AggregateError, AggregateResult};

/// Target ordering of the value columns in the aggregated output.
///
/// Every label appearing in any daily file's header must be a member of
/// this set; an unknown label is a fatal input error. The order is an
/// explicit configuration value so that format evolution (new energy
/// sources appearing over the years) is a configuration change.
#[derive(Debug, Clone)]
pub struct ColumnOrder {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl ColumnOrder {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self { labels, index }
    }

    /// The column order of the RTE éCO2mix daily exports: consumption, the
    /// two consumption forecasts, per-source generation, CO2 intensity and
    /// the cross-border balance.
    pub fn rte_default() -> Self {
        Self::new([
            "Consommation",
            "PrévisionJ-1",
            "PrévisionJ",
            "Nucléaire",
            "Gaz",
            "Charbon",
            "Fioul + pointe",
            "Hydraulique",
            "Eolien",
            "Autres",
            "Co2",
            "Solde",
        ])
    }

    /// Loads a column order from a JSON array of label strings.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read column order file {}", path.display()))?;
        let labels: Vec<String> = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a JSON array of labels", path.display()))?;
        anyhow::ensure!(!labels.is_empty(), "column order file {} is empty", path.display());
        Ok(Self::new(labels))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Header line of the aggregated output file.
    pub fn header_line(&self) -> String {
        let mut line = String::from("Timestamp");
        for label in &self.labels {
            line.push(',');
            line.push_str(label);
        }
        line
    }

    /// Maps a daily file's header labels onto canonical positions.
    ///
    /// Returns, for each source column in file order, the target index in
    /// the canonical order. Fails with [`AggregateError::UnknownColumnLabel`]
    /// on any label outside the canonical set.
    pub fn reconcile<S: AsRef<str>>(
        &self,
        header: &[S],
        day: NaiveDate,
    ) -> AggregateResult<Vec<usize>> {
        header
            .iter()
            .map(|label| {
                let label = label.as_ref();
                self.position(label)
                    .ok_or_else(|| AggregateError::UnknownColumnLabel {
                        label: label.to_string(),
                        day,
                    })
            })
            .collect()
    }
}
