//! CSV loading and load-time schema validation.
//!
//! The dataset is read once at startup and never mutated afterwards; callers
//! share it behind an `Arc`.

use crate::error::{DashboardError, Result};
use crate::types::{Feedback, Record, BRAZIL_STATES};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// Immutable, validated set of records.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    regions: BTreeSet<String>,
    first_date: NaiveDate,
    last_date: NaiveDate,
}

impl Dataset {
    /// Load and validate the CSV file at `path`.
    pub fn load(path: &Path, strict_vocabulary: bool) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            DashboardError::Config(format!("cannot open dataset {}: {}", path.display(), e))
        })?;
        let dataset = Self::from_reader(file, strict_vocabulary)?;
        tracing::info!(
            path = %path.display(),
            records = dataset.len(),
            regions = dataset.regions.len(),
            "Loaded dataset ({} to {})",
            dataset.first_date,
            dataset.last_date,
        );
        Ok(dataset)
    }

    /// Parse CSV data from any reader. Header and field whitespace is trimmed.
    pub fn from_reader<R: Read>(reader: R, strict_vocabulary: bool) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let missing: Vec<String> = Record::REQUIRED_COLUMNS
            .iter()
            .filter(|col| !headers.iter().any(|h| h == **col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DashboardError::Schema { missing });
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let record: Record =
                row.deserialize(Some(&headers))
                    .map_err(|e| DashboardError::Row {
                        line,
                        message: e.to_string(),
                    })?;
            validate_metrics(&record, line)?;
            check_vocabulary(&record, line, strict_vocabulary)?;
            records.push(record);
        }

        Self::from_records(records)
    }

    /// Build a dataset from already-typed records.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let first_date = records
            .iter()
            .map(|r| r.date)
            .min()
            .ok_or(DashboardError::EmptyDataset)?;
        let last_date = records
            .iter()
            .map(|r| r.date)
            .max()
            .ok_or(DashboardError::EmptyDataset)?;
        let regions = records.iter().map(|r| r.region.clone()).collect();

        Ok(Self {
            records,
            regions,
            first_date,
            last_date,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest observed dates (bounds of the date picker).
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.first_date, self.last_date)
    }

    /// Distinct region labels, sorted.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(String::as_str)
    }

    /// Feedback labels offered by the filter: the known vocabulary plus any
    /// unknown labels present in the data.
    pub fn feedback_labels(&self) -> Vec<Feedback> {
        let mut labels: Vec<Feedback> = Feedback::KNOWN.to_vec();
        let extra: BTreeSet<&Feedback> = self
            .records
            .iter()
            .map(|r| &r.feedback)
            .filter(|f| !f.is_known())
            .collect();
        labels.extend(extra.into_iter().cloned());
        labels
    }

    /// Every word of every record's word list, in record order.
    pub fn all_words(&self) -> impl Iterator<Item = &str> {
        self.records.iter().flat_map(|r| r.words())
    }
}

fn validate_metrics(record: &Record, line: u64) -> Result<()> {
    for (column, value) in record.float_metrics() {
        if !value.is_finite() || value < 0.0 {
            return Err(DashboardError::Row {
                line,
                message: format!("{} must be a non-negative number, got {}", column, value),
            });
        }
    }
    Ok(())
}

fn check_vocabulary(record: &Record, line: u64, strict: bool) -> Result<()> {
    if !record.feedback.is_known() {
        if strict {
            return Err(DashboardError::Vocabulary {
                kind: "feedback",
                label: record.feedback.to_string(),
                line,
            });
        }
        tracing::warn!(line, label = %record.feedback, "Unknown feedback label");
    }

    if !BRAZIL_STATES.contains(&record.region.as_str()) {
        if strict {
            return Err(DashboardError::Vocabulary {
                kind: "region",
                label: record.region.clone(),
                line,
            });
        }
        tracing::warn!(line, label = %record.region, "Region not in the map vocabulary");
    }

    Ok(())
}
