use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema mismatch: missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Invalid row at line {line}: {message}")]
    Row { line: u64, message: String },

    #[error("Unknown {kind} label at line {line}: {label:?}")]
    Vocabulary {
        kind: &'static str,
        label: String,
        line: u64,
    },

    #[error("Dataset contains no records")]
    EmptyDataset,

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
