// Structural failures that stop a dashboard session.
//
// Bad individual cells never end up here; the loader coerces them to
// missing values and only counts them.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("data file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown text encoding label: {label}")]
    UnknownEncoding { label: String },

    #[error("{origin} is not valid {encoding} text")]
    Decode { origin: String, encoding: String },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("required columns missing after renaming: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("text cannot be represented in {encoding}")]
    Encode { encoding: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, DashboardError>;
