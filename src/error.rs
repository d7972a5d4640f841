//! Error handling for food composition normalization.
//!
//! Only structural problems surface here: a broken header block, an
//! unresolvable component code, unreadable input or unwritable output.
//! Data-quality problems inside individual cells never become errors; the
//! cell parser degrades them to a documented fallback classification.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Input table is empty: {path}")]
    EmptyInput { path: PathBuf },

    #[error("Unknown character encoding label: {label}")]
    UnknownEncoding { label: String },

    #[error("Invalid header block: {reason}")]
    HeaderShape { reason: String },

    #[error(
        "Cannot resolve component code for column {column}: ({level_1}, {level_2_or_3})"
    )]
    UnresolvedComponentCode {
        column: usize,
        level_1: String,
        level_2_or_3: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Failed to write table '{table}' to {path}: {reason}")]
    WriteFailed {
        table: String,
        path: PathBuf,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, NormalizeError>;
