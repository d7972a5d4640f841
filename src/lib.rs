//! Food Composition Normalizer Library
//!
//! Converts the Standard Tables of Food Composition in Japan, distributed as
//! one CSV with an irregular, hierarchically merged twelve-row header, into
//! normalized, foreign-key-linked tables for bulk loading into a relational
//! store.
//!
//! This library provides tools for:
//! - Decomposing the merged header block into per-column component metadata
//! - Classifying header-less annotation columns and attaching them to their
//!   neighbouring component
//! - Parsing data cells into exact decimals, trace and missing markers,
//!   estimated-value flags and footnote symbols
//! - Assembling groups, foods, components, values, symbol definitions and
//!   raw audit snapshots with stable identifier allocation order
//! - Publishing the tables as CSV or Parquet through a staging directory

pub mod assembler;
pub mod cell_parser;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod header;
pub mod ids;
pub mod models;
pub mod processor;
pub mod reader;
pub mod tables;
pub mod writer;

// Re-export commonly used types
pub use assembler::{EntityAssembler, SourceInfo};
pub use cell_parser::CellParser;
pub use config::NormalizerConfig;
pub use error::{NormalizeError, Result};
pub use header::decompose_header;
pub use ids::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use models::{ColumnDescriptor, NormalizedTables, ParsedCell, ProcessingStats};
pub use processor::{RunOptions, TableProcessor};
pub use writer::OutputFormat;
