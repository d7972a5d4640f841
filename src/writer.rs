//! Table output for normalized record sets
//!
//! Writes every table into a staging directory inside the output directory
//! and only moves the files into place once all of them have been written,
//! so a failed run never leaves a partial set of tables behind.

use crate::error::{NormalizeError, Result};
use crate::tables::{ColumnKind, Field, Table};

use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::{Column, DataFrame, ParquetCompression, ParquetWriter, PlSmallStr};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values with `t`/`f` booleans, ready for `COPY`
    #[default]
    Csv,
    /// Typed Parquet columns with Snappy compression
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// Writer publishing a complete set of tables into one directory
#[derive(Debug)]
pub struct TableWriter {
    output_dir: PathBuf,
    format: OutputFormat,
    show_progress: bool,
}

impl TableWriter {
    pub fn new(output_dir: PathBuf, format: OutputFormat) -> Self {
        Self {
            output_dir,
            format,
            show_progress: true,
        }
    }

    /// Disable the progress spinner
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn file_name(&self, table: &Table) -> String {
        format!("{}.{}", table.name, self.format.extension())
    }

    /// Write all tables, returning rows written per table name
    pub fn write_all(&self, tables: &[Table]) -> Result<BTreeMap<String, usize>> {
        fs::create_dir_all(&self.output_dir)?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.output_dir)?;

        let progress_bar = if self.show_progress {
            ProgressBar::new(tables.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut written = BTreeMap::new();
        for table in tables {
            progress_bar.set_message(table.name);
            let staged = staging.path().join(self.file_name(table));

            match self.format {
                OutputFormat::Csv => write_csv(table, &staged)?,
                OutputFormat::Parquet => write_parquet(table, &staged)?,
            }

            debug!("Staged {} rows for {}", table.rows.len(), table.name);
            written.insert(table.name.to_string(), table.rows.len());
            progress_bar.inc(1);
        }

        // Each rename is atomic on its own; a failure here may leave mixed output
        for table in tables {
            let file_name = self.file_name(table);
            fs::rename(staging.path().join(&file_name), self.output_dir.join(&file_name))?;
        }

        progress_bar.finish_and_clear();
        Ok(written)
    }
}

fn write_failed(table: &Table, path: &Path, reason: impl ToString) -> NormalizeError {
    NormalizeError::WriteFailed {
        table: table.name.to_string(),
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Write one table as CSV with a header row
fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;

    for row in &table.rows {
        writer.write_record(row.iter().map(Field::render))?;
    }

    writer.flush()?;
    Ok(())
}

/// Convert a table to a typed DataFrame
pub fn to_dataframe(table: &Table) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(table.columns.len());

    for (index, (name, kind)) in table.columns.iter().enumerate() {
        let name = PlSmallStr::from_static(*name);
        let cells = table.rows.iter().map(|row| &row[index]);

        let column = match kind {
            ColumnKind::Text => {
                let values: Vec<Option<String>> = cells
                    .map(|field| match field {
                        Field::Null => None,
                        other => Some(other.render()),
                    })
                    .collect();
                Column::new(name, values)
            }
            ColumnKind::Integer => {
                let values: Vec<Option<i64>> = cells
                    .map(|field| match field {
                        Field::Integer(value) => Some(*value),
                        _ => None,
                    })
                    .collect();
                Column::new(name, values)
            }
            ColumnKind::Boolean => {
                let values: Vec<Option<bool>> = cells
                    .map(|field| match field {
                        Field::Boolean(value) => Some(*value),
                        _ => None,
                    })
                    .collect();
                Column::new(name, values)
            }
        };
        columns.push(column);
    }

    Ok(DataFrame::new(columns)?)
}

/// Write one table as a Snappy-compressed Parquet file
fn write_parquet(table: &Table, path: &Path) -> Result<()> {
    let mut df = to_dataframe(table)?;
    let file = fs::File::create(path)?;

    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Snappy)
        .finish(&mut df)
        .map_err(|e| write_failed(table, path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{FOOD_GROUPS, build_tables};
    use crate::models::{CellStats, DataSource, FoodGroup, NormalizedTables};
    use tempfile::TempDir;
    use uuid::Uuid;

    fn sample_tables() -> Vec<Table> {
        let source_id = Uuid::from_u128(1);
        let normalized = NormalizedTables {
            data_source: DataSource {
                id: source_id,
                title: "食品成分表".to_string(),
                file_name: "table.csv".to_string(),
                publish_date: None,
            },
            food_groups: vec![FoodGroup {
                id: Uuid::from_u128(2),
                data_source_id: source_id,
                group_code: "01".to_string(),
                name_jp: "穀類".to_string(),
                original_sort_order: 1,
            }],
            foods: Vec::new(),
            nutrient_components: Vec::new(),
            food_nutrient_values: Vec::new(),
            value_annotation_defs: Vec::new(),
            raw_snapshots: Vec::new(),
            skipped_rows: 0,
            cell_stats: CellStats::default(),
        };
        build_tables(&normalized, "2024-01-01T00:00:00").unwrap()
    }

    #[test]
    fn test_csv_output_publishes_every_table() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out");
        let writer = TableWriter::new(output.clone(), OutputFormat::Csv).without_progress();

        let written = writer.write_all(&sample_tables()).unwrap();

        assert_eq!(written.len(), 7);
        assert_eq!(written["food_groups"], 1);
        assert_eq!(written["foods"], 0);

        let groups = fs::read_to_string(output.join("food_groups.csv")).unwrap();
        let mut lines = groups.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,data_source_id,group_code,name_jp,original_sort_order,created_at,updated_at"
        );
        assert!(lines.next().unwrap().contains(",01,穀類,1,"));

        // Empty tables still carry their header
        let foods = fs::read_to_string(output.join("foods.csv")).unwrap();
        assert_eq!(foods.lines().count(), 1);

        // Staging directory is gone
        let leftovers: Vec<_> = fs::read_dir(&output)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".staging"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_rerun_replaces_previous_tables() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().to_path_buf();
        fs::write(output.join("food_groups.csv"), "stale\n").unwrap();
        fs::write(output.join("notes.txt"), "keep").unwrap();

        let writer = TableWriter::new(output.clone(), OutputFormat::Csv).without_progress();
        writer.write_all(&sample_tables()).unwrap();

        let groups = fs::read_to_string(output.join("food_groups.csv")).unwrap();
        assert!(groups.starts_with("id,data_source_id,group_code"));
        assert!(!groups.contains("stale"));
        assert_eq!(fs::read_to_string(output.join("notes.txt")).unwrap(), "keep");
    }

    #[test]
    fn test_dataframe_columns_are_typed() {
        let tables = sample_tables();
        let groups = tables.iter().find(|t| t.name == "food_groups").unwrap();

        let df = to_dataframe(groups).unwrap();

        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), FOOD_GROUPS.len());
        assert_eq!(
            df.column("original_sort_order").unwrap().dtype(),
            &polars::prelude::DataType::Int64
        );
        assert_eq!(
            df.column("group_code").unwrap().dtype(),
            &polars::prelude::DataType::String
        );
    }

    #[test]
    fn test_parquet_output() {
        let temp_dir = TempDir::new().unwrap();
        let writer =
            TableWriter::new(temp_dir.path().to_path_buf(), OutputFormat::Parquet).without_progress();

        writer.write_all(&sample_tables()).unwrap();

        let path = temp_dir.path().join("nutrient_components.parquet");
        assert!(path.exists());
        assert!(fs::metadata(path).unwrap().len() > 0);
    }
}
