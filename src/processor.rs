//! Main processing engine.
//!
//! Orchestrates one normalization run: load and decode the source table,
//! decompose its header, assemble the record sets, flatten them into tables
//! and publish them through the [`TableWriter`]. Any structural failure
//! aborts before the writer publishes anything.

use crate::assembler::{EntityAssembler, SourceInfo};
use crate::cell_parser::CellParser;
use crate::config::NormalizerConfig;
use crate::constants;
use crate::error::{NormalizeError, Result};
use crate::header::decompose_header;
use crate::ids::{IdGenerator, RandomIdGenerator};
use crate::models::{HeaderDecomposition, NormalizedTables, ProcessingStats};
use crate::reader::{Rows, extract_publish_date, load_rows};
use crate::tables::build_tables;
use crate::writer::{OutputFormat, TableWriter};

use chrono::Utc;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Per-run options, mostly coming from the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub encoding: String,
    pub data_source_id: Option<Uuid>,
    pub data_source_title: String,
    /// Overrides the input file name recorded on the data source
    pub file_name: Option<String>,
    pub show_progress: bool,
}

impl RunOptions {
    pub fn new(input_path: PathBuf) -> Self {
        Self {
            input_path,
            output_dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            format: OutputFormat::default(),
            encoding: constants::DEFAULT_ENCODING.to_string(),
            data_source_id: None,
            data_source_title: constants::DEFAULT_DATA_SOURCE_TITLE.to_string(),
            file_name: None,
            show_progress: true,
        }
    }

    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_data_source_id(mut self, id: Uuid) -> Self {
        self.data_source_id = Some(id);
        self
    }

    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Name recorded in `data_sources.file_name`
    pub fn effective_file_name(&self) -> String {
        self.file_name.clone().unwrap_or_else(|| {
            self.input_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }
}

/// Processor for one source table
#[derive(Debug)]
pub struct TableProcessor {
    config: NormalizerConfig,
    options: RunOptions,
    parser: CellParser,
}

impl TableProcessor {
    pub fn new(config: NormalizerConfig, options: RunOptions) -> Result<Self> {
        config.validate()?;
        let parser = CellParser::new(&config.cells);

        Ok(Self {
            config,
            options,
            parser,
        })
    }

    /// Read the source table, rejecting an empty file
    pub fn load(&self) -> Result<Rows> {
        let rows = load_rows(&self.options.input_path, &self.options.encoding)?;
        if rows.is_empty() {
            return Err(NormalizeError::EmptyInput {
                path: self.options.input_path.clone(),
            });
        }

        info!(
            "Loaded {} rows from {}",
            rows.len(),
            self.options.input_path.display()
        );
        Ok(rows)
    }

    pub fn decompose(&self, rows: &Rows) -> Result<HeaderDecomposition> {
        decompose_header(rows, &self.config.layout, &self.config.lookups)
    }

    /// Decompose and assemble every record set without writing anything
    pub fn normalize<G: IdGenerator>(&self, rows: &Rows, ids: G) -> Result<NormalizedTables> {
        let mut header = self.decompose(rows)?;
        let publish_date = rows.first().and_then(|row| extract_publish_date(row));
        debug!("Publish date: {:?}", publish_date);

        let source = SourceInfo {
            id: self.options.data_source_id,
            title: self.options.data_source_title.clone(),
            file_name: self.options.effective_file_name(),
            publish_date,
        };

        let assembler =
            EntityAssembler::new(&self.config.layout, &self.config.lookups, &self.parser, ids);
        Ok(assembler.assemble(rows, &mut header.components, source))
    }

    /// Run the full pipeline with random identifiers
    pub fn run(&self) -> Result<ProcessingStats> {
        self.run_with_ids(RandomIdGenerator)
    }

    /// Run the full pipeline with the given identifier source
    pub fn run_with_ids<G: IdGenerator>(&self, ids: G) -> Result<ProcessingStats> {
        let start_time = Instant::now();

        let rows = self.load()?;
        let normalized = self.normalize(&rows, ids)?;

        let stamped_at = Utc::now()
            .naive_utc()
            .format(constants::TIMESTAMP_FORMAT)
            .to_string();
        let tables = build_tables(&normalized, &stamped_at)?;

        let mut writer = TableWriter::new(self.options.output_dir.clone(), self.options.format);
        if !self.options.show_progress {
            writer = writer.without_progress();
        }
        let tables_written = writer.write_all(&tables)?;

        info!(
            "Wrote {} tables to {}",
            tables_written.len(),
            self.options.output_dir.display()
        );

        Ok(ProcessingStats {
            tables_written,
            output_path: self.options.output_dir.clone(),
            processing_time_ms: start_time.elapsed().as_millis(),
            ..ProcessingStats::from_tables(&normalized)
        })
    }
}
