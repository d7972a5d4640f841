//! Command-line interface components.

use crate::constants;
use crate::models::{HeaderDecomposition, ProcessingStats};
use crate::processor::RunOptions;
use crate::writer::OutputFormat;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "fcnorm")]
#[command(about = "Normalize the Standard Tables of Food Composition CSV into relational tables")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Source CSV file of the food composition table
    #[arg(value_name = "INPUT_CSV")]
    pub input_csv: PathBuf,

    /// Directory receiving the normalized tables
    #[arg(long, default_value = constants::DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Reuse an existing data_sources.id instead of generating one
    #[arg(long)]
    pub data_source_id: Option<Uuid>,

    /// Title recorded in data_sources.title
    #[arg(long, default_value = constants::DEFAULT_DATA_SOURCE_TITLE)]
    pub data_source_title: String,

    /// Override data_sources.file_name (defaults to the input file name)
    #[arg(long)]
    pub file_name: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Character encoding of the input (a leading BOM always wins)
    #[arg(long, default_value = constants::DEFAULT_ENCODING)]
    pub encoding: String,

    /// JSON configuration file overriding layout, lookup tables or cell conventions
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Discovery mode: decompose the header, print the components and exit
    #[arg(long)]
    pub discovery_only: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Per-run options derived from the arguments
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            input_path: self.input_csv.clone(),
            output_dir: self.output_dir.clone(),
            format: self.format,
            encoding: self.encoding.clone(),
            data_source_id: self.data_source_id,
            data_source_title: self.data_source_title.clone(),
            file_name: self.file_name.clone(),
            show_progress: !self.quiet,
        }
    }
}

/// Print the decomposed header as a component table
pub fn print_discovery(header: &HeaderDecomposition) {
    println!("{}", "Header decomposition".bright_green().bold());
    println!(
        "  {} {}  {} {}",
        "Components:".bright_cyan(),
        header.components.len().to_string().bright_white().bold(),
        "Annotation columns:".bright_cyan(),
        header.annotation_columns.len().to_string().bright_white().bold()
    );
    println!();

    for component in &header.components {
        let names: Vec<&str> = [
            Some(component.group_1_name_ja.as_str()),
            component.group_2_name_ja.as_deref(),
            component.group_3_name_ja.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        let annotations = if component.annotation_cols.is_empty() {
            String::new()
        } else {
            format!("  +{:?}", component.annotation_cols)
        };

        println!(
            "  {:>3}. {:>3} {:<14} {:<8} {}{}",
            component.original_sort_order,
            component.column_index,
            component.component_code.bright_yellow(),
            component.unit.as_deref().unwrap_or("-"),
            names.join(" / "),
            annotations.bright_black()
        );
    }
}

/// Print the end-of-run summary
pub fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Output:".bright_cyan(),
        stats.output_path.display()
    );

    let counts = [
        ("Food groups:", stats.food_groups),
        ("Foods:", stats.foods),
        ("Components:", stats.components),
        ("Values:", stats.values),
        ("Symbols:", stats.symbols),
        ("Snapshots:", stats.snapshots),
    ];
    for (label, count) in counts {
        println!(
            "  {} {}",
            label.bright_cyan(),
            count.to_string().bright_white().bold()
        );
    }

    println!(
        "  {} {} numeric, {} trace, {} missing, {} parenthetical, {} annotated",
        "Cells:".bright_cyan(),
        stats.cells.numeric,
        stats.cells.trace,
        stats.cells.missing,
        stats.cells.parenthetical,
        stats.cells.annotated
    );

    if stats.skipped_rows > 0 {
        println!(
            "  {} {}",
            "Rows skipped:".bright_yellow(),
            stats.skipped_rows.to_string().bright_yellow()
        );
    }
    if stats.cells.malformed > 0 {
        println!(
            "  {} {} (treated as missing, kept verbatim in raw_snapshots)",
            "Malformed cells:".bright_red(),
            stats.cells.malformed.to_string().bright_red().bold()
        );
    }
}
