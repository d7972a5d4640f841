//! Core data structures for food composition normalization.
//!
//! Defines the column descriptors produced by header decomposition, the
//! typed cell values produced by the cell parser, and the seven record sets
//! produced by the entity assembler.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Metadata for one nutrient/data column of the source table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub column_index: usize,
    pub component_code: String,
    pub group_1_name_ja: String,
    pub group_2_name_ja: Option<String>,
    pub group_3_name_ja: Option<String>,
    pub unit: Option<String>,
    pub category: String,
    pub original_sort_order: usize,
    /// Annotation-only columns hosting footnote marks for this component
    pub annotation_cols: Vec<usize>,
    /// Set by the assembler when any food row carries the inline glyph here
    pub has_inline_flag: bool,
}

/// Result of decomposing the header block
#[derive(Debug, Clone, Default)]
pub struct HeaderDecomposition {
    pub components: Vec<ColumnDescriptor>,
    pub annotation_columns: Vec<usize>,
}

/// Typed interpretation of one raw data cell
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCell {
    pub numeric: Option<Decimal>,
    pub in_parentheses: bool,
    pub is_trace: bool,
    pub is_missing: bool,
    pub inline_symbol: Option<String>,
    pub original_text: String,
    /// Non-blank text that was neither a marker nor a number
    pub malformed: bool,
}

/// One ingested edition of the reference table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub id: Uuid,
    pub title: String,
    pub file_name: String,
    pub publish_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodGroup {
    pub id: Uuid,
    pub data_source_id: Uuid,
    pub group_code: String,
    pub name_jp: String,
    pub original_sort_order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Food {
    pub id: Uuid,
    pub data_source_id: Uuid,
    pub food_code: String,
    pub index_code: String,
    pub group_id: Option<Uuid>,
    pub name_jp: String,
    pub waste_rate: String,
    pub remarks: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NutrientComponent {
    pub id: Uuid,
    pub data_source_id: Uuid,
    pub component_code: String,
    pub group_1_name_ja: String,
    pub group_2_name_ja: Option<String>,
    pub group_3_name_ja: Option<String>,
    pub unit: Option<String>,
    pub category: String,
    pub has_flag: bool,
    pub original_sort_order: usize,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodNutrientValue {
    pub id: Uuid,
    pub data_source_id: Uuid,
    pub food_id: Uuid,
    pub component_id: Uuid,
    /// Canonical decimal text, `None` when no numeric value
    pub value_numeric: Option<String>,
    pub value_raw: String,
    pub value_annotation_id: Option<Uuid>,
    pub in_parentheses: bool,
    pub is_tr: bool,
    pub is_missing: bool,
}

/// A deduplicated footnote symbol and its meaning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueAnnotationDef {
    pub id: Uuid,
    pub data_source_id: Uuid,
    pub symbol: String,
    pub meaning: String,
    pub note: String,
}

/// Verbatim copy of a food row, independent of parsing decisions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotPayload {
    pub food_group_code: String,
    pub food_code: String,
    pub index_code: String,
    pub food_name: String,
    pub waste_rate_raw: String,
    pub values: serde_json::Map<String, serde_json::Value>,
    pub annotations: serde_json::Map<String, serde_json::Value>,
    pub remarks: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSnapshot {
    pub id: Uuid,
    pub data_source_id: Uuid,
    pub food_id: Uuid,
    pub payload: SnapshotPayload,
}

/// Per-cell classification counts gathered while assembling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellStats {
    pub numeric: usize,
    pub trace: usize,
    pub missing: usize,
    pub parenthetical: usize,
    pub malformed: usize,
    pub annotated: usize,
}

/// All record sets produced by one run
#[derive(Debug, Clone)]
pub struct NormalizedTables {
    pub data_source: DataSource,
    pub food_groups: Vec<FoodGroup>,
    pub foods: Vec<Food>,
    pub nutrient_components: Vec<NutrientComponent>,
    pub food_nutrient_values: Vec<FoodNutrientValue>,
    pub value_annotation_defs: Vec<ValueAnnotationDef>,
    pub raw_snapshots: Vec<RawSnapshot>,
    pub skipped_rows: usize,
    pub cell_stats: CellStats,
}

/// Processing statistics reported at the end of a run
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub food_groups: usize,
    pub foods: usize,
    pub components: usize,
    pub values: usize,
    pub symbols: usize,
    pub snapshots: usize,
    pub skipped_rows: usize,
    pub cells: CellStats,
    pub tables_written: BTreeMap<String, usize>,
    pub output_path: std::path::PathBuf,
    pub processing_time_ms: u128,
}

impl ProcessingStats {
    pub fn from_tables(tables: &NormalizedTables) -> Self {
        Self {
            food_groups: tables.food_groups.len(),
            foods: tables.foods.len(),
            components: tables.nutrient_components.len(),
            values: tables.food_nutrient_values.len(),
            symbols: tables.value_annotation_defs.len(),
            snapshots: tables.raw_snapshots.len(),
            skipped_rows: tables.skipped_rows,
            cells: tables.cell_stats.clone(),
            ..Default::default()
        }
    }
}
