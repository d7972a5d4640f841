//! Flattening of normalized record sets into output tables.
//!
//! Each record set becomes a [`Table`]: a fixed, ordered column list with a
//! declared kind per column and one row of [`Field`]s per record. The writer
//! renders the same table as CSV or Parquet.

use crate::error::Result;
use crate::models::NormalizedTables;
use uuid::Uuid;

/// Output column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Boolean,
}

/// A single output value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Null,
}

impl Field {
    fn id(id: Uuid) -> Self {
        Field::Text(id.to_string())
    }

    fn optional_id(id: Option<Uuid>) -> Self {
        id.map(Field::id).unwrap_or(Field::Null)
    }

    fn text(value: &str) -> Self {
        Field::Text(value.to_string())
    }

    fn optional_text(value: Option<&str>) -> Self {
        value.map(Field::text).unwrap_or(Field::Null)
    }

    fn order(value: usize) -> Self {
        Field::Integer(value as i64)
    }

    /// Text form used by the CSV writer
    pub fn render(&self) -> String {
        match self {
            Field::Text(text) => text.clone(),
            Field::Integer(value) => value.to_string(),
            Field::Boolean(true) => "t".to_string(),
            Field::Boolean(false) => "f".to_string(),
            Field::Null => String::new(),
        }
    }
}

/// One output table ready to be serialized
#[derive(Debug, Clone)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [(&'static str, ColumnKind)],
    pub rows: Vec<Vec<Field>>,
}

impl Table {
    fn new(name: &'static str, columns: &'static [(&'static str, ColumnKind)]) -> Self {
        Self {
            name,
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row followed by the `created_at` / `updated_at` stamps
    fn push(&mut self, mut row: Vec<Field>, stamped_at: &str) {
        row.push(Field::text(stamped_at));
        row.push(Field::text(stamped_at));
        debug_assert_eq!(row.len(), self.columns.len(), "row width for {}", self.name);
        self.rows.push(row);
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(name, _)| *name)
    }
}

use ColumnKind::{Boolean, Integer, Text};

pub const DATA_SOURCES: &[(&str, ColumnKind)] = &[
    ("id", Text),
    ("title", Text),
    ("file_name", Text),
    ("publish_date", Text),
    ("created_at", Text),
    ("updated_at", Text),
];

pub const FOOD_GROUPS: &[(&str, ColumnKind)] = &[
    ("id", Text),
    ("data_source_id", Text),
    ("group_code", Text),
    ("name_jp", Text),
    ("original_sort_order", Integer),
    ("created_at", Text),
    ("updated_at", Text),
];

pub const FOODS: &[(&str, ColumnKind)] = &[
    ("id", Text),
    ("data_source_id", Text),
    ("food_code", Text),
    ("index_code", Text),
    ("group_id", Text),
    ("name_jp", Text),
    ("waste_rate", Text),
    ("remarks", Text),
    ("created_at", Text),
    ("updated_at", Text),
];

pub const NUTRIENT_COMPONENTS: &[(&str, ColumnKind)] = &[
    ("id", Text),
    ("data_source_id", Text),
    ("component_code", Text),
    ("group_1_name_ja", Text),
    ("group_2_name_ja", Text),
    ("group_3_name_ja", Text),
    ("unit", Text),
    ("category", Text),
    ("has_flag", Boolean),
    ("original_sort_order", Integer),
    ("note", Text),
    ("created_at", Text),
    ("updated_at", Text),
];

pub const FOOD_NUTRIENT_VALUES: &[(&str, ColumnKind)] = &[
    ("id", Text),
    ("data_source_id", Text),
    ("food_id", Text),
    ("component_id", Text),
    ("value_numeric", Text),
    ("value_raw", Text),
    ("value_annotation_id", Text),
    ("in_parentheses", Boolean),
    ("is_tr", Boolean),
    ("is_missing", Boolean),
    ("created_at", Text),
    ("updated_at", Text),
];

pub const VALUE_ANNOTATION_DEFS: &[(&str, ColumnKind)] = &[
    ("id", Text),
    ("data_source_id", Text),
    ("symbol", Text),
    ("meaning", Text),
    ("note", Text),
    ("created_at", Text),
    ("updated_at", Text),
];

pub const RAW_SNAPSHOTS: &[(&str, ColumnKind)] = &[
    ("id", Text),
    ("data_source_id", Text),
    ("food_id", Text),
    ("payload", Text),
    ("created_at", Text),
    ("updated_at", Text),
];

/// Flatten every record set, stamping rows with `stamped_at`
pub fn build_tables(normalized: &NormalizedTables, stamped_at: &str) -> Result<Vec<Table>> {
    let source = &normalized.data_source;
    let mut data_sources = Table::new("data_sources", DATA_SOURCES);
    data_sources.push(
        vec![
            Field::id(source.id),
            Field::text(&source.title),
            Field::text(&source.file_name),
            source
                .publish_date
                .map(|date| Field::Text(date.format("%Y-%m-%d").to_string()))
                .unwrap_or(Field::Null),
        ],
        stamped_at,
    );

    let mut food_groups = Table::new("food_groups", FOOD_GROUPS);
    for group in &normalized.food_groups {
        food_groups.push(
            vec![
                Field::id(group.id),
                Field::id(group.data_source_id),
                Field::text(&group.group_code),
                Field::text(&group.name_jp),
                Field::order(group.original_sort_order),
            ],
            stamped_at,
        );
    }

    let mut foods = Table::new("foods", FOODS);
    for food in &normalized.foods {
        foods.push(
            vec![
                Field::id(food.id),
                Field::id(food.data_source_id),
                Field::text(&food.food_code),
                Field::text(&food.index_code),
                Field::optional_id(food.group_id),
                Field::text(&food.name_jp),
                Field::text(&food.waste_rate),
                Field::text(&food.remarks),
            ],
            stamped_at,
        );
    }

    let mut components = Table::new("nutrient_components", NUTRIENT_COMPONENTS);
    for component in &normalized.nutrient_components {
        components.push(
            vec![
                Field::id(component.id),
                Field::id(component.data_source_id),
                Field::text(&component.component_code),
                Field::text(&component.group_1_name_ja),
                Field::optional_text(component.group_2_name_ja.as_deref()),
                Field::optional_text(component.group_3_name_ja.as_deref()),
                Field::optional_text(component.unit.as_deref()),
                Field::text(&component.category),
                Field::Boolean(component.has_flag),
                Field::order(component.original_sort_order),
                Field::text(&component.note),
            ],
            stamped_at,
        );
    }

    let mut values = Table::new("food_nutrient_values", FOOD_NUTRIENT_VALUES);
    for value in &normalized.food_nutrient_values {
        values.push(
            vec![
                Field::id(value.id),
                Field::id(value.data_source_id),
                Field::id(value.food_id),
                Field::id(value.component_id),
                Field::optional_text(value.value_numeric.as_deref()),
                Field::text(&value.value_raw),
                Field::optional_id(value.value_annotation_id),
                Field::Boolean(value.in_parentheses),
                Field::Boolean(value.is_tr),
                Field::Boolean(value.is_missing),
            ],
            stamped_at,
        );
    }

    let mut symbols = Table::new("value_annotation_defs", VALUE_ANNOTATION_DEFS);
    for def in &normalized.value_annotation_defs {
        symbols.push(
            vec![
                Field::id(def.id),
                Field::id(def.data_source_id),
                Field::text(&def.symbol),
                Field::text(&def.meaning),
                Field::text(&def.note),
            ],
            stamped_at,
        );
    }

    let mut snapshots = Table::new("raw_snapshots", RAW_SNAPSHOTS);
    for snapshot in &normalized.raw_snapshots {
        snapshots.push(
            vec![
                Field::id(snapshot.id),
                Field::id(snapshot.data_source_id),
                Field::id(snapshot.food_id),
                Field::Text(serde_json::to_string(&snapshot.payload)?),
            ],
            stamped_at,
        );
    }

    Ok(vec![
        data_sources,
        food_groups,
        foods,
        components,
        values,
        symbols,
        snapshots,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellStats, DataSource, FoodNutrientValue};

    fn minimal(values: Vec<FoodNutrientValue>) -> NormalizedTables {
        NormalizedTables {
            data_source: DataSource {
                id: Uuid::from_u128(1),
                title: "title".to_string(),
                file_name: "table.csv".to_string(),
                publish_date: chrono::NaiveDate::from_ymd_opt(2023, 4, 28),
            },
            food_groups: Vec::new(),
            foods: Vec::new(),
            nutrient_components: Vec::new(),
            food_nutrient_values: values,
            value_annotation_defs: Vec::new(),
            raw_snapshots: Vec::new(),
            skipped_rows: 0,
            cell_stats: CellStats::default(),
        }
    }

    #[test]
    fn test_field_rendering() {
        assert_eq!(Field::Boolean(true).render(), "t");
        assert_eq!(Field::Boolean(false).render(), "f");
        assert_eq!(Field::Null.render(), "");
        assert_eq!(Field::Integer(7).render(), "7");
    }

    #[test]
    fn test_tables_have_fixed_order_and_timestamps() {
        let tables = build_tables(&minimal(Vec::new()), "2024-01-01T00:00:00").unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name).collect();

        assert_eq!(
            names,
            vec![
                "data_sources",
                "food_groups",
                "foods",
                "nutrient_components",
                "food_nutrient_values",
                "value_annotation_defs",
                "raw_snapshots",
            ]
        );

        let source_row = &tables[0].rows[0];
        assert_eq!(source_row[3], Field::Text("2023-04-28".to_string()));
        assert_eq!(source_row[4], Field::Text("2024-01-01T00:00:00".to_string()));
        assert_eq!(source_row[5], Field::Text("2024-01-01T00:00:00".to_string()));
        assert!(tables[4].rows.is_empty());
    }

    #[test]
    fn test_value_row_layout() {
        let value = FoodNutrientValue {
            id: Uuid::from_u128(10),
            data_source_id: Uuid::from_u128(1),
            food_id: Uuid::from_u128(2),
            component_id: Uuid::from_u128(3),
            value_numeric: None,
            value_raw: "-".to_string(),
            value_annotation_id: None,
            in_parentheses: false,
            is_tr: false,
            is_missing: true,
        };

        let tables = build_tables(&minimal(vec![value]), "stamp").unwrap();
        let row = &tables[4].rows[0];

        assert_eq!(row.len(), FOOD_NUTRIENT_VALUES.len());
        assert_eq!(row[4], Field::Null);
        assert_eq!(row[5], Field::Text("-".to_string()));
        assert_eq!(row[6], Field::Null);
        assert_eq!(row[9], Field::Boolean(true));
    }
}
