//! Entity assembly from the decoded row matrix.
//!
//! Walks the data rows once, after group discovery, and emits every record
//! set with identifiers drawn from an [`IdGenerator`] in a fixed order:
//! data source, groups, components, then per food row the food, its
//! snapshot and its values, with symbol definitions allocated the first
//! time each symbol text is seen.

use crate::cell_parser::{CellParser, canonical_decimal};
use crate::config::{HeaderLayout, LookupTables};
use crate::ids::IdGenerator;
use crate::models::{
    CellStats, ColumnDescriptor, DataSource, Food, FoodGroup, FoodNutrientValue,
    NormalizedTables, NutrientComponent, ParsedCell, RawSnapshot, SnapshotPayload,
    ValueAnnotationDef,
};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Descriptive fields of the data source being ingested
#[derive(Debug, Clone, Default)]
pub struct SourceInfo {
    /// Reuse an existing `data_sources.id` instead of allocating one
    pub id: Option<Uuid>,
    pub title: String,
    pub file_name: String,
    pub publish_date: Option<NaiveDate>,
}

/// Builds the normalized record sets for one run
pub struct EntityAssembler<'a, G: IdGenerator> {
    layout: &'a HeaderLayout,
    lookups: &'a LookupTables,
    parser: &'a CellParser,
    ids: G,
    /// Symbol text to allocated definition id, scoped to this run
    symbol_ids: HashMap<String, Uuid>,
    symbol_defs: Vec<ValueAnnotationDef>,
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|value| value.trim()).unwrap_or("")
}

impl<'a, G: IdGenerator> EntityAssembler<'a, G> {
    pub fn new(
        layout: &'a HeaderLayout,
        lookups: &'a LookupTables,
        parser: &'a CellParser,
        ids: G,
    ) -> Self {
        Self {
            layout,
            lookups,
            parser,
            ids,
            symbol_ids: HashMap::new(),
            symbol_defs: Vec::new(),
        }
    }

    /// Whether a row after the header block describes a food
    fn is_food_row(&self, row: &[String]) -> bool {
        !cell(row, self.layout.food_code_column).is_empty()
    }

    /// Symbol definition id for `symbol`, allocated on first sight
    fn symbol_id(&mut self, symbol: &str, data_source_id: Uuid) -> Uuid {
        if let Some(id) = self.symbol_ids.get(symbol) {
            return *id;
        }

        if !self.lookups.is_known_symbol(symbol) {
            warn!("Unknown annotation symbol '{}'; using generic meaning", symbol);
        }

        let id = self.ids.next_id();
        self.symbol_ids.insert(symbol.to_string(), id);
        self.symbol_defs.push(ValueAnnotationDef {
            id,
            data_source_id,
            symbol: symbol.to_string(),
            meaning: self.lookups.symbol_meaning(symbol).to_string(),
            note: String::new(),
        });
        id
    }

    /// Produce every record set from the row matrix
    ///
    /// Marks `has_inline_flag` on each descriptor whose cells carry the
    /// inline footnote glyph in any food row.
    pub fn assemble(
        mut self,
        rows: &[Vec<String>],
        components: &mut [ColumnDescriptor],
        source: SourceInfo,
    ) -> NormalizedTables {
        let data_source = DataSource {
            id: source.id.unwrap_or_else(|| self.ids.next_id()),
            title: source.title,
            file_name: source.file_name,
            publish_date: source.publish_date,
        };
        let data_source_id = data_source.id;

        let body = rows.get(self.layout.header_rows..).unwrap_or(&[]);
        let food_rows: Vec<&Vec<String>> =
            body.iter().filter(|row| self.is_food_row(row)).collect();
        let skipped_rows = body.len() - food_rows.len();

        let food_groups = self.discover_groups(&food_rows, data_source_id);
        let group_ids: HashMap<&str, Uuid> = food_groups
            .iter()
            .map(|group| (group.group_code.as_str(), group.id))
            .collect();

        let component_ids: Vec<Uuid> = components.iter().map(|_| self.ids.next_id()).collect();

        let mut foods = Vec::with_capacity(food_rows.len());
        let mut raw_snapshots = Vec::with_capacity(food_rows.len());
        let mut values = Vec::with_capacity(food_rows.len() * components.len());
        let mut cell_stats = CellStats::default();

        for row in food_rows {
            let group_code = cell(row, self.layout.group_code_column);
            let group_id = group_ids.get(group_code).copied();
            let food_code = cell(row, self.layout.food_code_column);
            if group_id.is_none() {
                warn!("Food {} has no group code", food_code);
            }

            let food = Food {
                id: self.ids.next_id(),
                data_source_id,
                food_code: food_code.to_string(),
                index_code: cell(row, self.layout.index_code_column).to_string(),
                group_id,
                name_jp: cell(row, self.layout.food_name_column).to_string(),
                waste_rate: cell(row, self.layout.waste_rate_column).to_string(),
                remarks: cell(row, self.layout.remarks_column).to_string(),
            };

            raw_snapshots.push(RawSnapshot {
                id: self.ids.next_id(),
                data_source_id,
                food_id: food.id,
                payload: self.snapshot_payload(row, components, &food),
            });

            for (position, component) in components.iter_mut().enumerate() {
                let parsed = self.parser.parse(cell(row, component.column_index));

                if parsed.inline_symbol.is_some() {
                    component.has_inline_flag = true;
                }
                if parsed.malformed {
                    debug!(
                        "Food {} column {}: '{}' is not a number; treated as missing",
                        food.food_code, component.column_index, parsed.original_text
                    );
                }

                // A dedicated annotation column wins over an inline symbol
                let symbol = component
                    .annotation_cols
                    .iter()
                    .map(|&index| cell(row, index))
                    .find(|text| !text.is_empty())
                    .map(str::to_string)
                    .or(parsed.inline_symbol.clone());
                let value_annotation_id = symbol
                    .as_deref()
                    .map(|symbol| self.symbol_id(symbol, data_source_id));

                cell_stats.record(&parsed, value_annotation_id.is_some());

                values.push(FoodNutrientValue {
                    id: self.ids.next_id(),
                    data_source_id,
                    food_id: food.id,
                    component_id: component_ids[position],
                    value_numeric: parsed.numeric.as_ref().map(canonical_decimal),
                    value_raw: parsed.original_text.trim().to_string(),
                    value_annotation_id,
                    in_parentheses: parsed.in_parentheses,
                    is_tr: parsed.is_trace,
                    is_missing: parsed.is_missing,
                });
            }

            foods.push(food);
        }

        let nutrient_components = components
            .iter()
            .zip(component_ids)
            .map(|(component, id)| NutrientComponent {
                id,
                data_source_id,
                component_code: component.component_code.clone(),
                group_1_name_ja: component.group_1_name_ja.clone(),
                group_2_name_ja: component.group_2_name_ja.clone(),
                group_3_name_ja: component.group_3_name_ja.clone(),
                unit: component.unit.clone(),
                category: component.category.clone(),
                has_flag: !component.annotation_cols.is_empty() || component.has_inline_flag,
                original_sort_order: component.original_sort_order,
                note: String::new(),
            })
            .collect();

        info!(
            "Assembled {} foods in {} groups with {} values and {} symbols ({} rows skipped)",
            foods.len(),
            food_groups.len(),
            values.len(),
            self.symbol_defs.len(),
            skipped_rows
        );

        NormalizedTables {
            data_source,
            food_groups,
            foods,
            nutrient_components,
            food_nutrient_values: values,
            value_annotation_defs: self.symbol_defs,
            raw_snapshots,
            skipped_rows,
            cell_stats,
        }
    }

    /// Distinct group codes in first-seen order
    fn discover_groups(&mut self, food_rows: &[&Vec<String>], data_source_id: Uuid) -> Vec<FoodGroup> {
        let mut groups: Vec<FoodGroup> = Vec::new();

        for row in food_rows {
            let code = cell(row, self.layout.group_code_column);
            if code.is_empty() || groups.iter().any(|group| group.group_code == code) {
                continue;
            }

            groups.push(FoodGroup {
                id: self.ids.next_id(),
                data_source_id,
                group_code: code.to_string(),
                name_jp: self.lookups.group_name(code),
                original_sort_order: groups.len() + 1,
            });
        }

        debug!("Discovered {} food groups", groups.len());
        groups
    }

    fn snapshot_payload(
        &self,
        row: &[String],
        components: &[ColumnDescriptor],
        food: &Food,
    ) -> SnapshotPayload {
        let mut values = Map::new();
        let mut annotations = Map::new();

        for component in components {
            if component.column_index < row.len() {
                values.insert(
                    component.component_code.clone(),
                    Value::String(cell(row, component.column_index).to_string()),
                );
            }

            if !component.annotation_cols.is_empty() {
                let texts = component
                    .annotation_cols
                    .iter()
                    .map(|&index| cell(row, index))
                    .filter(|text| !text.is_empty())
                    .map(|text| Value::String(text.to_string()))
                    .collect();
                annotations.insert(component.component_code.clone(), Value::Array(texts));
            }
        }

        SnapshotPayload {
            food_group_code: cell(row, self.layout.group_code_column).to_string(),
            food_code: food.food_code.clone(),
            index_code: food.index_code.clone(),
            food_name: food.name_jp.clone(),
            waste_rate_raw: food.waste_rate.clone(),
            values,
            annotations,
            remarks: food.remarks.clone(),
        }
    }
}

impl CellStats {
    fn record(&mut self, parsed: &ParsedCell, annotated: bool) {
        if parsed.numeric.is_some() {
            self.numeric += 1;
        }
        if parsed.is_trace {
            self.trace += 1;
        }
        if parsed.is_missing {
            self.missing += 1;
        }
        if parsed.in_parentheses {
            self.parenthetical += 1;
        }
        if parsed.malformed {
            self.malformed += 1;
        }
        if annotated {
            self.annotated += 1;
        }
    }
}
