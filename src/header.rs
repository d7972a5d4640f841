//! Header block decomposition for the food composition table.
//!
//! The source table opens with a twelve-row header in which component names
//! are spread over three levels of merged cells, followed by a unit row and a
//! component code row. This module turns that block into one
//! [`ColumnDescriptor`] per data column and works out which header-less
//! columns only carry footnote marks for their left-hand neighbour.

use crate::config::{HeaderLayout, LookupTables};
use crate::error::{NormalizeError, Result};
use crate::models::{ColumnDescriptor, HeaderDecomposition};
use tracing::{debug, info};

/// Forward-fill a header row left to right; leading blanks stay blank
pub fn forward_fill(values: &[String]) -> Vec<String> {
    let mut current = String::new();
    values
        .iter()
        .map(|value| {
            let text = value.trim();
            if !text.is_empty() {
                current = text.to_string();
            }
            current.clone()
        })
        .collect()
}

/// Trimmed cell text, blank when the row is too short
fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|value| value.trim()).unwrap_or("")
}

fn non_blank(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// Decompose the header block into column descriptors
pub fn decompose_header(
    rows: &[Vec<String>],
    layout: &HeaderLayout,
    lookups: &LookupTables,
) -> Result<HeaderDecomposition> {
    if rows.len() < layout.header_rows {
        return Err(NormalizeError::HeaderShape {
            reason: format!(
                "expected {} header rows, found {}",
                layout.header_rows,
                rows.len()
            ),
        });
    }

    let level_1_raw = &rows[layout.level_1_row];
    let level_2_raw = &rows[layout.level_2_row];
    let level_3_raw = &rows[layout.level_3_row];
    let units = &rows[layout.unit_row];
    let codes = &rows[layout.code_row];
    let level_1 = forward_fill(level_1_raw);

    if codes.len() <= layout.first_component_column {
        return Err(NormalizeError::HeaderShape {
            reason: format!(
                "component code row has {} cells, components start at column {}",
                codes.len(),
                layout.first_component_column
            ),
        });
    }

    let mut decomposition = HeaderDecomposition::default();
    // Index of the most recently constructed descriptor
    let mut last: Option<usize> = None;

    for index in layout.first_component_column..codes.len() {
        if index == layout.remarks_column {
            continue;
        }

        let code = cell(codes, index);
        let unit = cell(units, index);
        let g1_filled = cell(&level_1, index);
        let g2 = cell(level_2_raw, index);
        let g3 = cell(level_3_raw, index);

        let is_annotation_col = code.is_empty()
            && unit.is_empty()
            && cell(level_1_raw, index).is_empty()
            && g2.is_empty()
            && g3.is_empty();

        if is_annotation_col {
            decomposition.annotation_columns.push(index);
            if let Some(owner) = last {
                decomposition.components[owner].annotation_cols.push(index);
            }
            continue;
        }

        let component_code = if code.is_empty() {
            let level_2_or_3 = if g2.is_empty() { g3 } else { g2 };
            let resolved = lookups.fallback_code(g1_filled, level_2_or_3).ok_or_else(|| {
                NormalizeError::UnresolvedComponentCode {
                    column: index,
                    level_1: g1_filled.to_string(),
                    level_2_or_3: level_2_or_3.to_string(),
                }
            })?;
            debug!(
                "Column {} has no code; resolved ({}, {}) -> {}",
                index, g1_filled, level_2_or_3, resolved
            );
            resolved.to_string()
        } else {
            code.to_string()
        };

        let category = match (non_blank(g1_filled), last) {
            (Some(name), _) => name,
            (None, Some(previous)) => decomposition.components[previous].category.clone(),
            (None, None) => lookups.uncategorized.clone(),
        };

        let descriptor = ColumnDescriptor {
            column_index: index,
            component_code,
            group_1_name_ja: non_blank(g1_filled).unwrap_or_else(|| category.clone()),
            group_2_name_ja: non_blank(g2),
            group_3_name_ja: non_blank(g3),
            unit: non_blank(unit),
            category,
            original_sort_order: decomposition.components.len() + 1,
            annotation_cols: Vec::new(),
            has_inline_flag: false,
        };

        decomposition.components.push(descriptor);
        last = Some(decomposition.components.len() - 1);
    }

    info!(
        "Decomposed header: {} components, {} annotation columns",
        decomposition.components.len(),
        decomposition.annotation_columns.len()
    );

    Ok(decomposition)
}
