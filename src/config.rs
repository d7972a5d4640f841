//! Configuration management and validation.
//!
//! Provides the header layout offsets, lookup tables and cell conventions
//! consumed by the header decomposer, cell parser and entity assembler.
//! Everything defaults to the 2023 table edition and can be overridden
//! piecewise from a JSON file.

use crate::constants;
use crate::error::{NormalizeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Row and column offsets of the fixed-format source table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderLayout {
    /// Number of leading rows forming the header block
    pub header_rows: usize,

    /// Row of level-1 names (merged cells, forward-filled)
    pub level_1_row: usize,

    /// Row of level-2 names
    pub level_2_row: usize,

    /// Row of level-3 names
    pub level_3_row: usize,

    /// Row of units
    pub unit_row: usize,

    /// Row of component codes
    pub code_row: usize,

    /// First column considered for component decomposition
    pub first_component_column: usize,

    /// Remarks column, excluded from decomposition
    pub remarks_column: usize,

    pub group_code_column: usize,
    pub food_code_column: usize,
    pub index_code_column: usize,
    pub food_name_column: usize,
    pub waste_rate_column: usize,
}

impl Default for HeaderLayout {
    fn default() -> Self {
        use constants::id_columns;

        Self {
            header_rows: constants::HEADER_ROW_COUNT,
            level_1_row: constants::LEVEL_1_ROW,
            level_2_row: constants::LEVEL_2_ROW,
            level_3_row: constants::LEVEL_3_ROW,
            unit_row: constants::UNIT_ROW,
            code_row: constants::CODE_ROW,
            first_component_column: constants::FIRST_COMPONENT_COLUMN,
            remarks_column: constants::REMARKS_COLUMN,
            group_code_column: id_columns::GROUP_CODE,
            food_code_column: id_columns::FOOD_CODE,
            index_code_column: id_columns::INDEX_CODE,
            food_name_column: id_columns::FOOD_NAME,
            waste_rate_column: id_columns::WASTE_RATE,
        }
    }
}

impl HeaderLayout {
    /// Check that every named header row lies inside the header block
    pub fn validate(&self) -> Result<()> {
        let rows = [
            ("level_1_row", self.level_1_row),
            ("level_2_row", self.level_2_row),
            ("level_3_row", self.level_3_row),
            ("unit_row", self.unit_row),
            ("code_row", self.code_row),
        ];

        for (name, row) in rows {
            if row >= self.header_rows {
                return Err(NormalizeError::Configuration {
                    message: format!(
                        "{} = {} lies outside the {}-row header block",
                        name, row, self.header_rows
                    ),
                });
            }
        }

        Ok(())
    }
}

/// One entry of the component code fallback table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFallback {
    pub level_1: String,
    /// Level-2 name, or level-3 when level-2 is blank
    pub level_2_or_3: String,
    pub code: String,
}

/// Fixed lookup tables supplied to the core as configuration data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupTables {
    pub group_names: BTreeMap<String, String>,
    pub group_name_fallback_prefix: String,
    pub code_fallbacks: Vec<CodeFallback>,
    pub uncategorized: String,
    pub symbol_meanings: BTreeMap<String, String>,
    pub unknown_symbol_meaning: String,
}

impl Default for LookupTables {
    fn default() -> Self {
        Self {
            group_names: constants::FOOD_GROUP_NAMES
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string()))
                .collect(),
            group_name_fallback_prefix: constants::GROUP_NAME_FALLBACK_PREFIX.to_string(),
            code_fallbacks: constants::COMPONENT_CODE_FALLBACKS
                .iter()
                .map(|(level_1, level_2_or_3, code)| CodeFallback {
                    level_1: level_1.to_string(),
                    level_2_or_3: level_2_or_3.to_string(),
                    code: code.to_string(),
                })
                .collect(),
            uncategorized: constants::UNCATEGORIZED.to_string(),
            symbol_meanings: constants::SYMBOL_MEANINGS
                .iter()
                .map(|(symbol, meaning)| (symbol.to_string(), meaning.to_string()))
                .collect(),
            unknown_symbol_meaning: constants::UNKNOWN_SYMBOL_MEANING.to_string(),
        }
    }
}

impl LookupTables {
    /// Display name for a group code, synthesized when the code is unknown
    pub fn group_name(&self, code: &str) -> String {
        self.group_names
            .get(code)
            .cloned()
            .unwrap_or_else(|| format!("{}{}", self.group_name_fallback_prefix, code))
    }

    /// Fallback component code for a header name pair
    pub fn fallback_code(&self, level_1: &str, level_2_or_3: &str) -> Option<&str> {
        self.code_fallbacks
            .iter()
            .find(|entry| entry.level_1 == level_1 && entry.level_2_or_3 == level_2_or_3)
            .map(|entry| entry.code.as_str())
    }

    /// Meaning of a footnote symbol, with the generic default for unknown ones
    pub fn symbol_meaning(&self, symbol: &str) -> &str {
        self.symbol_meanings
            .get(symbol)
            .map(String::as_str)
            .unwrap_or(self.unknown_symbol_meaning.as_str())
    }

    pub fn is_known_symbol(&self, symbol: &str) -> bool {
        self.symbol_meanings.contains_key(symbol)
    }
}

/// Special-value conventions of the source cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellConventions {
    /// Footnote glyph that may trail a value in its own cell
    pub inline_symbol: String,

    /// Trace-amount token, compared upper-cased
    pub trace_token: String,

    /// Dash-like glyphs meaning "not determined"
    pub missing_glyphs: Vec<String>,
}

impl Default for CellConventions {
    fn default() -> Self {
        Self {
            inline_symbol: constants::INLINE_SYMBOL.to_string(),
            trace_token: constants::TRACE_TOKEN.to_string(),
            missing_glyphs: constants::MISSING_GLYPHS
                .iter()
                .map(|glyph| glyph.to_string())
                .collect(),
        }
    }
}

/// Global configuration for a normalization run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub layout: HeaderLayout,
    pub lookups: LookupTables,
    pub cells: CellConventions,
}

impl NormalizerConfig {
    /// Load a configuration file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            NormalizeError::Configuration {
                message: format!("Failed to parse '{}': {}", path.display(), e),
            }
        })?;

        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Replace the header layout
    pub fn with_layout(mut self, layout: HeaderLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Replace the lookup tables
    pub fn with_lookups(mut self, lookups: LookupTables) -> Self {
        self.lookups = lookups;
        self
    }

    /// Replace the cell conventions
    pub fn with_cells(mut self, cells: CellConventions) -> Self {
        self.cells = cells;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;

        if self.cells.trace_token.trim().is_empty() {
            return Err(NormalizeError::Configuration {
                message: "trace_token must not be blank".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_lookups() {
        let lookups = LookupTables::default();

        assert_eq!(lookups.group_name("01"), "穀類");
        assert_eq!(lookups.group_name("99"), "食品群99");
        assert_eq!(lookups.fallback_code("無機質", "ナトリウム"), Some("NA"));
        assert_eq!(lookups.fallback_code("無機質", "カリウム"), None);
        assert_eq!(lookups.symbol_meaning("*"), "要確認（参考値・資料値など特記事項あり）");
        assert_eq!(lookups.symbol_meaning("‡"), "要確認（原資料参照）");
    }

    #[test]
    fn test_layout_validation_rejects_rows_outside_header() {
        let layout = HeaderLayout {
            code_row: 12,
            ..HeaderLayout::default()
        };

        assert!(layout.validate().is_err());
        assert!(HeaderLayout::default().validate().is_ok());
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"layout": {{"remarks_column": 70}}, "cells": {{"inline_symbol": "‡"}}}}"#
        )
        .unwrap();

        let config = NormalizerConfig::from_file(file.path()).unwrap();

        assert_eq!(config.layout.remarks_column, 70);
        assert_eq!(config.layout.header_rows, 12);
        assert_eq!(config.cells.inline_symbol, "‡");
        assert_eq!(config.cells.trace_token, "TR");
        assert_eq!(config.lookups, LookupTables::default());
    }

    #[test]
    fn test_malformed_config_file_is_configuration_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = NormalizerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, NormalizeError::Configuration { .. }));
    }
}
