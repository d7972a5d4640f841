//! Application constants for the food composition normalizer
//!
//! Default layout offsets and lookup tables for the 2023 supplement of the
//! eighth revision of the Standard Tables of Food Composition in Japan.
//! These values seed [`crate::config::NormalizerConfig::default`]; the core
//! components only ever see them through the configuration.

// =============================================================================
// Header Layout
// =============================================================================

/// Number of leading rows forming the header block
pub const HEADER_ROW_COUNT: usize = 12;

/// Header row holding the level-1 (merged) component group names
pub const LEVEL_1_ROW: usize = 2;

/// Header row holding the level-2 component names
pub const LEVEL_2_ROW: usize = 3;

/// Header row holding the level-3 component names
pub const LEVEL_3_ROW: usize = 4;

/// Header row holding the units
pub const UNIT_ROW: usize = 10;

/// Header row holding the component codes
pub const CODE_ROW: usize = 11;

/// First column that may describe a component (the refuse rate column)
pub const FIRST_COMPONENT_COLUMN: usize = 4;

/// Free-text remarks column, surfaced as `foods.remarks`
pub const REMARKS_COLUMN: usize = 61;

/// Identifier columns of each data row
pub mod id_columns {
    pub const GROUP_CODE: usize = 0;
    pub const FOOD_CODE: usize = 1;
    pub const INDEX_CODE: usize = 2;
    pub const FOOD_NAME: usize = 3;
    pub const WASTE_RATE: usize = 4;
}

// =============================================================================
// Cell Conventions
// =============================================================================

/// Footnote glyph that may trail a value inside its own cell
pub const INLINE_SYMBOL: &str = "†";

/// Token marking a trace amount (compared upper-cased)
pub const TRACE_TOKEN: &str = "TR";

/// Glyphs marking a value as not determined
pub const MISSING_GLYPHS: &[&str] = &["-", "―", "–"];

// =============================================================================
// Lookup Tables
// =============================================================================

/// Food group code to display name
pub const FOOD_GROUP_NAMES: &[(&str, &str)] = &[
    ("01", "穀類"),
    ("02", "いも及びでん粉類"),
    ("03", "砂糖及び甘味類"),
    ("04", "豆類"),
    ("05", "種実類"),
    ("06", "野菜類"),
    ("07", "果実類"),
    ("08", "きのこ類"),
    ("09", "藻類"),
    ("10", "魚介類"),
    ("11", "肉類"),
    ("12", "卵類"),
    ("13", "乳類"),
    ("14", "油脂類"),
    ("15", "菓子類"),
    ("16", "し好飲料類"),
    ("17", "調味料及び香辛料類"),
    ("18", "調理加工食品類"),
];

/// Prefix used to synthesize a group name for codes missing from the table
pub const GROUP_NAME_FALLBACK_PREFIX: &str = "食品群";

/// Component codes the source header leaves blank, keyed by name pair
pub const COMPONENT_CODE_FALLBACKS: &[(&str, &str, &str)] = &[("無機質", "ナトリウム", "NA")];

/// Category assigned when neither the column nor a predecessor has one
pub const UNCATEGORIZED: &str = "その他";

/// Known footnote symbols and their meanings
pub const SYMBOL_MEANINGS: &[(&str, &str)] = &[
    ("*", "要確認（参考値・資料値など特記事項あり）"),
    ("†", "要確認（原資料の脚注参照）"),
];

/// Meaning given to symbols absent from [`SYMBOL_MEANINGS`]
pub const UNKNOWN_SYMBOL_MEANING: &str = "要確認（原資料参照）";

// =============================================================================
// Data Source Defaults
// =============================================================================

/// Default `data_sources.title`
pub const DEFAULT_DATA_SOURCE_TITLE: &str = "日本食品標準成分表（八訂）増補2023年";

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "build";

/// Default input character encoding label
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Timestamp format for `created_at` / `updated_at`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
