//! Cell value parsing for food composition data cells
//!
//! Turns one raw cell into a [`ParsedCell`]. The checks run in a fixed order
//! and the first match wins:
//!
//! 1. blank → missing
//! 2. whole-cell parentheses → estimated value, parsing continues inside
//! 3. trailing footnote glyph → inline symbol, parsing continues on the rest
//! 4. thousands separators removed, text upper-cased for comparison
//! 5. dash glyph → missing
//! 6. trace token → trace
//! 7. exact decimal, or missing when the text is not a number
//!
//! Nothing in here fails: malformed text degrades to missing and is flagged
//! so the caller can count it.

use crate::config::CellConventions;
use crate::models::ParsedCell;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parser for raw cell text under a fixed set of conventions
#[derive(Debug, Clone)]
pub struct CellParser {
    inline_symbol: String,
    trace_token: String,
    missing_glyphs: Vec<String>,
}

impl Default for CellParser {
    fn default() -> Self {
        Self::new(&CellConventions::default())
    }
}

impl CellParser {
    pub fn new(conventions: &CellConventions) -> Self {
        Self {
            inline_symbol: conventions.inline_symbol.clone(),
            trace_token: conventions.trace_token.to_uppercase(),
            missing_glyphs: conventions
                .missing_glyphs
                .iter()
                .map(|glyph| glyph.to_uppercase())
                .collect(),
        }
    }

    /// Parse one raw cell
    pub fn parse(&self, raw_text: &str) -> ParsedCell {
        let mut cell = ParsedCell {
            original_text: raw_text.to_string(),
            ..ParsedCell::default()
        };

        let trimmed = raw_text.trim();
        if trimmed.is_empty() {
            cell.is_missing = true;
            return cell;
        }

        let mut core = trimmed;
        if let Some(inner) = strip_enclosing_parentheses(core) {
            cell.in_parentheses = true;
            core = inner.trim();
        }

        if !self.inline_symbol.is_empty() {
            if let Some(rest) = core.strip_suffix(self.inline_symbol.as_str()) {
                cell.inline_symbol = Some(self.inline_symbol.clone());
                core = rest.trim();
            }
        }

        let normalized = core.replace(',', "");
        let upper = normalized.to_uppercase();

        if self.missing_glyphs.iter().any(|glyph| *glyph == upper) {
            cell.is_missing = true;
            return cell;
        }

        if upper == self.trace_token {
            cell.is_trace = true;
            return cell;
        }

        match parse_decimal(&normalized) {
            Some(value) => cell.numeric = Some(value),
            None => {
                cell.is_missing = true;
                cell.malformed = true;
            }
        }

        cell
    }
}

/// Inner text when the whole string is wrapped in one pair of parentheses
fn strip_enclosing_parentheses(text: &str) -> Option<&str> {
    if text.len() < 2 {
        return None;
    }
    text.strip_prefix('(')?.strip_suffix(')')
}

/// Exact-precision decimal parse, accepting plain and scientific notation
///
/// Bounded by `rust_decimal`: 28 significant digits. Longer fractions are
/// rounded to fit; magnitudes beyond about 7.9e28 do not parse and the cell
/// falls back to missing.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }

    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

/// Render a decimal without trailing zeros, trailing point or exponent
///
/// Negative zero renders as `0`.
pub fn canonical_decimal(value: &Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CellParser {
        CellParser::default()
    }

    fn dec(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    #[test]
    fn test_blank_cell_is_missing() {
        let cell = parser().parse("   ");

        assert!(cell.is_missing);
        assert!(!cell.is_trace);
        assert!(!cell.in_parentheses);
        assert!(!cell.malformed);
        assert_eq!(cell.numeric, None);
        assert_eq!(cell.inline_symbol, None);
        assert_eq!(cell.original_text, "   ");
    }

    #[test]
    fn test_plain_number_keeps_precision() {
        let cell = parser().parse("12.50");

        assert_eq!(cell.numeric, Some(dec("12.50")));
        assert_eq!(cell.numeric.unwrap().scale(), 2);
        assert!(!cell.is_missing);
    }

    #[test]
    fn test_thousands_separator_removed() {
        let cell = parser().parse("1,234.0");

        assert_eq!(cell.numeric, Some(dec("1234.0")));
        assert_eq!(canonical_decimal(&cell.numeric.unwrap()), "1234");
        assert_eq!(cell.original_text, "1,234.0");
    }

    #[test]
    fn test_dash_glyphs_are_missing() {
        for glyph in ["-", "―", "–"] {
            let cell = parser().parse(glyph);
            assert!(cell.is_missing, "{glyph} should be missing");
            assert!(!cell.is_trace);
            assert!(!cell.malformed);
            assert_eq!(cell.numeric, None);
        }
    }

    #[test]
    fn test_trace_token_any_case() {
        for token in ["Tr", "TR", "tr"] {
            let cell = parser().parse(token);
            assert!(cell.is_trace, "{token} should be trace");
            assert!(!cell.is_missing);
            assert_eq!(cell.numeric, None);
        }
    }

    #[test]
    fn test_parenthetical_value() {
        let cell = parser().parse("(1.2)");

        assert_eq!(cell.numeric, Some(dec("1.2")));
        assert!(cell.in_parentheses);
        assert!(!cell.is_missing);
        assert!(!cell.is_trace);
    }

    #[test]
    fn test_parenthetical_trace_and_dash() {
        let trace = parser().parse("(Tr)");
        assert!(trace.in_parentheses);
        assert!(trace.is_trace);

        let dash = parser().parse("(-)");
        assert!(dash.in_parentheses);
        assert!(dash.is_missing);
    }

    #[test]
    fn test_inline_symbol_is_stripped() {
        let cell = parser().parse("1.2†");

        assert_eq!(cell.numeric, Some(dec("1.2")));
        assert_eq!(cell.inline_symbol.as_deref(), Some("†"));
        assert_eq!(cell.original_text, "1.2†");
    }

    #[test]
    fn test_inline_symbol_inside_parentheses() {
        let cell = parser().parse("(0.5†)");

        assert!(cell.in_parentheses);
        assert_eq!(cell.inline_symbol.as_deref(), Some("†"));
        assert_eq!(cell.numeric, Some(dec("0.5")));
    }

    #[test]
    fn test_malformed_text_falls_back_to_missing() {
        for text in ["abc", "1.2.3", "()", "1 2"] {
            let cell = parser().parse(text);
            assert!(cell.is_missing, "{text} should be missing");
            assert!(cell.malformed, "{text} should be flagged malformed");
            assert_eq!(cell.numeric, None);
        }
    }

    #[test]
    fn test_lone_parenthesis_is_not_a_pair() {
        let cell = parser().parse("(");

        assert!(!cell.in_parentheses);
        assert!(cell.is_missing);
    }

    #[test]
    fn test_negative_value_keeps_sign() {
        let cell = parser().parse("-0.30");
        assert_eq!(canonical_decimal(&cell.numeric.unwrap()), "-0.3");
    }

    #[test]
    fn test_negative_zero_renders_unsigned() {
        let cell = parser().parse("-0.0");
        assert_eq!(canonical_decimal(&cell.numeric.unwrap()), "0");
    }

    #[test]
    fn test_precision_limit() {
        let long_fraction = parser().parse("0.12345678901234567890123456789");
        assert_eq!(
            canonical_decimal(&long_fraction.numeric.unwrap()),
            "0.1234567890123456789012345679"
        );

        let too_large = parser().parse("123456789012345678901234567890");
        assert_eq!(too_large.numeric, None);
        assert!(too_large.is_missing);
        assert!(too_large.malformed);
    }

    #[test]
    fn test_canonicalization_is_idempotent() {
        for text in ["12.50", "1,234.0", "0.010", "100", "7.000", "(3.40)"] {
            let first = parser().parse(text).numeric.unwrap();
            let canonical = canonical_decimal(&first);
            let reparsed = parser().parse(&canonical).numeric.unwrap();

            assert_eq!(first, reparsed);
            assert_eq!(canonical_decimal(&reparsed), canonical);
            assert!(!canonical.contains('e') && !canonical.contains('E'));
        }

        assert_eq!(canonical_decimal(&dec("12.50")), "12.5");
        assert_eq!(canonical_decimal(&dec("100")), "100");
        assert_eq!(canonical_decimal(&dec("7.000")), "7");
    }

    #[test]
    fn test_custom_conventions() {
        let conventions = CellConventions {
            inline_symbol: "‡".to_string(),
            trace_token: "tr.".to_string(),
            missing_glyphs: vec!["n/a".to_string()],
        };
        let parser = CellParser::new(&conventions);

        assert!(parser.parse("N/A").is_missing);
        assert!(parser.parse("TR.").is_trace);
        assert_eq!(parser.parse("2‡").inline_symbol.as_deref(), Some("‡"));
        assert_eq!(parser.parse("2†").inline_symbol, None);
    }
}
