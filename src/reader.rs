//! Source table loading.
//!
//! Decodes the input file into text (resolving the byte-order mark and the
//! configured character encoding) and splits it into a ragged row matrix.
//! Also extracts the edition's publish date from the title row.

use crate::error::{NormalizeError, Result};
use chrono::NaiveDate;
use encoding_rs::Encoding;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Row matrix of a decoded CSV file
pub type Rows = Vec<Vec<String>>;

/// Read and decode a CSV file into rows
pub fn load_rows(path: &Path, encoding_label: &str) -> Result<Rows> {
    if !path.exists() {
        return Err(NormalizeError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let encoding = Encoding::for_label(encoding_label.trim().as_bytes()).ok_or_else(|| {
        NormalizeError::UnknownEncoding {
            label: encoding_label.to_string(),
        }
    })?;

    let bytes = std::fs::read(path)?;
    // A leading BOM overrides the configured label and is stripped
    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        warn!(
            "Input {} contained byte sequences invalid in {}; replaced with U+FFFD",
            path.display(),
            used.name()
        );
    }
    debug!("Decoded {} bytes from {} as {}", bytes.len(), path.display(), used.name());

    parse_rows(&text)
}

/// Split decoded CSV text into rows, allowing ragged row widths
pub fn parse_rows(text: &str) -> Result<Rows> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(rows)
}

fn publish_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"更新日[：:]?\s*(\d{4})年(\d{1,2})月(\d{1,2})日")
            .expect("publish date pattern is valid")
    })
}

/// Publish date announced in the title row, e.g. `更新日：2023年4月28日`
pub fn extract_publish_date(first_row: &[String]) -> Option<NaiveDate> {
    let joined = first_row.concat();
    let captures = publish_date_pattern().captures(&joined)?;

    let year = captures[1].parse().ok()?;
    let month = captures[2].parse().ok()?;
    let day = captures[3].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn test_parse_rows_allows_ragged_rows() {
        let rows = parse_rows("a,b,c\n\nd\n\"e,f\",g\n").unwrap();

        assert_eq!(rows[0], row(&["a", "b", "c"]));
        assert_eq!(rows.last().unwrap(), &row(&["e,f", "g"]));
        assert!(rows.iter().any(|r| r == &row(&["d"])));
    }

    #[test]
    fn test_load_rows_strips_utf8_bom() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\xEF\xBB\xBFcode,name\n01,rice\n").unwrap();

        let rows = load_rows(file.path(), "utf-8").unwrap();
        assert_eq!(rows[0][0], "code");
        assert_eq!(rows[1], row(&["01", "rice"]));
    }

    #[test]
    fn test_load_rows_decodes_shift_jis() {
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode("01,穀類\n");
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&encoded).unwrap();

        let rows = load_rows(file.path(), "shift_jis").unwrap();
        assert_eq!(rows[0], row(&["01", "穀類"]));
    }

    #[test]
    fn test_unknown_encoding_label() {
        let file = NamedTempFile::new().unwrap();
        let err = load_rows(file.path(), "klingon").unwrap_err();
        assert!(matches!(err, NormalizeError::UnknownEncoding { .. }));
    }

    #[test]
    fn test_missing_input_file() {
        let err = load_rows(Path::new("/definitely/not/here.csv"), "utf-8").unwrap_err();
        assert!(matches!(err, NormalizeError::InputNotFound { .. }));
    }

    #[test]
    fn test_extract_publish_date() {
        let first = row(&["日本食品標準成分表（八訂）増補2023年", "", "更新日：2023年4月28日"]);
        assert_eq!(
            extract_publish_date(&first),
            NaiveDate::from_ymd_opt(2023, 4, 28)
        );

        let plain = row(&["更新日2024年12月1日"]);
        assert_eq!(extract_publish_date(&plain), NaiveDate::from_ymd_opt(2024, 12, 1));

        assert_eq!(extract_publish_date(&row(&["no date here"])), None);
        assert_eq!(extract_publish_date(&row(&["更新日：2023年2月30日"])), None);
    }
}
