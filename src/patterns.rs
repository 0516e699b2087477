//! Regex matching over sheet cells.
//!
//! Pure functions over rows: first-match lookup, accumulated matches,
//! presence tests and unit extraction from header text.

use std::sync::LazyLock;

use regex::Regex;

use crate::workbook::Row;

/// Any UK export establishment (REMOS) number.
pub static ESTABLISHMENT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)RMS-GB-\d{6}-\d{3}").expect("establishment number pattern is valid")
});

static WEIGHT_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(kgs?|kilograms?|kilos?|grams?|g|lbs?)\b").expect("unit pattern is valid")
});

/// Matched text of the first cell (row order, then column order) matching `regex`.
pub fn find_match(regex: &Regex, rows: &[Row]) -> Option<String> {
    rows.iter()
        .flat_map(|row| row.iter())
        .find_map(|(_, cell)| regex.find(&cell.as_text()).map(|m| m.as_str().to_string()))
}

/// Append every match of `regex` in `rows` to `found`, skipping values already present.
///
/// Values are compared case-insensitively and stored uppercased.
pub fn find_all_matches(regex: &Regex, rows: &[Row], found: &mut Vec<String>) {
    for row in rows {
        for (_, cell) in row.iter() {
            let text = cell.as_text();
            for m in regex.find_iter(&text) {
                let value = m.as_str().to_uppercase();
                if !found.contains(&value) {
                    found.push(value);
                }
            }
        }
    }
}

/// True when any cell in `rows` matches `regex`.
pub fn test_any(regex: &Regex, rows: &[Row]) -> bool {
    rows.iter()
        .flat_map(|row| row.iter())
        .any(|(_, cell)| regex.is_match(&cell.as_text()))
}

/// Column key of the first cell in `row` whose text matches `regex`.
pub fn find_column<'a>(regex: &Regex, row: &'a Row) -> Option<&'a str> {
    row.iter()
        .find(|(_, cell)| regex.is_match(&cell.as_text()))
        .map(|(key, _)| key)
}

/// True when every pattern matches at least one cell of `row`.
pub fn matches_all<'r, I>(patterns: I, row: &Row) -> bool
where
    I: IntoIterator<Item = &'r Regex>,
{
    patterns
        .into_iter()
        .all(|regex| find_column(regex, row).is_some())
}

/// Weight unit named in header text, e.g. "Net Weight (KG)" → "kg".
pub fn find_unit(text: &str) -> Option<String> {
    WEIGHT_UNIT
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_lowercase())
}
