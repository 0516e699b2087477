//! Workbook input: sheets of rows keyed by spreadsheet column.
//!
//! The upstream converter emits `{ "<sheet>": [ { "<column>": value, ... } ] }`.
//! Sheet order and column order follow the document, so both are kept as
//! ordered vectors rather than maps.

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::WorkbookError;

/// A single non-null cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Text form of the cell, with whole numbers rendered without a trailing ".0".
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(f) => {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    format!("{}", *f as i64)
                } else {
                    format!("{}", f)
                }
            }
            CellValue::Bool(b) => b.to_string(),
        }
    }

    /// True for empty or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

/// Spreadsheet column key for a zero-based column index: 0 → "A", 26 → "AA".
pub fn column_key(index: usize) -> String {
    let mut n = index + 1;
    let mut key = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        key.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    key.reverse();
    String::from_utf8_lossy(&key).into_owned()
}

/// One spreadsheet row. Null cells are not stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from positional values keyed "A", "B", ... ; `None` leaves a gap.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<CellValue>>,
    {
        let cells = values
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (column_key(i), v)))
            .collect();
        Self { cells }
    }

    /// Set a cell, replacing any existing value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) {
        let key = key.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The cell under `key` when it holds something other than blank text.
    pub fn populated(&self, key: &str) -> Option<&CellValue> {
        self.get(key).filter(|v| !v.is_blank())
    }

    /// Cells in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &mut CellValue) -> bool,
    {
        self.cells.retain_mut(|(k, v)| keep(k, v));
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when the row has no cell with a non-blank value.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_blank())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, v) in &self.cells {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column key to cell value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut row = Row::new();
                while let Some((key, value)) = access.next_entry::<String, Option<CellValue>>()? {
                    if let Some(value) = value {
                        row.insert(key, value);
                    }
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// A named sheet and its rows, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// The converted spreadsheet handed to the parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Parse the converter's JSON output.
    pub fn from_json_str(json: &str) -> Result<Self, WorkbookError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, WorkbookError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// True when at least one sheet has a row with a non-blank cell.
    pub fn has_data_rows(&self) -> bool {
        self.sheets
            .iter()
            .any(|s| s.rows.iter().any(|r| !r.is_blank()))
    }
}

impl Serialize for Workbook {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sheets.len()))?;
        for sheet in &self.sheets {
            map.serialize_entry(&sheet.name, &sheet.rows)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Workbook {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WorkbookVisitor;

        impl<'de> Visitor<'de> for WorkbookVisitor {
            type Value = Workbook;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of sheet name to rows")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Workbook, A::Error> {
                let mut sheets = Vec::new();
                while let Some((name, rows)) = access.next_entry::<String, Option<Vec<Row>>>()? {
                    sheets.push(Sheet::new(name, rows.unwrap_or_default()));
                }
                Ok(Workbook { sheets })
            }
        }

        deserializer.deserialize_map(WorkbookVisitor)
    }
}
