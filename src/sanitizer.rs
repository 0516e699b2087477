//! Input clean-up applied before template selection.

use crate::workbook::{CellValue, Sheet, Workbook};

/// Trim text cells, drop cells left empty, and remove trailing empty rows.
///
/// Interior blank rows are kept so row numbers still line up with the source.
pub fn sanitize(workbook: &Workbook) -> Workbook {
    let sheets = workbook
        .sheets()
        .iter()
        .map(|sheet| {
            let mut rows = sheet.rows.clone();
            for row in &mut rows {
                row.retain(|_, value| {
                    if let CellValue::Text(text) = value {
                        let trimmed = text.trim();
                        if trimmed.len() != text.len() {
                            *text = trimmed.to_string();
                        }
                        !text.is_empty()
                    } else {
                        true
                    }
                });
            }
            while rows.last().is_some_and(|row| row.is_empty()) {
                rows.pop();
            }
            Sheet::new(sheet.name.clone(), rows)
        })
        .collect();

    Workbook::new(sheets)
}
