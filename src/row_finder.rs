//! Header row discovery.

use crate::mapper::HeaderColumns;
use crate::model::ModelDefinition;
use crate::patterns;
use crate::workbook::{Row, Sheet};

/// Where a template's header sits in one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMatch {
    pub sheet_name: String,
    pub header_row: usize,
    pub columns: HeaderColumns,
}

/// Index of the first row satisfying `predicate`.
pub fn find_header_row<F>(rows: &[Row], predicate: F) -> Option<usize>
where
    F: Fn(&Row) -> bool,
{
    rows.iter().position(predicate)
}

/// Header predicate for a template: every required field's regex matches some cell.
pub fn header_predicate(model: &ModelDefinition) -> impl Fn(&Row) -> bool + '_ {
    move |row: &Row| {
        patterns::matches_all(
            model
                .required_fields()
                .iter()
                .filter_map(|field| model.pattern(*field)),
            row,
        )
    }
}

/// Locate the template's header in `sheet` and resolve its columns.
pub fn find_header(sheet: &Sheet, model: &ModelDefinition) -> Option<HeaderMatch> {
    let header_row = find_header_row(&sheet.rows, header_predicate(model))?;
    Some(HeaderMatch {
        sheet_name: sheet.name.clone(),
        header_row,
        columns: HeaderColumns::resolve(&sheet.rows[header_row], model),
    })
}
