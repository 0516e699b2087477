//! Data row classification.
//!
//! Rows below a header are checked in order: empty, totals, repeated header.
//! Only rows that pass all three become line items.

use crate::mapper::HeaderColumns;
use crate::model::{Field, ModelDefinition};
use crate::workbook::Row;

/// Outcome of classifying one candidate data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Data,
    Empty,
    Totals,
    RepeatedHeader,
}

/// Classify a row, applying the checks in precedence order.
pub fn classify(
    row: &Row,
    header_row: &Row,
    columns: &HeaderColumns,
    model: &ModelDefinition,
) -> RowClass {
    if is_empty_row(row, columns) {
        RowClass::Empty
    } else if is_totals_row(row, columns, model) {
        RowClass::Totals
    } else if is_repeated_header_row(row, header_row, columns, model) {
        RowClass::RepeatedHeader
    } else {
        RowClass::Data
    }
}

/// True when every mapped column of the row is null or blank.
pub fn is_empty_row(row: &Row, columns: &HeaderColumns) -> bool {
    columns.keys().all(|key| row.populated(key).is_none())
}

/// True for totals and subtotal rows, when the template skips them.
pub fn is_totals_row(row: &Row, columns: &HeaderColumns, model: &ModelDefinition) -> bool {
    if !model.skip_totals_rows {
        return false;
    }

    let description = populated_text(row, columns, Field::Description);
    if let Some(description) = &description {
        let description = description.to_lowercase();
        if model
            .totals_row_keywords
            .iter()
            .any(|keyword| description.contains(keyword.as_str()))
        {
            return true;
        }
    }

    let has_numeric_only = columns
        .fields()
        .filter(|field| field.is_numeric())
        .any(|field| populated_text(row, columns, field).is_some());
    if !has_numeric_only {
        return false;
    }

    let pattern = model.totals_row_pattern;
    if pattern.description_empty && description.is_some() {
        return false;
    }
    if pattern.commodity_code_empty && populated_text(row, columns, Field::CommodityCode).is_some()
    {
        return false;
    }

    !columns
        .fields()
        .filter(|field| field.is_identifying())
        .any(|field| populated_text(row, columns, field).is_some())
}

/// True when the row repeats the header on every required mapped column.
pub fn is_repeated_header_row(
    row: &Row,
    header_row: &Row,
    columns: &HeaderColumns,
    model: &ModelDefinition,
) -> bool {
    if !model.skip_repeated_headers || !model.has_field_patterns() {
        return false;
    }

    let mut mandatory = columns
        .iter()
        .filter(|(field, _)| model.is_required(*field))
        .peekable();
    if mandatory.peek().is_none() {
        return false;
    }

    mandatory.all(|(_, key)| {
        match (row.populated(key), header_row.populated(key)) {
            (Some(value), Some(header)) => {
                value.as_text().trim().to_lowercase() == header.as_text().trim().to_lowercase()
            }
            _ => false,
        }
    })
}

fn populated_text(row: &Row, columns: &HeaderColumns, field: Field) -> Option<String> {
    columns
        .get(field)
        .and_then(|key| row.populated(key))
        .map(|value| value.as_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;
    use crate::workbook::CellValue;
    use serde_json::json;

    fn model(skip_totals: bool, skip_headers: bool) -> ModelDefinition {
        let config: ModelConfig = serde_json::from_value(json!({
            "id": "FILTER1",
            "establishment_number": "^RMS-GB-000015-\\d{3}$",
            "headers": {
                "description": "^description$",
                "commodity_code": "^commodity code$",
                "number_of_packages": "^packages$",
                "total_net_weight_kg": "^net weight$",
                "country_of_origin": "^country of origin$"
            },
            "required": ["description", "commodity_code", "number_of_packages", "total_net_weight_kg"],
            "skip_totals_rows": skip_totals,
            "skip_repeated_headers": skip_headers
        }))
        .unwrap();
        ModelDefinition::compile(&config).unwrap()
    }

    fn row(values: &[Option<&str>]) -> Row {
        Row::from_values(values.iter().map(|v| v.map(CellValue::from)))
    }

    fn header() -> Row {
        row(&[
            Some("Description"),
            Some("Commodity Code"),
            Some("Packages"),
            Some("Net Weight"),
            Some("Country of Origin"),
        ])
    }

    fn setup(skip_totals: bool, skip_headers: bool) -> (ModelDefinition, Row, HeaderColumns) {
        let model = model(skip_totals, skip_headers);
        let header = header();
        let columns = HeaderColumns::resolve(&header, &model);
        (model, header, columns)
    }

    #[test]
    fn test_blank_row_is_empty() {
        let (model, header, columns) = setup(false, false);
        let blank = row(&[Some("  "), None, Some(""), None, None]);
        assert!(is_empty_row(&blank, &columns));
        assert_eq!(classify(&blank, &header, &columns, &model), RowClass::Empty);
    }

    #[test]
    fn test_unmapped_cells_do_not_count() {
        let (_, _, columns) = setup(false, false);
        let mut stray = Row::new();
        stray.insert("Z", CellValue::from("signature"));
        assert!(is_empty_row(&stray, &columns));
    }

    #[test]
    fn test_totals_keyword_toggles_with_flag() {
        let totals = row(&[Some("TOTAL"), None, Some("10"), Some("100"), None]);

        let (model, header, columns) = setup(true, false);
        assert!(is_totals_row(&totals, &columns, &model));
        assert_eq!(classify(&totals, &header, &columns, &model), RowClass::Totals);

        let (model, header, columns) = setup(false, false);
        assert!(!is_totals_row(&totals, &columns, &model));
        assert_eq!(classify(&totals, &header, &columns, &model), RowClass::Data);
    }

    #[test]
    fn test_keyword_match_is_substring_and_case_insensitive() {
        let (model, _, columns) = setup(true, false);
        let subtotal = row(&[Some("Sub-Total for pallet 1"), Some("0101"), None, None, None]);
        assert!(is_totals_row(&subtotal, &columns, &model));
    }

    #[test]
    fn test_numbers_only_row_is_totals() {
        let (model, _, columns) = setup(true, false);
        let sums = row(&[None, None, Some("25"), Some("310.5"), None]);
        assert!(is_totals_row(&sums, &columns, &model));
    }

    #[test]
    fn test_identifying_column_overrides_totals() {
        let (model, _, columns) = setup(true, false);
        let item = row(&[None, None, Some("25"), Some("310.5"), Some("GB")]);
        assert!(!is_totals_row(&item, &columns, &model));
    }

    #[test]
    fn test_populated_description_or_code_is_not_totals() {
        let (model, _, columns) = setup(true, false);
        let described = row(&[Some("Apples"), None, Some("10"), Some("100"), None]);
        assert!(!is_totals_row(&described, &columns, &model));

        let coded = row(&[None, Some("0101"), Some("10"), Some("100"), None]);
        assert!(!is_totals_row(&coded, &columns, &model));
    }

    #[test]
    fn test_relaxed_totals_pattern() {
        let mut model = model(true, false);
        model.totals_row_pattern.commodity_code_empty = false;
        let header = header();
        let columns = HeaderColumns::resolve(&header, &model);
        let coded = row(&[None, Some("0101"), Some("10"), Some("100"), None]);
        assert!(is_totals_row(&coded, &columns, &model));
    }

    #[test]
    fn test_no_numbers_is_not_totals() {
        let (model, _, columns) = setup(true, false);
        let text_only = row(&[None, None, None, None, Some("GB")]);
        assert!(!is_totals_row(&text_only, &columns, &model));
    }

    #[test]
    fn test_repeated_header_any_casing() {
        let (model, header, columns) = setup(false, true);
        let repeated = row(&[
            Some("DESCRIPTION"),
            Some("commodity code"),
            Some("Packages"),
            Some("NET WEIGHT"),
            None,
        ]);
        assert!(is_repeated_header_row(&repeated, &header, &columns, &model));
        assert_eq!(
            classify(&repeated, &header, &columns, &model),
            RowClass::RepeatedHeader
        );
    }

    #[test]
    fn test_repeated_header_non_ascii_casing() {
        let (model, _, columns) = setup(false, true);
        let header = row(&[
            Some("Désignation"),
            Some("Commodity Code"),
            Some("Packages"),
            Some("Net Weight"),
            None,
        ]);
        let repeated = row(&[
            Some("DÉSIGNATION"),
            Some("COMMODITY CODE"),
            Some("packages"),
            Some("Net Weight"),
            None,
        ]);
        assert!(is_repeated_header_row(&repeated, &header, &columns, &model));
        assert_eq!(
            classify(&repeated, &header, &columns, &model),
            RowClass::RepeatedHeader
        );
    }

    #[test]
    fn test_repeated_header_needs_every_required_field() {
        let (model, header, columns) = setup(false, true);
        let one_off = row(&[
            Some("Description"),
            Some("Commodity Code"),
            Some("Packages"),
            Some("12"),
            None,
        ]);
        assert!(!is_repeated_header_row(&one_off, &header, &columns, &model));

        let missing = row(&[Some("Description"), Some("Commodity Code"), Some("Packages"), None, None]);
        assert!(!is_repeated_header_row(&missing, &header, &columns, &model));
    }

    #[test]
    fn test_repeated_header_disabled() {
        let (model, header, columns) = setup(false, false);
        let repeated = header.clone();
        assert!(!is_repeated_header_row(&repeated, &header, &columns, &model));
        assert_eq!(classify(&repeated, &header, &columns, &model), RowClass::Data);
    }

    #[test]
    fn test_empty_wins_over_other_classes() {
        let (model, header, columns) = setup(true, true);
        let blank = Row::new();
        assert_eq!(classify(&blank, &header, &columns, &model), RowClass::Empty);
    }
}
