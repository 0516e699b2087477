//! Header-to-field column resolution and line item extraction.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::ParseError;
use crate::model::{BlanketStatement, Field, ModelDefinition};
use crate::patterns;
use crate::result::LineItem;
use crate::row_filter::{self, RowClass};
use crate::row_finder::HeaderMatch;
use crate::workbook::{CellValue, Row};

/// Field → column key map resolved from a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderColumns {
    columns: BTreeMap<Field, String>,
}

impl HeaderColumns {
    /// For each field the template defines, take the first header cell matching its regex.
    pub fn resolve(header_row: &Row, model: &ModelDefinition) -> Self {
        let columns = model
            .field_patterns()
            .filter_map(|(field, regex)| {
                patterns::find_column(regex, header_row).map(|key| (field, key.to_string()))
            })
            .collect();
        Self { columns }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.columns.iter().map(|(f, k)| (*f, k.as_str()))
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.columns.keys().copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Extract line items from the rows below a header.
///
/// `data_row_index` is normally `header_row_index + 1`. Rows classified as
/// empty, totals or repeated header are left out.
pub fn map_rows(
    rows: &[Row],
    header_row_index: usize,
    data_row_index: usize,
    model: &ModelDefinition,
    sheet_name: &str,
) -> Result<Vec<LineItem>, ParseError> {
    let header_row = header_at(rows, header_row_index, sheet_name)?;
    let columns = HeaderColumns::resolve(header_row, model);
    Ok(extract(rows, header_row, &columns, data_row_index, model, sheet_name))
}

/// Extract line items below a header found by [`crate::row_finder::find_header`],
/// reusing its resolved columns.
pub fn map_header_match(
    rows: &[Row],
    header: &HeaderMatch,
    model: &ModelDefinition,
) -> Result<Vec<LineItem>, ParseError> {
    let header_row = header_at(rows, header.header_row, &header.sheet_name)?;
    Ok(extract(
        rows,
        header_row,
        &header.columns,
        header.header_row + 1,
        model,
        &header.sheet_name,
    ))
}

fn header_at<'a>(rows: &'a [Row], index: usize, sheet_name: &str) -> Result<&'a Row, ParseError> {
    rows.get(index).ok_or_else(|| ParseError::RowOutOfRange {
        sheet: sheet_name.to_string(),
        index,
    })
}

fn extract(
    rows: &[Row],
    header_row: &Row,
    columns: &HeaderColumns,
    data_row_index: usize,
    model: &ModelDefinition,
    sheet_name: &str,
) -> Vec<LineItem> {
    let unit_from_header = if model.find_unit_in_header {
        columns
            .get(Field::TotalNetWeightKg)
            .and_then(|key| header_row.get(key))
            .and_then(|cell| patterns::find_unit(&cell.as_text()))
            .map(CellValue::Text)
    } else {
        None
    };
    let blanket_nirms = blanket_value(model.blanket_nirms.as_ref(), rows);
    let blanket_treatment = blanket_value(model.blanket_treatment_type.as_ref(), rows);

    let mut items = Vec::new();
    let mut skipped = 0usize;

    for (index, row) in rows.iter().enumerate().skip(data_row_index) {
        match row_filter::classify(row, header_row, columns, model) {
            RowClass::Data => {}
            class => {
                if class != RowClass::Empty {
                    debug!("Skipping {:?} row {} on sheet '{}'", class, index + 1, sheet_name);
                }
                skipped += 1;
                continue;
            }
        }

        let mut item = LineItem::empty(sheet_name, index + 1);
        for (field, key) in columns.iter() {
            item.set(field, row.populated(key).cloned());
        }
        if model.find_unit_in_header {
            item.total_net_weight_unit = unit_from_header.clone();
        }
        if let Some(value) = &blanket_nirms {
            item.nirms = Some(value.clone());
        }
        if let Some(value) = &blanket_treatment {
            item.type_of_treatment = Some(value.clone());
        }
        items.push(item);
    }

    debug!(
        "Sheet '{}': mapped {} item(s), skipped {} row(s)",
        sheet_name,
        items.len(),
        skipped
    );

    items
}

/// The statement's value when its regex matches anywhere in the sheet.
fn blanket_value(statement: Option<&BlanketStatement>, rows: &[Row]) -> Option<CellValue> {
    let statement = statement?;
    patterns::test_any(&statement.regex, rows).then(|| CellValue::Text(statement.value.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;
    use serde_json::{json, Value};

    fn model(extra: Value) -> ModelDefinition {
        let mut config = json!({
            "id": "MAPPER1",
            "establishment_number": "^RMS-GB-000015-\\d{3}$",
            "headers": {
                "description": "^description$",
                "commodity_code": "^commodity code$",
                "number_of_packages": "^packages$",
                "total_net_weight_kg": "^net weight",
                "nirms": "^nirms$",
                "type_of_treatment": "^treatment$"
            },
            "required": ["description", "commodity_code", "number_of_packages", "total_net_weight_kg"]
        });
        if let (Some(base), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        let config: ModelConfig = serde_json::from_value(config).unwrap();
        ModelDefinition::compile(&config).unwrap()
    }

    fn row(values: &[Option<&str>]) -> Row {
        Row::from_values(values.iter().map(|v| v.map(CellValue::from)))
    }

    #[test]
    fn test_resolve_takes_first_matching_column() {
        let model = model(json!({}));
        let header = row(&[
            Some("Description"),
            Some("Description"),
            Some("Commodity Code"),
        ]);
        let columns = HeaderColumns::resolve(&header, &model);
        assert_eq!(columns.get(Field::Description), Some("A"));
        assert_eq!(columns.get(Field::CommodityCode), Some("C"));
        assert!(!columns.contains(Field::Nirms));
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn test_map_rows_extracts_values_and_locations() {
        let model = model(json!({}));
        let rows = vec![
            row(&[Some("RMS-GB-000015-001")]),
            row(&[Some("Description"), Some("Commodity Code"), Some("Packages"), Some("Net Weight")]),
            row(&[Some("Apples"), Some("0101"), Some("10"), Some("100")]),
            row(&[None, None, None, None]),
            row(&[Some("Pears"), None, Some("5"), Some(" ")]),
        ];
        let items = map_rows(&rows, 1, 2, &model, "Sheet1").unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].description, Some(CellValue::from("Apples")));
        assert_eq!(items[0].commodity_code, Some(CellValue::from("0101")));
        assert_eq!(items[0].row_location.row_number, 3);
        assert_eq!(items[0].row_location.sheet_name, "Sheet1");
        assert_eq!(items[0].nirms, None);

        assert_eq!(items[1].commodity_code, None);
        assert_eq!(items[1].total_net_weight_kg, None);
        assert_eq!(items[1].row_location.row_number, 5);
    }

    #[test]
    fn test_unit_taken_from_header() {
        let model = model(json!({"find_unit_in_header": true}));
        let rows = vec![
            row(&[Some("Description"), Some("Commodity Code"), Some("Packages"), Some("Net Weight (KG)")]),
            row(&[Some("Apples"), Some("0101"), Some("10"), Some("100")]),
            row(&[Some("Pears"), Some("0102"), Some("4"), Some("20")]),
        ];
        let items = map_rows(&rows, 0, 1, &model, "Sheet1").unwrap();
        assert!(items
            .iter()
            .all(|i| i.total_net_weight_unit == Some(CellValue::from("kg"))));
    }

    #[test]
    fn test_blanket_statements_apply_to_every_item() {
        let model = model(json!({
            "blanket_nirms": {"regex": "all goods in this consignment are nirms", "value": "NIRMS"},
            "blanket_treatment_type": {"regex": "^treatment: processed$", "value": "Processed"}
        }));
        let rows = vec![
            row(&[Some("All goods in this consignment are NIRMS eligible")]),
            row(&[Some("Treatment: Processed")]),
            row(&[Some("Description"), Some("Commodity Code"), Some("Packages"), Some("Net Weight"), Some("NIRMS")]),
            row(&[Some("Apples"), Some("0101"), Some("10"), Some("100"), Some("Non-NIRMS")]),
            row(&[Some("Pears"), Some("0102"), Some("4"), Some("20"), None]),
        ];
        let items = map_rows(&rows, 2, 3, &model, "Sheet1").unwrap();
        assert_eq!(items.len(), 2);
        for item in &items {
            assert_eq!(item.nirms, Some(CellValue::from("NIRMS")));
            assert_eq!(item.type_of_treatment, Some(CellValue::from("Processed")));
        }
    }

    #[test]
    fn test_blanket_absent_keeps_row_values() {
        let model = model(json!({
            "blanket_nirms": {"regex": "all goods in this consignment are nirms", "value": "NIRMS"}
        }));
        let rows = vec![
            row(&[Some("Description"), Some("Commodity Code"), Some("Packages"), Some("Net Weight"), Some("NIRMS")]),
            row(&[Some("Apples"), Some("0101"), Some("10"), Some("100"), Some("Non-NIRMS")]),
        ];
        let items = map_rows(&rows, 0, 1, &model, "Sheet1").unwrap();
        assert_eq!(items[0].nirms, Some(CellValue::from("Non-NIRMS")));
    }

    #[test]
    fn test_map_header_match_uses_resolved_columns() {
        let model = model(json!({}));
        let sheet = crate::workbook::Sheet::new(
            "Sheet1",
            vec![
                row(&[Some("RMS-GB-000015-001")]),
                row(&[Some("Description"), Some("Commodity Code"), Some("Packages"), Some("Net Weight")]),
                row(&[Some("Apples"), Some("0101"), Some("10"), Some("100")]),
            ],
        );
        let mut header = crate::row_finder::find_header(&sheet, &model).unwrap();
        assert_eq!(
            map_header_match(&sheet.rows, &header, &model).unwrap(),
            map_rows(&sheet.rows, 1, 2, &model, "Sheet1").unwrap()
        );

        header.columns = HeaderColumns::resolve(&row(&[Some("Description")]), &model);
        let items = map_header_match(&sheet.rows, &header, &model).unwrap();
        assert_eq!(items[0].description, Some(CellValue::from("Apples")));
        assert_eq!(items[0].commodity_code, None);
    }

    #[test]
    fn test_header_index_out_of_range() {
        let model = model(json!({}));
        let err = map_rows(&[], 3, 4, &model, "Sheet1").unwrap_err();
        assert!(matches!(err, ParseError::RowOutOfRange { index: 3, .. }));
    }

    #[test]
    fn test_data_index_past_end_yields_nothing() {
        let model = model(json!({}));
        let rows = vec![row(&[Some("Description"), Some("Commodity Code"), Some("Packages"), Some("Net Weight")])];
        assert!(map_rows(&rows, 0, 10, &model, "Sheet1").unwrap().is_empty());
    }
}
