//! Parse result types handed to the orchestration service.
//!
//! Key names follow the wire format the downstream persistence layer reads,
//! which mixes snake_case item fields with a few camelCase flags.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::model::{BlanketStatement, Field};
use crate::workbook::CellValue;

/// Parser model reported when no template matched.
pub const NOMATCH: &str = "NOMATCH";

/// Where an item came from in the source workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLocation {
    #[serde(rename = "sheetName")]
    pub sheet_name: String,
    /// 1-based spreadsheet row.
    #[serde(rename = "rowNumber")]
    pub row_number: usize,
}

/// One canonical extracted line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: Option<CellValue>,
    pub nature_of_products: Option<CellValue>,
    pub type_of_treatment: Option<CellValue>,
    pub commodity_code: Option<CellValue>,
    pub number_of_packages: Option<CellValue>,
    pub total_net_weight_kg: Option<CellValue>,
    pub total_net_weight_unit: Option<CellValue>,
    pub country_of_origin: Option<CellValue>,
    /// Raw NIRMS text; mapped to a tri-state downstream.
    pub nirms: Option<CellValue>,
    pub row_location: RowLocation,
}

impl LineItem {
    /// An item with every field unset.
    pub fn empty(sheet_name: impl Into<String>, row_number: usize) -> Self {
        Self {
            description: None,
            nature_of_products: None,
            type_of_treatment: None,
            commodity_code: None,
            number_of_packages: None,
            total_net_weight_kg: None,
            total_net_weight_unit: None,
            country_of_origin: None,
            nirms: None,
            row_location: RowLocation {
                sheet_name: sheet_name.into(),
                row_number,
            },
        }
    }

    pub fn set(&mut self, field: Field, value: Option<CellValue>) {
        let slot = match field {
            Field::Description => &mut self.description,
            Field::NatureOfProducts => &mut self.nature_of_products,
            Field::TypeOfTreatment => &mut self.type_of_treatment,
            Field::CommodityCode => &mut self.commodity_code,
            Field::NumberOfPackages => &mut self.number_of_packages,
            Field::TotalNetWeightKg => &mut self.total_net_weight_kg,
            Field::TotalNetWeightUnit => &mut self.total_net_weight_unit,
            Field::CountryOfOrigin => &mut self.country_of_origin,
            Field::Nirms => &mut self.nirms,
        };
        *slot = value;
    }
}

/// Minimal completeness verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessChecks {
    pub all_required_fields_present: bool,
    /// Filled in by the downstream validation layer.
    pub failure_reasons: Option<Vec<String>>,
}

/// Final output of one parse attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub registration_approval_number: Option<String>,
    pub items: Vec<LineItem>,
    pub business_checks: BusinessChecks,
    #[serde(rename = "parserModel")]
    pub parser_model: String,
    pub establishment_numbers: Vec<String>,
    #[serde(rename = "unitInHeader")]
    pub unit_in_header: bool,
    #[serde(rename = "validateCountryOfOrigin")]
    pub validate_country_of_origin: bool,
    #[serde(rename = "blanketNirms", serialize_with = "serialize_blanket")]
    pub blanket_nirms: Option<BlanketStatement>,
}

impl ParseResult {
    pub fn is_no_match(&self) -> bool {
        self.parser_model == NOMATCH
    }
}

/// An absent blanket statement is written as `false`.
fn serialize_blanket<S: Serializer>(
    value: &Option<BlanketStatement>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(statement) => statement.serialize(serializer),
        None => serializer.serialize_bool(false),
    }
}

/// Classification of one template's structural check against a workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatcherResult {
    Correct,
    EmptyFile,
    WrongEstablishmentNumber,
    WrongHeader,
    GenericError,
}

impl fmt::Display for MatcherResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatcherResult::Correct => "CORRECT",
            MatcherResult::EmptyFile => "EMPTY_FILE",
            MatcherResult::WrongEstablishmentNumber => "WRONG_ESTABLISHMENT_NUMBER",
            MatcherResult::WrongHeader => "WRONG_HEADER",
            MatcherResult::GenericError => "GENERIC_ERROR",
        };
        f.write_str(s)
    }
}
