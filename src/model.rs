//! Retailer template definitions.
//!
//! A [`ModelConfig`] is the serializable form of a template (regexes as
//! strings). [`ModelDefinition::compile`] turns it into the immutable,
//! pre-compiled form the engine works with. All patterns are compiled
//! case-insensitively.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::result::NOMATCH;

/// Canonical line item fields a template can locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Description,
    NatureOfProducts,
    TypeOfTreatment,
    CommodityCode,
    NumberOfPackages,
    TotalNetWeightKg,
    TotalNetWeightUnit,
    CountryOfOrigin,
    Nirms,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Description => "description",
            Field::NatureOfProducts => "nature_of_products",
            Field::TypeOfTreatment => "type_of_treatment",
            Field::CommodityCode => "commodity_code",
            Field::NumberOfPackages => "number_of_packages",
            Field::TotalNetWeightKg => "total_net_weight_kg",
            Field::TotalNetWeightUnit => "total_net_weight_unit",
            Field::CountryOfOrigin => "country_of_origin",
            Field::Nirms => "nirms",
        }
    }

    /// Quantity columns that a totals row typically fills in.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Field::NumberOfPackages | Field::TotalNetWeightKg)
    }

    /// Columns that only a genuine line item fills in.
    pub fn is_identifying(&self) -> bool {
        matches!(
            self,
            Field::NatureOfProducts | Field::TypeOfTreatment | Field::CountryOfOrigin | Field::Nirms
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Serializable configuration
// ============================================================================

/// Serializable template definition, as stored in `models/*.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Parser model id reported in results (e.g. "ASDA3").
    pub id: String,
    /// Regex locating this retailer's establishment number.
    pub establishment_number: String,
    /// Header regex per field.
    pub headers: BTreeMap<Field, String>,
    /// Fields whose headers must all be present for a row to count as the header row.
    pub required: Vec<Field>,
    #[serde(default)]
    pub find_unit_in_header: bool,
    #[serde(default)]
    pub validate_country_of_origin: bool,
    #[serde(default)]
    pub skip_totals_rows: bool,
    #[serde(default)]
    pub skip_repeated_headers: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default = "default_totals_keywords")]
    pub totals_row_keywords: Vec<String>,
    #[serde(default)]
    pub totals_row_pattern: TotalsRowPattern,
    /// Sheet names ignored by this template (compared case-insensitively).
    #[serde(default)]
    pub invalid_sheets: Vec<String>,
    #[serde(default)]
    pub blanket_nirms: Option<BlanketConfig>,
    #[serde(default)]
    pub blanket_treatment_type: Option<BlanketConfig>,
}

fn default_totals_keywords() -> Vec<String> {
    vec!["total".to_string()]
}

fn default_true() -> bool {
    true
}

/// Shape of a keyword-less totals row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsRowPattern {
    #[serde(default = "default_true")]
    pub description_empty: bool,
    #[serde(default = "default_true")]
    pub commodity_code_empty: bool,
}

impl Default for TotalsRowPattern {
    fn default() -> Self {
        Self {
            description_empty: true,
            commodity_code_empty: true,
        }
    }
}

/// A sheet-wide statement: when `regex` matches any cell, `value` applies to every item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlanketConfig {
    pub regex: String,
    pub value: String,
}

// ============================================================================
// Compiled definition
// ============================================================================

/// Compiled sheet-wide statement.
#[derive(Debug, Clone)]
pub struct BlanketStatement {
    pub regex: Regex,
    pub value: String,
}

impl PartialEq for BlanketStatement {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str() && self.value == other.value
    }
}

impl Serialize for BlanketStatement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("BlanketStatement", 2)?;
        s.serialize_field("regex", self.regex.as_str())?;
        s.serialize_field("value", &self.value)?;
        s.end()
    }
}

/// One retailer/version template, ready for matching and extraction.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    pub id: String,
    pub establishment_number: Regex,
    field_patterns: BTreeMap<Field, Regex>,
    required_fields: BTreeSet<Field>,
    optional_fields: BTreeSet<Field>,
    pub find_unit_in_header: bool,
    pub validate_country_of_origin: bool,
    pub skip_totals_rows: bool,
    pub skip_repeated_headers: bool,
    pub deprecated: bool,
    /// Lowercased.
    pub totals_row_keywords: Vec<String>,
    pub totals_row_pattern: TotalsRowPattern,
    invalid_sheets: Vec<String>,
    pub blanket_nirms: Option<BlanketStatement>,
    pub blanket_treatment_type: Option<BlanketStatement>,
}

impl ModelDefinition {
    /// Compile and validate a template configuration.
    pub fn compile(config: &ModelConfig) -> Result<Self, ModelError> {
        let id = config.id.trim().to_string();
        if id.is_empty() {
            return Err(ModelError::EmptyId);
        }
        if id.eq_ignore_ascii_case(NOMATCH) {
            return Err(ModelError::ReservedId(id));
        }

        let establishment_number =
            compile_pattern(&id, "establishment_number", &config.establishment_number)?;

        let mut field_patterns = BTreeMap::new();
        for (field, pattern) in &config.headers {
            field_patterns.insert(*field, compile_pattern(&id, field.as_str(), pattern)?);
        }

        let required_fields: BTreeSet<Field> = config.required.iter().copied().collect();
        if required_fields.is_empty() {
            return Err(ModelError::NoRequiredFields { model: id });
        }
        if let Some(field) = required_fields
            .iter()
            .find(|f| !field_patterns.contains_key(*f))
        {
            return Err(ModelError::MissingPattern {
                model: id,
                field: *field,
            });
        }
        let optional_fields = field_patterns
            .keys()
            .filter(|f| !required_fields.contains(*f))
            .copied()
            .collect();

        let blanket_nirms = config
            .blanket_nirms
            .as_ref()
            .map(|b| compile_blanket(&id, "blanket_nirms", b))
            .transpose()?;
        let blanket_treatment_type = config
            .blanket_treatment_type
            .as_ref()
            .map(|b| compile_blanket(&id, "blanket_treatment_type", b))
            .transpose()?;

        Ok(Self {
            id,
            establishment_number,
            field_patterns,
            required_fields,
            optional_fields,
            find_unit_in_header: config.find_unit_in_header,
            validate_country_of_origin: config.validate_country_of_origin,
            skip_totals_rows: config.skip_totals_rows,
            skip_repeated_headers: config.skip_repeated_headers,
            deprecated: config.deprecated,
            totals_row_keywords: config
                .totals_row_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            totals_row_pattern: config.totals_row_pattern,
            invalid_sheets: config.invalid_sheets.clone(),
            blanket_nirms,
            blanket_treatment_type,
        })
    }

    /// Header regex for a field, if the template maps it.
    pub fn pattern(&self, field: Field) -> Option<&Regex> {
        self.field_patterns.get(&field)
    }

    /// All header regexes in field order.
    pub fn field_patterns(&self) -> impl Iterator<Item = (Field, &Regex)> {
        self.field_patterns.iter().map(|(f, r)| (*f, r))
    }

    pub fn has_field_patterns(&self) -> bool {
        !self.field_patterns.is_empty()
    }

    pub fn required_fields(&self) -> &BTreeSet<Field> {
        &self.required_fields
    }

    pub fn optional_fields(&self) -> &BTreeSet<Field> {
        &self.optional_fields
    }

    pub fn is_required(&self, field: Field) -> bool {
        self.required_fields.contains(&field)
    }

    /// True when this template ignores the named sheet.
    pub fn is_invalid_sheet(&self, name: &str) -> bool {
        let name = name.trim();
        self.invalid_sheets
            .iter()
            .any(|s| s.trim().eq_ignore_ascii_case(name))
    }
}

fn compile_pattern(model: &str, field: &str, pattern: &str) -> Result<Regex, ModelError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ModelError::InvalidPattern {
            model: model.to_string(),
            field: field.to_string(),
            source,
        })
}

fn compile_blanket(
    model: &str,
    field: &str,
    config: &BlanketConfig,
) -> Result<BlanketStatement, ModelError> {
    Ok(BlanketStatement {
        regex: compile_pattern(model, field, &config.regex)?,
        value: config.value.clone(),
    })
}
