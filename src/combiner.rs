//! Final result assembly.

use crate::model::ModelDefinition;
use crate::result::{BusinessChecks, LineItem, ParseResult, NOMATCH};

/// Assemble a [`ParseResult`] from a template's output.
///
/// A `None` model yields all-false template flags.
pub fn combine(
    registration_approval_number: Option<String>,
    items: Vec<LineItem>,
    all_required_fields_present: bool,
    parser_model: &str,
    establishment_numbers: Vec<String>,
    model: Option<&ModelDefinition>,
) -> ParseResult {
    ParseResult {
        registration_approval_number,
        items,
        business_checks: BusinessChecks {
            all_required_fields_present,
            failure_reasons: None,
        },
        parser_model: parser_model.to_string(),
        establishment_numbers,
        unit_in_header: model.is_some_and(|m| m.find_unit_in_header),
        validate_country_of_origin: model.is_some_and(|m| m.validate_country_of_origin),
        blanket_nirms: model.and_then(|m| m.blanket_nirms.clone()),
    }
}

/// The result reported when no template produced a usable parse.
pub fn no_match() -> ParseResult {
    combine(None, Vec::new(), false, NOMATCH, Vec::new(), None)
}
