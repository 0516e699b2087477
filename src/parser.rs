//! Per-template parse orchestration.
//!
//! Runs header discovery, row filtering and mapping over every sheet a
//! template accepts, then hands the items to the combiner. Establishment
//! numbers are gathered from every sheet. Faults never escape: they are
//! logged and reported as `NOMATCH`.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info, info_span};

use crate::combiner;
use crate::error::ParseError;
use crate::mapper;
use crate::model::ModelDefinition;
use crate::patterns::{self, ESTABLISHMENT_NUMBER};
use crate::result::ParseResult;
use crate::row_finder;
use crate::workbook::{Sheet, Workbook};

/// Parse `workbook` with one template. Always returns a result.
pub fn parse(workbook: &Workbook, model: &ModelDefinition) -> ParseResult {
    let span = info_span!("parse", model = %model.id);
    let _enter = span.enter();

    guarded(&model.id, || try_parse(workbook, model))
}

/// Run a parse step, turning an error or panic into a `NOMATCH` result.
fn guarded<F>(model_id: &str, step: F) -> ParseResult
where
    F: FnOnce() -> Result<ParseResult, ParseError>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(step))
        .unwrap_or_else(|payload| Err(ParseError::from_panic(model_id, payload.as_ref())));

    match outcome {
        Ok(result) => result,
        Err(e) => {
            error!("Parse with model {} failed: {}", model_id, e);
            combiner::no_match()
        }
    }
}

/// Sheets the template does not list as invalid, in workbook order.
pub fn valid_sheets<'a>(
    workbook: &'a Workbook,
    model: &'a ModelDefinition,
) -> impl Iterator<Item = &'a Sheet> + 'a {
    workbook.sheets().iter().filter(move |sheet| {
        let valid = !model.is_invalid_sheet(&sheet.name);
        if !valid {
            debug!("Ignoring invalid sheet '{}' for model {}", sheet.name, model.id);
        }
        valid
    })
}

fn try_parse(workbook: &Workbook, model: &ModelDefinition) -> Result<ParseResult, ParseError> {
    let registration_approval_number = valid_sheets(workbook, model)
        .next()
        .and_then(|sheet| patterns::find_match(&model.establishment_number, &sheet.rows))
        .map(|number| number.to_uppercase());

    let mut establishment_numbers = Vec::new();
    for sheet in workbook.sheets() {
        patterns::find_all_matches(&ESTABLISHMENT_NUMBER, &sheet.rows, &mut establishment_numbers);
    }

    let mut items = Vec::new();
    let mut matched_sheets = 0usize;

    for sheet in valid_sheets(workbook, model) {
        let Some(header) = row_finder::find_header(sheet, model) else {
            debug!("No {} header on sheet '{}', skipping", model.id, sheet.name);
            continue;
        };
        matched_sheets += 1;

        items.extend(mapper::map_header_match(&sheet.rows, &header, model)?);
    }

    info!(
        "Model {} parsed {} item(s) from {} sheet(s), establishment number {:?}",
        model.id,
        items.len(),
        matched_sheets,
        registration_approval_number
    );

    Ok(combiner::combine(
        registration_approval_number,
        items,
        matched_sheets > 0,
        &model.id,
        establishment_numbers,
        Some(model),
    ))
}
