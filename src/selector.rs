//! Template selection.
//!
//! Each non-deprecated template gets a structural check in registry order;
//! the first `CORRECT` one parses the workbook.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info, warn};

use crate::combiner;
use crate::error::ParseError;
use crate::model::ModelDefinition;
use crate::parser;
use crate::patterns;
use crate::registry::ModelRegistry;
use crate::result::{MatcherResult, ParseResult};
use crate::row_finder;
use crate::workbook::Workbook;

/// Outcome of checking every candidate template against one workbook.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    /// First template classified `CORRECT`, in registry order.
    pub model: Option<&'a ModelDefinition>,
    /// Classification per candidate, in registry order.
    pub outcomes: Vec<(&'a str, MatcherResult)>,
}

impl Selection<'_> {
    /// Ids of every template classified `CORRECT`.
    pub fn matching_ids(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, r)| *r == MatcherResult::Correct)
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Structural check of one template against a workbook.
pub fn matches(workbook: &Workbook, model: &ModelDefinition) -> MatcherResult {
    guarded(&model.id, || classify(workbook, model))
}

/// Run a matcher check, reporting a panic as `GENERIC_ERROR`.
fn guarded<F>(model_id: &str, check: F) -> MatcherResult
where
    F: FnOnce() -> MatcherResult,
{
    match panic::catch_unwind(AssertUnwindSafe(check)) {
        Ok(result) => result,
        Err(payload) => {
            let e = ParseError::from_panic(model_id, payload.as_ref());
            error!("Matcher for model {} failed: {}", model_id, e);
            MatcherResult::GenericError
        }
    }
}

fn classify(workbook: &Workbook, model: &ModelDefinition) -> MatcherResult {
    if !workbook.has_data_rows() {
        return MatcherResult::EmptyFile;
    }

    let mut sheets = parser::valid_sheets(workbook, model).peekable();
    let Some(first) = sheets.peek() else {
        return MatcherResult::EmptyFile;
    };
    if !patterns::test_any(&model.establishment_number, &first.rows) {
        return MatcherResult::WrongEstablishmentNumber;
    }

    if sheets.any(|sheet| row_finder::find_header(sheet, model).is_some()) {
        MatcherResult::Correct
    } else {
        MatcherResult::WrongHeader
    }
}

/// Classify every non-deprecated template and pick the first `CORRECT` one.
pub fn select_model<'a>(workbook: &Workbook, registry: &'a ModelRegistry) -> Selection<'a> {
    let outcomes: Vec<(&str, MatcherResult)> = registry
        .candidates()
        .map(|model| {
            let result = matches(workbook, model);
            debug!("Model {}: {}", model.id, result);
            (model.id.as_str(), result)
        })
        .collect();

    let model = outcomes
        .iter()
        .find(|(_, r)| *r == MatcherResult::Correct)
        .and_then(|(id, _)| registry.get(id));

    let selection = Selection { model, outcomes };
    let matching = selection.matching_ids();
    if matching.len() > 1 {
        warn!(
            "Workbook matches {} models {:?}; using {}",
            matching.len(),
            matching,
            matching[0]
        );
    }
    selection
}

/// Select a template and parse with it, or report `NOMATCH`.
pub fn select_and_parse(workbook: &Workbook, registry: &ModelRegistry) -> ParseResult {
    let selection = select_model(workbook, registry);
    match selection.model {
        Some(model) => {
            info!("Packing list matches model {}", model.id);
            parser::parse(workbook, model)
        }
        None => {
            info!("Packing list matches no model");
            combiner::no_match()
        }
    }
}
