//! Packing list parser - rule-driven template matching and line item extraction
//! for retailer packing list spreadsheets.
//!
//! The engine is synchronous and stateless per call. A [`ModelRegistry`] is
//! immutable once built and can be shared across threads.
//!
//! ```no_run
//! use packing_list_parser::{parse_packing_list, ModelRegistry, Workbook};
//!
//! let registry = ModelRegistry::builtin()?;
//! let workbook = Workbook::from_json_str(r#"{"Sheet1": [{"A": "RMS-GB-000015-001"}]}"#)?;
//! let result = parse_packing_list(&workbook, &registry);
//! println!("{}", result.parser_model);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod combiner;
pub mod config;
pub mod error;
pub mod mapper;
pub mod model;
pub mod parser;
pub mod patterns;
pub mod registry;
pub mod result;
pub mod row_filter;
pub mod row_finder;
pub mod sanitizer;
pub mod selector;
pub mod workbook;

pub use error::{ModelError, ParseError, WorkbookError};
pub use model::{Field, ModelConfig, ModelDefinition};
pub use registry::ModelRegistry;
pub use result::{BusinessChecks, LineItem, MatcherResult, ParseResult, RowLocation, NOMATCH};
pub use workbook::{CellValue, Row, Sheet, Workbook};

/// Sanitize a workbook, select the matching template and parse with it.
///
/// Always returns a result; `parser_model` is [`NOMATCH`] when no template fits.
pub fn parse_packing_list(workbook: &Workbook, registry: &ModelRegistry) -> ParseResult {
    let sanitized = sanitizer::sanitize(workbook);
    selector::select_and_parse(&sanitized, registry)
}
