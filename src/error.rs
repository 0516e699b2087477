//! Error types for template configuration, workbook input and parsing.

use thiserror::Error;

use crate::model::Field;

/// Errors raised while compiling template definitions.
///
/// These surface once, when the registry is built, and are fatal for the caller.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A template without an id cannot be selected or reported.
    #[error("model id must not be empty")]
    EmptyId,

    /// `NOMATCH` is the sentinel parser model and cannot name a template.
    #[error("'{0}' is reserved and cannot be used as a model id")]
    ReservedId(String),

    /// Two templates share the same id.
    #[error("duplicate model id '{0}'")]
    DuplicateModel(String),

    /// A regex in the template failed to compile.
    #[error("invalid {field} pattern for model '{model}': {source}")]
    InvalidPattern {
        model: String,
        field: String,
        #[source]
        source: regex::Error,
    },

    /// The header predicate would match every row.
    #[error("model '{model}' declares no required fields")]
    NoRequiredFields { model: String },

    /// A required field has no header pattern to locate it.
    #[error("model '{model}' requires field '{field}' but defines no header pattern for it")]
    MissingPattern { model: String, field: Field },

    /// An embedded or loaded template file is not valid JSON for a template.
    #[error("failed to read model config '{name}': {source}")]
    Config {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while reading a workbook from its JSON form.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("invalid workbook JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Internal faults during a per-template parse.
///
/// Never returned to callers of [`crate::parser::parse`]; they are logged and
/// turned into a `NOMATCH` result.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("sheet '{sheet}' has no row {index}")]
    RowOutOfRange { sheet: String, index: usize },

    #[error("model '{model}' panicked: {message}")]
    Panicked { model: String, message: String },
}

impl ParseError {
    /// Build a [`ParseError::Panicked`] from a caught panic payload.
    pub fn from_panic(model: &str, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        ParseError::Panicked {
            model: model.to_string(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    fn caught<F: FnOnce() + panic::UnwindSafe>(f: F) -> Box<dyn std::any::Any + Send> {
        panic::catch_unwind(f).unwrap_err()
    }

    #[test]
    fn test_from_panic_static_message() {
        let payload = caught(|| panic!("header row missing"));
        let err = ParseError::from_panic("ASDA3", payload.as_ref());
        assert!(matches!(
            &err,
            ParseError::Panicked { model, message }
                if model == "ASDA3" && message == "header row missing"
        ));
        assert_eq!(err.to_string(), "model 'ASDA3' panicked: header row missing");
    }

    #[test]
    fn test_from_panic_formatted_message() {
        let row = 7;
        let payload = caught(move || panic!("no row {}", row));
        let err = ParseError::from_panic("ASDA3", payload.as_ref());
        assert!(matches!(err, ParseError::Panicked { message, .. } if message == "no row 7"));
    }

    #[test]
    fn test_from_panic_unknown_payload() {
        let payload = caught(|| panic::panic_any(42u8));
        let err = ParseError::from_panic("ASDA3", payload.as_ref());
        assert!(matches!(err, ParseError::Panicked { message, .. } if message == "unknown panic"));
    }
}
