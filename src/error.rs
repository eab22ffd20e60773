//! Error taxonomy for the engine

use thiserror::Error;

/// Errors raised by the financial engine.
///
/// Every computation either fully succeeds or fails with one of these before
/// producing output. Zero-guarded ratios are not errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid loan terms: {reason}")]
    InvalidLoanTerms { reason: String },

    #[error("invalid projection input: {reason}")]
    InvalidProjectionInput { reason: String },

    #[error("numeric instability in {context}")]
    NumericInstability { context: String },

    #[error("invalid input for `{field}`: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn loan_terms(reason: impl Into<String>) -> Self {
        EngineError::InvalidLoanTerms { reason: reason.into() }
    }

    pub(crate) fn projection_input(reason: impl Into<String>) -> Self {
        EngineError::InvalidProjectionInput { reason: reason.into() }
    }

    pub(crate) fn numeric(context: impl Into<String>) -> Self {
        EngineError::NumericInstability { context: context.into() }
    }

    pub(crate) fn input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
