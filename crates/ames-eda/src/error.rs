//! Custom error types for the cleaning and EDA pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Every failure
//! of a run is fatal: the pipeline never retries or recovers, it stops and
//! hands the error back to the caller.
//!
//! Errors are serializable so the CLI can print them as JSON when `--json`
//! output is requested.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the pipeline.
#[derive(Error, Debug)]
pub enum EdaError {
    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// An input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No observed values in a column a statistic is computed on.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// The log transform was asked to take the log of a non-positive value.
    #[error("Column '{column}' has non-positive value {value} at row {row}; log is undefined")]
    NonPositiveValue { column: String, row: usize, value: f64 },

    /// A column has a type the operation cannot work with.
    #[error("Column '{column}' has type {dtype}, expected {expected}")]
    SchemaMismatch {
        column: String,
        dtype: String,
        expected: String,
    },

    /// Chart rendering failed.
    #[error("Failed to render figure '{figure}': {reason}")]
    PlotFailed { figure: String, reason: String },

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EdaError>,
    },
}

impl EdaError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EdaError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, independent of the message text.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InputNotFound(_) => "INPUT_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::NonPositiveValue { .. } => "NON_POSITIVE_VALUE",
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::PlotFailed { .. } => "PLOT_FAILED",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a lookup failure (a referenced column is absent).
    pub fn is_lookup_error(&self) -> bool {
        match self {
            Self::ColumnNotFound(_) => true,
            Self::WithContext { source, .. } => source.is_lookup_error(),
            _ => false,
        }
    }

    /// Check if this error comes from a statistic that cannot be computed on the data.
    pub fn is_degenerate_statistic(&self) -> bool {
        match self {
            Self::NoValidValues(_) | Self::NonPositiveValue { .. } => true,
            Self::WithContext { source, .. } => source.is_degenerate_statistic(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for EdaError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EdaError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, EdaError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EdaError::Polars(e).with_context(context))
    }
}
