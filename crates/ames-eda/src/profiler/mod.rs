//! Data profiling module for dataset analysis.
//!
//! This module provides functionality for profiling tables, including:
//! - Missing-value reports
//! - `describe()`-style summaries with skew and kurtosis
//! - Correlation matrices and ranking against the target

mod missing;
pub mod statistics;

pub use missing::{missing_report, numeric_missing_report};
pub use statistics::CorrelationMatrix;

use crate::error::{EdaError, Result};
use crate::types::{CorrelationEntry, TargetSummary};
use crate::utils::{column_f64, column_values, numeric_column_names, require_column};
use polars::prelude::*;
use tracing::debug;

/// Data profiler for computing table statistics.
pub struct DataProfiler;

impl DataProfiler {
    /// Summary of one numeric column over its non-missing values.
    pub fn summarize(df: &DataFrame, column: &str) -> Result<TargetSummary> {
        let values = column_values(df, column)?;
        statistics::describe(column, &values)
            .ok_or_else(|| EdaError::NoValidValues(column.to_string()))
    }

    /// Correlation matrix over all numeric columns.
    pub fn correlation_matrix(df: &DataFrame) -> Result<CorrelationMatrix> {
        let columns = numeric_column_names(df);
        let data = columns
            .iter()
            .map(|c| column_f64(df, c))
            .collect::<Result<Vec<_>>>()?;
        debug!("Correlation matrix over {} numeric columns", columns.len());
        Ok(CorrelationMatrix::from_columns(columns, &data))
    }

    /// The `k` columns most correlated with `target`, target included.
    pub fn top_correlations(df: &DataFrame, target: &str, k: usize) -> Result<Vec<CorrelationEntry>> {
        require_column(df, target)?;
        let matrix = Self::correlation_matrix(df)?;
        let index = matrix
            .columns
            .iter()
            .position(|c| c == target)
            .ok_or_else(|| EdaError::SchemaMismatch {
                column: target.to_string(),
                dtype: df
                    .column(target)
                    .map(|c| c.dtype().to_string())
                    .unwrap_or_default(),
                expected: "numeric".to_string(),
            })?;
        Ok(statistics::nlargest(&matrix, index, k))
    }

    /// Correlation matrix restricted to the given columns, in that order.
    pub fn correlation_submatrix(df: &DataFrame, columns: &[String]) -> Result<CorrelationMatrix> {
        let data = columns
            .iter()
            .map(|c| column_f64(df, c))
            .collect::<Result<Vec<_>>>()?;
        Ok(CorrelationMatrix::from_columns(columns.to_vec(), &data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn houses() -> DataFrame {
        df![
            "SalePrice" => [100.0, 200.0, 300.0, 400.0, 500.0],
            "GrLivArea" => [1000i64, 1900, 3100, 3900, 5000],
            "YrSold" => [2008i64, 2006, 2010, 2007, 2009],
            "Street" => ["Pave", "Pave", "Grvl", "Pave", "Pave"],
        ]
        .unwrap()
    }

    #[test]
    fn test_summarize() {
        let summary = DataProfiler::summarize(&houses(), "SalePrice").unwrap();
        assert_eq!(summary.count, 5);
        assert_eq!(summary.mean, 300.0);
        assert_eq!(summary.median, 300.0);
        assert_eq!(summary.skew, Some(0.0));
    }

    #[test]
    fn test_summarize_all_missing() {
        let df = df!["SalePrice" => [None::<f64>, None]].unwrap();
        let err = DataProfiler::summarize(&df, "SalePrice").unwrap_err();
        assert!(err.is_degenerate_statistic());
    }

    #[test]
    fn test_top_correlations_include_target_first() {
        let top = DataProfiler::top_correlations(&houses(), "SalePrice", 2).unwrap();
        let names: Vec<&str> = top.iter().map(|e| e.column.as_str()).collect();
        assert_eq!(names, vec!["SalePrice", "GrLivArea"]);
        assert_eq!(top[0].coefficient, 1.0);
    }

    #[test]
    fn test_correlation_matrix_skips_text_columns() {
        let matrix = DataProfiler::correlation_matrix(&houses()).unwrap();
        assert_eq!(matrix.columns, vec!["SalePrice", "GrLivArea", "YrSold"]);
    }

    #[test]
    fn test_top_correlations_missing_target() {
        let err = DataProfiler::top_correlations(&houses(), "Price", 3).unwrap_err();
        assert!(err.is_lookup_error());
    }
}
