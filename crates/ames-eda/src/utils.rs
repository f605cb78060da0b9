//! Shared utilities for the pipeline.
//!
//! Column lookup, dtype classification and value extraction helpers used by
//! the profiler, the imputer and the chart renderers.

use crate::error::{EdaError, Result};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    is_numeric_dtype(dtype) && !matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Names of the numeric columns of a table, in table order.
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .collect()
}

// =============================================================================
// Column Access
// =============================================================================

/// Look up a column, turning an absent name into [`EdaError::ColumnNotFound`].
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| EdaError::ColumnNotFound(name.to_string()))
}

/// True when the table has a column with this name.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Values of a numeric column as `f64`, nulls kept as `None`.
pub fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = require_column(df, name)?;
    if !is_numeric_dtype(column.dtype()) {
        return Err(EdaError::SchemaMismatch {
            column: name.to_string(),
            dtype: column.dtype().to_string(),
            expected: "numeric".to_string(),
        });
    }
    let cast = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Non-null values of a numeric column as `f64`.
pub fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(column_f64(df, name)?.into_iter().flatten().collect())
}

/// Values of any column rendered as text labels, nulls kept as `None`.
pub fn column_labels(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = require_column(df, name)?;
    let cast = column.as_materialized_series().cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Pairs of non-null `(x, y)` values from two numeric columns of one table.
pub fn paired_values(df: &DataFrame, x: &str, y: &str) -> Result<Vec<(f64, f64)>> {
    let xs = column_f64(df, x)?;
    let ys = column_f64(df, y)?;
    Ok(xs
        .into_iter()
        .zip(ys)
        .filter_map(|(a, b)| Some((a?, b?)))
        .collect())
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Most frequent value of an already sorted slice.
///
/// Ties go to the first run, so on ascending input the smallest of the most
/// frequent values wins. Returns the value and its count.
pub fn sorted_mode<T: PartialEq + Clone>(sorted: &[T]) -> Option<(T, usize)> {
    let mut best: Option<(&T, usize)> = None;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let run = j - i;
        if best.is_none_or(|(_, count)| run > count) {
            best = Some((&sorted[i], run));
        }
        i = j;
    }
    best.map(|(value, count)| (value.clone(), count))
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill nulls of an integer Series, keeping its dtype.
pub fn fill_integer_nulls(series: &Series, fill_value: i64) -> PolarsResult<Series> {
    let cast = series.cast(&DataType::Int64)?;
    let filled: Vec<i64> = cast
        .i64()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Series::new(series.name().clone(), filled).cast(series.dtype())
}

/// Fill nulls of a float Series, keeping its dtype.
pub fn fill_float_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let cast = series.cast(&DataType::Float64)?;
    let filled: Vec<f64> = cast
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Series::new(series.name().clone(), filled).cast(series.dtype())
}

/// Fill nulls of a boolean Series.
pub fn fill_bool_nulls(series: &Series, fill_value: bool) -> PolarsResult<Series> {
    let filled: Vec<bool> = series
        .bool()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill nulls of a Series with a text value; the result is a String Series.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let cast = series.cast(&DataType::String)?;
    let filled: Vec<String> = cast
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value).to_string())
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Round to two decimals, the precision used in printed summaries.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
