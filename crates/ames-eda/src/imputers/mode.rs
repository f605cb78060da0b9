//! Mode imputation.
//!
//! Fills the missing entries of a column with its most frequent observed
//! value. Ties go to the smallest value (integers and floats compare
//! numerically, text lexicographically), so the result does not depend on
//! row order.

use crate::error::{EdaError, Result};
use crate::types::{ImputationRecord, ModeValue, TableKind};
use crate::utils::{
    fill_bool_nulls, fill_float_nulls, fill_integer_nulls, fill_string_nulls, is_integer_dtype,
    is_numeric_dtype, require_column, sorted_mode,
};
use polars::prelude::*;
use tracing::debug;

/// Mode imputer for filling missing values.
pub struct ModeImputer;

impl ModeImputer {
    /// Most frequent non-missing value of a column, in the column's own type.
    pub fn mode(series: &Series) -> Result<ModeValue> {
        let name = series.name().to_string();
        let dtype = series.dtype();

        let mode = if is_integer_dtype(dtype) {
            let cast = series.cast(&DataType::Int64)?;
            let mut values: Vec<i64> = cast.i64()?.into_iter().flatten().collect();
            values.sort_unstable();
            sorted_mode(&values).map(|(v, _)| ModeValue::Int(v))
        } else if is_numeric_dtype(dtype) {
            let cast = series.cast(&DataType::Float64)?;
            let mut values: Vec<f64> = cast
                .f64()?
                .into_iter()
                .flatten()
                .filter(|v| !v.is_nan())
                .collect();
            values.sort_by(|a, b| a.total_cmp(b));
            sorted_mode(&values).map(|(v, _)| ModeValue::Float(v))
        } else if matches!(dtype, DataType::Boolean) {
            let mut values: Vec<bool> = series.bool()?.into_iter().flatten().collect();
            values.sort_unstable();
            sorted_mode(&values).map(|(v, _)| ModeValue::Bool(v))
        } else {
            let cast = series.cast(&DataType::String)?;
            let mut values: Vec<&str> = cast.str()?.into_iter().flatten().collect();
            values.sort_unstable();
            sorted_mode(&values).map(|(v, _)| ModeValue::Str(v.to_string()))
        };

        mode.ok_or(EdaError::NoValidValues(name))
    }

    /// Replace the missing entries of `column` with its mode.
    ///
    /// The mode is computed on this table alone. A column without missing
    /// entries is left untouched and reported with `filled == 0`.
    pub fn impute(df: &mut DataFrame, column: &str, table: TableKind) -> Result<ImputationRecord> {
        let series = require_column(df, column)?.as_materialized_series().clone();
        let value = Self::mode(&series)?;
        let filled = series.null_count();

        if filled > 0 {
            let replacement = match &value {
                ModeValue::Int(v) => fill_integer_nulls(&series, *v)?,
                ModeValue::Float(v) => fill_float_nulls(&series, *v)?,
                ModeValue::Bool(v) => fill_bool_nulls(&series, *v)?,
                ModeValue::Str(v) => fill_string_nulls(&series, v)?,
            };
            df.replace(column, replacement)?;
        }

        debug!("[{}] Filled {} entries of '{}' with mode {}", table, filled, column, value);

        Ok(ImputationRecord {
            table,
            column: column.to_string(),
            value,
            filled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mode_string_tie_takes_smallest() {
        let s = Series::new("MSZoning".into(), [Some("RM"), Some("RL"), None, Some("RM"), Some("RL")]);
        assert_eq!(ModeImputer::mode(&s).unwrap(), ModeValue::Str("RL".to_string()));
    }

    #[test]
    fn test_mode_integer() {
        let s = Series::new("GarageCars".into(), [Some(2i64), Some(1), Some(2), None]);
        assert_eq!(ModeImputer::mode(&s).unwrap(), ModeValue::Int(2));
    }

    #[test]
    fn test_mode_all_missing_fails() {
        let s = Series::new("MasVnrArea".into(), [None::<f64>, None]);
        let err = ModeImputer::mode(&s).unwrap_err();
        assert!(err.is_degenerate_statistic());
    }

    #[test]
    fn test_impute_leaves_no_missing_and_keeps_rows() {
        let mut df = df![
            "Electrical" => [Some("SBrkr"), None, Some("FuseA"), Some("SBrkr"), None],
            "MasVnrArea" => [Some(0.0), Some(196.0), None, Some(0.0), Some(350.0)],
        ]
        .unwrap();

        let record = ModeImputer::impute(&mut df, "Electrical", TableKind::Train).unwrap();
        assert_eq!(record.filled, 2);
        assert_eq!(record.value, ModeValue::Str("SBrkr".to_string()));

        ModeImputer::impute(&mut df, "MasVnrArea", TableKind::Train).unwrap();
        assert_eq!(df.height(), 5);
        assert_eq!(df.column("Electrical").unwrap().null_count(), 0);
        assert_eq!(df.column("MasVnrArea").unwrap().null_count(), 0);
        assert_eq!(df.column("MasVnrArea").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_filled_values_were_observed() {
        let mut df = df!["BsmtFullBath" => [Some(1i64), None, Some(0), Some(1), None]].unwrap();
        let observed: Vec<i64> = df
            .column("BsmtFullBath")
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();

        ModeImputer::impute(&mut df, "BsmtFullBath", TableKind::Test).unwrap();

        let after = df.column("BsmtFullBath").unwrap().as_materialized_series().i64().unwrap();
        assert!(after.into_iter().all(|v| v.is_some_and(|v| observed.contains(&v))));
    }

    #[test]
    fn test_impute_missing_column() {
        let mut df = df!["a" => [1i64]].unwrap();
        let err = ModeImputer::impute(&mut df, "Functional", TableKind::Combined).unwrap_err();
        assert!(err.is_lookup_error());
    }
}
