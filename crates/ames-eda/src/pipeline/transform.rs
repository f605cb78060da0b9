//! Target transform.

use crate::error::{EdaError, Result};
use crate::utils::column_f64;
use polars::prelude::*;
use tracing::debug;

/// Replace every value of `column` with its natural log.
///
/// Missing entries stay missing. The whole column is checked first: a zero or
/// negative value fails with [`EdaError::NonPositiveValue`] and leaves the
/// table unchanged. The result is always Float64.
pub fn log_transform(df: &mut DataFrame, column: &str) -> Result<()> {
    let values = column_f64(df, column)?;

    if let Some((row, value)) = values
        .iter()
        .enumerate()
        .find_map(|(row, v)| v.filter(|v| *v <= 0.0 || v.is_nan()).map(|v| (row, v)))
    {
        return Err(EdaError::NonPositiveValue {
            column: column.to_string(),
            row,
            value,
        });
    }

    let logged: Vec<Option<f64>> = values.into_iter().map(|v| v.map(f64::ln)).collect();
    df.replace(column, Series::new(column.into(), logged))?;
    debug!("Applied ln to '{}'", column);
    Ok(())
}
