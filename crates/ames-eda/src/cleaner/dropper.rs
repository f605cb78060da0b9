//! Column-drop rule.

use crate::error::{EdaError, Result};
use crate::utils::has_column;
use polars::prelude::*;
use tracing::debug;

/// Removes named columns from a table.
pub struct ColumnDropper;

impl ColumnDropper {
    /// Names from `columns` that the table does not have.
    pub fn absent<'a>(df: &DataFrame, columns: &'a [String]) -> Vec<&'a str> {
        columns
            .iter()
            .filter(|c| !has_column(df, c))
            .map(String::as_str)
            .collect()
    }

    /// Drop every listed column.
    ///
    /// All names are checked first; if one is absent nothing is dropped.
    pub fn drop_columns(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        if let Some(missing) = Self::absent(df, columns).first() {
            return Err(EdaError::ColumnNotFound(missing.to_string()));
        }
        Ok(Self::drop_present(df, columns))
    }

    /// Drop the listed columns the table has; absent names are ignored.
    pub fn drop_present(df: &DataFrame, columns: &[String]) -> DataFrame {
        let present: Vec<PlSmallStr> = columns
            .iter()
            .filter(|c| has_column(df, c))
            .map(|c| c.as_str().into())
            .collect();
        debug!("Dropping {} columns", present.len());
        df.drop_many(present)
    }
}
