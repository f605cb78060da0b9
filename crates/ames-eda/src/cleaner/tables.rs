//! The train, test and combined tables, kept schema-aligned.

use super::ColumnDropper;
use crate::error::{EdaError, Result, ResultExt};
use crate::imputers::ModeImputer;
use crate::types::{ColumnDropGroup, DropRecord, ImputationRecord, MissingColumnPolicy, TableKind};
use crate::utils::{has_column, is_numeric_dtype};
use polars::prelude::*;
use tracing::{info, warn};

/// Train and test records plus their concatenation without the target.
#[derive(Debug, Clone)]
pub struct TableSet {
    pub train: DataFrame,
    pub test: DataFrame,
    pub combined: DataFrame,
}

impl TableSet {
    /// Build the set, deriving the combined table from train and test.
    pub fn new(train: DataFrame, test: DataFrame, target: &str) -> Result<Self> {
        let combined = combine(&train, &test, target).context("Building combined table")?;
        info!(
            "Combined table: {} rows x {} columns",
            combined.height(),
            combined.width()
        );
        Ok(Self {
            train,
            test,
            combined,
        })
    }

    pub fn get(&self, kind: TableKind) -> &DataFrame {
        match kind {
            TableKind::Train => &self.train,
            TableKind::Test => &self.test,
            TableKind::Combined => &self.combined,
        }
    }

    fn get_mut(&mut self, kind: TableKind) -> &mut DataFrame {
        match kind {
            TableKind::Train => &mut self.train,
            TableKind::Test => &mut self.test,
            TableKind::Combined => &mut self.combined,
        }
    }

    /// Drop a column group from all three tables.
    ///
    /// Under [`MissingColumnPolicy::Error`] every table is checked before any
    /// is modified, so a failed drop leaves the set unchanged.
    pub fn drop_group(
        &mut self,
        group: &ColumnDropGroup,
        policy: MissingColumnPolicy,
    ) -> Result<DropRecord> {
        let mut skipped: Vec<String> = Vec::new();
        for kind in TABLE_ORDER {
            for missing in ColumnDropper::absent(self.get(kind), &group.columns) {
                if policy == MissingColumnPolicy::Error {
                    return Err(EdaError::ColumnNotFound(missing.to_string())
                        .with_context(format!("Dropping group '{}' from {} table", group.name, kind)));
                }
                warn!("Column '{}' not in {} table, skipping drop", missing, kind);
                if !skipped.iter().any(|s| s == missing) {
                    skipped.push(missing.to_string());
                }
            }
        }

        let dropped: Vec<String> = group
            .columns
            .iter()
            .filter(|c| TABLE_ORDER.iter().any(|k| has_column(self.get(*k), c)))
            .cloned()
            .collect();

        for kind in TABLE_ORDER {
            let table = self.get_mut(kind);
            *table = ColumnDropper::drop_present(table, &group.columns);
        }

        info!("Dropped group '{}': {:?}", group.name, dropped);
        Ok(DropRecord {
            group: group.name.clone(),
            dropped,
            skipped,
        })
    }

    /// Mode-impute one column in each table independently.
    pub fn impute_column(
        &mut self,
        column: &str,
        policy: MissingColumnPolicy,
    ) -> Result<Vec<ImputationRecord>> {
        let mut records = Vec::with_capacity(TABLE_ORDER.len());
        for kind in TABLE_ORDER {
            let table = self.get_mut(kind);
            if !has_column(table, column) && policy == MissingColumnPolicy::Skip {
                warn!("Column '{}' not in {} table, skipping imputation", column, kind);
                continue;
            }
            let record = ModeImputer::impute(table, column, kind)
                .context(format!("Imputing '{}' in {} table", column, kind))?;
            records.push(record);
        }
        Ok(records)
    }

    pub fn shapes(&self) -> [(usize, usize); 3] {
        [self.train.shape(), self.test.shape(), self.combined.shape()]
    }
}

const TABLE_ORDER: [TableKind; 3] = [TableKind::Combined, TableKind::Train, TableKind::Test];

/// Concatenate train (minus `target`) and test rows.
///
/// Columns are train's order followed by test-only columns; a column absent
/// from one side is null there. When the two sides disagree on a column's
/// type, numeric pairs widen to Float64 and anything else becomes String.
pub fn combine(train: &DataFrame, test: &DataFrame, target: &str) -> Result<DataFrame> {
    let mut names: Vec<PlSmallStr> = train
        .get_column_names()
        .into_iter()
        .filter(|c| c.as_str() != target)
        .cloned()
        .collect();
    for name in test.get_column_names() {
        if name.as_str() != target && !names.contains(name) {
            names.push(name.clone());
        }
    }

    let mut train_part = Vec::with_capacity(names.len());
    let mut test_part = Vec::with_capacity(names.len());
    for name in &names {
        let left = train.column(name).ok();
        let right = test.column(name).ok();
        let dtype = unify_dtype(left.map(|c| c.dtype()), right.map(|c| c.dtype()));
        train_part.push(aligned(left, name, train.height(), &dtype)?);
        test_part.push(aligned(right, name, test.height(), &dtype)?);
    }

    let head = DataFrame::new(train_part)?;
    Ok(head.vstack(&DataFrame::new(test_part)?)?)
}

fn unify_dtype(left: Option<&DataType>, right: Option<&DataType>) -> DataType {
    match (left, right) {
        (Some(l), Some(r)) if l == r => l.clone(),
        (Some(DataType::Null), Some(other)) | (Some(other), Some(DataType::Null)) => other.clone(),
        (Some(l), Some(r)) if is_numeric_dtype(l) && is_numeric_dtype(r) => DataType::Float64,
        (Some(_), Some(_)) => DataType::String,
        (Some(only), None) | (None, Some(only)) => only.clone(),
        (None, None) => DataType::Null,
    }
}

fn aligned(column: Option<&Column>, name: &PlSmallStr, height: usize, dtype: &DataType) -> Result<Column> {
    let series = match column {
        Some(c) => c.as_materialized_series().cast(dtype)?,
        None => Series::full_null(name.clone(), height, dtype),
    };
    Ok(series.into_column())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn train_table() -> DataFrame {
        df![
            "Id" => [1i64, 2, 3],
            "MSZoning" => [Some("RL"), Some("RL"), None],
            "GarageCars" => [Some(2i64), None, Some(1)],
            "SalePrice" => [208500i64, 181500, 223500],
        ]
        .unwrap()
    }

    fn test_table() -> DataFrame {
        df![
            "Id" => [4i64, 5],
            "MSZoning" => [Some("RM"), None],
            "GarageCars" => [Some(1.0), None],
        ]
        .unwrap()
    }

    #[test]
    fn test_combined_drops_target_and_stacks_rows() {
        let tables = TableSet::new(train_table(), test_table(), "SalePrice").unwrap();
        assert_eq!(tables.combined.shape(), (5, 3));
        assert!(!has_column(&tables.combined, "SalePrice"));
        assert_eq!(
            tables.combined.column("GarageCars").unwrap().dtype(),
            &DataType::Float64
        );
    }

    #[test]
    fn test_combined_adds_test_only_columns() {
        let test_only = df!["Id" => [4i64], "Extra" => ["x"]].unwrap();
        let combined = combine(&train_table(), &test_only, "SalePrice").unwrap();
        let names: Vec<String> = combined.get_column_names().iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["Id", "MSZoning", "GarageCars", "Extra"]);
        assert_eq!(combined.column("Extra").unwrap().null_count(), 3);
    }

    #[test]
    fn test_drop_group_strict_leaves_tables_untouched() {
        let mut tables = TableSet::new(train_table(), test_table(), "SalePrice").unwrap();
        let group = ColumnDropGroup::new("g", ["MSZoning", "Fence"]);
        let err = tables.drop_group(&group, MissingColumnPolicy::Error).unwrap_err();
        assert!(err.is_lookup_error());
        assert!(has_column(&tables.train, "MSZoning"));
        assert!(has_column(&tables.combined, "MSZoning"));
    }

    #[test]
    fn test_drop_group_skip_records_absent() {
        let mut tables = TableSet::new(train_table(), test_table(), "SalePrice").unwrap();
        let group = ColumnDropGroup::new("g", ["MSZoning", "Fence"]);
        let record = tables.drop_group(&group, MissingColumnPolicy::Skip).unwrap();
        assert_eq!(record.dropped, vec!["MSZoning".to_string()]);
        assert_eq!(record.skipped, vec!["Fence".to_string()]);
        for kind in [TableKind::Train, TableKind::Test, TableKind::Combined] {
            assert!(!has_column(tables.get(kind), "MSZoning"));
        }
        assert_eq!(tables.train.height(), 3);
    }

    #[test]
    fn test_impute_column_per_table() {
        let mut tables = TableSet::new(train_table(), test_table(), "SalePrice").unwrap();
        let records = tables.impute_column("MSZoning", MissingColumnPolicy::Error).unwrap();
        assert_eq!(records.len(), 3);
        let value_for = |kind: TableKind| {
            records
                .iter()
                .find(|r| r.table == kind)
                .map(|r| r.value.to_string())
                .unwrap()
        };
        assert_eq!(value_for(TableKind::Train), "RL");
        assert_eq!(value_for(TableKind::Test), "RM");
        for kind in [TableKind::Train, TableKind::Test, TableKind::Combined] {
            assert_eq!(tables.get(kind).column("MSZoning").unwrap().null_count(), 0);
        }
    }

    #[test]
    fn test_impute_column_skip_absent() {
        let test_only = df!["Id" => [4i64]].unwrap();
        let mut tables = TableSet::new(train_table(), test_only, "SalePrice").unwrap();
        let records = tables.impute_column("GarageCars", MissingColumnPolicy::Skip).unwrap();
        // combined and train have the column, test does not
        assert_eq!(records.len(), 2);
    }
}
