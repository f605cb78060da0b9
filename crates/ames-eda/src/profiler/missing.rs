//! Missing-value reporting.

use crate::types::{MissingReport, MissingValueRow};
use crate::utils::is_numeric_dtype;
use polars::prelude::*;

/// Missing-value report over every column of a table.
///
/// Only columns with at least one missing entry are listed, sorted by count
/// descending. Columns with equal counts keep their table order.
pub fn missing_report(df: &DataFrame) -> MissingReport {
    report_for(df, |_| true)
}

/// Missing-value report restricted to the numeric columns.
pub fn numeric_missing_report(df: &DataFrame) -> MissingReport {
    report_for(df, |column| is_numeric_dtype(column.dtype()))
}

fn report_for(df: &DataFrame, include: impl Fn(&Column) -> bool) -> MissingReport {
    let total_rows = df.height();
    let mut rows: Vec<MissingValueRow> = df
        .get_columns()
        .iter()
        .filter(|c| include(c))
        .filter_map(|c| {
            let total = c.null_count();
            (total > 0).then(|| MissingValueRow {
                variable: c.name().to_string(),
                total,
                percent: 100.0 * total as f64 / total_rows as f64,
            })
        })
        .collect();

    // stable sort keeps table order for ties
    rows.sort_by(|a, b| b.total.cmp(&a.total));

    MissingReport { total_rows, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df![
            "Id" => [1i64, 2, 3, 4],
            "Alley" => [None::<&str>, None, Some("Grvl"), None],
            "LotFrontage" => [Some(65.0), None, Some(80.0), Some(68.0)],
            "Fence" => [Some("MnPrv"), None, None, Some("GdWo")],
            "Street" => ["Pave", "Pave", "Grvl", "Pave"],
        ]
        .unwrap()
    }

    #[test]
    fn test_report_lists_only_columns_with_nulls() {
        let report = missing_report(&sample());
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.columns(), vec!["Alley", "Fence", "LotFrontage"]);
    }

    #[test]
    fn test_report_percentages() {
        let report = missing_report(&sample());
        assert_eq!(report.get("Alley").unwrap().total, 3);
        assert_eq!(report.get("Alley").unwrap().percent, 75.0);
        assert_eq!(report.get("LotFrontage").unwrap().percent, 25.0);
    }

    #[test]
    fn test_numeric_report() {
        let report = numeric_missing_report(&sample());
        assert_eq!(report.columns(), vec!["LotFrontage"]);
    }

    #[test]
    fn test_complete_table_is_empty_report() {
        let df = df!["a" => [1i64, 2]].unwrap();
        assert!(missing_report(&df).is_empty());
    }
}
