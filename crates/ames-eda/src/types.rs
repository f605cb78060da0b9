//! Shared data types: report rows, rules and run summaries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Tables
// ============================================================================

/// Which of the three logical tables an operation ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Training records, carry the target column.
    Train,
    /// Test records, no target column.
    Test,
    /// Train ++ test with the target dropped.
    Combined,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Train => "train",
            Self::Test => "test",
            Self::Combined => "combined",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Missing-value report
// ============================================================================

/// One row of a missing-value report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValueRow {
    /// Column name.
    pub variable: String,
    /// Number of missing entries.
    pub total: usize,
    /// `100 * total / rows`.
    pub percent: f64,
}

/// Missing-value report of a table: only columns with at least one missing
/// entry, sorted descending by count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingReport {
    pub total_rows: usize,
    pub rows: Vec<MissingValueRow>,
}

impl MissingReport {
    /// True when no column has missing entries.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Names of the reported columns, in report order.
    pub fn columns(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.variable.as_str()).collect()
    }

    pub fn get(&self, column: &str) -> Option<&MissingValueRow> {
        self.rows.iter().find(|r| r.variable == column)
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// `describe()`-style summary of a numeric column plus shape statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
    /// Bias-corrected sample skewness; `None` with fewer than 3 values.
    pub skew: Option<f64>,
    /// Bias-corrected excess kurtosis; `None` with fewer than 4 values.
    pub kurtosis: Option<f64>,
}

/// Correlation of one column against the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEntry {
    pub column: String,
    pub coefficient: f64,
}

// ============================================================================
// Rules
// ============================================================================

/// A named set of columns removed together from every table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDropGroup {
    pub name: String,
    pub columns: Vec<String>,
    /// Render target-vs-column box plots for this group before dropping it.
    #[serde(default)]
    pub inspect: bool,
    /// Render the missing-percent chart of the combined table after this
    /// group is dropped.
    #[serde(default)]
    pub chart_after: bool,
}

impl ColumnDropGroup {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            inspect: false,
            chart_after: false,
        }
    }

    /// Mark the group for box-plot inspection before it is dropped.
    pub fn inspected(mut self) -> Self {
        self.inspect = true;
        self
    }

    /// Chart the remaining missing values once this group is gone.
    pub fn charted(mut self) -> Self {
        self.chart_after = true;
        self
    }
}

/// Rectangular outlier region: a row is an outlier when
/// `x_column > x_threshold AND y_column < y_threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierRule {
    pub x_column: String,
    pub y_column: String,
    pub x_threshold: f64,
    pub y_threshold: f64,
}

impl OutlierRule {
    pub fn new(
        x_column: impl Into<String>,
        x_threshold: f64,
        y_column: impl Into<String>,
        y_threshold: f64,
    ) -> Self {
        Self {
            x_column: x_column.into(),
            y_column: y_column.into(),
            x_threshold,
            y_threshold,
        }
    }
}

impl fmt::Display for OutlierRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} > {} AND {} < {}",
            self.x_column, self.x_threshold, self.y_column, self.y_threshold
        )
    }
}

/// Units in which a rule threshold on the target column is stated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThresholdScale {
    /// Thresholds are sale prices; converted with `ln` when the stored target
    /// has been log-transformed.
    #[default]
    Original,
    /// Thresholds are compared with the stored values as-is.
    AsStored,
}

/// What to do when a configured column is absent from a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MissingColumnPolicy {
    /// Fail with a lookup error.
    #[default]
    Error,
    /// Skip the column and log a warning.
    Skip,
}

// ============================================================================
// Imputation
// ============================================================================

/// Most frequent value of a column, in the column's own type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModeValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for ModeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

/// One mode imputation applied to one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationRecord {
    pub table: TableKind,
    pub column: String,
    pub value: ModeValue,
    /// Number of entries that were filled.
    pub filled: usize,
}

/// Result of dropping one column group from all tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropRecord {
    pub group: String,
    pub dropped: Vec<String>,
    /// Columns absent from a table and skipped under [`MissingColumnPolicy::Skip`].
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub skipped: Vec<String>,
}

// ============================================================================
// Run summaries
// ============================================================================

/// A rendered chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureRecord {
    pub number: usize,
    pub caption: String,
    pub path: PathBuf,
}

/// What the cleaning stage did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub train_shape_before: (usize, usize),
    pub test_shape_before: (usize, usize),
    pub combined_shape: (usize, usize),
    pub target_before: TargetSummary,
    pub target_after: TargetSummary,
    /// Missing values of the numeric train columns, before any drop.
    pub numeric_missing_train: MissingReport,
    /// Missing values of the combined table, before any drop.
    pub missing_before: MissingReport,
    /// Missing values of the combined table, after drops and imputation.
    pub missing_after: MissingReport,
    pub drops: Vec<DropRecord>,
    pub imputations: Vec<ImputationRecord>,
    pub train_shape_after: (usize, usize),
    pub test_shape_after: (usize, usize),
    pub files_written: Vec<PathBuf>,
}

/// What the EDA stage did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdaSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    pub outliers_removed: usize,
    pub outlier_rule: OutlierRule,
    pub top_correlations: Vec<CorrelationEntry>,
    pub target_summary: TargetSummary,
    pub files_written: Vec<PathBuf>,
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning: Option<CleaningSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eda: Option<EdaSummary>,
    pub figures: Vec<FigureRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_report_lookup() {
        let report = MissingReport {
            total_rows: 10,
            rows: vec![
                MissingValueRow {
                    variable: "PoolQC".to_string(),
                    total: 9,
                    percent: 90.0,
                },
                MissingValueRow {
                    variable: "Alley".to_string(),
                    total: 2,
                    percent: 20.0,
                },
            ],
        };
        assert_eq!(report.len(), 2);
        assert_eq!(report.columns(), vec!["PoolQC", "Alley"]);
        assert_eq!(report.get("Alley").unwrap().total, 2);
        assert!(report.get("Fence").is_none());
    }

    #[test]
    fn test_outlier_rule_display() {
        let rule = OutlierRule::new("GrLivArea", 4000.0, "SalePrice", 300000.0);
        assert_eq!(rule.to_string(), "GrLivArea > 4000 AND SalePrice < 300000");
    }

    #[test]
    fn test_mode_value_serializes_untagged() {
        assert_eq!(serde_json::to_string(&ModeValue::Int(2)).unwrap(), "2");
        assert_eq!(
            serde_json::to_string(&ModeValue::Str("SBrkr".to_string())).unwrap(),
            "\"SBrkr\""
        );
    }

    #[test]
    fn test_drop_group_builder() {
        let group = ColumnDropGroup::new("garage", ["GarageQual", "GarageType"]).inspected();
        assert!(group.inspect);
        assert!(!group.chart_after);
        assert_eq!(group.columns.len(), 2);
    }
}
