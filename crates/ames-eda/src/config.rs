//! Configuration types for the cleaning and EDA pipeline.
//!
//! Every path, column list and threshold of a run lives here. The defaults
//! reproduce the fixed decisions made for the Ames housing data; a JSON file
//! can override any subset of them.

use crate::error::{EdaError, Result};
use crate::types::{ColumnDropGroup, MissingColumnPolicy, OutlierRule, ThresholdScale};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Columns dropped because most of their entries are missing, or because
/// they have no visible relationship with the sale price.
const HIGH_MISSING_COLUMNS: [&str; 7] = [
    "PoolQC",
    "MiscFeature",
    "Alley",
    "Fence",
    "FireplaceQu",
    "LotFrontage",
    "GarageYrBlt",
];

const GARAGE_COLUMNS: [&str; 4] = ["GarageQual", "GarageType", "GarageFinish", "GarageCond"];

const BASEMENT_COLUMNS: [&str; 5] = [
    "BsmtQual",
    "BsmtCond",
    "BsmtFinType1",
    "BsmtFinType2",
    "BsmtExposure",
];

/// Columns whose remaining missing entries are filled with the mode.
const IMPUTE_COLUMNS: [&str; 18] = [
    "MasVnrType",
    "MSZoning",
    "BsmtFullBath",
    "Functional",
    "Utilities",
    "BsmtHalfBath",
    "Exterior1st",
    "KitchenQual",
    "GarageCars",
    "GarageArea",
    "TotalBsmtSF",
    "SaleType",
    "BsmtUnfSF",
    "BsmtFinSF2",
    "BsmtFinSF1",
    "Exterior2nd",
    "MasVnrArea",
    "Electrical",
];

/// Markers read as missing values, the same set pandas uses for this data.
const NULL_MARKERS: [&str; 5] = ["NA", "", "N/A", "NaN", "null"];

/// Default column-drop policy, applied in order.
pub fn default_drop_groups() -> Vec<ColumnDropGroup> {
    vec![
        ColumnDropGroup::new("high_missing", HIGH_MISSING_COLUMNS).charted(),
        ColumnDropGroup::new("garage", GARAGE_COLUMNS).inspected(),
        ColumnDropGroup::new("basement", BASEMENT_COLUMNS)
            .inspected()
            .charted(),
    ]
}

/// Configuration for the pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a configuration with the
/// fluent API, or [`PipelineConfig::from_json_file`] to load one.
///
/// # Example
///
/// ```rust,ignore
/// use ames_eda::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .data_dir("data")
///     .output_dir("output")
///     .render_figures(false)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the raw input files.
    /// Default: "data"
    pub data_dir: PathBuf,

    /// Raw training file name, relative to `data_dir`.
    /// Default: "train.csv"
    pub train_file: String,

    /// Raw test file name, relative to `data_dir`.
    /// Default: "test.csv"
    pub test_file: String,

    /// Directory for cleaned CSV files and the JSON report.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Directory for rendered charts.
    /// Default: "figures"
    pub figures_dir: PathBuf,

    /// Target column, present in train only.
    /// Default: "SalePrice"
    pub target_column: String,

    /// Cell values read as missing.
    pub null_values: Vec<String>,

    /// Rows scanned to infer column types; `None` scans the whole file.
    /// Default: None
    pub infer_schema_length: Option<usize>,

    /// Column groups dropped from every table, in order.
    pub drop_groups: Vec<ColumnDropGroup>,

    /// Columns imputed with their per-table mode.
    pub impute_columns: Vec<String>,

    /// Behaviour when a configured column is absent.
    /// Default: Error
    pub missing_columns: MissingColumnPolicy,

    /// Rows removed from the cleaned training table during EDA.
    /// Default: GrLivArea > 4000 AND SalePrice < 300000
    pub outlier_rule: OutlierRule,

    /// Rows hidden from the garage/lot-area scatter figures.
    /// Default: LotArea > 55000 AND SalePrice < 500000
    pub figure_filter_rule: OutlierRule,

    /// Units of rule thresholds on the target column.
    /// Default: Original
    pub threshold_scale: ThresholdScale,

    /// Number of columns (target included) in the correlation heatmap.
    /// Default: 11
    pub correlation_top_k: usize,

    /// Whether to render charts.
    /// Default: true
    pub render_figures: bool,

    /// Output file of the cleaning stage for train.
    /// Default: "Cleaned_train.csv"
    pub cleaned_train_file: String,

    /// Output file of the cleaning stage for test.
    /// Default: "Cleaned_test.csv"
    pub cleaned_test_file: String,

    /// Output file of the EDA stage.
    /// Default: "cleaned_train.csv"
    pub eda_train_file: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            train_file: "train.csv".to_string(),
            test_file: "test.csv".to_string(),
            output_dir: PathBuf::from("output"),
            figures_dir: PathBuf::from("figures"),
            target_column: "SalePrice".to_string(),
            null_values: NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
            infer_schema_length: None,
            drop_groups: default_drop_groups(),
            impute_columns: IMPUTE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            missing_columns: MissingColumnPolicy::default(),
            outlier_rule: OutlierRule::new("GrLivArea", 4000.0, "SalePrice", 300_000.0),
            figure_filter_rule: OutlierRule::new("LotArea", 55_000.0, "SalePrice", 500_000.0),
            threshold_scale: ThresholdScale::default(),
            correlation_top_k: 11,
            render_figures: true,
            cleaned_train_file: "Cleaned_train.csv".to_string(),
            cleaned_test_file: "Cleaned_test.csv".to_string(),
            eda_train_file: "cleaned_train.csv".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EdaError::InputNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| EdaError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    pub fn train_path(&self) -> PathBuf {
        self.data_dir.join(&self.train_file)
    }

    pub fn test_path(&self) -> PathBuf {
        self.data_dir.join(&self.test_file)
    }

    pub fn cleaned_train_path(&self) -> PathBuf {
        self.output_dir.join(&self.cleaned_train_file)
    }

    pub fn cleaned_test_path(&self) -> PathBuf {
        self.output_dir.join(&self.cleaned_test_file)
    }

    pub fn eda_train_path(&self) -> PathBuf {
        self.output_dir.join(&self.eda_train_file)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.target_column.is_empty() {
            return Err(ConfigValidationError::EmptyTarget);
        }

        if self.correlation_top_k < 2 {
            return Err(ConfigValidationError::InvalidTopK(self.correlation_top_k));
        }

        for (field, rule) in [
            ("outlier_rule", &self.outlier_rule),
            ("figure_filter_rule", &self.figure_filter_rule),
        ] {
            if !rule.x_threshold.is_finite() || !rule.y_threshold.is_finite() {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: field.to_string(),
                    rule: rule.to_string(),
                });
            }
        }

        for group in &self.drop_groups {
            if group.columns.is_empty() {
                return Err(ConfigValidationError::EmptyDropGroup(group.name.clone()));
            }
            if group.columns.contains(&self.target_column) {
                return Err(ConfigValidationError::TargetDropped {
                    group: group.name.clone(),
                    target: self.target_column.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Target column name must not be empty")]
    EmptyTarget,

    #[error("Invalid correlation top-k: {0} (must be at least 2)")]
    InvalidTopK(usize),

    #[error("Invalid thresholds for '{field}': {rule} (must be finite)")]
    InvalidThreshold { field: String, rule: String },

    #[error("Drop group '{0}' has no columns")]
    EmptyDropGroup(String),

    #[error("Drop group '{group}' would remove the target column '{target}'")]
    TargetDropped { group: String, target: String },
}

impl From<ConfigValidationError> for EdaError {
    fn from(e: ConfigValidationError) -> Self {
        EdaError::InvalidConfig(e.to_string())
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    base: Option<PipelineConfig>,
    data_dir: Option<PathBuf>,
    train_file: Option<String>,
    test_file: Option<String>,
    output_dir: Option<PathBuf>,
    figures_dir: Option<PathBuf>,
    target_column: Option<String>,
    drop_groups: Option<Vec<ColumnDropGroup>>,
    impute_columns: Option<Vec<String>>,
    missing_columns: Option<MissingColumnPolicy>,
    outlier_rule: Option<OutlierRule>,
    figure_filter_rule: Option<OutlierRule>,
    threshold_scale: Option<ThresholdScale>,
    correlation_top_k: Option<usize>,
    render_figures: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Start from an existing configuration instead of the defaults.
    pub fn from_config(config: PipelineConfig) -> Self {
        Self {
            base: Some(config),
            ..Self::default()
        }
    }

    /// Set the directory holding `train.csv` and `test.csv`.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    pub fn train_file(mut self, name: impl Into<String>) -> Self {
        self.train_file = Some(name.into());
        self
    }

    pub fn test_file(mut self, name: impl Into<String>) -> Self {
        self.test_file = Some(name.into());
        self
    }

    /// Set the directory for cleaned CSV files and reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the directory for rendered charts.
    pub fn figures_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.figures_dir = Some(path.into());
        self
    }

    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Replace the column-drop policy.
    pub fn drop_groups(mut self, groups: Vec<ColumnDropGroup>) -> Self {
        self.drop_groups = Some(groups);
        self
    }

    /// Replace the list of mode-imputed columns.
    pub fn impute_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.impute_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set what happens when a configured column is absent.
    pub fn missing_columns(mut self, policy: MissingColumnPolicy) -> Self {
        self.missing_columns = Some(policy);
        self
    }

    pub fn outlier_rule(mut self, rule: OutlierRule) -> Self {
        self.outlier_rule = Some(rule);
        self
    }

    pub fn figure_filter_rule(mut self, rule: OutlierRule) -> Self {
        self.figure_filter_rule = Some(rule);
        self
    }

    pub fn threshold_scale(mut self, scale: ThresholdScale) -> Self {
        self.threshold_scale = Some(scale);
        self
    }

    pub fn correlation_top_k(mut self, k: usize) -> Self {
        self.correlation_top_k = Some(k);
        self
    }

    /// Enable or disable chart rendering.
    pub fn render_figures(mut self, render: bool) -> Self {
        self.render_figures = Some(render);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<PipelineConfig, ConfigValidationError> {
        let base = self.base.unwrap_or_default();
        let config = PipelineConfig {
            data_dir: self.data_dir.unwrap_or(base.data_dir),
            train_file: self.train_file.unwrap_or(base.train_file),
            test_file: self.test_file.unwrap_or(base.test_file),
            output_dir: self.output_dir.unwrap_or(base.output_dir),
            figures_dir: self.figures_dir.unwrap_or(base.figures_dir),
            target_column: self.target_column.unwrap_or(base.target_column),
            drop_groups: self.drop_groups.unwrap_or(base.drop_groups),
            impute_columns: self.impute_columns.unwrap_or(base.impute_columns),
            missing_columns: self.missing_columns.unwrap_or(base.missing_columns),
            outlier_rule: self.outlier_rule.unwrap_or(base.outlier_rule),
            figure_filter_rule: self.figure_filter_rule.unwrap_or(base.figure_filter_rule),
            threshold_scale: self.threshold_scale.unwrap_or(base.threshold_scale),
            correlation_top_k: self.correlation_top_k.unwrap_or(base.correlation_top_k),
            render_figures: self.render_figures.unwrap_or(base.render_figures),
            ..base
        };

        config.validate()?;
        Ok(config)
    }
}
