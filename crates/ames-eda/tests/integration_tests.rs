//! Integration tests for the cleaning and EDA pipeline.
//!
//! These tests run the pipeline end to end on small CSV files written into a
//! temporary directory. Most disable figures; the figure tests need a system
//! `sans-serif` font and return early without one.

use ames_eda::{
    ColumnDropGroup, EdaPipeline, MissingColumnPolicy, ModeValue, PipelineConfig,
    PipelineConfigBuilder, PipelineStage, ReportGenerator, RunStages, TableKind, load_csv,
    reporting::REPORT_FILE_NAME,
};
use polars::prelude::*;
use plotters::style::IntoFont;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

const TRAIN_CSV: &str = "\
SalePrice,GrLivArea,PoolQC
200000,5000,NA
250000,2000,NA
180000,1500,NA
";

const TEST_CSV: &str = "\
GrLivArea,PoolQC
1800,NA
2100,Gd
";

fn write_inputs(dir: &Path, train: &str, test: &str) {
    fs::write(dir.join("train.csv"), train).unwrap();
    fs::write(dir.join("test.csv"), test).unwrap();
}

/// Config for the small tables: one drop group, nothing to impute.
fn small_config(dir: &TempDir) -> PipelineConfigBuilder {
    PipelineConfig::builder()
        .data_dir(dir.path())
        .output_dir(dir.path().join("output"))
        .figures_dir(dir.path().join("figures"))
        .render_figures(false)
        .drop_groups(vec![ColumnDropGroup::new("high_missing", ["PoolQC"])])
        .impute_columns(Vec::<String>::new())
        .correlation_top_k(2)
}

fn run(config: PipelineConfig, stages: RunStages) -> ames_eda::EdaResult<ames_eda::PipelineResult> {
    EdaPipeline::builder()
        .config(config)
        .stages(stages)
        .build()
        .unwrap()
        .run()
}

/// Whether plotters can load the font the charts are drawn with.
fn fonts_available() -> bool {
    ("sans-serif", 20).into_font().box_size("Fig 1.").is_ok()
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|c| c.to_string()).collect()
}

fn f64_values(df: &DataFrame, column: &str) -> Vec<f64> {
    df.column(column)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

fn str_values(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    df.column(column)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(String::from))
        .collect()
}

// ============================================================================
// End-to-End Tests
// ============================================================================

#[test]
fn test_end_to_end_small_tables() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), TRAIN_CSV, TEST_CSV);
    let config = small_config(&dir).build().unwrap();

    let result = run(config.clone(), RunStages::All).unwrap();

    // Cleaning stage output
    let cleaned_train = load_csv(&config.cleaned_train_path(), &config).unwrap();
    let cleaned_test = load_csv(&config.cleaned_test_path(), &config).unwrap();
    assert_eq!(column_names(&cleaned_train), vec!["SalePrice", "GrLivArea"]);
    assert_eq!(column_names(&cleaned_test), vec!["GrLivArea"]);
    assert_eq!(cleaned_train.height(), 3);

    // EDA stage output: ln prices, outlier row (5000, 200000) gone
    let eda_train = load_csv(&config.eda_train_path(), &config).unwrap();
    assert_eq!(column_names(&eda_train), vec!["SalePrice", "GrLivArea"]);
    assert_eq!(f64_values(&eda_train, "GrLivArea"), vec![2000.0, 1500.0]);
    let prices = f64_values(&eda_train, "SalePrice");
    assert!((prices[0] - 250_000f64.ln()).abs() < 1e-9);
    assert!((prices[1] - 180_000f64.ln()).abs() < 1e-9);

    let header = fs::read_to_string(config.eda_train_path()).unwrap();
    assert!(header.starts_with("SalePrice,GrLivArea\n"));

    let cleaning = result.cleaning.unwrap();
    assert_eq!(cleaning.drops[0].dropped, vec!["PoolQC".to_string()]);
    assert_eq!(cleaning.missing_before.get("PoolQC").unwrap().total, 4);
    assert!(cleaning.missing_after.is_empty());
    assert_eq!(cleaning.combined_shape, (5, 2));

    let eda = result.eda.unwrap();
    assert_eq!(eda.outliers_removed, 1);
    assert_eq!(eda.rows_after, 2);
    assert_eq!(eda.top_correlations[0].column, "SalePrice");
    assert!(result.figures.is_empty());
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(&dir).build().unwrap();

    let err = run(config.clone(), RunStages::All).unwrap_err();

    assert_eq!(err.error_code(), "INPUT_NOT_FOUND");
    assert!(!config.cleaned_train_path().exists());
}

#[test]
fn test_eda_stage_without_cleaned_table() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), TRAIN_CSV, TEST_CSV);
    let config = small_config(&dir).build().unwrap();

    let err = run(config, RunStages::Eda).unwrap_err();
    assert_eq!(err.error_code(), "INPUT_NOT_FOUND");
}

// ============================================================================
// Figure Tests
// ============================================================================

const FIGURE_TRAIN_CSV: &str = "\
SalePrice,GrLivArea,OverallQual,LotFrontage,GarageQual,PoolQC
208500,1710,7,65,TA,NA
181500,1262,6,80,TA,NA
223500,1786,7,NA,Gd,NA
140000,1717,7,60,NA,NA
250000,2198,8,84,TA,NA
200000,5000,8,NA,Gd,NA
";

const FIGURE_TEST_CSV: &str = "\
GrLivArea,OverallQual,LotFrontage,GarageQual,PoolQC
896,5,80,TA,NA
1329,6,81,NA,Gd
";

fn figure_config(dir: &TempDir) -> PipelineConfig {
    small_config(dir)
        .render_figures(true)
        .missing_columns(MissingColumnPolicy::Skip)
        .drop_groups(vec![
            ColumnDropGroup::new("high_missing", ["PoolQC"]).charted(),
            ColumnDropGroup::new("garage", ["GarageQual"]).inspected(),
        ])
        .correlation_top_k(3)
        .build()
        .unwrap()
}

#[test]
fn test_figures_rendered_in_caption_order() {
    if !fonts_available() {
        eprintln!("skipping: no sans-serif font");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), FIGURE_TRAIN_CSV, FIGURE_TEST_CSV);
    let config = figure_config(&dir);

    let result = run(config.clone(), RunStages::All).unwrap();

    let names: Vec<String> = result
        .figures
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "SalePrice_Normality.png",
            "Transformed_SalePrice_Normality.png",
            "Fig_2.png",
            "missing_percent_1.png",
            "missing_percent_2.png",
            "garage_boxplots.png",
            "Correlation_Heatmap.png",
            "SalePrice_by_OverallQual.png",
            "GrLivArea_Regression.png",
            "GrLivArea_Regression_No_Outliers.png",
        ]
    );
    for (i, figure) in result.figures.iter().enumerate() {
        assert_eq!(figure.number, i + 1);
        assert!(figure.caption.starts_with(&format!("Fig {}. ", i + 1)));
        assert!(figure.path.starts_with(&config.figures_dir));
        assert!(fs::metadata(&figure.path).unwrap().len() > 0);
    }
    assert_eq!(
        result.figures[3].caption,
        "Fig 4. Display Missing data percentage by variable"
    );
    // the garage group is not charted after its drop
    assert!(!config.figures_dir.join("missing_percent_3.png").exists());
    assert_eq!(result.eda.unwrap().outliers_removed, 1);
}

#[test]
fn test_report_records_numbered_figures() {
    if !fonts_available() {
        eprintln!("skipping: no sans-serif font");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), FIGURE_TRAIN_CSV, FIGURE_TEST_CSV);
    let config = figure_config(&dir);
    let result = run(config.clone(), RunStages::Clean).unwrap();

    let report = ReportGenerator::build_report(&config, &result);
    let path = ReportGenerator::new(&config.output_dir)
        .write_report_to_file(&report)
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    let figures = json["figures"].as_array().unwrap();
    assert_eq!(figures.len(), 6);
    assert_eq!(figures[0]["number"], 1);
    assert_eq!(figures[0]["caption"], "Fig 1. Histogram and normal probability plot");
    assert_eq!(figures[5]["number"], 6);
    assert_eq!(figures[5]["caption"], "Fig 6. SalePrice vs garage variables");
    assert_eq!(
        json["figures_dir"],
        config.figures_dir.display().to_string()
    );
    assert_eq!(report.files_written().len(), 2);
}

#[test]
fn test_strict_policy_fails_on_absent_figure_column() {
    if !fonts_available() {
        eprintln!("skipping: no sans-serif font");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), FIGURE_TRAIN_CSV, FIGURE_TEST_CSV);
    let config = small_config(&dir)
        .render_figures(true)
        .drop_groups(vec![ColumnDropGroup::new("high_missing", ["PoolQC"])])
        .build()
        .unwrap();

    // MasVnrArea is one of the pre-drop scatter columns
    let err = run(config.clone(), RunStages::Clean).unwrap_err();

    assert!(err.is_lookup_error());
    assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    assert!(err.to_string().contains("MasVnrArea"));
    assert!(!config.cleaned_train_path().exists());
}

// ============================================================================
// Missing-Column Policy Tests
// ============================================================================

#[test]
fn test_strict_policy_fails_on_absent_drop_column() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), TRAIN_CSV, TEST_CSV);
    let config = small_config(&dir)
        .drop_groups(vec![ColumnDropGroup::new("high_missing", ["PoolQC", "Fence"])])
        .build()
        .unwrap();

    let err = run(config.clone(), RunStages::Clean).unwrap_err();

    assert!(err.is_lookup_error());
    assert!(err.to_string().contains("Fence"));
    assert!(!config.cleaned_train_path().exists());
}

#[test]
fn test_skip_policy_tolerates_absent_columns() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), TRAIN_CSV, TEST_CSV);
    let config = small_config(&dir)
        .drop_groups(vec![ColumnDropGroup::new("high_missing", ["PoolQC", "Fence"])])
        .impute_columns(["Electrical"])
        .missing_columns(MissingColumnPolicy::Skip)
        .build()
        .unwrap();

    let cleaning = run(config.clone(), RunStages::Clean).unwrap().cleaning.unwrap();

    assert_eq!(cleaning.drops[0].dropped, vec!["PoolQC".to_string()]);
    assert_eq!(cleaning.drops[0].skipped, vec!["Fence".to_string()]);
    assert!(cleaning.imputations.is_empty());
    assert!(config.cleaned_train_path().exists());
}

// ============================================================================
// Imputation Tests
// ============================================================================

#[test]
fn test_each_table_imputes_with_its_own_mode() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(
        dir.path(),
        "SalePrice,GrLivArea,MSZoning\n208500,1710,RL\n181500,1262,RL\n223500,1786,NA\n140000,1717,RM\n",
        "GrLivArea,MSZoning\n896,RM\n1329,NA\n928,RM\n",
    );
    let config = small_config(&dir)
        .drop_groups(Vec::new())
        .impute_columns(["MSZoning"])
        .build()
        .unwrap();

    let cleaning = run(config.clone(), RunStages::Clean).unwrap().cleaning.unwrap();

    let cleaned_train = load_csv(&config.cleaned_train_path(), &config).unwrap();
    let cleaned_test = load_csv(&config.cleaned_test_path(), &config).unwrap();
    assert_eq!(
        str_values(&cleaned_train, "MSZoning")[2].as_deref(),
        Some("RL")
    );
    assert_eq!(
        str_values(&cleaned_test, "MSZoning")[1].as_deref(),
        Some("RM")
    );
    assert_eq!(cleaned_train.height(), 4);
    assert_eq!(cleaned_test.height(), 3);

    // combined: RL x2, RM x3 -> RM
    let combined = cleaning
        .imputations
        .iter()
        .find(|r| r.table == TableKind::Combined)
        .unwrap();
    assert_eq!(combined.value, ModeValue::Str("RM".to_string()));
    assert_eq!(combined.filled, 2);
}

#[test]
fn test_all_missing_imputation_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(
        dir.path(),
        "SalePrice,GrLivArea,Alley\n208500,1710,NA\n181500,1262,NA\n",
        "GrLivArea,Alley\n896,NA\n",
    );
    let config = small_config(&dir)
        .drop_groups(Vec::new())
        .impute_columns(["Alley"])
        .build()
        .unwrap();

    let err = run(config, RunStages::Clean).unwrap_err();
    assert!(err.is_degenerate_statistic());
}

// ============================================================================
// Re-run Tests
// ============================================================================

#[test]
fn test_rerun_on_cleaned_output_fails_with_lookup_error() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), TRAIN_CSV, TEST_CSV);
    let config = small_config(&dir).build().unwrap();
    run(config.clone(), RunStages::Clean).unwrap();

    let rerun = small_config(&dir)
        .data_dir(&config.output_dir)
        .train_file(config.cleaned_train_file.clone())
        .test_file(config.cleaned_test_file.clone())
        .output_dir(dir.path().join("rerun"))
        .build()
        .unwrap();

    let err = run(rerun, RunStages::Clean).unwrap_err();
    assert!(err.is_lookup_error());
}

#[test]
fn test_rerun_produces_same_output() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), TRAIN_CSV, TEST_CSV);
    let config = small_config(&dir).build().unwrap();

    run(config.clone(), RunStages::All).unwrap();
    let first = fs::read_to_string(config.eda_train_path()).unwrap();
    run(config.clone(), RunStages::All).unwrap();
    let second = fs::read_to_string(config.eda_train_path()).unwrap();

    assert_eq!(first, second);
}

// ============================================================================
// Progress and Report Tests
// ============================================================================

#[test]
fn test_progress_stages_reported_in_order() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), TRAIN_CSV, TEST_CSV);
    let config = small_config(&dir).build().unwrap();

    let stages = Arc::new(Mutex::new(Vec::new()));
    let seen = stages.clone();
    EdaPipeline::builder()
        .config(config)
        .on_progress(move |update| seen.lock().unwrap().push(update.stage))
        .build()
        .unwrap()
        .run()
        .unwrap();

    let stages = stages.lock().unwrap();
    assert_eq!(stages.first(), Some(&PipelineStage::Loading));
    assert_eq!(stages.last(), Some(&PipelineStage::Complete));
    let position = |stage| stages.iter().position(|s| *s == stage).unwrap();
    assert!(position(PipelineStage::Transforming) < position(PipelineStage::DroppingColumns));
    assert!(position(PipelineStage::Correlating) < position(PipelineStage::OutlierRemoval));
}

#[test]
fn test_emitted_report_contains_both_stages() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), TRAIN_CSV, TEST_CSV);
    let config = small_config(&dir).build().unwrap();
    let result = run(config.clone(), RunStages::All).unwrap();

    let report = ReportGenerator::build_report(&config, &result);
    let path = ReportGenerator::new(&config.output_dir)
        .write_report_to_file(&report)
        .unwrap();

    assert_eq!(path, config.output_dir.join(REPORT_FILE_NAME));
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["target_column"], "SalePrice");
    assert_eq!(json["eda"]["outliers_removed"], 1);
    assert_eq!(json["cleaning"]["drops"][0]["dropped"][0], "PoolQC");
    assert!(json["figures_dir"].is_null());
    assert_eq!(report.files_written().len(), 3);
}

#[test]
fn test_config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), TRAIN_CSV, TEST_CSV);
    let config_path = dir.path().join("config.json");
    let json = serde_json::json!({
        "data_dir": dir.path(),
        "output_dir": dir.path().join("from_file"),
        "render_figures": false,
        "drop_groups": [{ "name": "pool", "columns": ["PoolQC"] }],
        "impute_columns": [],
        "correlation_top_k": 2,
    });
    fs::write(&config_path, json.to_string()).unwrap();

    let config = PipelineConfig::from_json_file(&config_path).unwrap();
    let result = run(config.clone(), RunStages::All).unwrap();

    assert_eq!(result.cleaning.unwrap().drops[0].group, "pool");
    assert!(dir.path().join("from_file").join("cleaned_train.csv").exists());
}
