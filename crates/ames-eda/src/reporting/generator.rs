use crate::config::PipelineConfig;
use crate::error::{EdaError, Result};
use crate::types::{
    CleaningSummary, DropRecord, EdaSummary, FigureRecord, MissingColumnPolicy, PipelineResult,
    TargetSummary,
};
use crate::utils::round2;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// File name of the JSON run report inside the output directory.
pub const REPORT_FILE_NAME: &str = "eda_report.json";

// ============================================================================
// Run Report Types
// ============================================================================

/// Report of a whole run, for JSON output and the console summary.
///
/// Use this for both `--json` and `--emit-report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    // Metadata
    /// Timestamp when the report was generated
    pub generated_at: String,
    pub train_file: String,
    pub test_file: String,
    pub output_dir: String,
    /// `None` when rendering was disabled
    pub figures_dir: Option<String>,
    pub target_column: String,
    pub missing_columns: MissingColumnPolicy,

    /// Total execution time in milliseconds
    pub duration_ms: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning: Option<CleaningSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eda: Option<EdaSummary>,
    pub figures: Vec<FigureRecord>,

    /// Things a reader should double-check (skipped columns, gaps left after
    /// imputation).
    pub warnings: Vec<String>,
}

impl RunReport {
    /// Every file the run wrote, figures excluded.
    pub fn files_written(&self) -> Vec<&PathBuf> {
        let cleaning = self.cleaning.iter().flat_map(|c| c.files_written.iter());
        let eda = self.eda.iter().flat_map(|e| e.files_written.iter());
        cleaning.chain(eda).collect()
    }
}

pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Build the report of a finished run.
    pub fn build_report(config: &PipelineConfig, result: &PipelineResult) -> RunReport {
        RunReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            train_file: config.train_path().display().to_string(),
            test_file: config.test_path().display().to_string(),
            output_dir: config.output_dir.display().to_string(),
            figures_dir: config
                .render_figures
                .then(|| config.figures_dir.display().to_string()),
            target_column: config.target_column.clone(),
            missing_columns: config.missing_columns,
            duration_ms: result.duration_ms,
            cleaning: result.cleaning.clone(),
            eda: result.eda.clone(),
            figures: result.figures.clone(),
            warnings: collect_warnings(result),
        }
    }

    /// Write a report to `eda_report.json` in the output directory.
    pub fn write_report_to_file(&self, report: &RunReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.output_dir.join(REPORT_FILE_NAME);
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&report_path)?;
        file.write_all(json.as_bytes()).map_err(|e| {
            EdaError::ReportGenerationFailed(format!("{}: {}", report_path.display(), e))
        })?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }

    /// Human-readable summary of a report, as printed by the CLI.
    pub fn render_summary(report: &RunReport) -> String {
        Summary(report).to_string()
    }
}

/// Console rendering of a [`RunReport`].
struct Summary<'a>(&'a RunReport);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let rule = "=".repeat(80);

        writeln!(f, "\n{rule}")?;
        writeln!(f, "CLEANING AND EDA COMPLETE")?;
        writeln!(f, "{rule}\n")?;
        writeln!(f, "Train:  {}", report.train_file)?;
        writeln!(f, "Test:   {}", report.test_file)?;
        writeln!(f, "Target: {}", report.target_column)?;
        writeln!(f, "Duration: {}ms\n", report.duration_ms)?;

        if let Some(cleaning) = &report.cleaning {
            write_cleaning(f, cleaning)?;
        }
        if let Some(eda) = &report.eda {
            write_eda(f, eda)?;
        }

        let files = report.files_written();
        if !files.is_empty() {
            writeln!(f, "Files Written:")?;
            for path in files {
                writeln!(f, "  - {}", path.display())?;
            }
            writeln!(f)?;
        }

        if !report.figures.is_empty() {
            writeln!(f, "Figures ({}):", report.figures.len())?;
            for figure in &report.figures {
                writeln!(f, "  - {} -> {}", figure.caption, figure.path.display())?;
            }
            writeln!(f)?;
        }

        if !report.warnings.is_empty() {
            writeln!(f, "Warnings:")?;
            for warning in &report.warnings {
                writeln!(f, "  ! {}", warning)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Use --json for machine-readable output")?;
        writeln!(f, "Use --emit-report to save the JSON report")?;
        write!(f, "{rule}")
    }
}

/// `describe()`-style block of a target summary, values rounded to 2 places.
pub fn format_target_summary(summary: &TargetSummary) -> String {
    let shape = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v));
    format!(
        "{}: count {}, mean {}, std {}, min {}, 25% {}, 50% {}, 75% {}, max {}, skew {}, kurtosis {}",
        summary.column,
        summary.count,
        round2(summary.mean),
        round2(summary.std),
        round2(summary.min),
        round2(summary.q25),
        round2(summary.median),
        round2(summary.q75),
        round2(summary.max),
        shape(summary.skew),
        shape(summary.kurtosis),
    )
}

fn write_cleaning(f: &mut fmt::Formatter<'_>, cleaning: &CleaningSummary) -> fmt::Result {
    writeln!(f, "Cleaning:")?;
    writeln!(
        f,
        "  Train: {} x {} -> {} x {}",
        cleaning.train_shape_before.0,
        cleaning.train_shape_before.1,
        cleaning.train_shape_after.0,
        cleaning.train_shape_after.1
    )?;
    writeln!(
        f,
        "  Test:  {} x {} -> {} x {}",
        cleaning.test_shape_before.0,
        cleaning.test_shape_before.1,
        cleaning.test_shape_after.0,
        cleaning.test_shape_after.1
    )?;
    writeln!(f, "  Before: {}", format_target_summary(&cleaning.target_before))?;
    writeln!(f, "  After:  {}", format_target_summary(&cleaning.target_after))?;

    for drop in &cleaning.drops {
        writeln!(f, "  Dropped [{}]: {}", drop.group, drop.dropped.join(", "))?;
    }

    let filled: usize = cleaning.imputations.iter().map(|r| r.filled).sum();
    writeln!(
        f,
        "  Imputed: {} values across {} column/table pairs",
        filled,
        cleaning.imputations.len()
    )?;
    for record in cleaning.imputations.iter().filter(|r| r.filled > 0).take(10) {
        writeln!(
            f,
            "    {} [{}] <- {} ({} filled)",
            record.column, record.table, record.value, record.filled
        )?;
    }
    writeln!(f)
}

fn write_eda(f: &mut fmt::Formatter<'_>, eda: &EdaSummary) -> fmt::Result {
    writeln!(f, "EDA:")?;
    writeln!(
        f,
        "  Rows: {} -> {} ({} removed where {})",
        eda.rows_before, eda.rows_after, eda.outliers_removed, eda.outlier_rule
    )?;
    writeln!(f, "  Top correlations:")?;
    for entry in &eda.top_correlations {
        writeln!(f, "    {:<16} {:>6.3}", entry.column, entry.coefficient)?;
    }
    writeln!(f)
}

fn skipped_warning(drop: &DropRecord) -> Option<String> {
    (!drop.skipped.is_empty()).then(|| {
        format!(
            "Drop group '{}' skipped absent columns: {}",
            drop.group,
            drop.skipped.join(", ")
        )
    })
}

fn collect_warnings(result: &PipelineResult) -> Vec<String> {
    let Some(cleaning) = &result.cleaning else {
        return Vec::new();
    };

    let mut warnings: Vec<String> = cleaning.drops.iter().filter_map(skipped_warning).collect();
    if !cleaning.missing_after.is_empty() {
        warnings.push(format!(
            "Columns still missing values after imputation: {}",
            cleaning.missing_after.columns().join(", ")
        ));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CorrelationEntry, MissingReport, OutlierRule};
    use pretty_assertions::assert_eq;

    fn target(column: &str, mean: f64) -> TargetSummary {
        TargetSummary {
            column: column.to_string(),
            count: 3,
            mean,
            std: 1.0,
            min: 1.0,
            q25: 1.5,
            median: 2.0,
            q75: 2.5,
            max: 3.0,
            skew: Some(0.0),
            kurtosis: None,
        }
    }

    fn result() -> PipelineResult {
        PipelineResult {
            duration_ms: 12,
            cleaning: Some(CleaningSummary {
                train_shape_before: (3, 3),
                test_shape_before: (2, 2),
                combined_shape: (5, 2),
                target_before: target("SalePrice", 180_921.196),
                target_after: target("SalePrice", 12.024),
                numeric_missing_train: MissingReport::default(),
                missing_before: MissingReport::default(),
                missing_after: MissingReport::default(),
                drops: vec![DropRecord {
                    group: "high_missing".to_string(),
                    dropped: vec!["PoolQC".to_string()],
                    skipped: vec!["Fence".to_string()],
                }],
                imputations: Vec::new(),
                train_shape_after: (3, 2),
                test_shape_after: (2, 1),
                files_written: vec![PathBuf::from("output/Cleaned_train.csv")],
            }),
            eda: Some(EdaSummary {
                rows_before: 3,
                rows_after: 2,
                outliers_removed: 1,
                outlier_rule: OutlierRule::new("GrLivArea", 4000.0, "SalePrice", 300_000.0),
                top_correlations: vec![CorrelationEntry {
                    column: "SalePrice".to_string(),
                    coefficient: 1.0,
                }],
                target_summary: target("SalePrice", 12.0),
                files_written: vec![PathBuf::from("output/cleaned_train.csv")],
            }),
            figures: Vec::new(),
        }
    }

    #[test]
    fn test_build_report_collects_warnings() {
        let report = ReportGenerator::build_report(&PipelineConfig::default(), &result());
        assert_eq!(report.target_column, "SalePrice");
        assert_eq!(report.figures_dir.as_deref(), Some("figures"));
        assert_eq!(
            report.warnings,
            vec!["Drop group 'high_missing' skipped absent columns: Fence".to_string()]
        );
        assert_eq!(report.files_written().len(), 2);
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = ReportGenerator::build_report(&PipelineConfig::default(), &result());
        let path = ReportGenerator::new(dir.path()).write_report_to_file(&report).unwrap();

        assert_eq!(path, dir.path().join(REPORT_FILE_NAME));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["eda"]["outliers_removed"], 1);
        assert_eq!(json["cleaning"]["drops"][0]["dropped"][0], "PoolQC");
    }

    #[test]
    fn test_render_summary_mentions_stages() {
        let report = ReportGenerator::build_report(&PipelineConfig::default(), &result());
        let text = ReportGenerator::render_summary(&report);
        assert!(text.contains("Dropped [high_missing]: PoolQC"));
        assert!(text.contains("1 removed where GrLivArea > 4000 AND SalePrice < 300000"));
        assert!(text.contains("! Drop group 'high_missing'"));
    }

    #[test]
    fn test_render_summary_lists_figures_between_rules() {
        let mut result = result();
        result.figures = vec![FigureRecord {
            number: 1,
            caption: "Fig 1. Histogram and normal probability plot".to_string(),
            path: PathBuf::from("figures/SalePrice_Normality.png"),
        }];
        let report = ReportGenerator::build_report(&PipelineConfig::default(), &result);
        let text = ReportGenerator::render_summary(&report);

        let rule = "=".repeat(80);
        assert!(text.starts_with(&format!("\n{rule}\nCLEANING AND EDA COMPLETE\n")));
        assert!(text.ends_with(&rule));
        assert!(text.contains(
            "Figures (1):\n  - Fig 1. Histogram and normal probability plot -> figures/SalePrice_Normality.png\n"
        ));
    }

    #[test]
    fn test_format_target_summary_rounds() {
        let text = format_target_summary(&target("SalePrice", 180_921.196));
        assert!(text.starts_with("SalePrice: count 3, mean 180921.2,"));
        assert!(text.ends_with("skew 0.00, kurtosis n/a"));
    }
}
