//! Reporter stage: correlations, figures and the one outlier removal.

use super::cleaning::present_for_figure;
use super::outliers::OutlierHandler;
use super::progress::{PipelineStage, ProgressSink, ProgressUpdate};
use crate::config::PipelineConfig;
use crate::error::{Result, ResultExt};
use crate::io::{load_csv, write_csv};
use crate::profiler::DataProfiler;
use crate::reporting::charts::{BROWN, CRIMSON, INDIAN_RED, KHAKI, OLIVE, ORANGE, STEEL_BLUE};
use crate::reporting::{FigureBook, ScatterStyle, format_target_summary};
use crate::types::{EdaSummary, OutlierRule};
use plotters::style::RGBColor;
use polars::prelude::*;
use tracing::{debug, info};

/// The cleaned target is stored as `ln(SalePrice)`.
const TARGET_IS_LOG: bool = true;

/// Target-by-category box plots drawn once outliers are gone.
const CATEGORY_BOXES: [(&str, &str); 4] = [
    ("OverallCond", "Overall Condition"),
    ("Neighborhood", "Neighborhood"),
    ("BedroomAbvGr", "Bedrooms Above Grade"),
    ("MSZoning", "Zoning Classification"),
];

/// EDA stage of a run.
pub struct EdaStage<'a> {
    config: &'a PipelineConfig,
    progress: ProgressSink,
}

/// Output of [`EdaStage::analyze`]: the training table without outliers.
#[derive(Debug, Clone)]
pub struct AnalyzedTable {
    pub train: DataFrame,
    pub summary: EdaSummary,
}

impl<'a> EdaStage<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            progress: ProgressSink::default(),
        }
    }

    pub(crate) fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Read `Cleaned_train.csv`, analyze it and write `cleaned_train.csv`.
    pub fn run(&self, figures: &mut FigureBook) -> Result<EdaSummary> {
        let input = self.config.cleaned_train_path();
        let train = load_csv(&input, self.config).context("Loading cleaned training table")?;

        let AnalyzedTable { mut train, mut summary } = self.analyze(train, figures)?;

        self.progress.report(ProgressUpdate::new(
            PipelineStage::Saving,
            0.0,
            "Writing training table without outliers...",
        ));
        let output = self.config.eda_train_path();
        write_csv(&mut train, &output)?;
        summary.files_written.push(output);
        Ok(summary)
    }

    /// Rank correlations, render the figures and remove the outlier rows.
    pub fn analyze(&self, train: DataFrame, figures: &mut FigureBook) -> Result<AnalyzedTable> {
        let target = self.config.target_column.as_str();
        let rows_before = train.height();

        self.progress.report(ProgressUpdate::new(
            PipelineStage::Correlating,
            0.0,
            format!("Ranking correlations with '{}'...", target),
        ));
        let top_correlations =
            DataProfiler::top_correlations(&train, target, self.config.correlation_top_k)?;
        for entry in &top_correlations {
            info!("corr({}, {}) = {:.3}", target, entry.column, entry.coefficient);
        }
        figures.correlation_heatmap(&train, target, &top_correlations)?;
        self.progress.report(ProgressUpdate::new(
            PipelineStage::Correlating,
            1.0,
            format!("{} columns ranked", top_correlations.len()),
        ));

        self.progress.report(ProgressUpdate::new(
            PipelineStage::Plotting,
            0.0,
            "Rendering figures...",
        ));
        self.boxes(figures, &train, "OverallQual", "Overall Quality", None)?;
        self.regression(
            figures,
            &train,
            "GrLivArea",
            "Regression Plot of Above Ground Living Area vs Sale Price",
            "GrLivArea_Regression.png",
            BROWN,
        )?;

        // Outlier removal
        self.progress.report(ProgressUpdate::new(
            PipelineStage::OutlierRemoval,
            0.0,
            format!("Removing rows where {}", self.config.outlier_rule),
        ));
        let rule = self.stored_rule(&self.config.outlier_rule);
        let (train, outliers_removed) = OutlierHandler::remove(&train, &rule)?;
        self.progress.report(ProgressUpdate::new(
            PipelineStage::OutlierRemoval,
            1.0,
            format!("{} rows removed", outliers_removed),
        ));

        self.regression(
            figures,
            &train,
            "GrLivArea",
            "Regression Plot of Above Ground Living Area vs Sale Price after removing outliers",
            "GrLivArea_Regression_No_Outliers.png",
            BROWN,
        )?;
        for (column, label) in CATEGORY_BOXES {
            self.boxes(figures, &train, column, label, None)?;
        }
        self.filtered_scatters(figures, &train)?;
        self.regression(
            figures,
            &train,
            "TotalBsmtSF",
            "Regression Plot of Total Basement Area vs Sale Price",
            "TotalBsmtSF_Regression.png",
            CRIMSON,
        )?;
        self.scatter(
            figures,
            &train,
            "1stFlrSF",
            None,
            ScatterStyle {
                text: "Scatter Plot of First Floor Area vs Sale Price",
                file_name: "1stFlrSF_Scatter.png",
                x_label: "First Floor square feet",
                color: OLIVE,
                fit_line: false,
            },
        )?;
        self.boxes(figures, &train, "FullBath", "Full Bathrooms Above Grade", Some(KHAKI))?;
        self.boxes(figures, &train, "TotRmsAbvGrd", "Total Rooms Above Grade", Some(INDIAN_RED))?;
        self.progress.report(ProgressUpdate::new(
            PipelineStage::Plotting,
            1.0,
            format!("{} figures rendered", figures.records().len()),
        ));

        let target_summary = DataProfiler::summarize(&train, target)?;
        info!("Without outliers: {}", format_target_summary(&target_summary));

        let summary = EdaSummary {
            rows_before,
            rows_after: train.height(),
            outliers_removed,
            outlier_rule: self.config.outlier_rule.clone(),
            top_correlations,
            target_summary,
            files_written: Vec::new(),
        };
        Ok(AnalyzedTable { train, summary })
    }

    /// A rule restated in the units of the stored target.
    fn stored_rule(&self, rule: &OutlierRule) -> OutlierRule {
        OutlierHandler::resolve_rule(
            rule,
            &self.config.target_column,
            TARGET_IS_LOG,
            self.config.threshold_scale,
        )
    }

    /// Garage-area and lot-area scatters, drawn from the table with the
    /// large-lot rows hidden.
    fn filtered_scatters(&self, figures: &mut FigureBook, train: &DataFrame) -> Result<()> {
        if !self.can_plot(figures, train, &["LotArea", "GarageArea", "MSZoning"])? {
            return Ok(());
        }
        let rule = self.stored_rule(&self.config.figure_filter_rule);
        let (visible, hidden) = OutlierHandler::remove(train, &rule)?;
        debug!("{} rows hidden from the lot-area figures", hidden);

        self.scatter(
            figures,
            &visible,
            "GarageArea",
            None,
            ScatterStyle {
                text: "Scatter Plot of Garage Area vs Sale Price",
                file_name: "GarageArea_Scatter.png",
                x_label: "Garage Area",
                color: ORANGE,
                fit_line: false,
            },
        )?;
        self.scatter(
            figures,
            &visible,
            "LotArea",
            Some("MSZoning"),
            ScatterStyle {
                text: "Scatter Plot of Lot Area vs Sale Price by Zoning Classification",
                file_name: "LotArea_by_MSZoning.png",
                x_label: "Lot Area",
                color: STEEL_BLUE,
                fit_line: false,
            },
        )
    }

    fn can_plot(&self, figures: &FigureBook, df: &DataFrame, columns: &[&str]) -> Result<bool> {
        if !figures.is_enabled() {
            return Ok(false);
        }
        let mut all_present = true;
        for column in columns {
            all_present &= present_for_figure(df, column, self.config.missing_columns)?;
        }
        Ok(all_present)
    }

    fn boxes(
        &self,
        figures: &mut FigureBook,
        df: &DataFrame,
        category: &str,
        label: &str,
        color: Option<RGBColor>,
    ) -> Result<()> {
        if !self.can_plot(figures, df, &[category])? {
            return Ok(());
        }
        let target = &self.config.target_column;
        let text = format!("Box Plot of {} vs {}", label, target);
        figures.category_boxes(df, category, target, &text, label, color)
    }

    fn regression(
        &self,
        figures: &mut FigureBook,
        df: &DataFrame,
        x: &str,
        text: &str,
        file_name: &str,
        color: RGBColor,
    ) -> Result<()> {
        let style = ScatterStyle {
            text,
            file_name,
            x_label: x,
            color,
            fit_line: true,
        };
        self.scatter(figures, df, x, None, style)
    }

    fn scatter(
        &self,
        figures: &mut FigureBook,
        df: &DataFrame,
        x: &str,
        hue: Option<&str>,
        style: ScatterStyle<'_>,
    ) -> Result<()> {
        if !self.can_plot(figures, df, &[x])? {
            return Ok(());
        }
        figures.target_scatter(df, x, &self.config.target_column, hue, style)
    }
}
