//! Loader/Cleaner stage: log-transform the target, drop the configured
//! column groups, mode-impute what is left and write the cleaned tables.

use super::progress::{PipelineStage, ProgressSink, ProgressUpdate};
use super::transform::log_transform;
use crate::cleaner::TableSet;
use crate::config::PipelineConfig;
use crate::error::{EdaError, Result, ResultExt};
use crate::io::{load_csv, write_csv};
use crate::profiler::{DataProfiler, missing_report, numeric_missing_report};
use crate::reporting::charts::DARK_GREEN;
use crate::reporting::{FigureBook, format_target_summary};
use crate::types::{CleaningSummary, MissingColumnPolicy};
use crate::utils::has_column;
use plotters::style::{BLUE, RED};
use polars::prelude::*;
use tracing::{info, warn};

/// Columns plotted against the target before anything is dropped.
const PRE_DROP_SCATTER: [&str; 3] = ["LotFrontage", "MasVnrArea", "GarageYrBlt"];

/// Cleaning stage of a run.
pub struct CleaningStage<'a> {
    config: &'a PipelineConfig,
    progress: ProgressSink,
}

/// Tables produced by [`CleaningStage::clean`], not yet written.
#[derive(Debug, Clone)]
pub struct CleanedTables {
    pub tables: TableSet,
    pub summary: CleaningSummary,
}

impl<'a> CleaningStage<'a> {
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

    /// Load the raw files, clean them and write `Cleaned_train.csv` and
    /// `Cleaned_test.csv`.
    pub fn run(&self, figures: &mut FigureBook) -> Result<CleaningSummary> {
        self.progress.report(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            "Loading raw tables...",
        ));
        let train = load_csv(&self.config.train_path(), self.config)?;
        let test = load_csv(&self.config.test_path(), self.config)?;
        self.progress.report(ProgressUpdate::new(
            PipelineStage::Loading,
            1.0,
            format!("Loaded train {:?} and test {:?}", train.shape(), test.shape()),
        ));

        let CleanedTables { mut tables, mut summary } = self.clean(train, test, figures)?;

        self.progress.report(ProgressUpdate::new(
            PipelineStage::Saving,
            0.0,
            "Writing cleaned tables...",
        ));
        let train_path = self.config.cleaned_train_path();
        let test_path = self.config.cleaned_test_path();
        write_csv(&mut tables.train, &train_path)?;
        write_csv(&mut tables.test, &test_path)?;
        summary.files_written = vec![train_path, test_path];
        self.progress.report(ProgressUpdate::new(
            PipelineStage::Saving,
            1.0,
            "Cleaned tables written",
        ));

        Ok(summary)
    }

    /// Clean in-memory train and test tables.
    ///
    /// Steps, in order: summarize and log-transform the target in train,
    /// report missing values, drop each column group from all three tables,
    /// then mode-impute the configured columns per table.
    pub fn clean(
        &self,
        mut train: DataFrame,
        test: DataFrame,
        figures: &mut FigureBook,
    ) -> Result<CleanedTables> {
        let target = self.config.target_column.as_str();
        let policy = self.config.missing_columns;
        let train_shape_before = train.shape();
        let test_shape_before = test.shape();

        // Target before and after the transform
        self.progress.report(ProgressUpdate::new(
            PipelineStage::Profiling,
            0.0,
            format!("Summarizing '{}'...", target),
        ));
        let target_before = DataProfiler::summarize(&train, target).context("Summarizing target")?;
        info!("Before transform: {}", format_target_summary(&target_before));
        figures.normality(
            &train,
            target,
            "Histogram and normal probability plot",
            &format!("{}_Normality.png", target),
        )?;

        self.progress.report(ProgressUpdate::new(
            PipelineStage::Transforming,
            0.0,
            format!("Applying ln to '{}'...", target),
        ));
        log_transform(&mut train, target)?;
        let target_after = DataProfiler::summarize(&train, target)?;
        info!("After transform: {}", format_target_summary(&target_after));
        figures.normality(
            &train,
            target,
            "Transformed Histogram and normal probability plot",
            &format!("Transformed_{}_Normality.png", target),
        )?;
        self.progress.report(ProgressUpdate::new(
            PipelineStage::Transforming,
            1.0,
            "Target transformed",
        ));

        // Missing values before any drop
        let numeric_missing_train = numeric_missing_report(&train);
        for row in &numeric_missing_train.rows {
            info!(
                "Numeric column '{}' missing {} values ({:.2}%)",
                row.variable, row.total, row.percent
            );
        }
        if figures.is_enabled() {
            let mut panels = Vec::with_capacity(PRE_DROP_SCATTER.len());
            for (column, color) in PRE_DROP_SCATTER.into_iter().zip([RED, DARK_GREEN, BLUE]) {
                if present_for_figure(&train, column, policy)? {
                    panels.push((column, color));
                }
            }
            if !panels.is_empty() {
                figures.target_scatter_row(
                    &train,
                    target,
                    &panels,
                    &format!("{} vs columns with missing values", target),
                    "Fig_2.png",
                )?;
            }
        }

        let mut tables = TableSet::new(train, test, target)?;
        let combined_shape = tables.combined.shape();
        let missing_before = missing_report(&tables.combined);
        info!(
            "Combined table has {} columns with missing values",
            missing_before.len()
        );
        figures.missing_percent(&missing_before)?;
        self.progress.report(ProgressUpdate::new(
            PipelineStage::Profiling,
            1.0,
            format!("{} columns with missing values", missing_before.len()),
        ));

        // Column drops
        let groups = &self.config.drop_groups;
        let mut drops = Vec::with_capacity(groups.len());
        for (i, group) in groups.iter().enumerate() {
            self.progress.report(ProgressUpdate::with_items(
                PipelineStage::DroppingColumns,
                format!("Group: {}", group.name),
                i,
                groups.len(),
                format!("Dropping {} columns of '{}'", group.columns.len(), group.name),
            ));
            if group.inspect && figures.is_enabled() {
                let mut shown = group.clone();
                shown.columns.clear();
                for column in &group.columns {
                    if present_for_figure(&tables.train, column, policy)? {
                        shown.columns.push(column.clone());
                    }
                }
                figures.group_boxes(&tables.train, target, &shown)?;
            }
            drops.push(tables.drop_group(group, policy)?);
            if group.chart_after {
                figures.missing_percent(&missing_report(&tables.combined))?;
            }
        }

        // Imputation
        let columns = &self.config.impute_columns;
        let mut imputations = Vec::new();
        for (i, column) in columns.iter().enumerate() {
            self.progress.report(ProgressUpdate::with_items(
                PipelineStage::Imputing,
                format!("Column: {}", column),
                i,
                columns.len(),
                format!("Imputing '{}'", column),
            ));
            let records = tables.impute_column(column, policy)?;
            for record in &records {
                if record.filled > 0 {
                    info!(
                        "[{}] '{}': filled {} values with {}",
                        record.table, column, record.filled, record.value
                    );
                }
            }
            imputations.extend(records);
        }

        let missing_after = missing_report(&tables.combined);
        if missing_after.is_empty() {
            info!("No more columns with missing values");
        } else {
            warn!(
                "Columns still missing values: {}",
                missing_after.columns().join(", ")
            );
        }
        self.progress.report(ProgressUpdate::new(
            PipelineStage::Imputing,
            1.0,
            format!("{} imputations applied", imputations.len()),
        ));

        let summary = CleaningSummary {
            train_shape_before,
            test_shape_before,
            combined_shape,
            target_before,
            target_after,
            numeric_missing_train,
            missing_before,
            missing_after,
            drops,
            imputations,
            train_shape_after: tables.train.shape(),
            test_shape_after: tables.test.shape(),
            files_written: Vec::new(),
        };
        Ok(CleanedTables { tables, summary })
    }
}

/// Whether a column can be plotted; an absent column fails the run unless
/// absent columns are skipped.
pub(crate) fn present_for_figure(
    df: &DataFrame,
    column: &str,
    policy: MissingColumnPolicy,
) -> Result<bool> {
    if has_column(df, column) {
        return Ok(true);
    }
    match policy {
        MissingColumnPolicy::Error => {
            Err(EdaError::ColumnNotFound(column.to_string()).with_context("Rendering figures"))
        }
        MissingColumnPolicy::Skip => {
            warn!("Column '{}' absent, leaving it out of the figures", column);
            Ok(false)
        }
    }
}
