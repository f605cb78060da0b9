//! Progress reporting for the cleaning and EDA pipeline.
//!
//! The pipeline emits a [`ProgressUpdate`] at the start of every step and
//! once per item of iterative steps (drop groups, imputed columns).
//! Runs are short and synchronous, so there is no cancellation.
//!
//! # Example
//!
//! ```rust,ignore
//! use ames_eda::EdaPipeline;
//!
//! let result = EdaPipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Steps of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Reading the input tables
    Loading,
    /// Target summary and missing-value reports
    Profiling,
    /// Log transform of the target
    Transforming,
    /// Removing column groups
    DroppingColumns,
    /// Mode imputation of the remaining gaps
    Imputing,
    /// Writing cleaned tables
    Saving,
    /// Correlation ranking against the target
    Correlating,
    /// Removing outlier rows
    OutlierRemoval,
    /// Rendering charts
    Plotting,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Profiling => "Profiling Tables",
            Self::Transforming => "Transforming Target",
            Self::DroppingColumns => "Dropping Columns",
            Self::Imputing => "Imputing Values",
            Self::Saving => "Saving Tables",
            Self::Correlating => "Ranking Correlations",
            Self::OutlierRemoval => "Removing Outliers",
            Self::Plotting => "Rendering Figures",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of a full run spent in this stage (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.10,
            Self::Profiling => 0.10,
            Self::Transforming => 0.05,
            Self::DroppingColumns => 0.10,
            Self::Imputing => 0.15,
            Self::Saving => 0.05,
            Self::Correlating => 0.10,
            Self::OutlierRemoval => 0.05,
            Self::Plotting => 0.30,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Profiling => 0.10,
            Self::Transforming => 0.20,
            Self::DroppingColumns => 0.25,
            Self::Imputing => 0.35,
            Self::Saving => 0.50,
            Self::Correlating => 0.55,
            Self::OutlierRemoval => 0.65,
            Self::Plotting => 0.70,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress update with optional sub-stage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PipelineStage,

    /// Optional sub-stage description (e.g., "Group: garage", "Column: MSZoning")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage without sub-stage info.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Creates a new progress update with item counts.
    pub fn with_items(
        stage: PipelineStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            sub_stage: Some(sub_stage.into()),
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::new(stage, stage_progress, message)
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Complete, 1.0, message)
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Failed, 0.0, message)
    }
}

/// Trait for receiving progress updates during a run.
///
/// Implementations must be `Send + Sync` so a pipeline can be moved to a
/// worker thread together with its reporter.
pub trait ProgressReporter: Send + Sync {
    /// Called at each step; should return quickly.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Optional reporter shared by the stages of one run.
#[derive(Clone, Default)]
pub(crate) struct ProgressSink(Option<Arc<dyn ProgressReporter>>);

impl ProgressSink {
    pub(crate) fn new(reporter: Option<Arc<dyn ProgressReporter>>) -> Self {
        Self(reporter)
    }

    pub(crate) fn report(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.0 {
            reporter.report(update);
        }
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
static_assertions::assert_impl_all!(ProgressSink: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RUN_STAGES: [PipelineStage; 9] = [
        PipelineStage::Loading,
        PipelineStage::Profiling,
        PipelineStage::Transforming,
        PipelineStage::DroppingColumns,
        PipelineStage::Imputing,
        PipelineStage::Saving,
        PipelineStage::Correlating,
        PipelineStage::OutlierRemoval,
        PipelineStage::Plotting,
    ];

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(PipelineStage::Profiling, 0.5, "Profiling...");
        assert_eq!(update.stage, PipelineStage::Profiling);
        assert!(update.sub_stage.is_none());
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_progress_update_with_items() {
        let update = ProgressUpdate::with_items(
            PipelineStage::Imputing,
            "Column: MSZoning",
            9,
            18,
            "Imputing MSZoning",
        );
        assert_eq!(update.sub_stage, Some("Column: MSZoning".to_string()));
        assert_eq!(update.stage_progress, 0.5);
        assert_eq!(update.items_processed, Some(9));
        assert_eq!(update.items_total, Some(18));
    }

    #[test]
    fn test_progress_update_complete() {
        let update = ProgressUpdate::complete("Done!");
        assert_eq!(update.stage, PipelineStage::Complete);
        assert_eq!(update.progress, 1.0);
    }

    #[test]
    fn test_closure_progress_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::new(PipelineStage::Loading, 0.0, "Test"));
        reporter.report(ProgressUpdate::complete("Done"));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_sink_ignores_updates() {
        ProgressSink::default().report(ProgressUpdate::complete("Done"));

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let sink = ProgressSink::new(Some(Arc::new(ClosureProgressReporter::new(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        }))));
        sink.clone().report(ProgressUpdate::failed("boom"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stage_weights_sum() {
        let total_weight: f32 = RUN_STAGES.iter().map(|s| s.weight()).sum();
        assert!((total_weight - 1.0).abs() < 0.01, "Weights should sum to ~1.0");
    }

    #[test]
    fn test_base_progress_is_cumulative() {
        for pair in RUN_STAGES.windows(2) {
            let expected = pair[0].base_progress() + pair[0].weight();
            assert!((pair[1].base_progress() - expected).abs() < 1e-6, "{:?}", pair[1]);
        }
    }

    #[test]
    fn test_stage_json_values() {
        let json = serde_json::to_string(&PipelineStage::DroppingColumns).unwrap();
        assert_eq!(json, "\"dropping_columns\"");
        let json = serde_json::to_string(&PipelineStage::OutlierRemoval).unwrap();
        assert_eq!(json, "\"outlier_removal\"");
    }
}
