//! Main pipeline module.
//!
//! This module provides the [`EdaPipeline`] struct and builder that run the
//! cleaning stage, the EDA stage, or both in order.

use super::cleaning::CleaningStage;
use super::eda::EdaStage;
use super::progress::{ClosureProgressReporter, ProgressReporter, ProgressSink, ProgressUpdate};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::Result;
use crate::reporting::FigureBook;
use crate::types::PipelineResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Which stages a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStages {
    /// Raw files to `Cleaned_train.csv` / `Cleaned_test.csv`.
    Clean,
    /// `Cleaned_train.csv` to figures and `cleaned_train.csv`.
    Eda,
    /// Cleaning, then EDA on its output.
    #[default]
    All,
}

impl RunStages {
    pub fn includes_cleaning(&self) -> bool {
        matches!(self, Self::Clean | Self::All)
    }

    pub fn includes_eda(&self) -> bool {
        matches!(self, Self::Eda | Self::All)
    }
}

/// The cleaning and EDA pipeline.
///
/// Use [`EdaPipeline::builder()`] to create a new pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use ames_eda::{EdaPipeline, PipelineConfig, RunStages};
///
/// let result = EdaPipeline::builder()
///     .config(PipelineConfig::builder().data_dir("data").build()?)
///     .stages(RunStages::All)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
/// ```
pub struct EdaPipeline {
    config: PipelineConfig,
    stages: RunStages,
    progress: ProgressSink,
}

static_assertions::assert_impl_all!(EdaPipeline: Send);

impl EdaPipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> EdaPipelineBuilder {
        EdaPipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stages(&self) -> RunStages {
        self.stages
    }

    /// Run the configured stages.
    ///
    /// Any failure aborts the run; files written by an earlier stage stay on
    /// disk.
    pub fn run(&self) -> Result<PipelineResult> {
        match self.run_internal() {
            Ok(result) => {
                self.progress
                    .report(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.progress.report(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn run_internal(&self) -> Result<PipelineResult> {
        let start_time = Instant::now();
        info!("Starting pipeline ({:?})...", self.stages);

        let mut figures = FigureBook::new(&self.config.figures_dir, self.config.render_figures);

        let cleaning = if self.stages.includes_cleaning() {
            info!("Stage 1: Cleaning raw tables...");
            let stage = CleaningStage::new(&self.config).with_progress(self.progress.clone());
            Some(stage.run(&mut figures)?)
        } else {
            None
        };

        let eda = if self.stages.includes_eda() {
            info!("Stage 2: Exploratory analysis...");
            let stage = EdaStage::new(&self.config).with_progress(self.progress.clone());
            Some(stage.run(&mut figures)?)
        } else {
            None
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Pipeline finished in {}ms with {} figures",
            duration_ms,
            figures.records().len()
        );

        Ok(PipelineResult {
            duration_ms,
            cleaning,
            eda,
            figures: figures.into_records(),
        })
    }
}

/// Builder for creating an [`EdaPipeline`] instance.
///
/// Use [`EdaPipeline::builder()`] to get started.
#[derive(Default)]
pub struct EdaPipelineBuilder {
    config: Option<PipelineConfig>,
    stages: Option<RunStages>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(EdaPipelineBuilder: Send);

impl EdaPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Choose the stages to run. Default: all.
    pub fn stages(mut self, stages: RunStages) -> Self {
        self.stages = Some(stages);
        self
    }

    /// Set a progress reporter for receiving updates during a run.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use ames_eda::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct StageLogger;
    ///
    /// impl ProgressReporter for StageLogger {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         println!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = EdaPipeline::builder()
    ///     .progress_reporter(Arc::new(StageLogger))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<EdaPipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(EdaPipeline {
            config,
            stages: self.stages.unwrap_or_default(),
            progress: ProgressSink::new(self.progress_reporter),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::progress::PipelineStage;
    use std::sync::Mutex;

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = EdaPipeline::builder().build().unwrap();
        assert_eq!(pipeline.stages(), RunStages::All);
        assert_eq!(pipeline.config().target_column, "SalePrice");
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let mut config = PipelineConfig::default();
        config.correlation_top_k = 0;
        assert!(EdaPipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_run_stages() {
        assert!(RunStages::Clean.includes_cleaning());
        assert!(!RunStages::Clean.includes_eda());
        assert!(!RunStages::Eda.includes_cleaning());
        assert!(RunStages::All.includes_cleaning() && RunStages::All.includes_eda());
    }

    #[test]
    fn test_failed_run_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::builder()
            .data_dir(dir.path())
            .output_dir(dir.path())
            .render_figures(false)
            .build()
            .unwrap();

        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = stages.clone();
        let err = EdaPipeline::builder()
            .config(config)
            .on_progress(move |update| seen.lock().unwrap().push(update.stage))
            .build()
            .unwrap()
            .run()
            .unwrap_err();

        assert_eq!(err.error_code(), "INPUT_NOT_FOUND");
        let stages = stages.lock().unwrap();
        assert_eq!(stages.first(), Some(&PipelineStage::Loading));
        assert_eq!(stages.last(), Some(&PipelineStage::Failed));
    }
}
