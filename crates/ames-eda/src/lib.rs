//! Ames Housing Cleaning and EDA Library
//!
//! A batch pipeline built with Rust and Polars that cleans the Ames, Iowa
//! housing data and produces the descriptive statistics and figures used to
//! explore it.
//!
//! # Overview
//!
//! A run has two stages:
//!
//! - **Cleaning**: loads `train.csv` and `test.csv`, log-transforms
//!   `SalePrice`, drops the configured column groups from train, test and
//!   their combination, mode-imputes the remaining gaps per table and writes
//!   `Cleaned_train.csv` / `Cleaned_test.csv`
//! - **EDA**: ranks correlations with the target, removes the
//!   `GrLivArea > 4000 AND SalePrice < 300000` outliers, renders box, scatter
//!   and regression figures and writes `cleaned_train.csv`
//!
//! Every failure is fatal: a missing file, an absent column, the mode of an
//! all-missing column or the log of a non-positive value aborts the run.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ames_eda::{EdaPipeline, PipelineConfig, RunStages};
//!
//! let config = PipelineConfig::builder()
//!     .data_dir("data")
//!     .output_dir("output")
//!     .figures_dir("figures")
//!     .build()?;
//!
//! let result = EdaPipeline::builder()
//!     .config(config)
//!     .stages(RunStages::All)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! if let Some(eda) = &result.eda {
//!     println!("Removed {} outliers", eda.outliers_removed);
//! }
//! ```
//!
//! # Working on tables directly
//!
//! The building blocks take tables by reference and return new ones:
//!
//! ```rust,ignore
//! use ames_eda::{OutlierHandler, OutlierRule, log_transform, missing_report};
//!
//! log_transform(&mut train, "SalePrice")?;
//! let report = missing_report(&train);
//! let rule = OutlierRule::new("GrLivArea", 4000.0, "SalePrice", 300_000f64.ln());
//! let (kept, removed) = OutlierHandler::remove(&train, &rule)?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod io;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{ColumnDropper, TableSet, combine};
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder, default_drop_groups};
pub use error::{EdaError, Result as EdaResult, ResultExt};
pub use imputers::ModeImputer;
pub use io::{load_csv, write_csv};
pub use pipeline::{
    AnalyzedTable, CleanedTables, CleaningStage, ClosureProgressReporter, EdaPipeline,
    EdaPipelineBuilder, EdaStage, OutlierHandler, PipelineStage, ProgressReporter, ProgressUpdate,
    RunStages, log_transform,
};
pub use profiler::{CorrelationMatrix, DataProfiler, missing_report, numeric_missing_report};
pub use reporting::{FigureBook, ReportGenerator, RunReport};
pub use types::{
    CleaningSummary, ColumnDropGroup, CorrelationEntry, DropRecord, EdaSummary, FigureRecord,
    ImputationRecord, MissingColumnPolicy, MissingReport, MissingValueRow, ModeValue, OutlierRule,
    PipelineResult, TableKind, TargetSummary, ThresholdScale,
};
