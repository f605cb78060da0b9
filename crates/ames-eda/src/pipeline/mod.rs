//! Pipeline module.
//!
//! This module provides the cleaning and EDA stages, the transforms and
//! filters they apply, and the [`EdaPipeline`] that runs them.

mod builder;
mod cleaning;
mod eda;
pub mod outliers;
pub mod progress;
pub mod transform;

pub use builder::{EdaPipeline, EdaPipelineBuilder, RunStages};
pub use cleaning::{CleanedTables, CleaningStage};
pub use eda::{AnalyzedTable, EdaStage};
pub use outliers::OutlierHandler;
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
pub use transform::log_transform;
