//! Figures and run reports.
//!
//! - [`charts`] draws PNG charts with `plotters`.
//! - [`FigureBook`] maps table columns onto those charts and numbers the
//!   captions of a run ("Fig 1. ...").
//! - [`ReportGenerator`] builds the JSON run report and the console summary.
//!
//! # Example
//!
//! ```rust,ignore
//! use ames_eda::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report(&config, &result);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! ReportGenerator::new(&config.output_dir).write_report_to_file(&report)?;
//! ```

pub mod charts;
mod figures;
mod generator;

pub use figures::{FigureBook, ScatterStyle, grouped_values};
pub use generator::{REPORT_FILE_NAME, ReportGenerator, RunReport, format_target_summary};
