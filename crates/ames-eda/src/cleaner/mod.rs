//! Data cleaning module for preprocessing the housing tables.
//!
//! This module provides functionality for:
//! - Dropping named column groups from train, test and combined tables
//! - Building the combined table used for missing-value decisions
//! - Per-table mode imputation of the remaining gaps

mod dropper;
mod tables;

pub use dropper::ColumnDropper;
pub use tables::{TableSet, combine};
