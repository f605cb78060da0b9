//! Imputation module for handling missing values.
//!
//! Each table computes its own mode: train, test and the combined table may
//! fill the same column with different values.

mod mode;

pub use mode::ModeImputer;
