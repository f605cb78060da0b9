//! Outlier handling module.
//!
//! Contains the rectangular-region filter used to remove anomalous sales:
//! a row is dropped when `x > x_threshold AND y < y_threshold`.

use crate::error::Result;
use crate::types::{OutlierRule, ThresholdScale};
use crate::utils::column_f64;
use polars::prelude::*;
use tracing::{debug, info};

/// Handles outlier detection and removal.
pub struct OutlierHandler;

impl OutlierHandler {
    /// Restate a rule in the units of the stored table.
    ///
    /// With [`ThresholdScale::Original`], thresholds on a log-transformed
    /// target are converted with `ln`. A non-positive threshold has no log and
    /// becomes negative infinity, which no stored value is below.
    pub fn resolve_rule(
        rule: &OutlierRule,
        target: &str,
        target_is_log: bool,
        scale: ThresholdScale,
    ) -> OutlierRule {
        if !target_is_log || scale == ThresholdScale::AsStored {
            return rule.clone();
        }

        let to_stored = |threshold: f64| {
            if threshold > 0.0 {
                threshold.ln()
            } else {
                f64::NEG_INFINITY
            }
        };

        let mut resolved = rule.clone();
        if resolved.x_column == target {
            resolved.x_threshold = to_stored(resolved.x_threshold);
        }
        if resolved.y_column == target {
            resolved.y_threshold = to_stored(resolved.y_threshold);
        }
        if resolved != *rule {
            debug!("Outlier rule '{}' stated on stored values as '{}'", rule, resolved);
        }
        resolved
    }

    /// Rows matching the rule. Rows with a missing x or y never match.
    pub fn outlier_flags(df: &DataFrame, rule: &OutlierRule) -> Result<Vec<bool>> {
        let xs = column_f64(df, &rule.x_column)?;
        let ys = column_f64(df, &rule.y_column)?;
        Ok(xs
            .into_iter()
            .zip(ys)
            .map(|(x, y)| match (x, y) {
                (Some(x), Some(y)) => x > rule.x_threshold && y < rule.y_threshold,
                _ => false,
            })
            .collect())
    }

    /// Remove the rows matching the rule; returns the kept rows and the
    /// number removed. Row order is preserved.
    pub fn remove(df: &DataFrame, rule: &OutlierRule) -> Result<(DataFrame, usize)> {
        let flags = Self::outlier_flags(df, rule)?;
        let removed = flags.iter().filter(|f| **f).count();
        let keep: Vec<bool> = flags.iter().map(|f| !f).collect();
        let kept = df.filter(&BooleanChunked::from_slice(PlSmallStr::from_static("keep"), &keep))?;
        info!("Removed {} rows where {}", removed, rule);
        Ok((kept, removed))
    }
}
