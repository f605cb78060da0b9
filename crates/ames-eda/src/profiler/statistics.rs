//! Descriptive statistics over numeric columns.
//!
//! Shape statistics use the bias-corrected sample estimators (the same ones
//! pandas reports), quantiles use linear interpolation between order
//! statistics.

use crate::types::{CorrelationEntry, TargetSummary};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;

/// Upper bound on histogram bins.
const MAX_HISTOGRAM_BINS: usize = 50;

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.mean())
}

/// Sample standard deviation (`n - 1` denominator); 0 for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.std_dev()
}

/// Central moment sums `(sum d^2, sum d^3, sum d^4)` around the mean.
fn central_sums(values: &[f64]) -> (f64, f64, f64) {
    let m = values.mean();
    values.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), v| {
        let d = v - m;
        let d2 = d * d;
        (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
    })
}

/// Adjusted Fisher-Pearson skewness.
///
/// `None` with fewer than 3 values; 0 for a constant column.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let (s2, s3, _) = central_sums(values);
    let nf = n as f64;
    let m2 = s2 / nf;
    let m3 = s3 / nf;
    if m2 == 0.0 {
        return Some(0.0);
    }
    Some((nf * (nf - 1.0).sqrt() / (nf - 2.0)) * (m3 / m2.powf(1.5)))
}

/// Bias-corrected excess kurtosis (0 for a normal distribution).
///
/// `None` with fewer than 4 values; 0 for a constant column.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let (s2, _, s4) = central_sums(values);
    if s2 == 0.0 {
        return Some(0.0);
    }
    let nf = n as f64;
    let numerator = nf * (nf + 1.0) * (nf - 1.0) * s4;
    let denominator = (nf - 2.0) * (nf - 3.0) * s2 * s2;
    let adjustment = 3.0 * (nf - 1.0).powi(2) / ((nf - 2.0) * (nf - 3.0));
    Some(numerator / denominator - adjustment)
}

/// Sort a copy of the values ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Quantile of ascending-sorted values with linear interpolation.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// `describe()` summary plus skew and kurtosis; `None` for an empty slice.
pub fn describe(column: &str, values: &[f64]) -> Option<TargetSummary> {
    let sorted = sorted(values);
    Some(TargetSummary {
        column: column.to_string(),
        count: values.len(),
        mean: mean(values)?,
        std: sample_std(values),
        min: *sorted.first()?,
        q25: quantile_sorted(&sorted, 0.25)?,
        median: quantile_sorted(&sorted, 0.5)?,
        q75: quantile_sorted(&sorted, 0.75)?,
        max: *sorted.last()?,
        skew: skewness(values),
        kurtosis: kurtosis(values),
    })
}

/// Pearson correlation of paired observations.
///
/// `None` with fewer than 2 pairs or when either side is constant.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let mx = pairs.iter().map(|p| p.0).mean();
    let my = pairs.iter().map(|p| p.1).mean();
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Ordinary least squares line `y = slope * x + intercept`.
pub fn linear_fit(pairs: &[(f64, f64)]) -> Option<(f64, f64)> {
    if pairs.len() < 2 {
        return None;
    }
    let mx = pairs.iter().map(|p| p.0).mean();
    let my = pairs.iter().map(|p| p.1).mean();
    let sxx: f64 = pairs.iter().map(|(x, _)| (x - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = pairs.iter().map(|(x, y)| (x - mx) * (y - my)).sum();
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

/// Pairwise correlation matrix over a set of columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `NaN` where a coefficient is undefined.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Build from per-column observations aligned by row (`None` = missing).
    /// Each coefficient uses the rows where both columns are present.
    pub fn from_columns(columns: Vec<String>, data: &[Vec<Option<f64>>]) -> Self {
        let k = columns.len();
        let mut values = vec![vec![f64::NAN; k]; k];
        for i in 0..k {
            for j in i..k {
                let pairs: Vec<(f64, f64)> = data[i]
                    .iter()
                    .zip(&data[j])
                    .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                    .collect();
                let r = if i == j && pairs.len() >= 2 {
                    Some(1.0)
                } else {
                    pearson(&pairs)
                };
                let r = r.unwrap_or(f64::NAN);
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Self { columns, values }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The `k` largest correlations in one column of a correlation matrix.
///
/// Undefined coefficients are skipped; ties keep matrix order.
pub fn nlargest(matrix: &CorrelationMatrix, target_index: usize, k: usize) -> Vec<CorrelationEntry> {
    let mut entries: Vec<CorrelationEntry> = matrix
        .columns
        .iter()
        .enumerate()
        .filter_map(|(i, name)| {
            let r = matrix.get(i, target_index);
            (!r.is_nan()).then(|| CorrelationEntry {
                column: name.clone(),
                coefficient: r,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.coefficient.total_cmp(&a.coefficient));
    entries.truncate(k);
    entries
}

/// Points of a normal probability (QQ) plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityPlot {
    /// Theoretical standard-normal quantiles.
    pub theoretical: Vec<f64>,
    /// Sample values, ascending.
    pub ordered: Vec<f64>,
    pub slope: f64,
    pub intercept: f64,
    /// Correlation of the plotted points.
    pub r: f64,
}

/// Normal probability plot using Filliben's order-statistic medians.
pub fn probability_plot(values: &[f64]) -> Option<ProbabilityPlot> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let normal = Normal::new(0.0, 1.0).ok()?;
    let nf = n as f64;
    let last = 0.5f64.powf(1.0 / nf);
    let theoretical: Vec<f64> = (1..=n)
        .map(|i| {
            let m = if i == 1 {
                1.0 - last
            } else if i == n {
                last
            } else {
                (i as f64 - 0.3175) / (nf + 0.365)
            };
            normal.inverse_cdf(m)
        })
        .collect();
    let ordered = sorted(values);
    let pairs: Vec<(f64, f64)> = theoretical.iter().copied().zip(ordered.iter().copied()).collect();
    let (slope, intercept) = linear_fit(&pairs)?;
    let r = pearson(&pairs).unwrap_or(0.0);
    Some(ProbabilityPlot {
        theoretical,
        ordered,
        slope,
        intercept,
        r,
    })
}

/// Gaussian kernel density estimate on `grid`, Scott's bandwidth.
///
/// Empty when the sample is empty or constant.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Vec<f64> {
    let n = values.len();
    let std = sample_std(values);
    if n == 0 || std == 0.0 {
        return Vec::new();
    }
    let bandwidth = std * (n as f64).powf(-0.2);
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    grid.iter()
        .map(|x| {
            values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm
        })
        .collect()
}

/// One bar of a density histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    /// Bar height such that the bar areas sum to 1.
    pub density: f64,
}

/// Density histogram with Freedman-Diaconis bins, capped at 50.
pub fn density_histogram(values: &[f64]) -> Vec<HistogramBin> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let sorted = sorted(values);
    let (min, max) = (sorted[0], sorted[n - 1]);
    if min == max {
        return vec![HistogramBin {
            start: min - 0.5,
            end: max + 0.5,
            density: 1.0,
        }];
    }

    let iqr = quantile_sorted(&sorted, 0.75).unwrap_or(max) - quantile_sorted(&sorted, 0.25).unwrap_or(min);
    let width = 2.0 * iqr / (n as f64).cbrt();
    let bins = if width > 0.0 {
        ((max - min) / width).ceil() as usize
    } else {
        (n as f64).sqrt().ceil() as usize
    }
    .clamp(1, MAX_HISTOGRAM_BINS);

    let step = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &sorted {
        let idx = (((v - min) / step) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| HistogramBin {
            start: min + step * i as f64,
            end: min + step * (i + 1) as f64,
            density: c as f64 / (n as f64 * step),
        })
        .collect()
}

/// Box-plot statistics with whiskers at the furthest points within 1.5 IQR.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let sorted = sorted(values);
    let q1 = quantile_sorted(&sorted, 0.25)?;
    let median = quantile_sorted(&sorted, 0.5)?;
    let q3 = quantile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= low_fence && *v <= high_fence)
        .collect();
    Some(BoxStats {
        q1,
        median,
        q3,
        whisker_low: inside.first().copied().unwrap_or(q1),
        whisker_high: inside.last().copied().unwrap_or(q3),
        outliers: sorted
            .into_iter()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect(),
    })
}
