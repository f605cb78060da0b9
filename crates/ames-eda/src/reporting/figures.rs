//! Figure catalogue with run-wide caption numbering.
//!
//! [`FigureBook`] turns table columns into chart data, numbers each figure
//! in render order ("Fig 1. ...", "Fig 2. ...") and records what was
//! written. When rendering is disabled every method is a no-op.

use super::charts::{self, BoxPanel, PointSet, ScatterPanel};
use crate::error::{EdaError, Result};
use crate::profiler::DataProfiler;
use crate::types::{ColumnDropGroup, CorrelationEntry, FigureRecord, MissingReport};
use crate::utils::{column_f64, column_labels, column_values, is_numeric_dtype, paired_values, require_column};
use plotters::prelude::{Palette, Palette99, RGBColor};
use plotters::style::Color;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Numbers, renders and records the figures of a run.
#[derive(Debug)]
pub struct FigureBook {
    dir: PathBuf,
    enabled: bool,
    records: Vec<FigureRecord>,
    missing_charts: usize,
}

impl FigureBook {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
            records: Vec::new(),
            missing_charts: 0,
        }
    }

    /// A book that renders nothing.
    pub fn disabled() -> Self {
        Self::new(PathBuf::new(), false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn records(&self) -> &[FigureRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<FigureRecord> {
        self.records
    }

    /// Number of the next figure.
    pub fn next_number(&self) -> usize {
        self.records.len() + 1
    }

    /// Render one numbered figure through `draw(path, caption)`.
    fn draw<F>(&mut self, file_name: &str, text: &str, draw: F) -> Result<()>
    where
        F: FnOnce(&Path, &str) -> Result<()>,
    {
        if !self.enabled {
            return Ok(());
        }
        fs::create_dir_all(&self.dir)?;
        let number = self.next_number();
        let caption = format!("Fig {}. {}", number, text);
        let path = self.dir.join(file_name);
        draw(&path, &caption)?;
        info!("Figure saved: {} ({})", path.display(), caption);
        self.records.push(FigureRecord {
            number,
            caption,
            path,
        });
        Ok(())
    }

    /// Histogram, probability plot and box plot of one column.
    pub fn normality(&mut self, df: &DataFrame, column: &str, text: &str, file_name: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let values = column_values(df, column)?;
        self.draw(file_name, text, |path, caption| {
            charts::normality_panel(path, caption, column, &values)
        })
    }

    /// One scatter panel per column, target on x, column on y.
    pub fn target_scatter_row(
        &mut self,
        df: &DataFrame,
        target: &str,
        columns: &[(&str, RGBColor)],
        text: &str,
        file_name: &str,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let panels = columns
            .iter()
            .map(|(column, color)| {
                Ok(ScatterPanel {
                    title: format!("{} vs {}", target, column),
                    x_label: target.to_string(),
                    y_label: column.to_string(),
                    sets: vec![PointSet {
                        label: None,
                        color: *color,
                        points: paired_values(df, target, column)?,
                    }],
                    fit_line: false,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.draw(file_name, text, |path, caption| charts::scatter_row(path, caption, &panels))
    }

    /// Missing-percent bar chart, files numbered `missing_percent_1.png`, ...
    pub fn missing_percent(&mut self, report: &MissingReport) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.missing_charts += 1;
        let file_name = format!("missing_percent_{}.png", self.missing_charts);
        self.draw(&file_name, "Display Missing data percentage by variable", |path, caption| {
            charts::missing_bars(path, caption, report)
        })
    }

    /// Target-by-category box plots for every column of a drop group.
    pub fn group_boxes(&mut self, df: &DataFrame, target: &str, group: &ColumnDropGroup) -> Result<()> {
        if !self.enabled || group.columns.is_empty() {
            return Ok(());
        }
        let panels = group
            .columns
            .iter()
            .map(|column| {
                Ok(BoxPanel {
                    title: format!("{} vs {}", target, column),
                    x_label: column.clone(),
                    y_label: target.to_string(),
                    groups: grouped_values(df, column, target)?,
                    color: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let layout = grid_layout(panels.len());
        let text = format!("{} vs {} variables", target, group.name);
        let file_name = format!("{}_boxplots.png", group.name);
        self.draw(&file_name, &text, |path, caption| {
            charts::box_grid(path, caption, layout, &panels)
        })
    }

    /// Heatmap of the correlations among the top-ranked columns.
    pub fn correlation_heatmap(
        &mut self,
        df: &DataFrame,
        target: &str,
        top: &[CorrelationEntry],
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let columns: Vec<String> = top.iter().map(|e| e.column.clone()).collect();
        let matrix = DataProfiler::correlation_submatrix(df, &columns)?;
        let title = format!(
            "Correlation Heatmap of {} with {} most related variables",
            target,
            columns.len().saturating_sub(1)
        );
        let text = format!("Correlation Matrix Heatmap of {}", target);
        self.draw("Correlation_Heatmap.png", &text, |path, caption| {
            charts::heatmap(path, caption, &title, &matrix)
        })
    }

    /// Box plots of the target by the values of one column.
    pub fn category_boxes(
        &mut self,
        df: &DataFrame,
        category: &str,
        target: &str,
        text: &str,
        x_label: &str,
        color: Option<RGBColor>,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let panel = BoxPanel {
            title: "House Prices in Ames, Iowa".to_string(),
            x_label: x_label.to_string(),
            y_label: target.to_string(),
            groups: grouped_values(df, category, target)?,
            color,
        };
        let file_name = format!("{}_by_{}.png", target, category);
        self.draw(&file_name, text, |path, caption| charts::box_chart(path, caption, &panel))
    }

    /// Scatter of the target against a column, with an optional fit line
    /// and an optional hue column splitting the points into coloured sets.
    pub fn target_scatter(
        &mut self,
        df: &DataFrame,
        x: &str,
        target: &str,
        hue: Option<&str>,
        style: ScatterStyle<'_>,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let sets = match hue {
            Some(hue) => hue_sets(df, x, target, hue)?,
            None => vec![PointSet {
                label: None,
                color: style.color,
                points: paired_values(df, x, target)?,
            }],
        };
        let panel = ScatterPanel {
            title: "House Prices in Ames, Iowa".to_string(),
            x_label: style.x_label.to_string(),
            y_label: target.to_string(),
            sets,
            fit_line: style.fit_line,
        };
        self.draw(style.file_name, style.text, |path, caption| {
            charts::scatter(path, caption, &panel)
        })
    }
}

/// Presentation settings of a single scatter figure.
#[derive(Debug, Clone, Copy)]
pub struct ScatterStyle<'a> {
    pub text: &'a str,
    pub file_name: &'a str,
    pub x_label: &'a str,
    pub color: RGBColor,
    pub fit_line: bool,
}

/// Values of `value` grouped by the categories of `category`.
///
/// Rows missing either side are skipped. Numeric categories are ordered
/// numerically, text categories lexicographically.
pub fn grouped_values(df: &DataFrame, category: &str, value: &str) -> Result<Vec<(String, Vec<f64>)>> {
    let numeric = is_numeric_dtype(require_column(df, category)?.dtype());
    let values = column_f64(df, value)?;
    let labels = column_labels(df, category)?;
    let keys: Vec<Option<f64>> = if numeric {
        column_f64(df, category)?
    } else {
        vec![None; labels.len()]
    };

    let mut groups: Vec<(String, Option<f64>, Vec<f64>)> = Vec::new();
    for ((label, key), value) in labels.into_iter().zip(keys).zip(values) {
        let (Some(label), Some(value)) = (label, value) else {
            continue;
        };
        match groups.iter_mut().find(|g| g.0 == label) {
            Some(group) => group.2.push(value),
            None => groups.push((label, key, vec![value])),
        }
    }

    if numeric {
        groups.sort_by(|a, b| a.1.unwrap_or(f64::NAN).total_cmp(&b.1.unwrap_or(f64::NAN)));
    } else {
        groups.sort_by(|a, b| a.0.cmp(&b.0));
    }
    Ok(groups.into_iter().map(|(label, _, values)| (label, values)).collect())
}

/// `(x, y)` points split into one coloured set per value of `hue`.
fn hue_sets(df: &DataFrame, x: &str, y: &str, hue: &str) -> Result<Vec<PointSet>> {
    let xs = column_f64(df, x)?;
    let ys = column_f64(df, y)?;
    let hues = column_labels(df, hue)?;

    let mut sets: Vec<PointSet> = Vec::new();
    for ((x, y), hue) in xs.into_iter().zip(ys).zip(hues) {
        let (Some(x), Some(y), Some(hue)) = (x, y, hue) else {
            continue;
        };
        match sets.iter_mut().find(|s| s.label.as_deref() == Some(hue.as_str())) {
            Some(set) => set.points.push((x, y)),
            None => {
                let rgba = Palette99::pick(sets.len()).to_rgba();
                sets.push(PointSet {
                    label: Some(hue),
                    color: RGBColor(rgba.0, rgba.1, rgba.2),
                    points: vec![(x, y)],
                });
            }
        }
    }
    if sets.is_empty() {
        return Err(EdaError::NoValidValues(hue.to_string()));
    }
    Ok(sets)
}

/// Grid shape for `n` panels: one row up to two, two columns up to four,
/// three columns beyond.
fn grid_layout(n: usize) -> (usize, usize) {
    let cols = match n {
        0..=2 => n.max(1),
        3..=4 => 2,
        _ => 3,
    };
    (n.div_ceil(cols).max(1), cols)
}
