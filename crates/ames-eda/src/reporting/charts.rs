//! Static chart rendering with the [`plotters`] bitmap backend.
//!
//! Every chart is written as a PNG with a caption strip along the bottom.
//! Renderers take plain data (points, groups, matrices) and know nothing
//! about tables; [`super::figures`] prepares the data.

use crate::error::{EdaError, Result};
use crate::profiler::statistics::{
    BoxStats, CorrelationMatrix, box_stats, density_histogram, gaussian_kde, linear_fit,
    probability_plot,
};
use crate::types::MissingReport;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::Path;

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;
type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const FONT: &str = "sans-serif";
const CAPTION_HEIGHT: u32 = 44;
/// Category count above which axis labels are drawn vertically.
const ROTATE_LABELS_ABOVE: usize = 12;
const KDE_POINTS: usize = 200;
/// Half the width of a box, in category units.
const BOX_HALF_WIDTH: f64 = 0.3;

pub const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);
pub const BROWN: RGBColor = RGBColor(165, 42, 42);
pub const CRIMSON: RGBColor = RGBColor(220, 20, 60);
pub const OLIVE: RGBColor = RGBColor(128, 128, 0);
pub const ORANGE: RGBColor = RGBColor(255, 165, 0);
pub const DARK_GREEN: RGBColor = RGBColor(0, 128, 0);
pub const KHAKI: RGBColor = RGBColor(189, 183, 107);
pub const INDIAN_RED: RGBColor = RGBColor(205, 92, 92);

/// One set of points drawn in a single colour.
#[derive(Debug, Clone)]
pub struct PointSet {
    /// Legend entry; `None` draws no legend.
    pub label: Option<String>,
    pub color: RGBColor,
    pub points: Vec<(f64, f64)>,
}

/// A scatter plot, optionally with a least-squares line (regression plot).
#[derive(Debug, Clone)]
pub struct ScatterPanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub sets: Vec<PointSet>,
    pub fit_line: bool,
}

/// Box plots of one value per category.
#[derive(Debug, Clone)]
pub struct BoxPanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// `(category, values)` in display order.
    pub groups: Vec<(String, Vec<f64>)>,
    /// Single fill colour; `None` picks one colour per category.
    pub color: Option<RGBColor>,
}

/// Create the PNG, draw into the area above the caption strip, save.
fn render<F>(path: &Path, size: (u32, u32), caption: &str, draw: F) -> Result<()>
where
    F: FnOnce(&Area) -> DrawResult<()>,
{
    let outcome: DrawResult<()> = (|| {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        let (body, footer) = root.split_vertically(size.1 - CAPTION_HEIGHT);
        draw(&body)?;
        footer.titled(caption, (FONT, 20))?;
        root.present()?;
        Ok(())
    })();

    outcome.map_err(|e| EdaError::PlotFailed {
        figure: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Histogram with density curve, normal probability plot and box plot.
pub fn normality_panel(path: &Path, caption: &str, column: &str, values: &[f64]) -> Result<()> {
    render(path, (1200, 844), caption, |area| {
        let (left, right) = area.split_horizontally(800);
        let (upper, lower) = left.split_vertically(400);
        draw_histogram(&upper, column, values)?;
        draw_probability_plot(&lower, values)?;
        draw_boxes(
            &right,
            &BoxPanel {
                title: "Box Plot".to_string(),
                x_label: String::new(),
                y_label: column.to_string(),
                groups: vec![(column.to_string(), values.to_vec())],
                color: Some(STEEL_BLUE),
            },
        )
    })
}

/// Scatter panels side by side.
pub fn scatter_row(path: &Path, caption: &str, panels: &[ScatterPanel]) -> Result<()> {
    let width = 500 * panels.len().max(1) as u32;
    render(path, (width, 544), caption, |area| {
        for (panel, cell) in panels.iter().zip(area.split_evenly((1, panels.len().max(1)))) {
            draw_scatter(&cell, panel)?;
        }
        Ok(())
    })
}

/// A single scatter or regression plot.
pub fn scatter(path: &Path, caption: &str, panel: &ScatterPanel) -> Result<()> {
    render(path, (1200, 744), caption, |area| draw_scatter(area, panel))
}

/// A single box-plot chart.
pub fn box_chart(path: &Path, caption: &str, panel: &BoxPanel) -> Result<()> {
    render(path, (1200, 744), caption, |area| draw_boxes(area, panel))
}

/// Box-plot charts in a grid of `rows x cols` cells, filled row by row.
pub fn box_grid(path: &Path, caption: &str, (rows, cols): (usize, usize), panels: &[BoxPanel]) -> Result<()> {
    let size = (500 * cols as u32, 420 * rows as u32 + CAPTION_HEIGHT);
    render(path, size, caption, |area| {
        for (panel, cell) in panels.iter().zip(area.split_evenly((rows, cols))) {
            draw_boxes(&cell, panel)?;
        }
        Ok(())
    })
}

/// Bar chart of missing percentages, one bar per reported column.
pub fn missing_bars(path: &Path, caption: &str, report: &MissingReport) -> Result<()> {
    render(path, (1500, 744), caption, |area| {
        let labels: Vec<String> = report.rows.iter().map(|r| r.variable.clone()).collect();
        let top = report
            .rows
            .iter()
            .map(|r| r.percent)
            .fold(0.0, f64::max)
            .max(1.0)
            * 1.15;

        let mut chart = ChartBuilder::on(area)
            .caption("Percentage of Missing Values by Variable", (FONT, 26))
            .margin(15)
            .x_label_area_size(110)
            .y_label_area_size(60)
            .build_cartesian_2d(category_range(labels.len()), 0.0..top)?;

        let x_fmt = |x: &f64| category_label(&labels, *x);
        let y_fmt = |y: &f64| format!("{:.0}%", y);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len() + 1)
            .x_label_formatter(&x_fmt)
            .x_label_style(category_label_style(labels.len()))
            .y_label_formatter(&y_fmt)
            .x_desc("Variable")
            .y_desc("Percent")
            .draw()?;

        chart.draw_series(report.rows.iter().enumerate().map(|(i, row)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, row.percent)], Palette99::pick(i).filled())
        }))?;

        let annotation = (FONT, 13)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart.draw_series(report.rows.iter().enumerate().map(|(i, row)| {
            Text::new(
                format!("{:.2}", row.percent),
                (i as f64, row.percent),
                annotation.clone(),
            )
        }))?;
        Ok(())
    })
}

/// Lower-triangle correlation heatmap with annotated coefficients.
pub fn heatmap(path: &Path, caption: &str, title: &str, matrix: &CorrelationMatrix) -> Result<()> {
    render(path, (1000, 1044), caption, |area| {
        let k = matrix.len();
        let labels = matrix.columns.clone();
        // rows are drawn top-down, so the y axis reads the labels reversed
        let reversed: Vec<String> = labels.iter().rev().cloned().collect();

        let mut chart = ChartBuilder::on(area)
            .caption(title, (FONT, 24))
            .margin(15)
            .x_label_area_size(110)
            .y_label_area_size(110)
            .build_cartesian_2d(category_range(k), category_range(k))?;

        let x_fmt = |x: &f64| category_label(&labels, *x);
        let y_fmt = |y: &f64| category_label(&reversed, *y);
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(k + 1)
            .y_labels(k + 1)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .x_label_style((FONT, 13).into_font().transform(FontTransform::Rotate90))
            .y_label_style((FONT, 13))
            .draw()?;

        let cells: Vec<(f64, f64, f64)> = (0..k)
            .flat_map(|i| (0..i).map(move |j| (i, j)))
            .map(|(i, j)| (j as f64, (k - 1 - i) as f64, matrix.get(i, j)))
            .collect();

        chart.draw_series(cells.iter().map(|&(x, y, r)| {
            Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], diverging(r).filled())
        }))?;

        let annotation = (FONT, 13)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(cells.iter().filter(|c| !c.2.is_nan()).map(|&(x, y, r)| {
            Text::new(format!("{:.2}", r), (x, y), annotation.clone())
        }))?;
        Ok(())
    })
}

fn draw_histogram(area: &Area, column: &str, values: &[f64]) -> DrawResult<()> {
    let bins = density_histogram(values);
    let x_range = padded_range(values.iter().copied());
    let grid: Vec<f64> = (0..KDE_POINTS)
        .map(|i| x_range.start + (x_range.end - x_range.start) * i as f64 / (KDE_POINTS - 1) as f64)
        .collect();
    let density = gaussian_kde(values, &grid);
    let top = bins
        .iter()
        .map(|b| b.density)
        .chain(density.iter().copied())
        .fold(0.0, f64::max)
        .max(f64::MIN_POSITIVE)
        * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption("Histogram", (FONT, 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, 0.0..top)?;
    chart
        .configure_mesh()
        .x_desc(column)
        .y_desc("Density")
        .label_style((FONT, 13))
        .draw()?;

    chart.draw_series(
        bins.iter()
            .map(|b| Rectangle::new([(b.start, 0.0), (b.end, b.density)], STEEL_BLUE.mix(0.45).filled())),
    )?;
    if !density.is_empty() {
        chart.draw_series(LineSeries::new(
            grid.into_iter().zip(density),
            STEEL_BLUE.stroke_width(2),
        ))?;
    }
    Ok(())
}

fn draw_probability_plot(area: &Area, values: &[f64]) -> DrawResult<()> {
    let Some(plot) = probability_plot(values) else {
        return Ok(());
    };
    let x_range = padded_range(plot.theoretical.iter().copied());
    let y_range = padded_range(plot.ordered.iter().copied());

    let mut chart = ChartBuilder::on(area)
        .caption("Probability Plot", (FONT, 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range.clone(), y_range)?;
    chart
        .configure_mesh()
        .x_desc("Theoretical quantiles")
        .y_desc("Ordered Values")
        .label_style((FONT, 13))
        .draw()?;

    chart.draw_series(
        plot.theoretical
            .iter()
            .zip(&plot.ordered)
            .map(|(x, y)| Circle::new((*x, *y), 3, STEEL_BLUE.filled())),
    )?;
    let line = [x_range.start, x_range.end].map(|x| (x, plot.slope * x + plot.intercept));
    chart.draw_series(LineSeries::new(line, RED.stroke_width(2)))?;
    Ok(())
}

fn draw_scatter(area: &Area, panel: &ScatterPanel) -> DrawResult<()> {
    let all: Vec<(f64, f64)> = panel.sets.iter().flat_map(|s| s.points.iter().copied()).collect();
    let x_range = padded_range(all.iter().map(|p| p.0));
    let y_range = padded_range(all.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, (FONT, 22))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(75)
        .build_cartesian_2d(x_range.clone(), y_range)?;
    chart
        .configure_mesh()
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.y_label.as_str())
        .label_style((FONT, 13))
        .draw()?;

    let mut has_legend = false;
    for set in &panel.sets {
        let color = set.color;
        let drawn = chart.draw_series(
            set.points
                .iter()
                .map(move |p| Circle::new(*p, 3, color.mix(0.7).filled())),
        )?;
        if let Some(label) = &set.label {
            drawn
                .label(label.as_str())
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
            has_legend = true;
        }
    }

    if panel.fit_line
        && let Some((slope, intercept)) = linear_fit(&all)
    {
        let color = panel.sets.first().map(|s| s.color).unwrap_or(STEEL_BLUE);
        let line = [x_range.start, x_range.end].map(|x| (x, slope * x + intercept));
        chart.draw_series(LineSeries::new(line, color.stroke_width(3)))?;
    }

    if has_legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .label_font((FONT, 13))
            .draw()?;
    }
    Ok(())
}

fn draw_boxes(area: &Area, panel: &BoxPanel) -> DrawResult<()> {
    let labels: Vec<String> = panel.groups.iter().map(|g| g.0.clone()).collect();
    let stats: Vec<(f64, BoxStats, RGBColor)> = panel
        .groups
        .iter()
        .enumerate()
        .filter_map(|(i, (_, values))| {
            let color = panel.color.unwrap_or_else(|| {
                let c = Palette99::pick(i).to_rgba();
                RGBColor(c.0, c.1, c.2)
            });
            box_stats(values).map(|s| (i as f64, s, color))
        })
        .collect();
    let y_range = padded_range(panel.groups.iter().flat_map(|g| g.1.iter().copied()));

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, (FONT, 22))
        .margin(12)
        .x_label_area_size(if labels.len() > ROTATE_LABELS_ABOVE { 90 } else { 45 })
        .y_label_area_size(75)
        .build_cartesian_2d(category_range(labels.len()), y_range)?;

    let x_fmt = |x: &f64| category_label(&labels, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len() + 1)
        .x_label_formatter(&x_fmt)
        .x_label_style(category_label_style(labels.len()))
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.y_label.as_str())
        .draw()?;

    chart.draw_series(stats.iter().map(|(x, s, color)| {
        Rectangle::new([(x - BOX_HALF_WIDTH, s.q1), (x + BOX_HALF_WIDTH, s.q3)], color.mix(0.8).filled())
    }))?;
    chart.draw_series(stats.iter().map(|(x, s, _)| {
        Rectangle::new([(x - BOX_HALF_WIDTH, s.q1), (x + BOX_HALF_WIDTH, s.q3)], BLACK.stroke_width(1))
    }))?;

    let strokes: Vec<Vec<(f64, f64)>> = stats
        .iter()
        .flat_map(|(x, s, _)| {
            let x = *x;
            [
                vec![(x - BOX_HALF_WIDTH, s.median), (x + BOX_HALF_WIDTH, s.median)],
                vec![(x, s.q3), (x, s.whisker_high)],
                vec![(x, s.q1), (x, s.whisker_low)],
                vec![(x - BOX_HALF_WIDTH / 2.0, s.whisker_high), (x + BOX_HALF_WIDTH / 2.0, s.whisker_high)],
                vec![(x - BOX_HALF_WIDTH / 2.0, s.whisker_low), (x + BOX_HALF_WIDTH / 2.0, s.whisker_low)],
            ]
        })
        .collect();
    chart.draw_series(strokes.into_iter().map(|p| PathElement::new(p, BLACK.stroke_width(1))))?;

    chart.draw_series(stats.iter().flat_map(|(x, s, _)| {
        s.outliers
            .iter()
            .map(move |v| Circle::new((*x, *v), 3, BLACK.stroke_width(1)))
    }))?;
    Ok(())
}

/// Axis range placing categories `0..n` at integer positions.
fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Label for an axis position: the category at an integer position, else blank.
fn category_label(labels: &[String], position: f64) -> String {
    let index = position.round();
    if (position - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

fn category_label_style(n: usize) -> TextStyle<'static> {
    if n > ROTATE_LABELS_ABOVE {
        (FONT, 12).into_font().transform(FontTransform::Rotate90).into()
    } else {
        (FONT, 13).into_font().into()
    }
}

/// Value range with 5% padding on both sides; never empty.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

/// Blue-white-red colour for a coefficient in `[-1, 1]`.
fn diverging(r: f64) -> RGBColor {
    if r.is_nan() {
        return RGBColor(220, 220, 220);
    }
    let t = r.abs().min(1.0);
    let (end_r, end_g, end_b) = if r < 0.0 { (59.0, 76.0, 192.0) } else { (180.0, 4.0, 38.0) };
    let lerp = |end: f64| (247.0 + (end - 247.0) * t).round() as u8;
    RGBColor(lerp(end_r), lerp(end_g), lerp(end_b))
}
