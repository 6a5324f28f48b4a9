//! SVG rendering of a recorded figure through Plotters.
//!
//! A twin axis becomes Plotters' secondary coordinate: it shares the X range
//! and gets its own Y range and right-hand axis description.

use std::path::Path;

use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{Error, Result};
use crate::plot::canvas::{self, ErrorBarSeries, Series, TickLocators};
use crate::plot::scene::{Axis, Figure, pad_range};

/// Pixel size of the rendered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgSize {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgSize {
    fn default() -> Self {
        Self {
            width: 960,
            height: 600,
        }
    }
}

/// Render `figure` to an SVG document.
pub fn render_svg(figure: &Figure, size: SvgSize) -> Result<String> {
    let primary = figure
        .primary()
        .ok_or_else(|| Error::Render("figure has no axes".to_string()))?;
    let mut twins = figure.twins();
    let secondary = twins.next();
    if twins.next().is_some() {
        return Err(Error::Render("only two Y scales can be drawn".to_string()));
    }

    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, (size.width, size.height)).into_drawing_area();
        draw_figure(&root, figure, primary, secondary).map_err(|e| Error::Render(e.to_string()))?;
        root.present().map_err(|e| Error::Render(e.to_string()))?;
    }
    Ok(buf)
}

/// Render `figure` and write it to `path`.
pub fn write_svg(figure: &Figure, size: SvgSize, path: &Path) -> Result<()> {
    let svg = render_svg(figure, size)?;
    std::fs::write(path, svg).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("wrote {}", path.display());
    Ok(())
}

fn rgb(color: canvas::Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn y_range(axis: &Axis) -> (f64, f64) {
    let (lo, hi) = axis.y_extent().unwrap_or((0.0, 1.0));
    pad_range(lo, hi, 0.05)
}

/// Draw every series of `$axis` with `$chart.$draw(..)`; sets `$labeled` when a
/// legend entry was attached.
macro_rules! draw_axis {
    ($chart:ident, $draw:ident, $axis:expr, $labeled:ident) => {
        for series in &$axis.series {
            let color = rgb(series.color());
            let style = series.style();
            let mut label = series.label().filter(|_| $axis.legend).map(str::to_string);
            if let Series::ErrorBar(bars) = series {
                $chart.$draw(
                    whiskers(bars)
                        .into_iter()
                        .map(|segment| PathElement::new(segment, color.stroke_width(1))),
                )?;
            }
            if style.has_line() {
                let anno = $chart.$draw(LineSeries::new(points(series), color.stroke_width(2)))?;
                if let Some(label) = label.take() {
                    anno.label(label)
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
                    $labeled = true;
                }
            }
            if style.has_markers() {
                let anno = $chart.$draw(points(series).map(|p| Circle::new(p, 3, color.filled())))?;
                if let Some(label) = label.take() {
                    anno.label(label)
                        .legend(move |(x, y)| Circle::new((x + 10, y), 3, color.filled()));
                    $labeled = true;
                }
            }
        }
    };
}

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    primary: &Axis,
    secondary: Option<&Axis>,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let (x0, x1) = figure.x_extent().unwrap_or((0.0, 1.0));
    let (x0, x1) = pad_range(x0, x1, 0.02);
    let (y0, y1) = y_range(primary);
    let (s0, s1) = secondary.map_or((y0, y1), y_range);

    let mut builder = ChartBuilder::on(root);
    builder.margin(12).x_label_area_size(40).y_label_area_size(64);
    if secondary.is_some() {
        builder.right_y_label_area_size(64);
    }
    let mut chart = builder
        .build_cartesian_2d(x0..x1, y0..y1)?
        .set_secondary_coord(x0..x1, s0..s1);

    // Tick density: `*_labels` is the major count, light lines split each interval.
    let ticks = primary.ticks.unwrap_or_default();
    let desc_color = primary.color.map_or(BLACK, rgb);
    chart
        .configure_mesh()
        .x_desc(primary.x_label.as_deref().unwrap_or(""))
        .y_desc(primary.y_label.as_deref().unwrap_or(""))
        .x_labels(ticks.major)
        .y_labels(ticks.major)
        .x_max_light_lines(ticks.minor)
        .y_max_light_lines(ticks.minor)
        .axis_desc_style(("sans-serif", 15).into_font().color(&desc_color))
        .label_style(("sans-serif", 12).into_font())
        .draw()?;

    if let Some(axis) = secondary {
        let TickLocators { major, .. } = axis.ticks.unwrap_or_default();
        let desc_color = axis.color.map_or(BLACK, rgb);
        chart
            .configure_secondary_axes()
            .y_desc(axis.y_label.as_deref().unwrap_or(""))
            .y_labels(major)
            .axis_desc_style(("sans-serif", 15).into_font().color(&desc_color))
            .label_style(("sans-serif", 12).into_font().color(&desc_color))
            .draw()?;
    }

    let mut labeled = false;
    draw_axis!(chart, draw_series, primary, labeled);
    if let Some(axis) = secondary {
        draw_axis!(chart, draw_secondary_series, axis, labeled);
    }

    if labeled {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }
    Ok(())
}

fn points(series: &Series) -> impl Iterator<Item = (f64, f64)> + '_ {
    series
        .x()
        .iter()
        .copied()
        .zip(series.y().iter().copied())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
}

/// Vertical and horizontal whiskers of an error-bar series.
fn whiskers(bars: &ErrorBarSeries) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    for (i, (&x, &y)) in bars.x.iter().zip(&bars.y).enumerate() {
        if let Some(e) = bars.y_err.as_ref().map(|e| e[i].abs()) {
            out.push(vec![(x, y - e), (x, y + e)]);
        }
        if let Some(e) = bars.x_err.as_ref().map(|e| e[i].abs()) {
            out.push(vec![(x - e, y), (x + e, y)]);
        }
    }
    out.retain(|seg| seg.iter().all(|(a, b)| a.is_finite() && b.is_finite()));
    out
}
