//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - markers: `o`, `x`, `+`, ... (one glyph per series, in draw order)
//! - lines: `-` on the primary axis, `.` on the secondary axis
//! - vertical error bars: `|`

use crate::error::{Error, Result};
use crate::plot::canvas::Series;
use crate::plot::scene::{Axis, Figure, pad_range};

const MARKERS: [char; 6] = ['o', 'x', '+', '*', '#', '@'];

struct Layer<'a> {
    axis: &'a Axis,
    line: char,
    y_range: (f64, f64),
}

/// Render a recorded figure onto a `width × height` character grid.
pub fn render_ascii(figure: &Figure, width: usize, height: usize) -> Result<String> {
    let width = width.max(10);
    let height = height.max(5);

    let primary = figure
        .primary()
        .ok_or_else(|| Error::Render("figure has no axes".to_string()))?;
    let mut twins = figure.twins();
    let secondary = twins.next();
    if twins.next().is_some() {
        return Err(Error::Render("only two Y scales can be drawn".to_string()));
    }

    let (x_min, x_max) = figure.x_extent().unwrap_or((0.0, 1.0));

    let mut layers = vec![Layer {
        axis: primary,
        line: '-',
        y_range: y_range(primary),
    }];
    if let Some(axis) = secondary {
        layers.push(Layer {
            axis,
            line: '.',
            y_range: y_range(axis),
        });
    }

    let mut grid = vec![vec![' '; width]; height];
    let to_cell = |x: f64, y: f64, (y_min, y_max): (f64, f64)| {
        (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height))
    };

    // Lines first, then error bars, then markers on top.
    for layer in &layers {
        for series in layer.axis.series.iter().filter(|s| s.style().has_line()) {
            let mut prev = None;
            for (&x, &y) in series.x().iter().zip(series.y()) {
                if !(x.is_finite() && y.is_finite()) {
                    prev = None;
                    continue;
                }
                let (cx, cy) = to_cell(x, y, layer.y_range);
                match prev {
                    Some((x0, y0)) => draw_line(&mut grid, x0, y0, cx, cy, layer.line),
                    None => put(&mut grid, cx, cy, layer.line),
                }
                prev = Some((cx, cy));
            }
        }
    }
    for layer in &layers {
        for series in &layer.axis.series {
            let Series::ErrorBar(bars) = series else { continue };
            let Some(y_err) = &bars.y_err else { continue };
            for ((&x, &y), &e) in bars.x.iter().zip(&bars.y).zip(y_err) {
                if !(x.is_finite() && y.is_finite() && e.is_finite()) {
                    continue;
                }
                let (cx, top) = to_cell(x, y + e.abs(), layer.y_range);
                let (_, bottom) = to_cell(x, y - e.abs(), layer.y_range);
                draw_line(&mut grid, cx, top, cx, bottom, '|');
            }
        }
    }

    let mut legend = Vec::new();
    let mut index = 0;
    for layer in &layers {
        for series in &layer.axis.series {
            let glyph = if series.style().has_markers() {
                MARKERS[index % MARKERS.len()]
            } else {
                layer.line
            };
            index += 1;
            if series.style().has_markers() {
                for (&x, &y) in series.x().iter().zip(series.y()) {
                    if x.is_finite() && y.is_finite() {
                        let (cx, cy) = to_cell(x, y, layer.y_range);
                        grid[cy][cx] = glyph;
                    }
                }
            }
            if let (true, Some(label)) = (layer.axis.legend, series.label()) {
                legend.push(format!("  {glyph} {label}"));
            }
        }
    }

    // Header with ranges, grid, then legend entries.
    let mut out = String::new();
    let x_name = primary.x_label.as_deref().unwrap_or("x");
    out.push_str(&format!("Plot: {x_name}=[{x_min:.3}, {x_max:.3}]"));
    for (layer, default) in layers.iter().zip(["y", "y2"]) {
        let (y_min, y_max) = layer.y_range;
        let y_name = layer.axis.y_label.as_deref().unwrap_or(default);
        out.push_str(&format!(" | {y_name}=[{y_min:.2}, {y_max:.2}]"));
    }
    out.push('\n');

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    for entry in legend {
        out.push_str(&entry);
        out.push('\n');
    }

    Ok(out)
}

fn y_range(axis: &Axis) -> (f64, f64) {
    let (lo, hi) = axis.y_extent().unwrap_or((0.0, 1.0));
    pad_range(lo, hi, 0.05)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn put(grid: &mut [Vec<char>], x: usize, y: usize, ch: char) {
    if grid[y][x] == ' ' {
        grid[y][x] = ch;
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            put(grid, x0 as usize, y0 as usize, ch);
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
