//! Drawing primitives consumed by plot sessions.
//!
//! A [`Canvas`] owns figures and their axes; callers only hold ids. Sessions
//! never keep references into the canvas, so several sessions can extend
//! the same figure one after another.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FigureId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisId {
    pub(crate) figure: usize,
    pub(crate) index: usize,
}

impl AxisId {
    pub fn figure(self) -> FigureId {
        FigureId(self.figure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Default color cycle (the "tab10" palette).
    pub const CYCLE: [Color; 10] = [
        Color::rgb(0x1f, 0x77, 0xb4),
        Color::rgb(0xff, 0x7f, 0x0e),
        Color::rgb(0x2c, 0xa0, 0x2c),
        Color::rgb(0xd6, 0x27, 0x28),
        Color::rgb(0x94, 0x67, 0xbd),
        Color::rgb(0x8c, 0x56, 0x4b),
        Color::rgb(0xe3, 0x77, 0xc2),
        Color::rgb(0x7f, 0x7f, 0x7f),
        Color::rgb(0xbc, 0xbd, 0x22),
        Color::rgb(0x17, 0xbe, 0xcf),
    ];

    pub fn cycle(n: usize) -> Color {
        Self::CYCLE[n % Self::CYCLE.len()]
    }

    /// Parse `#rrggbb` (leading `#` optional).
    pub fn from_hex(s: &str) -> Result<Color> {
        let hex = s.trim().trim_start_matches('#');
        let parsed = (hex.len() == 6)
            .then(|| u32::from_str_radix(hex, 16).ok())
            .flatten()
            .ok_or_else(|| Error::invalid(format!("`{s}` is not a #rrggbb color")))?;
        Ok(Color::rgb((parsed >> 16) as u8, (parsed >> 8) as u8, parsed as u8))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Line,
    Markers,
    LineMarkers,
}

impl LineStyle {
    pub fn has_line(self) -> bool {
        matches!(self, LineStyle::Line | LineStyle::LineMarkers)
    }

    pub fn has_markers(self) -> bool {
        matches!(self, LineStyle::Markers | LineStyle::LineMarkers)
    }
}

/// A plain line/marker series.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub label: Option<String>,
    pub color: Color,
    pub style: LineStyle,
}

/// A series with horizontal and/or vertical error bars.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBarSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub x_err: Option<Vec<f64>>,
    pub y_err: Option<Vec<f64>>,
    pub label: Option<String>,
    pub color: Color,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Line(LineSeries),
    ErrorBar(ErrorBarSeries),
}

impl Series {
    pub fn x(&self) -> &[f64] {
        match self {
            Series::Line(s) => &s.x,
            Series::ErrorBar(s) => &s.x,
        }
    }

    pub fn y(&self) -> &[f64] {
        match self {
            Series::Line(s) => &s.y,
            Series::ErrorBar(s) => &s.y,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Series::Line(s) => s.label.as_deref(),
            Series::ErrorBar(s) => s.label.as_deref(),
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Series::Line(s) => s.color,
            Series::ErrorBar(s) => s.color,
        }
    }

    pub fn style(&self) -> LineStyle {
        match self {
            Series::Line(s) => s.style,
            Series::ErrorBar(s) => s.style,
        }
    }

    /// X extent including error bars.
    pub fn x_extent(&self) -> impl Iterator<Item = f64> + '_ {
        let err = match self {
            Series::ErrorBar(s) => s.x_err.as_deref(),
            Series::Line(_) => None,
        };
        spread(self.x(), err)
    }

    /// Y extent including error bars.
    pub fn y_extent(&self) -> impl Iterator<Item = f64> + '_ {
        let err = match self {
            Series::ErrorBar(s) => s.y_err.as_deref(),
            Series::Line(_) => None,
        };
        spread(self.y(), err)
    }
}

fn spread<'a>(values: &'a [f64], err: Option<&'a [f64]>) -> impl Iterator<Item = f64> + 'a {
    values.iter().enumerate().flat_map(move |(i, &v)| {
        let e = err.map_or(0.0, |e| e[i].abs());
        [v - e, v + e]
    })
}

/// Major/minor tick density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickLocators {
    /// Approximate number of major ticks.
    pub major: usize,
    /// Minor ticks per major interval.
    pub minor: usize,
}

impl Default for TickLocators {
    fn default() -> Self {
        Self { major: 5, minor: 4 }
    }
}

/// Figure/axis canvas with primitive draw operations.
pub trait Canvas {
    fn create_figure(&mut self) -> FigureId;

    /// Primary axis of a figure.
    fn create_axis(&mut self, figure: FigureId) -> Result<AxisId>;

    /// Second Y scale sharing the X scale of `axis`.
    fn twin_x(&mut self, axis: AxisId) -> Result<AxisId>;

    fn y_label(&self, axis: AxisId) -> Result<Option<&str>>;

    fn set_x_label(&mut self, axis: AxisId, label: &str) -> Result<()>;

    fn set_y_label(&mut self, axis: AxisId, label: &str) -> Result<()>;

    /// Color of the axis description (used to tell twin scales apart).
    fn set_axis_color(&mut self, axis: AxisId, color: Color) -> Result<()>;

    fn line(&mut self, axis: AxisId, series: LineSeries) -> Result<()>;

    fn error_bar(&mut self, axis: AxisId, series: ErrorBarSeries) -> Result<()>;

    fn legend(&mut self, axis: AxisId) -> Result<()>;

    fn set_tick_locators(&mut self, axis: AxisId, ticks: TickLocators) -> Result<()>;

    /// Number of series drawn on all axes of `figure` (drives the color cycle).
    fn series_count(&self, figure: FigureId) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let c = Color::from_hex("#1f77b4").unwrap();
        assert_eq!(c, Color::CYCLE[0]);
        assert_eq!(c.to_hex(), "#1f77b4");
        assert!(Color::from_hex("blue").is_err());
    }

    #[test]
    fn extent_includes_error_bars() {
        let s = Series::ErrorBar(ErrorBarSeries {
            x: vec![1.0, 2.0],
            y: vec![10.0, 20.0],
            x_err: None,
            y_err: Some(vec![1.0, 2.0]),
            label: None,
            color: Color::cycle(0),
            style: LineStyle::Markers,
        });
        let ys: Vec<f64> = s.y_extent().collect();
        assert_eq!(ys, vec![9.0, 11.0, 18.0, 22.0]);
        let xs: Vec<f64> = s.x_extent().collect();
        assert_eq!(xs, vec![1.0, 1.0, 2.0, 2.0]);
    }
}
