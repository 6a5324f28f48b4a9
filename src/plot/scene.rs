//! In-memory canvas.
//!
//! `Scene` records every primitive call into plain data (figures → axes →
//! series). Renderers read a finished [`Figure`] back out.

use log::debug;

use crate::error::{Error, Result};
use crate::plot::canvas::{
    AxisId, Canvas, Color, ErrorBarSeries, FigureId, LineSeries, Series, TickLocators,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Axis {
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub color: Option<Color>,
    pub series: Vec<Series>,
    pub legend: bool,
    pub ticks: Option<TickLocators>,
    /// Index of the axis whose X scale this one shares.
    pub twin_of: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Figure {
    pub axes: Vec<Axis>,
}

impl Axis {
    /// Y range spanned by the series, error bars included.
    pub fn y_extent(&self) -> Option<(f64, f64)> {
        extent(self.series.iter().flat_map(Series::y_extent))
    }
}

impl Figure {
    /// X range shared by all axes, error bars included.
    pub fn x_extent(&self) -> Option<(f64, f64)> {
        extent(self.axes.iter().flat_map(|a| a.series.iter()).flat_map(Series::x_extent))
    }

    /// The first axis that is not a twin.
    pub fn primary(&self) -> Option<&Axis> {
        self.axes.iter().find(|a| a.twin_of.is_none())
    }

    /// Axes sharing the X scale of another axis, in creation order.
    pub fn twins(&self) -> impl Iterator<Item = &Axis> {
        self.axes.iter().filter(|a| a.twin_of.is_some())
    }
}

/// Finite min/max of `values`; a single value is widened to a unit-ish span.
fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    if max > min {
        Some((min, max))
    } else {
        let half = 0.5 * min.abs().max(1.0);
        Some((min - half, max + half))
    }
}

/// Widen `(min, max)` by `frac` of its span on both sides.
pub(crate) fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    figures: Vec<Figure>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn figure(&self, id: FigureId) -> Result<&Figure> {
        let len = self.figures.len();
        self.figures.get(id.0).ok_or(Error::IndexOutOfRange {
            what: "figures",
            index: id.0 as isize,
            len,
        })
    }

    pub fn axis(&self, id: AxisId) -> Result<&Axis> {
        let figure = self.figure(FigureId(id.figure))?;
        let len = figure.axes.len();
        figure.axes.get(id.index).ok_or(Error::IndexOutOfRange {
            what: "axes",
            index: id.index as isize,
            len,
        })
    }

    fn axis_mut(&mut self, id: AxisId) -> Result<&mut Axis> {
        let n_figures = self.figures.len();
        let figure = self.figures.get_mut(id.figure).ok_or(Error::IndexOutOfRange {
            what: "figures",
            index: id.figure as isize,
            len: n_figures,
        })?;
        let len = figure.axes.len();
        figure.axes.get_mut(id.index).ok_or(Error::IndexOutOfRange {
            what: "axes",
            index: id.index as isize,
            len,
        })
    }

    fn push_axis(&mut self, figure: FigureId, axis: Axis) -> Result<AxisId> {
        let n_figures = self.figures.len();
        let fig = self.figures.get_mut(figure.0).ok_or(Error::IndexOutOfRange {
            what: "figures",
            index: figure.0 as isize,
            len: n_figures,
        })?;
        fig.axes.push(axis);
        Ok(AxisId {
            figure: figure.0,
            index: fig.axes.len() - 1,
        })
    }
}

impl Canvas for Scene {
    fn create_figure(&mut self) -> FigureId {
        self.figures.push(Figure::default());
        debug!("created figure {}", self.figures.len() - 1);
        FigureId(self.figures.len() - 1)
    }

    fn create_axis(&mut self, figure: FigureId) -> Result<AxisId> {
        self.push_axis(figure, Axis::default())
    }

    fn twin_x(&mut self, axis: AxisId) -> Result<AxisId> {
        let x_label = self.axis(axis)?.x_label.clone();
        let twin = self.push_axis(
            axis.figure(),
            Axis {
                x_label,
                twin_of: Some(axis.index),
                ..Axis::default()
            },
        )?;
        debug!("figure {}: twin axis {} of axis {}", axis.figure, twin.index, axis.index);
        Ok(twin)
    }

    fn y_label(&self, axis: AxisId) -> Result<Option<&str>> {
        Ok(self.axis(axis)?.y_label.as_deref())
    }

    fn set_x_label(&mut self, axis: AxisId, label: &str) -> Result<()> {
        self.axis_mut(axis)?.x_label = Some(label.to_string());
        Ok(())
    }

    fn set_y_label(&mut self, axis: AxisId, label: &str) -> Result<()> {
        self.axis_mut(axis)?.y_label = Some(label.to_string());
        Ok(())
    }

    fn set_axis_color(&mut self, axis: AxisId, color: Color) -> Result<()> {
        self.axis_mut(axis)?.color = Some(color);
        Ok(())
    }

    fn line(&mut self, axis: AxisId, series: LineSeries) -> Result<()> {
        if series.x.len() != series.y.len() {
            return Err(Error::mismatch(format!(
                "line has {} x and {} y values",
                series.x.len(),
                series.y.len()
            )));
        }
        self.axis_mut(axis)?.series.push(Series::Line(series));
        Ok(())
    }

    fn error_bar(&mut self, axis: AxisId, series: ErrorBarSeries) -> Result<()> {
        let n = series.x.len();
        let aligned = series.y.len() == n
            && series.x_err.as_ref().is_none_or(|e| e.len() == n)
            && series.y_err.as_ref().is_none_or(|e| e.len() == n);
        if !aligned {
            return Err(Error::mismatch("error-bar series buffers differ in length"));
        }
        self.axis_mut(axis)?.series.push(Series::ErrorBar(series));
        Ok(())
    }

    fn legend(&mut self, axis: AxisId) -> Result<()> {
        self.axis_mut(axis)?.legend = true;
        Ok(())
    }

    fn set_tick_locators(&mut self, axis: AxisId, ticks: TickLocators) -> Result<()> {
        self.axis_mut(axis)?.ticks = Some(ticks);
        Ok(())
    }

    fn series_count(&self, figure: FigureId) -> Result<usize> {
        Ok(self.figure(figure)?.axes.iter().map(|a| a.series.len()).sum())
    }
}
