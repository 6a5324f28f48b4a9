//! One curve on a (possibly shared) figure.
//!
//! A [`PlotSession`] pairs a parameter with a measurement and draws them once
//! onto a [`Canvas`]. Chaining works by passing the [`CanvasHandle`] returned
//! by one draw into the next session:
//!
//! - no handle: a fresh figure with one axis
//! - same Y label as the primary axis (or an unlabeled primary): overlay
//! - a different label: a twin axis, allocated the first time only
//! - a third distinct label: [`Error::AxisConflict`]

use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::{FitResult, Kind, Variable};
use crate::error::{Error, Result};
use crate::fit::{FitEngine, FitOptions, LevenbergMarquardt};
use crate::models::FitRegistry;
use crate::plot::canvas::{
    AxisId, Canvas, Color, ErrorBarSeries, FigureId, LineSeries, LineStyle, TickLocators,
};

/// Samples used to draw a fitted curve across the data's X range.
const FIT_SAMPLES: usize = 200;

/// Figure plus its primary and optional secondary Y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasHandle {
    pub figure: FigureId,
    pub primary: AxisId,
    pub secondary: Option<AxisId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawOptions {
    /// Curve color; the figure's color cycle when unset.
    pub color: Option<Color>,
    /// Markers for error-bar series, a line otherwise, when unset.
    pub style: Option<LineStyle>,
    /// Guess, sigma and bounds forwarded to the fit.
    pub fit: FitOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawOutput {
    pub handle: CanvasHandle,
    /// Axis the curve landed on.
    pub axis: AxisId,
    pub fit: Option<FitResult>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Unrendered,
    Rendered(CanvasHandle),
}

#[derive(Debug, Clone)]
pub struct PlotSession<'a> {
    parameter: &'a Variable,
    measurement: &'a Variable,
    previous: Option<CanvasHandle>,
    registry: &'a FitRegistry,
    state: State,
}

impl<'a> PlotSession<'a> {
    pub fn new(parameter: &'a Variable, measurement: &'a Variable, previous: Option<CanvasHandle>) -> Result<Self> {
        if parameter.kind() != Kind::Parameter {
            return Err(Error::invalid(format!(
                "`{}` is a {}, expected a parameter",
                parameter.name(),
                parameter.kind().display_name()
            )));
        }
        if measurement.kind() != Kind::Measurement {
            return Err(Error::invalid(format!(
                "`{}` is a {}, expected a measurement",
                measurement.name(),
                measurement.kind().display_name()
            )));
        }
        if parameter.len() != measurement.len() {
            return Err(Error::mismatch(format!(
                "`{}` has {} points but `{}` has {}",
                parameter.name(),
                parameter.len(),
                measurement.name(),
                measurement.len()
            )));
        }
        Ok(Self {
            parameter,
            measurement,
            previous,
            registry: FitRegistry::builtin(),
            state: State::Unrendered,
        })
    }

    /// Resolve fit names against `registry` instead of the built-in catalog.
    pub fn with_registry(mut self, registry: &'a FitRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Chain onto `previous` instead of the handle given at construction.
    ///
    /// Has no effect once the session is rendered.
    pub fn with_previous(mut self, previous: Option<CanvasHandle>) -> Self {
        self.previous = previous;
        self
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self.state, State::Rendered(_))
    }

    /// Handle to chain the next session onto, once drawn.
    pub fn handle(&self) -> Option<CanvasHandle> {
        match self.state {
            State::Rendered(handle) => Some(handle),
            State::Unrendered => None,
        }
    }

    /// Draw the curve (and the fitted curve when `fit` names a function).
    ///
    /// The fit and the axis choice both happen before anything is drawn, so
    /// a failure leaves the canvas untouched. Drawing again reuses the same
    /// figure and axis and draws the curve a second time.
    pub fn draw<C>(&mut self, canvas: &mut C, fit: Option<&str>, opts: &DrawOptions) -> Result<DrawOutput>
    where
        C: Canvas + ?Sized,
    {
        let x = self.parameter.data();
        let y = self.measurement.data();

        let fitted = match fit {
            Some(name) => {
                let function = self.registry.resolve(name)?;
                let result = FitEngine::<LevenbergMarquardt>::default().fit(function, x, y, &opts.fit)?;
                Some((function, result))
            }
            None => None,
        };

        let base = match self.state {
            State::Rendered(handle) => Some(handle),
            State::Unrendered => self.previous,
        };
        let (handle, axis) = acquire_axis(canvas, base, &self.measurement.axis_label())?;
        canvas.set_x_label(handle.primary, &self.parameter.axis_label())?;

        let color = match opts.color {
            Some(color) => color,
            None => Color::cycle(canvas.series_count(handle.figure)?),
        };
        if Some(axis) == handle.secondary {
            canvas.set_axis_color(axis, color)?;
        }

        let label = self.measurement.label().map(str::to_string);
        let has_label = label.is_some();
        let x_err = self.parameter.err().map(<[f64]>::to_vec);
        let y_err = self.measurement.err().map(<[f64]>::to_vec);
        if x_err.is_some() || y_err.is_some() {
            canvas.error_bar(
                axis,
                ErrorBarSeries {
                    x: x.to_vec(),
                    y: y.to_vec(),
                    x_err,
                    y_err,
                    label,
                    color,
                    style: opts.style.unwrap_or(LineStyle::Markers),
                },
            )?;
        } else {
            canvas.line(
                axis,
                LineSeries {
                    x: x.to_vec(),
                    y: y.to_vec(),
                    label,
                    color,
                    style: opts.style.unwrap_or(LineStyle::Line),
                },
            )?;
        }

        if let Some((function, result)) = &fitted {
            let xs = domain_samples(x);
            let ys = function.eval_all(&xs, &result.params);
            canvas.line(
                axis,
                LineSeries {
                    x: xs,
                    y: ys,
                    label: Some(format!("{} fit", result.function)),
                    color: Color::cycle(canvas.series_count(handle.figure)?),
                    style: LineStyle::Line,
                },
            )?;
        }
        if fitted.is_some() || has_label {
            canvas.legend(axis)?;
        }

        canvas.set_tick_locators(handle.primary, TickLocators::default())?;
        if let Some(secondary) = handle.secondary {
            canvas.set_tick_locators(secondary, TickLocators::default())?;
        }

        self.state = State::Rendered(handle);
        Ok(DrawOutput {
            handle,
            axis,
            fit: fitted.map(|(_, result)| result),
        })
    }
}

fn acquire_axis<C>(canvas: &mut C, base: Option<CanvasHandle>, y_label: &str) -> Result<(CanvasHandle, AxisId)>
where
    C: Canvas + ?Sized,
{
    let Some(handle) = base else {
        let figure = canvas.create_figure();
        let primary = canvas.create_axis(figure)?;
        canvas.set_y_label(primary, y_label)?;
        let handle = CanvasHandle {
            figure,
            primary,
            secondary: None,
        };
        return Ok((handle, primary));
    };

    match canvas.y_label(handle.primary)?.map(str::to_owned) {
        None => {
            canvas.set_y_label(handle.primary, y_label)?;
            return Ok((handle, handle.primary));
        }
        Some(existing) if existing == y_label => return Ok((handle, handle.primary)),
        Some(_) => {}
    }

    match handle.secondary {
        Some(secondary) => match canvas.y_label(secondary)?.map(str::to_owned) {
            Some(existing) if existing == y_label => Ok((handle, secondary)),
            None => {
                canvas.set_y_label(secondary, y_label)?;
                Ok((handle, secondary))
            }
            Some(_) => Err(Error::AxisConflict {
                requested: y_label.to_string(),
            }),
        },
        None => {
            let secondary = canvas.twin_x(handle.primary)?;
            canvas.set_y_label(secondary, y_label)?;
            debug!("allocated secondary axis for `{y_label}`");
            let handle = CanvasHandle {
                secondary: Some(secondary),
                ..handle
            };
            Ok((handle, secondary))
        }
    }
}

fn domain_samples(x: &[f64]) -> Vec<f64> {
    let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(lo.is_finite() && hi.is_finite()) || lo == hi {
        return x.to_vec();
    }
    let step = (hi - lo) / (FIT_SAMPLES - 1) as f64;
    (0..FIT_SAMPLES).map(|i| lo + step * i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::canvas::Series;
    use crate::plot::scene::Scene;
    use approx::assert_relative_eq;

    fn time() -> Variable {
        Variable::parameter(vec![0.0, 1.0, 2.0, 3.0], "t", "s")
    }

    fn meas(name: &str, unit: &str, data: Vec<f64>) -> Variable {
        Variable::measurement(data, name, unit)
    }

    #[test]
    fn first_draw_creates_figure_and_labels() {
        let t = time();
        let v = meas("V", "V", vec![0.0, 2.0, 4.0, 6.0]);
        let mut scene = Scene::new();
        let mut session = PlotSession::new(&t, &v, None).unwrap();
        assert!(!session.is_rendered());

        let out = session.draw(&mut scene, None, &DrawOptions::default()).unwrap();
        assert!(session.is_rendered());
        assert_eq!(session.handle(), Some(out.handle));
        assert_eq!(out.axis, out.handle.primary);
        assert!(out.fit.is_none());

        let axis = scene.axis(out.axis).unwrap();
        assert_eq!(axis.x_label.as_deref(), Some("t (s)"));
        assert_eq!(axis.y_label.as_deref(), Some("V (V)"));
        assert_eq!(axis.ticks, Some(TickLocators { major: 5, minor: 4 }));
        assert!(matches!(axis.series[0], Series::Line(_)));
        assert!(!axis.legend);
    }

    #[test]
    fn fit_adds_curve_and_legend() {
        let t = time();
        let v = meas("V", "V", vec![0.0, 2.0, 4.0, 6.0]);
        let mut scene = Scene::new();
        let out = PlotSession::new(&t, &v, None)
            .unwrap()
            .draw(&mut scene, Some("linear"), &DrawOptions::default())
            .unwrap();
        let fit = out.fit.unwrap();
        assert_relative_eq!(fit.params[0], 2.0, epsilon = 1e-8);

        let axis = scene.axis(out.axis).unwrap();
        assert_eq!(axis.series.len(), 2);
        assert_eq!(axis.series[1].label(), Some("linear fit"));
        assert_eq!(axis.series[1].x().len(), FIT_SAMPLES);
        assert!(axis.legend);
    }

    #[test]
    fn error_bars_when_either_side_has_uncertainty() {
        let t = time().with_err(0.1).unwrap();
        let v = meas("V", "V", vec![0.0, 2.0, 4.0, 6.0]);
        let mut scene = Scene::new();
        let out = PlotSession::new(&t, &v, None)
            .unwrap()
            .draw(&mut scene, None, &DrawOptions::default())
            .unwrap();
        match &scene.axis(out.axis).unwrap().series[0] {
            Series::ErrorBar(s) => {
                assert_eq!(s.x_err.as_deref(), Some(&[0.1; 4][..]));
                assert!(s.y_err.is_none());
                assert_eq!(s.style, LineStyle::Markers);
            }
            other => panic!("expected error bars, got {other:?}"),
        }
    }

    #[test]
    fn chaining_overlays_then_twins_then_conflicts() {
        let t = time();
        let v1 = meas("V", "V", vec![0.0, 1.0, 2.0, 3.0]);
        let v2 = meas("V", "V", vec![3.0, 2.0, 1.0, 0.0]);
        let i = meas("I", "A", vec![1.0, 1.0, 1.0, 1.0]);
        let temp = meas("T", "K", vec![300.0; 4]);
        let mut scene = Scene::new();
        let opts = DrawOptions::default();

        let first = PlotSession::new(&t, &v1, None).unwrap().draw(&mut scene, None, &opts).unwrap();
        let second = PlotSession::new(&t, &v2, Some(first.handle))
            .unwrap()
            .draw(&mut scene, None, &opts)
            .unwrap();
        assert_eq!(second.axis, first.handle.primary);
        assert_eq!(second.handle.secondary, None);

        let third = PlotSession::new(&t, &i, Some(second.handle))
            .unwrap()
            .draw(&mut scene, None, &opts)
            .unwrap();
        let secondary = third.handle.secondary.unwrap();
        assert_eq!(third.axis, secondary);
        assert_eq!(scene.axis(secondary).unwrap().y_label.as_deref(), Some("I (A)"));
        assert_eq!(scene.axis(secondary).unwrap().color, Some(Color::cycle(2)));

        let fourth = PlotSession::new(&t, &i, Some(third.handle))
            .unwrap()
            .draw(&mut scene, None, &opts)
            .unwrap();
        assert_eq!(fourth.axis, secondary);

        let before = scene.series_count(first.handle.figure).unwrap();
        let err = PlotSession::new(&t, &temp, Some(fourth.handle))
            .unwrap()
            .draw(&mut scene, None, &opts)
            .unwrap_err();
        assert!(matches!(err, Error::AxisConflict { .. }));
        assert_eq!(scene.series_count(first.handle.figure).unwrap(), before);
        assert_eq!(scene.figure(first.handle.figure).unwrap().axes.len(), 2);
    }

    #[test]
    fn drawing_twice_draws_twice_on_the_same_axis() {
        let t = time();
        let v = meas("V", "V", vec![0.0; 4]);
        let mut scene = Scene::new();
        let mut session = PlotSession::new(&t, &v, None).unwrap();
        let a = session.draw(&mut scene, None, &DrawOptions::default()).unwrap();
        let b = session.draw(&mut scene, None, &DrawOptions::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(scene.series_count(a.handle.figure).unwrap(), 2);
    }

    #[test]
    fn unknown_fit_leaves_canvas_untouched() {
        let t = time();
        let v = meas("V", "V", vec![0.0; 4]);
        let mut scene = Scene::new();
        let err = PlotSession::new(&t, &v, None)
            .unwrap()
            .draw(&mut scene, Some("spline"), &DrawOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFit(_)));
        assert!(scene.figure(FigureId(0)).is_err());
    }

    #[test]
    fn rejects_wrong_kinds_and_lengths() {
        let t = time();
        let v = meas("V", "V", vec![0.0; 3]);
        assert!(matches!(PlotSession::new(&t, &v, None), Err(Error::LengthMismatch(_))));
        assert!(matches!(PlotSession::new(&t, &t, None), Err(Error::InvalidInput(_))));
        let free = Variable::new(Kind::Variable, vec![0.0; 4], "x", "");
        assert!(matches!(PlotSession::new(&free, &v, None), Err(Error::InvalidInput(_))));
    }
}
