//! Parameters and their co-indexed measurements.
//!
//! Every transformation applies the same permutation or slice to the
//! parameter and to each measurement involved, and returns a new `DataSet`.
//! Only `add_parameters` / `add_measurements` mutate in place.

use std::ops::Range;

use crate::domain::types::{FitResult, Kind, Slice};
use crate::domain::variable::{Variable, make_variable};
use crate::error::{Error, Result};
use crate::math::gradient;
use crate::plot::canvas::{AxisId, Canvas, Color};
use crate::plot::session::{CanvasHandle, DrawOptions, DrawOutput, PlotSession};

#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    parameters: Vec<Variable>,
    measurements: Vec<Variable>,
    /// Free variables carried along (empty when absent).
    variables: Vec<Variable>,
}

/// A series given either by position in a `DataSet` or directly.
#[derive(Debug, Clone, Copy)]
pub enum VarRef<'a> {
    /// Position; negative values count from the end.
    Index(isize),
    Object(&'a Variable),
}

impl From<isize> for VarRef<'_> {
    fn from(i: isize) -> Self {
        VarRef::Index(i)
    }
}

impl<'a> From<&'a Variable> for VarRef<'a> {
    fn from(v: &'a Variable) -> Self {
        VarRef::Object(v)
    }
}

/// Result of [`DataSet::plots_1d`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlotsOutput {
    pub handle: CanvasHandle,
    /// Axis of the last curve.
    pub axis: AxisId,
    /// One entry per curve, `None` where no fit was requested.
    pub fits: Vec<Option<FitResult>>,
}

fn require_kind(items: &[Variable], kind: Kind) -> Result<()> {
    match items.iter().find(|v| v.kind() != kind) {
        Some(v) => Err(Error::invalid(format!(
            "`{}` is a {}, expected a {}",
            v.name(),
            v.kind().display_name(),
            kind.display_name()
        ))),
        None => Ok(()),
    }
}

fn pick<'a>(items: &'a [Variable], index: usize, what: &'static str) -> Result<&'a Variable> {
    items.get(index).ok_or(Error::IndexOutOfRange {
        what,
        index: index as isize,
        len: items.len(),
    })
}

fn resolve<'a>(items: &'a [Variable], r: VarRef<'a>, what: &'static str) -> Result<&'a Variable> {
    match r {
        VarRef::Object(v) => Ok(v),
        VarRef::Index(index) => {
            let len = items.len() as isize;
            let i = if index < 0 { index + len } else { index };
            if i < 0 || i >= len {
                return Err(Error::IndexOutOfRange {
                    what,
                    index,
                    len: items.len(),
                });
            }
            Ok(&items[i as usize])
        }
    }
}

/// One entry per curve: `items` as is, or a single item repeated `n` times.
fn broadcast<T: Clone>(items: &[T], n: usize, what: &str) -> Result<Vec<T>> {
    match items.len() {
        len if len == n => Ok(items.to_vec()),
        1 => Ok(vec![items[0].clone(); n]),
        len => Err(Error::mismatch(format!(
            "{len} {what} cannot be matched with {n} measurements"
        ))),
    }
}

impl DataSet {
    pub fn new(parameters: Vec<Variable>, measurements: Vec<Variable>) -> Result<Self> {
        if parameters.is_empty() || measurements.is_empty() {
            return Err(Error::invalid(
                "a data set needs at least one parameter and one measurement",
            ));
        }
        require_kind(&parameters, Kind::Parameter)?;
        require_kind(&measurements, Kind::Measurement)?;
        Ok(Self {
            parameters,
            measurements,
            variables: Vec::new(),
        })
    }

    /// Attach free variables (kind `Variable`).
    pub fn with_variables(mut self, variables: Vec<Variable>) -> Result<Self> {
        require_kind(&variables, Kind::Variable)?;
        self.variables = variables;
        Ok(self)
    }

    pub fn parameters(&self) -> &[Variable] {
        &self.parameters
    }

    pub fn measurements(&self) -> &[Variable] {
        &self.measurements
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn parameter(&self, index: usize) -> Result<&Variable> {
        pick(&self.parameters, index, "parameters")
    }

    pub fn measurement(&self, index: usize) -> Result<&Variable> {
        pick(&self.measurements, index, "measurements")
    }

    /// Sort one parameter ascending and reorder the selected measurements alike.
    ///
    /// Returns a set of that parameter plus the reordered measurements (all
    /// of them when `measurements` is `None`). With `unique`, repeated
    /// parameter values keep their first occurrence only.
    pub fn sort(&self, parameter: usize, measurements: Option<&[usize]>, unique: bool) -> Result<DataSet> {
        let param = self.parameter(parameter)?;
        let selected = self.select_measurements(measurements)?;
        for m in &selected {
            if m.len() != param.len() {
                return Err(Error::mismatch(format!(
                    "`{}` has {} points but `{}` has {}",
                    m.name(),
                    m.len(),
                    param.name(),
                    param.len()
                )));
            }
        }

        let (sorted, order) = if unique {
            param.sort_unique()
        } else {
            param.sort(None)?
        };
        let reordered = selected
            .iter()
            .map(|m| m.subset(order.clone()))
            .collect::<Result<Vec<_>>>()?;
        DataSet::new(vec![sorted], reordered)
    }

    /// Smallest measurement value between two parameter values.
    ///
    /// `start` / `stop` are looked up in the parameter (exact match, else the
    /// first value at or above); the window is `[start, stop)` in positions.
    pub fn min(&self, parameter: usize, measurement: usize, start: Option<f64>, stop: Option<f64>) -> Result<f64> {
        let (meas, range) = self.window(parameter, measurement, start, stop)?;
        meas.min(Some(range))
    }

    pub fn max(&self, parameter: usize, measurement: usize, start: Option<f64>, stop: Option<f64>) -> Result<f64> {
        let (meas, range) = self.window(parameter, measurement, start, stop)?;
        meas.max(Some(range))
    }

    /// Position of the minimum over the window, relative to the full series.
    pub fn argmin(&self, parameter: usize, measurement: usize, start: Option<f64>, stop: Option<f64>) -> Result<usize> {
        let (meas, range) = self.window(parameter, measurement, start, stop)?;
        meas.argmin(Some(range))
    }

    pub fn argmax(&self, parameter: usize, measurement: usize, start: Option<f64>, stop: Option<f64>) -> Result<usize> {
        let (meas, range) = self.window(parameter, measurement, start, stop)?;
        meas.argmax(Some(range))
    }

    /// Slice every parameter and measurement, or only the selected ones.
    pub fn subset(&self, slice: Slice, parameter: Option<usize>, measurement: Option<usize>) -> Result<DataSet> {
        let params = match parameter {
            Some(i) => vec![self.parameter(i)?],
            None => self.parameters.iter().collect(),
        };
        let meas = match measurement {
            Some(i) => vec![self.measurement(i)?],
            None => self.measurements.iter().collect(),
        };
        DataSet::new(
            params.into_iter().map(|p| p.subset(slice)).collect::<Result<_>>()?,
            meas.into_iter().map(|m| m.subset(slice)).collect::<Result<_>>()?,
        )
    }

    /// Remove the slice from every parameter and measurement, or only the selected ones.
    pub fn delete(&self, slice: Slice, parameters: Option<&[usize]>, measurements: Option<&[usize]>) -> Result<DataSet> {
        let params = match parameters {
            Some(idx) => idx.iter().map(|&i| self.parameter(i)).collect::<Result<Vec<_>>>()?,
            None => self.parameters.iter().collect(),
        };
        let meas = self.select_measurements(measurements)?;
        DataSet::new(
            params.into_iter().map(|p| p.delete(slice)).collect::<Result<_>>()?,
            meas.into_iter().map(|m| m.delete(slice)).collect::<Result<_>>()?,
        )
    }

    /// Numerical derivative d(measurement)/d(parameter) as a new measurement.
    ///
    /// Central differences inside, one-sided at both ends. The name defaults
    /// to `d<meas>/d<param>` and the unit to `<meas unit>/<param unit>`.
    pub fn derive(
        &self,
        parameter: usize,
        measurement: usize,
        name: Option<&str>,
        unit: Option<&str>,
        label: Option<&str>,
    ) -> Result<Variable> {
        let p = self.parameter(parameter)?;
        let m = self.measurement(measurement)?;
        let data = gradient(m.data(), p.data())?;
        let name = name.map_or_else(|| format!("d{}/d{}", m.name(), p.name()), str::to_string);
        let unit = unit.map_or_else(|| format!("{}/{}", m.unit(), p.unit()), str::to_string);
        make_variable(Kind::Measurement, data, name, unit, None, label.map(str::to_string))
    }

    pub fn add_measurements(&mut self, items: impl IntoIterator<Item = Variable>) -> Result<()> {
        let items: Vec<Variable> = items.into_iter().collect();
        require_kind(&items, Kind::Measurement)?;
        self.measurements.extend(items);
        Ok(())
    }

    pub fn add_parameters(&mut self, items: impl IntoIterator<Item = Variable>) -> Result<()> {
        let items: Vec<Variable> = items.into_iter().collect();
        require_kind(&items, Kind::Parameter)?;
        self.parameters.extend(items);
        Ok(())
    }

    /// A plot session for one curve, not drawn yet.
    pub fn session_1d<'a>(
        &'a self,
        parameter: VarRef<'a>,
        measurement: VarRef<'a>,
        previous: Option<CanvasHandle>,
    ) -> Result<PlotSession<'a>> {
        let p = resolve(&self.parameters, parameter, "parameters")?;
        let m = resolve(&self.measurements, measurement, "measurements")?;
        PlotSession::new(p, m, previous)
    }

    /// Draw one parameter/measurement curve, optionally with a fit.
    pub fn plot_1d<C>(
        &self,
        canvas: &mut C,
        parameter: VarRef<'_>,
        measurement: VarRef<'_>,
        fit: Option<&str>,
        previous: Option<CanvasHandle>,
        opts: &DrawOptions,
    ) -> Result<DrawOutput>
    where
        C: Canvas + ?Sized,
    {
        self.session_1d(parameter, measurement, previous)?
            .draw(canvas, fit, opts)
    }

    /// Draw several curves onto one figure, chaining each onto the previous.
    ///
    /// `parameters`, `fits` and `colors` hold one entry per measurement or a
    /// single entry used for all of them. Empty `fits` / `colors` mean no fit
    /// and the color cycle. References are resolved before anything is drawn.
    #[allow(clippy::too_many_arguments)]
    pub fn plots_1d<C>(
        &self,
        canvas: &mut C,
        parameters: &[VarRef<'_>],
        measurements: &[VarRef<'_>],
        fits: &[Option<&str>],
        colors: &[Color],
        previous: Option<CanvasHandle>,
        opts: &DrawOptions,
    ) -> Result<PlotsOutput>
    where
        C: Canvas + ?Sized,
    {
        let n = measurements.len();
        if n == 0 {
            return Err(Error::invalid("no measurements to plot"));
        }
        let parameters = broadcast(parameters, n, "parameters")?;
        let fits = if fits.is_empty() {
            vec![None; n]
        } else {
            broadcast(fits, n, "fits")?
        };
        let colors: Vec<Option<Color>> = if colors.is_empty() {
            vec![None; n]
        } else {
            broadcast(colors, n, "colors")?.into_iter().map(Some).collect()
        };

        let mut sessions = Vec::with_capacity(n);
        for (p, m) in parameters.into_iter().zip(measurements.iter().copied()) {
            sessions.push(self.session_1d(p, m, None)?);
        }

        let mut handle = previous;
        let mut last = None;
        let mut results = Vec::with_capacity(n);
        for ((session, fit), color) in sessions.into_iter().zip(fits).zip(colors) {
            let mut session = session.with_previous(handle);
            let opts = DrawOptions {
                color: color.or(opts.color),
                ..opts.clone()
            };
            let out = session.draw(canvas, fit, &opts)?;
            handle = Some(out.handle);
            last = Some((out.handle, out.axis));
            results.push(out.fit);
        }

        let (handle, axis) = last.ok_or_else(|| Error::invalid("no measurements to plot"))?;
        Ok(PlotsOutput {
            handle,
            axis,
            fits: results,
        })
    }

    fn select_measurements(&self, selection: Option<&[usize]>) -> Result<Vec<&Variable>> {
        match selection {
            Some(idx) => idx.iter().map(|&i| self.measurement(i)).collect(),
            None => Ok(self.measurements.iter().collect()),
        }
    }

    fn window(
        &self,
        parameter: usize,
        measurement: usize,
        start: Option<f64>,
        stop: Option<f64>,
    ) -> Result<(&Variable, Range<usize>)> {
        let param = self.parameter(parameter)?;
        let meas = self.measurement(measurement)?;
        let position = |v: f64| param.locate(v, true)?.first().ok_or(Error::NotFound(v));
        let start = match start {
            Some(v) => position(v)?,
            None => 0,
        };
        let stop = match stop {
            Some(v) => position(v)?,
            None => meas.len(),
        };
        Ok((meas, start..stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::scene::Scene;
    use approx::assert_relative_eq;

    fn sample() -> DataSet {
        let t = Variable::parameter(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], "t", "s");
        let y = Variable::measurement(vec![9.0, 8.0, 7.0, 1.0, 3.0, 2.0, 0.0, 5.0], "y", "m");
        DataSet::new(vec![t], vec![y]).unwrap()
    }

    #[test]
    fn constructor_checks_kinds_and_presence() {
        let t = Variable::parameter(vec![0.0], "t", "s");
        let y = Variable::measurement(vec![1.0], "y", "m");
        assert!(matches!(
            DataSet::new(vec![y.clone()], vec![y.clone()]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(DataSet::new(vec![t.clone()], vec![]), Err(Error::InvalidInput(_))));
        let free = Variable::new(Kind::Variable, vec![1.0], "x", "");
        let set = DataSet::new(vec![t.clone()], vec![y.clone()])
            .unwrap()
            .with_variables(vec![free])
            .unwrap();
        assert_eq!(set.variables().len(), 1);
        assert!(DataSet::new(vec![t], vec![y.clone()]).unwrap().with_variables(vec![y]).is_err());
    }

    #[test]
    fn windowed_extrema() {
        let set = sample();
        assert_eq!(set.min(0, 0, Some(2.0), Some(6.0)).unwrap(), 1.0);
        assert_eq!(set.argmin(0, 0, Some(2.0), Some(6.0)).unwrap(), 3);
        assert_eq!(set.max(0, 0, Some(2.0), Some(6.0)).unwrap(), 7.0);
        assert_eq!(set.argmax(0, 0, Some(3.0), None).unwrap(), 7);
        assert_eq!(set.min(0, 0, None, None).unwrap(), 0.0);
        // 2.5 is absent: the window starts at the first value above it.
        assert_eq!(set.max(0, 0, Some(2.5), None).unwrap(), 5.0);
        assert!(matches!(set.min(0, 0, Some(99.0), None), Err(Error::NotFound(_))));
        assert!(matches!(set.min(0, 3, None, None), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn sort_reorders_measurements_with_the_parameter() {
        let t = Variable::parameter(vec![3.0, 1.0, 2.0, 1.0], "t", "s");
        let y = Variable::measurement(vec![30.0, 10.0, 20.0, 11.0], "y", "m")
            .with_err(vec![0.3, 0.1, 0.2, 0.11])
            .unwrap();
        let set = DataSet::new(vec![t], vec![y]).unwrap();

        let sorted = set.sort(0, None, false).unwrap();
        assert_eq!(sorted.parameters()[0].data(), &[1.0, 1.0, 2.0, 3.0]);
        assert_eq!(sorted.measurements()[0].data(), &[10.0, 11.0, 20.0, 30.0]);
        assert_eq!(sorted.measurements()[0].err().unwrap(), &[0.1, 0.11, 0.2, 0.3]);

        let unique = set.sort(0, None, true).unwrap();
        assert_eq!(unique.parameters()[0].data(), &[1.0, 2.0, 3.0]);
        assert_eq!(unique.measurements()[0].data(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn sort_keeps_only_the_selected_measurements() {
        let t = Variable::parameter(vec![2.0, 0.0, 1.0], "t", "s");
        let a = Variable::measurement(vec![20.0, 0.0, 10.0], "a", "V");
        let b = Variable::measurement(vec![5.0, 3.0, 4.0], "b", "A");
        let set = DataSet::new(vec![t], vec![a, b]).unwrap();

        let sorted = set.sort(0, Some(&[1]), false).unwrap();
        assert_eq!(sorted.parameters()[0].data(), &[0.0, 1.0, 2.0]);
        assert_eq!(sorted.measurements().len(), 1);
        assert_eq!(sorted.measurements()[0].name(), "b");
        assert_eq!(sorted.measurements()[0].data(), &[3.0, 4.0, 5.0]);
        assert_eq!(set.measurements()[0].data(), &[20.0, 0.0, 10.0]);

        assert!(matches!(set.sort(0, Some(&[2]), false), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn sort_rejects_misaligned_measurement() {
        let t = Variable::parameter(vec![3.0, 1.0], "t", "s");
        let y = Variable::measurement(vec![1.0, 2.0, 3.0], "y", "m");
        let set = DataSet::new(vec![t], vec![y]).unwrap();
        assert!(matches!(set.sort(0, None, false), Err(Error::LengthMismatch(_))));
    }

    #[test]
    fn subset_and_delete_select_series() {
        let t = Variable::parameter(vec![0.0, 1.0, 2.0, 3.0], "t", "s");
        let a = Variable::measurement(vec![10.0, 11.0, 12.0, 13.0], "a", "V");
        let b = Variable::measurement(vec![20.0, 21.0, 22.0, 23.0], "b", "V");
        let set = DataSet::new(vec![t], vec![a, b]).unwrap();

        let all = set.subset(Slice::range(1, 3), None, None).unwrap();
        assert_eq!(all.measurements().len(), 2);
        assert_eq!(all.measurements()[1].data(), &[21.0, 22.0]);

        let one = set.subset(Slice::new(None, None, 2), Some(0), Some(1)).unwrap();
        assert_eq!(one.parameters()[0].data(), &[0.0, 2.0]);
        assert_eq!(one.measurements().len(), 1);
        assert_eq!(one.measurements()[0].data(), &[20.0, 22.0]);

        let removed = set.delete(Slice::range(0, 2), None, Some(&[0])).unwrap();
        assert_eq!(removed.parameters()[0].data(), &[2.0, 3.0]);
        assert_eq!(removed.measurements().len(), 1);
        assert_eq!(removed.measurements()[0].data(), &[12.0, 13.0]);
    }

    #[test]
    fn derive_defaults_name_and_unit() {
        let t = Variable::parameter(vec![0.0, 1.0, 2.0, 3.0], "t", "s");
        let x = Variable::measurement(vec![0.0, 1.0, 4.0, 9.0], "x", "m");
        let set = DataSet::new(vec![t], vec![x]).unwrap();
        let v = set.derive(0, 0, None, None, None).unwrap();
        assert_eq!(v.kind(), Kind::Measurement);
        assert_eq!(v.name(), "dx/dt");
        assert_eq!(v.unit(), "m/s");
        assert!(v.err().is_none());
        let expected = [1.0, 2.0, 4.0, 5.0];
        for (got, want) in v.data().iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        let named = set.derive(0, 0, Some("v"), Some("m/s"), Some("speed")).unwrap();
        assert_eq!(named.label(), Some("speed"));
    }

    #[test]
    fn add_appends_in_place() {
        let mut set = sample();
        set.add_measurements([Variable::measurement(vec![0.0; 8], "z", "m")]).unwrap();
        assert_eq!(set.measurements().len(), 2);
        set.add_parameters(vec![Variable::parameter(vec![0.0; 8], "u", "s")]).unwrap();
        assert_eq!(set.parameters().len(), 2);
        let wrong = Variable::parameter(vec![0.0; 8], "w", "s");
        assert!(set.add_measurements([wrong]).is_err());
        assert_eq!(set.measurements().len(), 2);
    }

    #[test]
    fn plot_resolves_references() {
        let set = sample();
        let mut scene = Scene::new();
        let out = set
            .plot_1d(&mut scene, VarRef::Index(-1), VarRef::Index(0), None, None, &DrawOptions::default())
            .unwrap();
        assert_eq!(scene.series_count(out.handle.figure).unwrap(), 1);

        let err = set
            .plot_1d(&mut scene, VarRef::Index(1), VarRef::Index(0), None, None, &DrawOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { what: "parameters", .. }));

        let stray = Variable::measurement(vec![0.0; 8], "m", "m");
        let err = set
            .plot_1d(&mut scene, VarRef::Object(&stray), VarRef::Index(0), None, None, &DrawOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let session = set.session_1d(VarRef::Index(0), VarRef::Index(0), None).unwrap();
        assert!(!session.is_rendered());
    }

    #[test]
    fn plots_broadcast_single_parameter() {
        let mut set = sample();
        set.add_measurements([Variable::measurement(vec![1.0; 8], "z", "m")]).unwrap();
        let mut scene = Scene::new();
        let out = set
            .plots_1d(
                &mut scene,
                &[VarRef::Index(0)],
                &[VarRef::Index(0), VarRef::Index(1)],
                &[],
                &[],
                None,
                &DrawOptions::default(),
            )
            .unwrap();
        assert_eq!(out.fits, vec![None, None]);
        assert_eq!(out.axis, out.handle.primary);
        assert_eq!(scene.series_count(out.handle.figure).unwrap(), 2);
    }

    #[test]
    fn plots_reject_unbroadcastable_lists() {
        let mut set = sample();
        set.add_measurements([
            Variable::measurement(vec![1.0; 8], "z", "m"),
            Variable::measurement(vec![2.0; 8], "w", "m"),
        ])
        .unwrap();
        let mut scene = Scene::new();
        let err = set
            .plots_1d(
                &mut scene,
                &[VarRef::Index(0), VarRef::Index(0)],
                &[VarRef::Index(0), VarRef::Index(1), VarRef::Index(2)],
                &[],
                &[],
                None,
                &DrawOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch(_)));

        let err = set
            .plots_1d(
                &mut scene,
                &[VarRef::Index(0)],
                &[VarRef::Index(0), VarRef::Index(1), VarRef::Index(2)],
                &[Some("linear"), None],
                &[],
                None,
                &DrawOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch(_)));
        assert!(scene.figure(crate::plot::FigureId(0)).is_err());
    }

    #[test]
    fn plots_collect_fit_results() {
        let t = Variable::parameter(vec![0.0, 1.0, 2.0, 3.0], "t", "s");
        let a = Variable::measurement(vec![0.0, 2.0, 4.0, 6.0], "a", "V");
        let b = Variable::measurement(vec![1.0, 2.0, 3.0, 4.0], "b", "A");
        let set = DataSet::new(vec![t], vec![a, b]).unwrap();
        let mut scene = Scene::new();
        let out = set
            .plots_1d(
                &mut scene,
                &[VarRef::Index(0)],
                &[VarRef::Index(0), VarRef::Index(1)],
                &[Some("linear")],
                &[Color::rgb(0, 0, 0)],
                None,
                &DrawOptions::default(),
            )
            .unwrap();
        assert_relative_eq!(out.fits[0].as_ref().unwrap().params[0], 2.0, epsilon = 1e-8);
        assert_relative_eq!(out.fits[1].as_ref().unwrap().params[1], 1.0, epsilon = 1e-8);
        assert_eq!(Some(out.axis), out.handle.secondary);
    }
}
