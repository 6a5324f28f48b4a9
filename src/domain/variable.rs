//! Named, unit-tagged numeric series with optional per-point uncertainty.
//!
//! A `Variable` owns its buffers. Every transformation (`rescale`, `subset`,
//! `delete`, `sort`, ...) returns a fresh instance built through
//! [`make_variable`]; nothing aliases the receiver's data.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use crate::domain::types::{Kind, Lookup, Point, Selector, Slice, Uncertainty};
use crate::error::{Error, Result};

/// A 1-D experimental series.
///
/// `Parameter` and `Measurement` are the same type distinguished by [`Kind`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    data: Vec<f64>,
    name: String,
    unit: String,
    err: Option<Vec<f64>>,
    label: Option<String>,
    kind: Kind,
    /// Values originate from integers (affects table formatting only).
    integral: bool,
}

/// Build a variable of the requested kind.
///
/// Shared by constructors and every transformation, so kind-specific
/// behavior lives in one place.
pub fn make_variable(
    kind: Kind,
    data: Vec<f64>,
    name: impl Into<String>,
    unit: impl Into<String>,
    err: Option<Uncertainty>,
    label: Option<String>,
) -> Result<Variable> {
    let err = err.map(|e| e.expand(data.len())).transpose()?;
    Ok(Variable {
        data,
        name: name.into(),
        unit: unit.into(),
        err,
        label,
        kind,
        integral: false,
    })
}

/// Optional overrides for [`Variable::rescale`].
#[derive(Debug, Clone, Default)]
pub struct Rescale {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub label: Option<String>,
    pub kind: Option<Kind>,
}

impl Variable {
    pub fn new(kind: Kind, data: Vec<f64>, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            data,
            name: name.into(),
            unit: unit.into(),
            err: None,
            label: None,
            kind,
            integral: false,
        }
    }

    pub fn parameter(data: Vec<f64>, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::new(Kind::Parameter, data, name, unit)
    }

    pub fn measurement(data: Vec<f64>, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::new(Kind::Measurement, data, name, unit)
    }

    /// Series of integer values; the table formatter prints them without decimals.
    pub fn from_integers(kind: Kind, data: &[i64], name: impl Into<String>, unit: impl Into<String>) -> Self {
        let mut v = Self::new(kind, data.iter().map(|&x| x as f64).collect(), name, unit);
        v.integral = true;
        v
    }

    /// Attach an uncertainty (builder form of [`Variable::add_err`]).
    pub fn with_err(mut self, err: impl Into<Uncertainty>) -> Result<Self> {
        self.add_err(err)?;
        Ok(self)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn add_err(&mut self, err: impl Into<Uncertainty>) -> Result<()> {
        self.err = Some(err.into().expand(self.data.len())?);
        Ok(())
    }

    pub fn add_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// The raw values.
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn err(&self) -> Option<&[f64]> {
        self.err.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_integral(&self) -> bool {
        self.integral
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `"name (unit)"`, or just the name when the unit is empty.
    pub fn axis_label(&self) -> String {
        if self.unit.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.unit)
        }
    }

    /// Same metadata and kind, new buffers.
    fn derived(&self, data: Vec<f64>, err: Option<Vec<f64>>) -> Variable {
        Variable {
            data,
            name: self.name.clone(),
            unit: self.unit.clone(),
            err,
            label: self.label.clone(),
            kind: self.kind,
            integral: self.integral,
        }
    }

    /// Apply `f` pointwise to the data, and to the uncertainty under the same form.
    ///
    /// The uncertainty is transformed directly, not propagated through the
    /// derivative of `f`: `rescale(|x| 2.0 * x + 1.0)` maps an error of `0.1`
    /// to `1.2`.
    pub fn rescale<F>(&self, f: F, opts: Rescale) -> Result<Variable>
    where
        F: Fn(f64) -> f64,
    {
        let data = self.data.iter().map(|&x| f(x)).collect();
        let err = self
            .err
            .as_ref()
            .map(|e| Uncertainty::PerPoint(e.iter().map(|&x| f(x)).collect()));

        make_variable(
            opts.kind.unwrap_or(self.kind),
            data,
            opts.name.unwrap_or_else(|| self.name.clone()),
            opts.unit.unwrap_or_else(|| self.unit.clone()),
            err,
            opts.label.or_else(|| self.label.clone()),
        )
    }

    /// Keep the selected positions of data and uncertainty.
    pub fn subset(&self, selector: impl Into<Selector>) -> Result<Variable> {
        let idx = selector.into().positions(self.len())?;
        let data = idx.iter().map(|&i| self.data[i]).collect();
        let err = self.err.as_ref().map(|e| idx.iter().map(|&i| e[i]).collect());
        Ok(self.derived(data, err))
    }

    /// A single sample. Negative indices count from the end.
    pub fn single(&self, index: isize) -> Result<Point> {
        let len = self.len();
        let i = if index < 0 { index + len as isize } else { index };
        if i < 0 || i as usize >= len {
            return Err(Error::IndexOutOfRange {
                what: "data",
                index,
                len,
            });
        }
        let i = i as usize;
        Ok(Point {
            value: self.data[i],
            err: self.err.as_ref().map(|e| e[i]),
        })
    }

    /// Remove the positions selected by `slice` from data and uncertainty.
    pub fn delete(&self, slice: Slice) -> Result<Variable> {
        let mut drop = vec![false; self.len()];
        for i in slice.indices(self.len())? {
            drop[i] = true;
        }
        let keep = |buf: &[f64]| -> Vec<f64> {
            buf.iter()
                .zip(&drop)
                .filter(|(_, d)| !**d)
                .map(|(&v, _)| v)
                .collect()
        };
        let data = keep(&self.data);
        let err = self.err.as_deref().map(keep);
        Ok(self.derived(data, err))
    }

    /// Reorder the data and return the permutation used.
    ///
    /// Without an explicit order, the stable ascending permutation is computed.
    /// The uncertainty is carried over in its original, unsorted order; apply
    /// the returned permutation with [`Variable::subset`] to realign it.
    pub fn sort(&self, order: Option<&[usize]>) -> Result<(Variable, Vec<usize>)> {
        let order = match order {
            Some(order) => {
                if order.len() != self.len() {
                    return Err(Error::mismatch(format!(
                        "sort order has {} positions but data has {}",
                        order.len(),
                        self.len()
                    )));
                }
                Selector::from(order).positions(self.len())?
            }
            None => argsort(&self.data),
        };
        let data = order.iter().map(|&i| self.data[i]).collect();
        Ok((self.derived(data, self.err.clone()), order))
    }

    /// Sorted distinct values with the position of each value's first occurrence.
    ///
    /// The uncertainty is taken from those first occurrences.
    pub fn sort_unique(&self) -> (Variable, Vec<usize>) {
        let order = argsort(&self.data);
        let mut first: Vec<usize> = Vec::with_capacity(order.len());
        for i in order {
            let dup = first
                .last()
                .is_some_and(|&j| self.data[j].total_cmp(&self.data[i]) == Ordering::Equal);
            if !dup {
                first.push(i);
            }
        }
        let data = first.iter().map(|&i| self.data[i]).collect();
        let err = self.err.as_ref().map(|e| first.iter().map(|&i| e[i]).collect());
        (self.derived(data, err), first)
    }

    pub fn min(&self, range: Option<Range<usize>>) -> Result<f64> {
        let (_, values) = self.window(range)?;
        Ok(values[extremum(values, |a, b| a < b)])
    }

    pub fn max(&self, range: Option<Range<usize>>) -> Result<f64> {
        let (_, values) = self.window(range)?;
        Ok(values[extremum(values, |a, b| a > b)])
    }

    /// Position of the minimum, relative to the full series.
    pub fn argmin(&self, range: Option<Range<usize>>) -> Result<usize> {
        let (start, values) = self.window(range)?;
        Ok(start + extremum(values, |a, b| a < b))
    }

    /// Position of the maximum, relative to the full series.
    pub fn argmax(&self, range: Option<Range<usize>>) -> Result<usize> {
        let (start, values) = self.window(range)?;
        Ok(start + extremum(values, |a, b| a > b))
    }

    /// Positions holding exactly `value`.
    ///
    /// With no exact match and `closest`, the first position whose value is
    /// at or above `value` (not the numerically nearest one).
    pub fn locate(&self, value: f64, closest: bool) -> Result<Lookup> {
        let exact: Vec<usize> = positions_where(&self.data, |v| v == value);
        if !exact.is_empty() {
            return Ok(Lookup::Exact(exact));
        }
        if closest {
            if let Some(i) = self.data.iter().position(|&v| v >= value) {
                return Ok(Lookup::Closest(i));
            }
        }
        Err(Error::NotFound(value))
    }

    fn window(&self, range: Option<Range<usize>>) -> Result<(usize, &[f64])> {
        let range = range.unwrap_or(0..self.len());
        let end = range.end.min(self.len());
        if range.start >= end {
            return Err(Error::invalid(format!(
                "empty range {}..{} on `{}` of length {}",
                range.start,
                range.end,
                self.name,
                self.len()
            )));
        }
        Ok((range.start, &self.data[range.start..end]))
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data.is_empty() {
            return write!(f, "{} (empty)", self.name);
        }
        let min = self.data[extremum(&self.data, |a, b| a < b)];
        let max = self.data[extremum(&self.data, |a, b| a > b)];
        write!(
            f,
            "{} from {} to {} {} in {} steps",
            self.name,
            min,
            max,
            self.unit,
            self.data.len()
        )
    }
}

/// Stable ascending permutation (NaN sorts last).
pub(crate) fn argsort(values: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    idx
}

/// Index of the first element winning `better`; the first NaN wins outright.
fn extremum(values: &[f64], better: fn(f64, f64) -> bool) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            return i;
        }
        if better(v, values[best]) {
            best = i;
        }
    }
    best
}

fn positions_where(values: &[f64], pred: impl Fn(f64) -> bool) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| pred(v))
        .map(|(i, _)| i)
        .collect()
}
