//! Small value types shared by `Variable` and `DataSet`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Role of a series in an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Free series, neither controlled nor observed.
    Variable,
    /// Independent (controlled) series.
    Parameter,
    /// Dependent (observed) series.
    Measurement,
}

impl Kind {
    pub fn display_name(self) -> &'static str {
        match self {
            Kind::Variable => "Variable",
            Kind::Parameter => "Parameter",
            Kind::Measurement => "Measurement",
        }
    }
}

/// Uncertainty supplied at construction.
///
/// A constant is broadcast to one value per data point.
#[derive(Debug, Clone, PartialEq)]
pub enum Uncertainty {
    Constant(f64),
    PerPoint(Vec<f64>),
}

impl From<f64> for Uncertainty {
    fn from(value: f64) -> Self {
        Uncertainty::Constant(value)
    }
}

impl From<Vec<f64>> for Uncertainty {
    fn from(value: Vec<f64>) -> Self {
        Uncertainty::PerPoint(value)
    }
}

impl From<&[f64]> for Uncertainty {
    fn from(value: &[f64]) -> Self {
        Uncertainty::PerPoint(value.to_vec())
    }
}

impl Uncertainty {
    /// Expand to a per-point buffer of length `n`.
    pub(crate) fn expand(self, n: usize) -> Result<Vec<f64>> {
        match self {
            Uncertainty::Constant(v) => Ok(vec![v; n]),
            Uncertainty::PerPoint(v) if v.len() == n => Ok(v),
            Uncertainty::PerPoint(v) => Err(Error::mismatch(format!(
                "error buffer has {} values but data has {n}",
                v.len()
            ))),
        }
    }
}

/// A start/stop/step slice with Python semantics.
///
/// Negative bounds count from the end, out-of-range bounds are clamped and a
/// negative step walks backwards. A zero step is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: isize,
}

impl Default for Slice {
    fn default() -> Self {
        Self::full()
    }
}

impl Slice {
    pub fn new(start: Option<isize>, stop: Option<isize>, step: isize) -> Self {
        Self { start, stop, step }
    }

    /// `[:]`
    pub fn full() -> Self {
        Self::new(None, None, 1)
    }

    /// `[start:stop]`
    pub fn range(start: isize, stop: isize) -> Self {
        Self::new(Some(start), Some(stop), 1)
    }

    /// Positions selected by this slice on a sequence of length `len`, in order.
    pub fn indices(&self, len: usize) -> Result<Vec<usize>> {
        if self.step == 0 {
            return Err(Error::invalid("slice step cannot be zero"));
        }
        let n = len as isize;
        let resolve = |bound: isize, lo: isize, hi: isize| {
            let b = if bound < 0 { bound + n } else { bound };
            b.clamp(lo, hi)
        };

        let mut out = Vec::new();
        if self.step > 0 {
            let start = self.start.map_or(0, |s| resolve(s, 0, n));
            let stop = self.stop.map_or(n, |s| resolve(s, 0, n));
            let mut i = start;
            while i < stop {
                out.push(i as usize);
                i += self.step;
            }
        } else {
            let start = self.start.map_or(n - 1, |s| resolve(s, -1, n - 1));
            let stop = self.stop.map_or(-1, |s| resolve(s, -1, n - 1));
            let mut i = start;
            while i > stop {
                out.push(i as usize);
                i += self.step;
            }
        }
        Ok(out)
    }
}

/// Which positions of a series to keep.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Arbitrary positions, kept in the given order (repeats allowed).
    Indices(Vec<usize>),
    Slice(Slice),
}

impl From<Slice> for Selector {
    fn from(value: Slice) -> Self {
        Selector::Slice(value)
    }
}

impl From<Vec<usize>> for Selector {
    fn from(value: Vec<usize>) -> Self {
        Selector::Indices(value)
    }
}

impl From<&[usize]> for Selector {
    fn from(value: &[usize]) -> Self {
        Selector::Indices(value.to_vec())
    }
}

impl Selector {
    pub(crate) fn positions(&self, len: usize) -> Result<Vec<usize>> {
        match self {
            Selector::Indices(idx) => {
                if let Some(&bad) = idx.iter().find(|&&i| i >= len) {
                    return Err(Error::IndexOutOfRange {
                        what: "data",
                        index: bad as isize,
                        len,
                    });
                }
                Ok(idx.clone())
            }
            Selector::Slice(slice) => slice.indices(len),
        }
    }
}

/// A single sample: the value and, if the series carries one, its uncertainty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub value: f64,
    pub err: Option<f64>,
}

/// Outcome of a value lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Every position holding exactly the requested value.
    Exact(Vec<usize>),
    /// No exact match: the first position whose value is at or above it.
    Closest(usize),
}

impl Lookup {
    /// The first position of the lookup; `None` for an empty exact match.
    pub fn first(&self) -> Option<usize> {
        match self {
            Lookup::Exact(idx) => idx.first().copied(),
            Lookup::Closest(i) => Some(*i),
        }
    }
}

/// Best-fit parameters of a named function and their standard errors.
///
/// `errors[i]` is the square root of the i-th diagonal entry of the fit
/// covariance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub function: String,
    pub params: Vec<f64>,
    pub errors: Vec<f64>,
}

/// Name and unit of one data column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub unit: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }
}

impl FromStr for ColumnSpec {
    type Err = Error;

    /// `name:unit`, or a bare `name` without unit.
    fn from_str(s: &str) -> Result<Self> {
        let (name, unit) = s.split_once(':').unwrap_or((s, ""));
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid(format!("column spec `{s}` has no name")));
        }
        Ok(ColumnSpec::new(name, unit.trim()))
    }
}
