//! Column-file ingest.
//!
//! A data file holds one sample per line. The first column is the parameter,
//! every further column a measurement. Columns are separated by runs of
//! whitespace unless a delimiter is given, in which case the file is read
//! through the `csv` crate. Blank lines and lines starting with `#` are skipped.
//!
//! Validation is strict: a ragged row, a non-numeric cell or a column count
//! that disagrees with the supplied specs fails the whole read.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::domain::{ColumnSpec, DataSet, Kind, Variable};
use crate::error::{Error, Result};

/// How the columns of a file are named.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadSpec {
    pub parameter: ColumnSpec,
    /// One spec per measurement column, in file order.
    pub measurements: Vec<ColumnSpec>,
    /// Optional legend labels, paired positionally with `measurements`.
    pub labels: Option<Vec<String>>,
    /// Field delimiter; `None` splits on whitespace.
    pub delimiter: Option<u8>,
}

impl ReadSpec {
    pub fn new(parameter: ColumnSpec, measurements: Vec<ColumnSpec>) -> Self {
        Self {
            parameter,
            measurements,
            labels: None,
            delimiter: None,
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }
}

/// What [`readfile`] hands back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Output {
    #[default]
    DataSet,
    Measurements,
    Parameter,
}

#[derive(Debug, Clone)]
pub enum Loaded {
    DataSet(DataSet),
    Measurements(Vec<Variable>),
    Parameter(Variable),
}

impl Loaded {
    pub fn into_dataset(self) -> Option<DataSet> {
        match self {
            Loaded::DataSet(set) => Some(set),
            _ => None,
        }
    }

    pub fn into_measurements(self) -> Option<Vec<Variable>> {
        match self {
            Loaded::Measurements(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_parameter(self) -> Option<Variable> {
        match self {
            Loaded::Parameter(p) => Some(p),
            _ => None,
        }
    }
}

/// Read `path` and build the requested output from its columns.
pub fn readfile(path: &Path, spec: &ReadSpec, output: Output) -> Result<Loaded> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let columns = parse_columns(&text, spec.delimiter)?;
    info!(
        "read {} rows x {} columns from {}",
        columns.first().map_or(0, Vec::len),
        columns.len(),
        path.display()
    );
    let (parameter, measurements) = build(columns, spec)?;
    Ok(match output {
        Output::DataSet => Loaded::DataSet(DataSet::new(vec![parameter], measurements)?),
        Output::Measurements => Loaded::Measurements(measurements),
        Output::Parameter => Loaded::Parameter(parameter),
    })
}

/// Shorthand for `readfile(.., Output::DataSet)`.
pub fn read_dataset(path: &Path, spec: &ReadSpec) -> Result<DataSet> {
    readfile(path, spec, Output::DataSet)?
        .into_dataset()
        .ok_or_else(|| Error::invalid("expected a data set"))
}

/// Split `text` into numeric columns (column-major).
pub fn parse_columns(text: &str, delimiter: Option<u8>) -> Result<Vec<Vec<f64>>> {
    let rows = match delimiter {
        None => whitespace_rows(text)?,
        Some(d) => delimited_rows(text, d)?,
    };

    let (first_line, first) = rows
        .first()
        .ok_or_else(|| Error::invalid("file contains no data rows"))?;
    let width = first.len();
    debug!("first data row on line {first_line} has {width} columns");

    let mut columns = vec![Vec::with_capacity(rows.len()); width];
    for (line, row) in &rows {
        if row.len() != width {
            return Err(Error::mismatch(format!(
                "line {line} has {} columns, expected {width}",
                row.len()
            )));
        }
        for (col, &value) in columns.iter_mut().zip(row) {
            col.push(value);
        }
    }
    Ok(columns)
}

type Row = (usize, Vec<f64>);

fn whitespace_rows(text: &str) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim().trim_start_matches('\u{feff}');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|cell| parse_cell(cell, line_no))
            .collect::<Result<Vec<_>>>()?;
        rows.push((line_no, row));
    }
    Ok(rows)
}

fn delimited_rows(text: &str, delimiter: u8) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| Error::invalid(format!("malformed row: {e}")))?;
        let line_no = record.position().map_or(0, |p| p.line() as usize);
        if record.iter().all(str::is_empty) {
            continue;
        }
        let row = record
            .iter()
            .map(|cell| parse_cell(cell.trim_start_matches('\u{feff}'), line_no))
            .collect::<Result<Vec<_>>>()?;
        rows.push((line_no, row));
    }
    Ok(rows)
}

fn parse_cell(cell: &str, line: usize) -> Result<f64> {
    cell.parse::<f64>()
        .map_err(|_| Error::invalid(format!("line {line}: `{cell}` is not a number")))
}

/// Pair columns with their specs: parameter first, then measurements in order.
fn build(mut columns: Vec<Vec<f64>>, spec: &ReadSpec) -> Result<(Variable, Vec<Variable>)> {
    let found = columns.len().saturating_sub(1);
    if found != spec.measurements.len() {
        return Err(Error::mismatch(format!(
            "{} measurement specs for {found} measurement columns",
            spec.measurements.len()
        )));
    }
    if let Some(labels) = &spec.labels {
        if labels.len() != spec.measurements.len() {
            return Err(Error::mismatch(format!(
                "{} labels for {} measurements",
                labels.len(),
                spec.measurements.len()
            )));
        }
    }

    let measurement_data = columns.split_off(1);
    let parameter_data = columns.remove(0);

    let parameter = Variable::new(
        Kind::Parameter,
        parameter_data,
        spec.parameter.name.clone(),
        spec.parameter.unit.clone(),
    );
    let measurements: Vec<Variable> = measurement_data
        .into_iter()
        .zip(&spec.measurements)
        .enumerate()
        .map(|(i, (data, col))| {
            let v = Variable::new(Kind::Measurement, data, col.name.clone(), col.unit.clone());
            match spec.labels.as_ref().map(|labels| labels[i].clone()) {
                Some(label) => v.with_label(label),
                None => v,
            }
        })
        .collect();
    Ok((parameter, measurements))
}
