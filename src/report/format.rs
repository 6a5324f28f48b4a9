//! Formatted terminal output: measurement tables, fit summaries, data set overviews.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::{DataSet, FitResult, Variable};
use crate::error::{Error, Result};
use crate::models::FitFunction;

/// Decimals that put the leading digit of `err` on the last shown digit.
///
/// `None` for a zero or non-finite error.
pub fn decimals_for(err: f64) -> Option<usize> {
    let err = err.abs();
    if err == 0.0 || !err.is_finite() {
        return None;
    }
    let p = (-err.log10().floor()).max(0.0) as usize;
    // Rounding can carry into the next digit (0.096 -> 0.10).
    if p > 0 && (err * 10f64.powi(p as i32)).round() >= 10.0 {
        return Some(p - 1);
    }
    Some(p)
}

/// `"value ± error"` rounded to the error's leading digit.
pub fn format_measured(value: f64, err: f64, fallback: usize) -> String {
    let p = decimals_for(err).unwrap_or(fallback);
    format!("{value:.p$} ± {err:.p$}")
}

fn cell(v: &Variable, i: usize) -> String {
    let value = v.data()[i];
    match v.err() {
        Some(err) => format_measured(value, err[i], 2),
        None if v.is_integral() => format!("{value:.0}"),
        None => format!("{value:.2}"),
    }
}

/// Render measurements as columns, one row per sample.
///
/// Columns without uncertainty use two decimals (none for integer data);
/// columns with uncertainty print `value ± error` at the error's precision.
pub fn table(measurements: &[Variable], row_labels: Option<&[String]>) -> Result<String> {
    let first = measurements
        .first()
        .ok_or_else(|| Error::invalid("a table needs at least one measurement"))?;
    let rows = first.len();
    if let Some(m) = measurements.iter().find(|m| m.len() != rows) {
        return Err(Error::mismatch(format!(
            "`{}` has {} rows but `{}` has {rows}",
            m.name(),
            m.len(),
            first.name()
        )));
    }
    if let Some(labels) = row_labels {
        if labels.len() != rows {
            return Err(Error::mismatch(format!(
                "{} row labels for {rows} rows",
                labels.len()
            )));
        }
    }

    let mut columns: Vec<Vec<String>> = Vec::with_capacity(measurements.len() + 1);
    if let Some(labels) = row_labels {
        let mut col = vec![String::new()];
        col.extend(labels.iter().cloned());
        columns.push(col);
    }
    for m in measurements {
        let mut col = vec![m.axis_label()];
        col.extend((0..rows).map(|i| cell(m, i)));
        columns.push(col);
    }

    let widths: Vec<usize> = columns
        .iter()
        .map(|c| c.iter().map(|s| s.chars().count()).max().unwrap_or(0))
        .collect();
    let labelled = row_labels.is_some();
    let pad = |s: &str, width: usize, left: bool| {
        let fill = " ".repeat(width.saturating_sub(s.chars().count()));
        if left { format!("{s}{fill}") } else { format!("{fill}{s}") }
    };

    let mut out = String::new();
    for row in 0..=rows {
        let line: Vec<String> = columns
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(c, (col, &w))| pad(&col[row], w, labelled && c == 0))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
        if row == 0 {
            let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
            out.push_str(&rule.join("  "));
            out.push('\n');
        }
    }
    Ok(out)
}

/// Parameter listing for one fit.
pub fn format_fit(result: &FitResult, function: &FitFunction) -> String {
    let mut out = String::new();
    out.push_str(&format!("Fit: {}  y = {}\n", function.name, function.formula));
    for ((name, &value), &err) in function.params.iter().zip(&result.params).zip(&result.errors) {
        out.push_str(&format!("  {name:<4} = {}\n", format_measured(value, err, 6)));
    }
    out
}

/// One line per series of a data set.
pub fn format_dataset(set: &DataSet) -> String {
    let mut out = String::new();
    for (title, items) in [("Parameters", set.parameters()), ("Measurements", set.measurements())] {
        out.push_str(&format!("{title}:\n"));
        for v in items {
            out.push_str(&format!("  {v}\n"));
        }
    }
    out
}
