//! Command-line parsing for `lab`.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! data model and fitting code. Every tunable flag can also be set through an
//! environment variable (or a `.env` file, loaded before parsing).

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ColumnSpec, Quantity};
use crate::fit::{Bound, Bounds, FitOptions};
use crate::io::ReadSpec;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "lab", version, about = "Fit, plot and tabulate experimental data series")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a named function to one measurement column.
    Fit(FitArgs),
    /// Plot measurement columns against the parameter (SVG and/or terminal).
    Plot(PlotArgs),
    /// Print the measurement columns as a formatted table.
    Table(TableArgs),
    /// List the registered fit functions.
    Functions,
}

/// Where the data comes from and how its columns are named.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Data file: one sample per line, the parameter in the first column.
    pub file: PathBuf,

    /// Parameter column as NAME[:UNIT], or a preset @QUANTITY:UNIT (e.g. @voltage:mV).
    #[arg(short = 'p', long = "param", value_parser = parse_column)]
    pub param: ColumnSpec,

    /// One spec per measurement column, in file order.
    #[arg(short = 'm', long = "measurement", value_parser = parse_column, required = true)]
    pub measurements: Vec<ColumnSpec>,

    /// Legend labels for the measurements (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Single-character field delimiter; whitespace when unset.
    #[arg(long, env = "LAB_DELIMITER", value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

impl InputArgs {
    pub fn read_spec(&self) -> ReadSpec {
        ReadSpec {
            parameter: self.param.clone(),
            measurements: self.measurements.clone(),
            labels: (!self.labels.is_empty()).then(|| self.labels.clone()),
            delimiter: self.delimiter,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Registered fit function (see `lab functions`).
    #[arg(short = 'f', long)]
    pub function: String,

    /// Measurement column to fit (0-based).
    #[arg(long, default_value_t = 0)]
    pub column: usize,

    /// Initial parameter guess (comma separated); ones inside the bounds when unset.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub guess: Vec<f64>,

    /// Lower bounds: one value for all parameters or one per parameter.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub lower: Vec<f64>,

    /// Upper bounds: one value for all parameters or one per parameter.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub upper: Vec<f64>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

impl FitArgs {
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            initial_guess: (!self.guess.is_empty()).then(|| self.guess.clone()),
            sigma: None,
            bounds: Bounds {
                lower: bound(&self.lower, f64::NEG_INFINITY),
                upper: bound(&self.upper, f64::INFINITY),
            },
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Measurement columns to plot (0-based, comma separated); all when unset.
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<usize>,

    /// Fit every plotted curve with this function.
    #[arg(long)]
    pub fit: Option<String>,

    /// Write the figure as SVG.
    #[arg(long, value_name = "SVG")]
    pub out: Option<PathBuf>,

    /// Render an ASCII plot in the terminal (the default when `--out` is unset).
    #[arg(long)]
    pub ascii: bool,

    /// ASCII plot width (columns).
    #[arg(long, env = "LAB_PLOT_WIDTH", default_value_t = 100)]
    pub width: usize,

    /// ASCII plot height (rows).
    #[arg(long, env = "LAB_PLOT_HEIGHT", default_value_t = 25)]
    pub height: usize,

    /// SVG width in pixels.
    #[arg(long, env = "LAB_SVG_WIDTH", default_value_t = 960)]
    pub svg_width: u32,

    /// SVG height in pixels.
    #[arg(long, env = "LAB_SVG_HEIGHT", default_value_t = 600)]
    pub svg_height: u32,
}

impl PlotArgs {
    pub fn show_ascii(&self) -> bool {
        self.ascii || self.out.is_none()
    }
}

#[derive(Debug, Args, Clone)]
pub struct TableArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Row labels (comma separated), one per sample.
    #[arg(long, value_delimiter = ',')]
    pub row_labels: Vec<String>,
}

/// `NAME[:UNIT]`, or `@QUANTITY:UNIT` for a physical quantity preset.
pub fn parse_column(s: &str) -> Result<ColumnSpec, String> {
    let parsed = match s.strip_prefix('@') {
        Some(preset) => Quantity::preset(preset),
        None => ColumnSpec::from_str(s),
    };
    parsed.map_err(|e| e.to_string())
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "\\t" | "tab" => Ok(b'\t'),
        _ if s.len() == 1 => Ok(s.as_bytes()[0]),
        _ => Err(format!("delimiter must be a single ASCII character, got `{s}`")),
    }
}

fn bound(values: &[f64], unbounded: f64) -> Bound {
    match values {
        [] => Bound::All(unbounded),
        [v] => Bound::All(*v),
        _ => Bound::Each(values.to_vec()),
    }
}
