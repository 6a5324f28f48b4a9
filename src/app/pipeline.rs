//! Shared command pipelines.
//!
//! Each pipeline loads the data file, runs the computation and returns the
//! results; printing and rendering stay in `app`.

use crate::cli::{FitArgs, InputArgs, PlotArgs};
use crate::domain::{DataSet, FitResult, VarRef};
use crate::error::{Error, Result};
use crate::fit::fit;
use crate::io::read_dataset;
use crate::models::{FitFunction, FitRegistry};
use crate::plot::{DrawOptions, FigureId, Scene};

/// Outputs of `lab fit`.
#[derive(Debug, Clone)]
pub struct FitRun {
    pub function: &'static FitFunction,
    pub result: FitResult,
}

/// Outputs of `lab plot`: the recorded scene and the figure holding the curves.
#[derive(Debug)]
pub struct PlotRun {
    pub scene: Scene,
    pub figure: FigureId,
    pub fits: Vec<Option<FitResult>>,
}

pub fn load(input: &InputArgs) -> Result<DataSet> {
    read_dataset(&input.file, &input.read_spec())
}

/// Fit the chosen measurement column against the parameter.
pub fn run_fit(args: &FitArgs) -> Result<FitRun> {
    let function = FitRegistry::builtin().resolve(&args.function)?;
    let set = load(&args.input)?;
    let x = set.parameter(0)?;
    let y = set.measurement(args.column)?;

    let result = fit(function, x.data(), y.data(), &args.fit_options())?;
    Ok(FitRun { function, result })
}

/// Draw the selected columns onto one figure of a fresh scene.
pub fn run_plot(args: &PlotArgs) -> Result<PlotRun> {
    let set = load(&args.input)?;
    let columns: Vec<usize> = if args.columns.is_empty() {
        (0..set.measurements().len()).collect()
    } else {
        args.columns.clone()
    };
    let measurements = columns
        .iter()
        .map(|&c| {
            isize::try_from(c)
                .map(VarRef::Index)
                .map_err(|_| Error::invalid(format!("column {c} is too large")))
        })
        .collect::<Result<Vec<_>>>()?;

    let fits = [args.fit.as_deref()];
    let fits: &[Option<&str>] = if args.fit.is_some() { &fits } else { &[] };

    let mut scene = Scene::new();
    let out = set.plots_1d(
        &mut scene,
        &[VarRef::Index(0)],
        &measurements,
        fits,
        &[],
        None,
        &DrawOptions::default(),
    )?;
    Ok(PlotRun {
        scene,
        figure: out.handle.figure,
        fits: out.fits,
    })
}
