//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initialises logging
//! - parses CLI arguments
//! - runs the selected pipeline
//! - prints reports and plots

use clap::Parser;
use log::{debug, info};

use crate::cli::{Cli, Command, FitArgs, PlotArgs, TableArgs};
use crate::error::{Error, Result};
use crate::models::FitRegistry;
use crate::plot::svg::{SvgSize, write_svg};

pub mod pipeline;

/// Entry point for the `lab` binary.
pub fn run() -> Result<()> {
    // Environment defaults for flags (LAB_PLOT_WIDTH, ...) may live in `.env`.
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    debug!("{:?}", cli.command);

    match cli.command {
        Command::Fit(args) => handle_fit(&args),
        Command::Plot(args) => handle_plot(&args),
        Command::Table(args) => handle_table(&args),
        Command::Functions => {
            print!("{}", format_functions(FitRegistry::builtin()));
            Ok(())
        }
    }
}

fn init_logging() {
    let env = env_logger::Env::default().filter_or("LAB_LOG", "warn");
    // A second init (tests, embedding) keeps the first logger.
    let _ = env_logger::Builder::from_env(env).format_timestamp(None).try_init();
}

fn handle_fit(args: &FitArgs) -> Result<()> {
    let run = pipeline::run_fit(args)?;
    if args.json {
        let json = serde_json::to_string_pretty(&run.result)
            .map_err(|e| Error::invalid(format!("cannot serialize fit result: {e}")))?;
        println!("{json}");
    } else {
        print!("{}", crate::report::format_fit(&run.result, run.function));
    }
    Ok(())
}

fn handle_plot(args: &PlotArgs) -> Result<()> {
    let run = pipeline::run_plot(args)?;
    let figure = run.scene.figure(run.figure)?;

    if let Some(path) = &args.out {
        let size = SvgSize {
            width: args.svg_width,
            height: args.svg_height,
        };
        write_svg(figure, size, path)?;
    }
    if args.show_ascii() {
        print!("{}", crate::plot::ascii::render_ascii(figure, args.width, args.height)?);
    }

    let registry = FitRegistry::builtin();
    for result in run.fits.iter().flatten() {
        let function = registry.resolve(&result.function)?;
        print!("{}", crate::report::format_fit(result, function));
    }
    info!("plotted {} curve(s)", run.fits.len());
    Ok(())
}

fn handle_table(args: &TableArgs) -> Result<()> {
    let set = pipeline::load(&args.input)?;
    let labels = (!args.row_labels.is_empty()).then_some(args.row_labels.as_slice());
    print!("{}", crate::report::table(set.measurements(), labels)?);
    Ok(())
}

/// One line per registered function: name, parameters and formula.
pub fn format_functions(registry: &FitRegistry) -> String {
    let mut out = String::new();
    for f in registry.functions() {
        out.push_str(&format!("{:<12} ({})  y = {}\n", f.name, f.params.join(", "), f.formula));
    }
    out
}
