use std::path::Path;

use approx::assert_abs_diff_eq;
use clap::Parser;
use tempdir::TempDir;

use lab_analysis::app::pipeline::{run_fit, run_plot};
use lab_analysis::cli::{Cli, Command};
use lab_analysis::error::Error;
use lab_analysis::plot::ascii::render_ascii;
use lab_analysis::plot::svg::{SvgSize, render_svg, write_svg};

const DATA: &str = "\
# t   V     I
0     1.0   10.0
1     3.0    9.0
2     5.0    8.0
3     7.0    7.0
4     9.0    6.0
";

fn data_file(dir: &TempDir) -> String {
    let path = dir.path().join("run.txt");
    std::fs::write(&path, DATA).unwrap();
    path.to_string_lossy().into_owned()
}

fn parse(args: &[&str]) -> Command {
    Cli::try_parse_from(args).unwrap().command
}

#[test]
fn fit_command_recovers_line() {
    let dir = TempDir::new("lab-pipeline").unwrap();
    let file = data_file(&dir);
    let Command::Fit(args) = parse(&[
        "lab", "fit", &file, "-p", "t:s", "-m", "V:V", "-m", "I:mA", "-f", "linear",
    ]) else {
        panic!("expected fit");
    };

    let run = run_fit(&args).unwrap();
    assert_eq!(run.function.name, "linear");
    assert_abs_diff_eq!(run.result.params[0], 2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(run.result.params[1], 1.0, epsilon = 1e-6);
    assert!(run.result.errors.iter().all(|e| *e < 1e-6));

    let json = serde_json::to_value(&run.result).unwrap();
    assert_eq!(json["function"], "linear");
}

#[test]
fn fit_command_reports_unknown_function() {
    let dir = TempDir::new("lab-pipeline").unwrap();
    let file = data_file(&dir);
    let Command::Fit(args) = parse(&["lab", "fit", &file, "-p", "t", "-m", "V", "-m", "I", "-f", "gaussian"]) else {
        panic!("expected fit");
    };
    let err = run_fit(&args).unwrap_err();
    assert!(matches!(err, Error::UnknownFit(_)));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn plot_command_puts_second_unit_on_twin_axis() {
    let dir = TempDir::new("lab-pipeline").unwrap();
    let file = data_file(&dir);
    let Command::Plot(args) = parse(&[
        "lab", "plot", &file, "-p", "t:s", "-m", "V:V", "-m", "I:mA", "--labels", "voltage,current", "--fit",
        "linear",
    ]) else {
        panic!("expected plot");
    };

    let run = run_plot(&args).unwrap();
    assert_eq!(run.fits.len(), 2);
    let current = run.fits[1].as_ref().unwrap();
    assert_abs_diff_eq!(current.params[0], -1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(current.params[1], 10.0, epsilon = 1e-6);

    let figure = run.scene.figure(run.figure).unwrap();
    assert_eq!(figure.axes.len(), 2);
    assert_eq!(figure.twins().count(), 1);

    let ascii = render_ascii(figure, 40, 12).unwrap();
    let header = ascii.lines().next().unwrap();
    assert!(header.contains("t (s)=[0.000, 4.000]"), "{header}");
    assert!(header.contains("V (V)"), "{header}");
    assert!(header.contains("I (mA)"), "{header}");
    assert!(ascii.contains("voltage"));
    assert!(ascii.contains("linear fit"));

    let svg = render_svg(figure, SvgSize::default()).unwrap();
    for text in ["t (s)", "V (V)", "I (mA)", "current"] {
        assert!(svg.contains(text), "missing `{text}`");
    }

    let out = dir.path().join("plot.svg");
    write_svg(figure, SvgSize { width: 640, height: 400 }, &out).unwrap();
    assert!(Path::new(&out).exists());
}

#[test]
fn plot_command_rejects_a_third_unit() {
    let dir = TempDir::new("lab-pipeline").unwrap();
    let path = dir.path().join("three.txt");
    std::fs::write(&path, "0 1 2 3\n1 2 3 4\n").unwrap();
    let file = path.to_string_lossy().into_owned();
    let Command::Plot(args) = parse(&[
        "lab", "plot", &file, "-p", "t:s", "-m", "V:V", "-m", "I:A", "-m", "T:K",
    ]) else {
        panic!("expected plot");
    };
    let err = run_plot(&args).unwrap_err();
    assert!(matches!(err, Error::AxisConflict { .. }));
}
