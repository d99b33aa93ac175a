//! felt - command line finite element analysis

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use felt_solver::input::{load_model, load_model_reader, write_model};
use felt_solver::output::{draw_structure_ascii, write_graphics_file, write_material_statistics};
use felt_solver::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "felt", version)]
#[command(about = "Finite element analysis of static, transient, modal and spectral problems")]
struct Args {
    /// JSON model file (standard input when omitted)
    input: Option<PathBuf>,

    /// Echo the problem as it was understood
    #[arg(long)]
    debug: bool,

    /// Draw a character rendering of the structure
    #[arg(long)]
    preview: bool,

    /// Suppress result tables
    #[arg(long)]
    no_table: bool,

    /// Plot tables, mode shapes and transfer functions
    #[arg(long)]
    plot: bool,

    /// Spectral analysis reports transfer functions instead of output spectra
    #[arg(long)]
    transfer: bool,

    /// Modal analysis reports eigenvalues and modes only
    #[arg(long)]
    eigen: bool,

    /// Scale modes to unit modal mass before forming modal matrices
    #[arg(long)]
    orthonormal: bool,

    /// Renumber nodes to reduce the bandwidth
    #[arg(long)]
    renumber: bool,

    /// Print material usage after the analysis
    #[arg(long)]
    summary: bool,

    /// Print the assembled global matrices
    #[arg(long)]
    matrices: bool,

    /// Log analysis details
    #[arg(long)]
    details: bool,

    /// Write M, C and K to FILE in MATLAB format
    #[arg(long, value_name = "FILE")]
    matlab: Option<PathBuf>,

    /// Write the structure and its solution to FILE as JSON
    #[arg(long, value_name = "FILE")]
    graphics: Option<PathBuf>,
}

impl Args {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            matrices: self.matrices,
            matrix_export: self.matlab.clone(),
            table: !self.no_table,
            plot: self.plot,
            spectra: !self.transfer,
            modal: !self.eigen,
            orthonormal: self.orthonormal,
            renumber: self.renumber,
        }
    }
}

fn read_problem(input: Option<&PathBuf>) -> Result<Problem> {
    match input {
        Some(path) => load_model(path).with_context(|| format!("could not read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("could not read standard input")?;
            load_model_reader(text.as_bytes()).context("could not parse standard input")
        }
    }
}

fn felt(args: &Args) -> Result<()> {
    let mut problem = read_problem(args.input.as_ref())?;
    let stdout = io::stdout();

    if args.debug {
        let mut out = stdout.lock();
        write_model(&problem, &mut out).context("could not echo the problem")?;
        writeln!(out)?;
    }

    if args.preview {
        print!("{}", draw_structure_ascii(&problem, 78, 22));
    }

    let options = args.run_options();
    let mut reporter = TextReporter::new(stdout.lock());
    let output = run(&mut problem, &options, &mut reporter)
        .with_context(|| format!("{} analysis failed", problem.analysis.mode.label()))?;
    drop(reporter);

    if matches!(output, AnalysisOutput::Nothing) {
        log::warn!("no output spectra were computed");
    }

    if let Some(path) = &args.graphics {
        write_graphics_file(&problem, path)
            .with_context(|| format!("could not write graphics file {}", path.display()))?;
    }

    if args.summary {
        write_material_statistics(&problem, &mut stdout.lock())
            .context("could not write material statistics")?;
    }

    problem.dispose();
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Help and version go to stdout and are not failures
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let default_filter = if args.details { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match felt(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
