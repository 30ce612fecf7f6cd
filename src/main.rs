use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use recsolve::dispatch::PENDING_TEXT;
use recsolve::logging::init_logger;
use recsolve::{CancelToken, Config, Dispatcher, FormulaArtifact, Pipeline, Request};

#[derive(Debug, Parser)]
#[command(name = "recsolve", version, about = "Closed forms for linear recurrences")]
struct Cli {
    /// TOML file with render and solver settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve one recurrence f(n) = a1*f(n-1) + ... + am*f(n-m)
    Solve {
        #[arg(long, allow_hyphen_values = true)]
        order: String,
        /// Comma-separated a1,...,am
        #[arg(long, allow_hyphen_values = true)]
        coefficients: String,
        /// Comma-separated f(0),...,f(m-1)
        #[arg(long, allow_hyphen_values = true)]
        initial: String,
        /// Write the typeset formula to this SVG file
        #[arg(long)]
        svg: Option<PathBuf>,
        /// Also print the LaTeX source
        #[arg(long)]
        latex: bool,
    },
    /// Read `order; coefficients; initial values` lines from stdin
    Interactive {
        /// Seconds to wait for each line before moving on
        #[arg(long, default_value_t = 30)]
        timeout: u64,
        #[arg(long)]
        latex: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };
    tracing::debug!(?config, "configuration loaded");
    let pipeline = Pipeline::new(&config);

    match cli.command {
        Command::Solve {
            order,
            coefficients,
            initial,
            svg,
            latex,
        } => {
            let request = Request::new(order, coefficients, initial);
            match pipeline.run(&request, &CancelToken::new()) {
                Ok(solution) => {
                    println!("{}", solution.formula.plain);
                    if latex {
                        println!("{}", solution.formula.latex);
                    }
                    if let Some(path) = svg {
                        std::fs::write(&path, &solution.formula.svg)
                            .with_context(|| format!("writing {}", path.display()))?;
                        tracing::info!(path = %path.display(), "formula written");
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    println!("{}", err.display_message());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Interactive { timeout, latex } => {
            interactive(pipeline, Duration::from_secs(timeout), latex)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn interactive(pipeline: Pipeline, timeout: Duration, latex: bool) -> anyhow::Result<()> {
    let mut dispatcher = Dispatcher::new(pipeline);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(';').collect();
        let [order, coefficients, initial] = fields[..] else {
            writeln!(stdout, "Error: expected 'order; coefficients; initial values'")?;
            continue;
        };

        let ticket = dispatcher.submit(Request::new(order, coefficients, initial));
        writeln!(stdout, "{PENDING_TEXT}")?;
        stdout.flush()?;
        if !dispatcher.wait_for(ticket, timeout) {
            writeln!(stdout, "(no result after {}s, skipped)", timeout.as_secs())?;
            continue;
        }
        match dispatcher.slot().artifact() {
            Some(FormulaArtifact::Image(formula)) => {
                writeln!(stdout, "{}", formula.plain)?;
                if latex {
                    writeln!(stdout, "{}", formula.latex)?;
                }
            }
            Some(FormulaArtifact::Message(message)) => writeln!(stdout, "{message}")?,
            None => {}
        }
    }
    Ok(())
}
