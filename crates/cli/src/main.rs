//! evalb: evaluate Scheme expressions through a native interpreter library
//!
//! Each expression is evaluated and every returned value is printed on its
//! own line. A void result prints nothing; `(values 1 2)` prints two lines.
//! Expressions come from the command line, or one per line from stdin.

mod config;
mod library;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;
use evalbridge_core::{BridgeError, Evaluation, PrintConfig, evaluate, value_to_scheme};
use tracing::warn;

use config::{BridgeConfig, FileConfig, OutputFormat};
use library::SchemeLibrary;

#[derive(ClapParser)]
#[command(name = "evalb")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluate Scheme expressions through a native interpreter library", long_about = None)]
struct Cli {
    /// Expressions to evaluate (reads stdin, one per line, when none are given)
    expressions: Vec<String>,

    /// TOML configuration file
    #[arg(short, long, env = "EVALBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Shared library exporting the evaluate entry point
    #[arg(short, long)]
    library: Option<PathBuf>,

    /// Name of the exported evaluate function
    #[arg(long)]
    symbol: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Pretty-print nested vectors
    #[arg(long)]
    pretty: bool,

    /// Log each decoded cell
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for target in ["evalb", "evalbridge_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), BridgeError> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let overrides = FileConfig {
        library: cli.library,
        symbol: cli.symbol,
        format: cli.format,
        pretty: cli.pretty.then_some(true),
    };
    let config = BridgeConfig::resolve(file, overrides)?;
    let scheme = SchemeLibrary::open(&config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.expressions.is_empty() {
        for expr in expression_lines(io::stdin().lock()) {
            let eval = evaluate(&scheme, &expr?)?;
            print_evaluation(&mut out, &eval, &config);
        }
    } else {
        for expr in &cli.expressions {
            let eval = evaluate(&scheme, expr)?;
            print_evaluation(&mut out, &eval, &config);
        }
    }

    Ok(())
}

/// Non-blank lines of `input`, trimmed
fn expression_lines(input: impl BufRead) -> impl Iterator<Item = Result<String, BridgeError>> {
    input.lines().filter_map(|line| match line {
        Ok(line) => {
            let expr = line.trim();
            (!expr.is_empty()).then(|| Ok(expr.to_string()))
        }
        Err(e) => Some(Err(BridgeError::Io(e))),
    })
}

fn print_evaluation(out: &mut impl Write, eval: &Evaluation, config: &BridgeConfig) {
    for error in eval.errors() {
        warn!("{}", error);
    }
    for line in render(eval, config) {
        if writeln!(out, "{}", line).is_err() {
            // stdout closed (e.g. piped into head)
            process::exit(0);
        }
    }
}

/// One output line per value
fn render(eval: &Evaluation, config: &BridgeConfig) -> Vec<String> {
    let print_config = if config.pretty {
        PrintConfig::pretty()
    } else {
        PrintConfig::compact()
    };

    eval.values()
        .iter()
        .map(|value| match config.format {
            OutputFormat::Scheme => value_to_scheme(value, &print_config),
            OutputFormat::Json => {
                let json = if config.pretty {
                    serde_json::to_string_pretty(value)
                } else {
                    serde_json::to_string(value)
                };
                json.unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
            }
        })
        .collect()
}
