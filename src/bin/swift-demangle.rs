//! Command line front end for the demangler.
//!
//! Demangles each symbol given on the command line, or every line of stdin when no symbols
//! are given. `--fixtures` runs a regression file instead.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use swift_demangle::fixture::{FixtureRunner, FixtureSet};
use swift_demangle::{decode, decode_and_render, demangle_line, RenderOptions};

#[derive(Parser)]
#[command(name = "swift-demangle")]
#[command(version)]
#[command(about = "Demangle Swift symbol names", long_about = None)]
struct Cli {
    /// Mangled names to demangle; stdin is read when none are given
    #[arg(value_name = "SYMBOLS")]
    symbols: Vec<String>,

    /// Short names without module prefixes, types or specialization details
    #[arg(long)]
    simplified: bool,

    /// Print Optional<T>, Array<T> and Dictionary<K, V> without sugar
    #[arg(long)]
    no_sugar: bool,

    /// Print the decoded node tree instead of text
    #[arg(long)]
    tree: bool,

    /// Run a `mangled ---> expected` fixture file and report mismatches
    #[arg(long, value_name = "FILE")]
    fixtures: Option<PathBuf>,

    /// Log decoder activity at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> RenderOptions {
        let mut options = if self.simplified {
            RenderOptions::simplified()
        } else {
            RenderOptions::default()
        };
        if self.no_sugar {
            options.remove(RenderOptions::SYNTHESIZE_SUGAR_ON_TYPES);
        }
        options
    }
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let result = match &cli.fixtures {
        Some(path) => run_fixtures(path, cli.options()),
        None if cli.symbols.is_empty() => demangle_stdin(&cli),
        None => demangle_symbols(&cli),
    };
    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn demangle_one(cli: &Cli, symbol: &str) -> String {
    if cli.tree {
        return match decode(symbol) {
            Ok(tree) => tree.tree_string(),
            Err(e) => format!("<<invalid: {e}>>\n"),
        };
    }
    decode_and_render(symbol, cli.options())
}

fn demangle_symbols(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for symbol in &cli.symbols {
        let text = demangle_one(cli, symbol);
        if cli.tree {
            write!(out, "{text}")?;
        } else {
            writeln!(out, "{text}")?;
        }
    }
    Ok(true)
}

fn demangle_stdin(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let options = cli.options();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if cli.tree {
            write!(out, "{}", demangle_one(cli, line.trim()))?;
        } else {
            writeln!(out, "{}", demangle_line(&line, options))?;
        }
    }
    Ok(true)
}

fn run_fixtures(path: &Path, options: RenderOptions) -> Result<bool, Box<dyn std::error::Error>> {
    let set = FixtureSet::load(path)?;
    let report = FixtureRunner::new(options).run(&set);
    for mismatch in &report.mismatches {
        println!("line {}: {}", mismatch.line, mismatch.input);
        println!("  expected: {}", mismatch.expected);
        println!("  actual:   {}", mismatch.actual);
    }
    println!("{}/{} fixtures passed", report.passed, report.total());
    Ok(report.is_success())
}
