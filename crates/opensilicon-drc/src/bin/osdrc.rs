//! `osdrc`: run the built-in design checks over a design file.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use log::error;
use opensilicon_core::LayoutDatabase;
use opensilicon_drc::{
    providers, DrcEngine, DrcError, DrcSettings, LogReporter, NullReporter, ProgressReporter,
    VerificationReport,
};

const EXIT_VIOLATIONS: i32 = 1;
const EXIT_IO: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// OpenSilicon design rule checker.
#[derive(Parser)]
#[command(name = "osdrc", version, about = "Check a design against a rule document")]
struct Cli {
    /// Rule document
    #[arg(long)]
    rules: PathBuf,

    /// Design JSON
    #[arg(long)]
    design: PathBuf,

    /// Settings JSON; defaults apply to anything it omits
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress per-violation logging while checking
    #[arg(long)]
    quiet: bool,
}

fn load(cli: &Cli) -> Result<(DrcEngine, LayoutDatabase), DrcError> {
    let settings = match &cli.settings {
        Some(path) => DrcSettings::load(path)?,
        None => DrcSettings::default(),
    };
    let mut engine = DrcEngine::new(settings);
    engine.load_rules_file(&cli.rules)?;
    let design = LayoutDatabase::from_json(&read(&cli.design)?)?;
    Ok((engine, design))
}

fn read(path: &Path) -> Result<String, DrcError> {
    Ok(std::fs::read_to_string(path)?)
}

fn print_text(report: &VerificationReport) {
    for d in &report.diagnostics {
        println!("{d}");
    }
    for v in &report.violations {
        println!("{v}");
    }
    for m in &report.aux_messages {
        println!("  {m}");
    }
    println!(
        "{} violation(s); providers run: {}; skipped: {}{}{}",
        report.violations.len(),
        join_or_none(&report.providers_run),
        join_or_none(&report.providers_skipped),
        if report.truncated { "; truncated" } else { "" },
        if report.cancelled { "; cancelled" } else { "" },
    );
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let (mut engine, design) = match load(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            process::exit(EXIT_IO);
        }
    };

    for provider in providers::builtin() {
        engine.register_provider(provider);
    }

    let reporter: &dyn ProgressReporter = if cli.quiet { &NullReporter } else { &LogReporter };
    let report = engine.run(&design, reporter);

    match cli.output {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(EXIT_IO);
            }
        },
    }

    if report.has_errors() {
        process::exit(EXIT_VIOLATIONS);
    }
}
