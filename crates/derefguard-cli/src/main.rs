use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use derefguard_core::analysis::{run_check_after_deref_analysis, CollectFindings, Finding};
use derefguard_core::format::format_cfg;
use derefguard_core::persist::load_cfg;
use derefguard_core::{CheckPolarity, DeclMap};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "derefguard")]
#[command(about = "Finds null checks made after the pointer was already dereferenced")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a serialized CFG and report dead null checks
    Analyze {
        input: PathBuf,

        /// Emit findings as a JSON array instead of text
        #[arg(long)]
        json: bool,

        /// Print analysis statistics
        #[arg(short, long)]
        verbose: bool,
    },

    /// Pretty-print a serialized CFG
    Dump { input: PathBuf },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            json,
            verbose,
        } => analyze(&input, json, verbose),
        Commands::Dump { input } => {
            let (cfg, decls) = load_cfg(&input)
                .with_context(|| format!("failed to load CFG from {}", input.display()))?;
            print!("{}", format_cfg(&cfg, &decls));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn analyze(input: &Path, json: bool, verbose: bool) -> Result<ExitCode> {
    let (cfg, decls) = load_cfg(input)
        .with_context(|| format!("failed to load CFG from {}", input.display()))?;

    let mut collected = CollectFindings::new();
    let stats = run_check_after_deref_analysis(&cfg, &decls, &mut collected)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&collected.findings)?);
    } else {
        for finding in &collected.findings {
            print_finding(finding, &decls);
        }
        if collected.is_empty() {
            println!("{}", "no findings".green());
        }
        if verbose {
            println!(
                "{} {} blocks visited, {} findings",
                "stats:".dimmed(),
                stats.blocks_visited,
                stats.findings
            );
        }
    }

    // Non-zero when something was found, so the exit status can gate CI.
    Ok(if collected.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn print_finding(finding: &Finding, decls: &DeclMap) {
    let name = decls.name_of(finding.var);
    let test = match finding.polarity {
        CheckPolarity::Null => format!("!{}", name),
        CheckPolarity::NonNull => name.clone(),
    };
    println!(
        "{} null check `{}` at {} is dead: `{}` was already dereferenced at {}",
        "warning:".yellow().bold(),
        test.bold(),
        finding.check,
        name.bold(),
        finding.deref
    );
}
