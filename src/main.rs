//! Command-line front end for rebuilding and triaging fuzzer solutions.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use simple_logger::SimpleLogger;

use psp_flash::FlashLayout;
use psp_flash::batch;

#[derive(Parser)]
#[command(
    name = "psp-flash",
    version,
    about = "Rebuild and triage AMD PSP flash images from fuzzer solutions"
)]
struct Cli {
    /// Log debug output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create full flash images from the solutions of a fuzzer run.
    Rebuild {
        /// Path to the specific fuzzer run (not the general runs/ dir).
        run_dir: PathBuf,
        /// Directory to write the new flash images to, joined under the
        /// run's solutions directory.
        #[arg(short, long, default_value = "full_img")]
        new_dir: PathBuf,
    },
    /// Check the rebuilt images of a run for the known buffer overflow.
    Triage {
        /// Path to the specific fuzzer run (not the general runs/ dir).
        run_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    let layout = FlashLayout::PSP;
    match cli.command {
        Command::Rebuild { run_dir, new_dir } => {
            let summary = batch::rebuild_run(&run_dir, &new_dir, &layout)
                .with_context(|| format!("rebuilding run {}", run_dir.display()))?;
            println!(
                "{}/{} solution files have been transformed",
                summary.transformed, summary.files
            );
        }
        Command::Triage { run_dir } => {
            let summary = batch::triage_run(&run_dir, &layout)
                .with_context(|| format!("triaging run {}", run_dir.display()))?;
            println!("#ROMFiles = {}", summary.files);
            println!("#NumKnown = {}", summary.known);
            println!("#NumUnknown = {}", summary.unknown);
            if summary.failed > 0 {
                println!("#NumFailed = {}", summary.failed);
            }
        }
    }
    Ok(())
}
