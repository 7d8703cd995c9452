//! CLI frontend for the Broken Divinity combat core.

mod commands;
mod encounter;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::fight::Strategy;

#[derive(Parser)]
#[command(
    name = "bd",
    about = "Broken Divinity: run turn-based encounters from the command line",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an encounter file to completion
    Fight {
        /// Encounter file (JSON)
        file: PathBuf,

        /// Turn action used by every combatant
        #[arg(short, long, value_enum, default_value_t = Strategy::Basic)]
        strategy: Strategy,

        /// RNG seed for the random strategy
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Stop after this many rounds (0 = no limit)
        #[arg(long, default_value_t = 100)]
        max_rounds: u32,

        /// Show debug logs on stderr
        #[arg(short, long)]
        verbose: bool,

        /// Print the result, events and final roster as JSON
        #[arg(long)]
        json: bool,
    },

    /// List built-in statuses, buffs and damage modifiers
    Catalog,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Fight { verbose: true, .. });
    init_tracing(verbose);

    let result = match cli.command {
        Commands::Fight {
            file,
            strategy,
            seed,
            max_rounds,
            verbose: _,
            json,
        } => commands::fight::run(&file, strategy, seed, max_rounds, json),
        Commands::Catalog => commands::catalog::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
