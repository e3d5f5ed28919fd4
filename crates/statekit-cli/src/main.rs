//! statekit CLI
//!
//! The command-line interface for moving and listing resources in state files.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use commands::MvOptions;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} state move tool", "statekit".green().bold());
            println!();
            println!("Run {} for available commands.", "statekit --help".cyan());
            Ok(())
        }
    }
}

/// Verbose mode logs at DEBUG; otherwise `RUST_LOG` applies, defaulting to warn.
fn init_tracing(verbose: bool) -> Result<()> {
    let result = if verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };
    result.map_err(|e| CliError::user(format!("Failed to set tracing subscriber: {e}")))?;
    tracing::debug!("Verbose mode enabled");
    Ok(())
}

fn execute_command(cmd: Commands) -> Result<()> {
    let cwd = std::env::current_dir()?;
    match cmd {
        Commands::Mv {
            state,
            state_out,
            backup,
            backup_out,
            no_backup,
            source,
            destination,
        } => {
            let options = MvOptions {
                state,
                state_out,
                backup,
                backup_out,
                no_backup,
            };
            commands::run_mv(&cwd, &source, &destination, &options)
        }
        Commands::List { state, filter } => {
            commands::run_list(&cwd, state.as_ref(), filter.as_deref())
        }
    }
}
