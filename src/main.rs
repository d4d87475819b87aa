//! Stemweave CLI - Stem Recipe Renderer
//!
//! Command-line interface for checking and rendering stem recipes.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::debug;

use stemweave::cli::commands::{self, RenderArgs};
use stemweave::cli::{exit_code, Cli, Commands};
use stemweave::StemweaveError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    debug!("Stemweave v{}", env!("CARGO_PKG_VERSION"));

    match handle_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if let Some(e) = err.downcast_ref::<StemweaveError>() {
                for suggestion in e.recovery_suggestions() {
                    eprintln!("  hint: {}", suggestion);
                }
            }
            ExitCode::from(exit_code(&err))
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Check { recipe } => commands::check(&recipe),
        Commands::Fmt { recipe } => commands::fmt(&recipe),
        Commands::Render {
            stems,
            recipe,
            output,
            config,
            bit_depth,
            normalize,
            report,
        } => commands::render(
            &recipe,
            &RenderArgs {
                stems,
                output,
                config,
                bit_depth,
                normalize,
                report,
            },
        ),
        Commands::Actions => commands::actions(),
    }
}
