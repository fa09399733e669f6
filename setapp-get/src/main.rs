//! setapp-get: install Setapp applications from the terminal.

use clap::{CommandFactory, Parser};
use std::process::ExitCode;

mod cli;
mod commands;
mod reporter;

use cli::Cli;
use commands::{Outcome, Services};

/// Usage problems exit with 2, failures with 1
const EXIT_USAGE: u8 = 2;
const EXIT_FAILURE: u8 = 1;

/// A completed run exits 0 even when some targets failed to install.
fn exit_code(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Completed => 0,
        Outcome::Usage => EXIT_USAGE,
        Outcome::UnknownCommand(_) => EXIT_FAILURE,
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `-v`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = commands::config_from_cli(&cli);
    log::debug!("Using config: {:?}", config);

    let services = match Services::system(config, !cli.no_sudo) {
        Ok(services) => services,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let mut stdout = std::io::stdout();
    match commands::dispatch(cli.command, &services, cli.refresh, &mut stdout).await {
        Ok(outcome) => {
            match &outcome {
                Outcome::Completed => {}
                Outcome::Usage => eprintln!("{}", Cli::command().render_help()),
                Outcome::UnknownCommand(name) => eprintln!("Unknown command: {}", name),
            }
            ExitCode::from(exit_code(&outcome))
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
