mod commands;
mod error;
mod runtime;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use groupsaga_config::Settings;
use tracing_subscriber::EnvFilter;

use crate::commands::Commands;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "groupsaga")]
#[command(about = "Create and delete groups across a node fleet", long_about = None)]
struct Cli {
    /// Settings file (TOML); environment variables override it
    #[arg(long = "config", short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = Settings::load(cli.config.as_deref())
        .map_err(CliError::from)
        .and_then(|settings| cli.command.execute(&settings));

    if let Err(e) = result {
        print_error(&e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn print_error(error: &CliError) {
    eprintln!("error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = std::error::Error::source(cause);
    }
}
