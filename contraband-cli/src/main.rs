//! `contraband` binary entry point
//!
//! Parses arguments, resolves the configuration, initializes logging and
//! dispatches to a command handler. Errors map to exit codes via
//! [`CliError::exit_code`].

mod cli;
mod collector;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use contraband_core::config::GeneralConfig;

use crate::cli::{Cli, Commands};
use crate::commands::ConfigSource;
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let cwd = std::env::current_dir()?;
    let source = ConfigSource::resolve(cli.config.as_deref(), &cwd);
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Scan(args) => {
            let config = commands::load_config(&source).await?;
            init_logging(&config.general, cli.log_level.as_deref())?;
            contraband_core::metrics::describe_all();
            commands::scan::execute(args, config, &writer).await
        }
        Commands::Config(args) => {
            // The file under inspection may be broken, so log with defaults.
            init_logging(&GeneralConfig::default(), cli.log_level.as_deref())?;
            commands::config::execute(args, &source, &writer).await
        }
    }
}

fn init_logging(general: &GeneralConfig, level: Option<&str>) -> Result<(), CliError> {
    logging::init_tracing(general, level).map_err(|e| CliError::Command(e.to_string()))
}
