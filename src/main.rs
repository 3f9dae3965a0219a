mod cleanup;
mod cli;
mod config;
mod logging;
mod model;
mod providers;
mod verify;

use std::process::ExitCode;

use clap::Parser;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose, cli.quiet) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli::run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
