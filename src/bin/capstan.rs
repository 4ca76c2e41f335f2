//! Capstan CLI binary.

use capstan::cli::{run, Cli};
use capstan::logging::init_logging;
use clap::Parser;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_level.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    match run(&cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            let report = anyhow::Error::from(e);
            error!("command failed: {report:#}");
            eprintln!("{report:#}");
            process::exit(1);
        }
    }
}
