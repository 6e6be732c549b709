//! docdesk CLI Binary
//!
//! Command-line interface for document-grounded question answering.

use anyhow::Context;
use clap::Parser;
use docdesk::logging::init_logging;
use docdesk::tooling::cli::{Cli, CliContext};
use std::process;

async fn run(cli: Cli) -> anyhow::Result<String> {
    let context = CliContext::new(cli.workspace.clone(), cli.config.clone())
        .context("Error initializing workspace")?;

    let logging = context.logging_config(&cli);
    init_logging(Some(&logging)).context("Error initializing logging")?;

    Ok(context.execute(&cli.command).await?)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
