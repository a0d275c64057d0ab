//! aip-bridge CLI Binary

use aip_bridge::logging::init_logging;
use aip_bridge::tooling::cli::{load_config, Cli, CliContext};
use clap::Parser;
use std::process;

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.root.as_deref(), cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(Some(&cli.logging_config(&config))) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let context = match CliContext::new(
        &config,
        cli.root.as_deref(),
        cli.user.clone(),
        &cli.cmis_version,
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error opening repository: {}", e);
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
