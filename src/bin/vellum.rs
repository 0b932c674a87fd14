//! Vellum CLI Binary
//!
//! Command-line interface for reconciling a local directory with a replicated document.

use clap::Parser;
use std::process;
use tracing::{error, info};
use vellum::cli::{Cli, RunContext};
use vellum::config::ConfigLoader;
use vellum::logging::{init_logging, resolve_log_file_path, LoggingConfig};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Vellum CLI starting");

    let context = match RunContext::new(cli.root.clone(), cli.config.clone()) {
        Ok(ctx) => {
            info!(root = ?ctx.root(), "CLI context initialized");
            ctx
        }
        Err(e) => {
            error!("Error opening mirror root: {}", e);
            eprintln!("{}", vellum::cli::map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", vellum::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args, environment, and config file
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    if !cli.verbose {
        return LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
    }

    let mut config = match &cli.config {
        Some(config_path) => ConfigLoader::load_from_file(config_path),
        None => ConfigLoader::load(&cli.root),
    }
    .map(|c| c.logging)
    .unwrap_or_default();

    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    config.file =
        resolve_log_file_path(cli.log_file.clone(), config.file.take(), Some(&cli.root)).ok();

    config
}
