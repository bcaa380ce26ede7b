mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use cli_args::Cli;
use treeprompt_core::{AppError, Config};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match commands::generate::handle_generate_command(&cli_args) {
        Ok(_) => {
            log::debug!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = exit_code_for(&e);
            // Fatal errors are printed even with -q, where logging is off.
            let stderr = io::stderr();
            if report_error(&mut stderr.lock(), &e).is_err() {
                log::error!("Application failed: {:#}", e);
            }
            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn report_error<W: Write>(out: &mut W, err: &anyhow::Error) -> io::Result<()> {
    writeln!(out, "{} {:#}", "Error:".red().bold(), err)
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::Config(_)) => 1,
        Some(AppError::TomlParse(_)) => 1,
        Some(AppError::FileRead { .. }) => 1,
        Some(AppError::InvalidArgument(_)) => 1,
        Some(AppError::Io(_)) => 2,
        Some(AppError::WalkDir(_)) => 2,
        Some(AppError::RuleLoading(_)) => 2,
        Some(AppError::EndpointUnreachable { .. }) => 3,
        Some(AppError::EndpointStatus { .. }) => 3,
        Some(AppError::StreamDecode(_)) => 4,
        Some(_) => 1,
        None => 1,
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Info,  // Default: progress lines
            1 => log::LevelFilter::Debug, // -v
            _ => log::LevelFilter::Trace, // -vv+
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn merge_config_with_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    log::trace!("Applying CLI overrides to config...");

    if let Some(model) = &cli.generation.model {
        config.generation.model = model.clone();
    }
    if let Some(endpoint) = &cli.generation.endpoint {
        config.generation.endpoint = endpoint.clone();
    }
    if let Some(rules_file) = &cli.collect.rules_file {
        config.general.rules_file = rules_file.clone();
    }
    if cli.collect.absolute_paths {
        config.general.absolute_paths = true;
    }

    log::trace!("Config after CLI overrides: {:?}", config);
    config
}

pub fn load_config_for_command(project_root: &Path, cli: &Cli) -> Result<Config> {
    let config_path = Config::resolve_config_path(
        project_root,
        cli.project_config.context_file.as_ref(),
        cli.project_config.disable_context_file,
    )
    .context("Failed to resolve configuration path")?;

    let config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let config = merge_config_with_cli_overrides(config, cli);
    if config.generation.model.trim().is_empty() {
        return Err(AppError::InvalidArgument("Model name must not be empty".to_string()).into());
    }
    Ok(config)
}
