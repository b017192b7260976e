mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use std::env;
use std::process;

use cli_args::{Cli, Commands, ConfigFileOpts, PathOpts};
use code2md_core::{AppError, Config};

/// Exit code when the run completed but at least one project failed.
pub const EXIT_PROJECTS_FAILED: i32 = 3;
/// Exit code when documents were written but `INDEX.md` was not.
pub const EXIT_INDEX_FAILED: i32 = 2;

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(code) => {
            log::info!("Application finished with code {}.", code);
            code
        }
        Err(e) => {
            let exit_code = match e.downcast_ref::<AppError>() {
                Some(AppError::Config(_)) => 1,
                Some(AppError::TomlParse(_)) => 1,
                Some(AppError::TomlSerialize(_)) => 1,
                Some(AppError::Glob(_)) => 1,
                Some(AppError::FileRead { .. }) => 2,
                Some(AppError::FileWrite { .. }) => 2,
                Some(AppError::SourceDirMissing(_)) => 2,
                Some(AppError::WalkDir(_)) => 2,
                Some(AppError::InvalidArgument(_)) => 5,
                Some(AppError::ProjectNotFound { .. }) => 5,
                Some(AppError::AmbiguousProject { .. }) => 5,
                Some(_) => 1,
                None => 1,
            };

            if !quiet || exit_code == 1 || exit_code == 5 {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }

            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli, quiet: bool) -> Result<i32> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(0);
    };
    match command {
        Commands::Convert(args) => {
            log::debug!("Executing 'convert' command...");
            commands::convert::handle_convert_command(args, quiet)
        }
        Commands::List(args) => {
            log::debug!("Executing 'list' command...");
            commands::list::handle_list_command(args, quiet)?;
            Ok(0)
        }
        Commands::Config(args) => {
            log::debug!("Executing 'config' command...");
            commands::config::handle_config_command(args)?;
            Ok(0)
        }
    }
}

/// Loads the config file (if any) from the working directory and applies the
/// path overrides shared by all commands.
pub fn load_config_for_command(config_opts: &ConfigFileOpts, paths: &PathOpts) -> Result<Config> {
    let working_dir = env::current_dir().context("Failed to determine working directory")?;
    let config_path = Config::resolve_config_path(
        &working_dir,
        config_opts.config.as_ref(),
        config_opts.no_config,
    )
    .context("Failed to resolve configuration path")?;

    let mut config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(dir) = &paths.code_dir {
        config.paths.code_base_dir = dir.clone();
    }
    if let Some(dir) = &paths.markdown_dir {
        config.paths.markdown_base_dir = dir.clone();
    }
    config.validate().context("Invalid configuration after CLI overrides")?;

    log::trace!("Effective config: {:?}", config);
    Ok(config)
}
