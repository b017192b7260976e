use crate::cli_args::ConvertArgs;
use crate::output;
use crate::{EXIT_INDEX_FAILED, EXIT_PROJECTS_FAILED, load_config_for_command};
use anyhow::{Context, Result};
use byte_unit::Byte;
use code2md_core::{self as core, AppError, Config};
use colored::Colorize;
use std::str::FromStr;

pub fn handle_convert_command(args: ConvertArgs, quiet: bool) -> Result<i32> {
    let mut config = load_config_for_command(&args.config_file, &args.paths)
        .context("Failed to load configuration")?;
    apply_convert_overrides(&mut config, &args)?;

    log::info!(
        "Converting projects from {} into {}",
        config.code_base_dir().display(),
        config.markdown_base_dir().display()
    );

    let report = match &args.project {
        Some(pattern) => core::run_single(&config, pattern)
            .with_context(|| format!("Failed to convert project matching '{}'", pattern))?,
        None => core::run(&config).context("Batch conversion failed")?,
    };

    if !quiet {
        output::print_batch_summary(&report)?;
    }

    if let Some(err) = &report.index_error {
        eprintln!("{} {}", "Error:".red().bold(), err);
        return Ok(EXIT_INDEX_FAILED);
    }
    if report.failed() > 0 {
        log::warn!("{} project(s) could not be converted.", report.failed());
        return Ok(EXIT_PROJECTS_FAILED);
    }
    if report.results.is_empty() && !quiet {
        println!(
            "{} No projects found in {}",
            "!".yellow(),
            config.code_base_dir().display()
        );
    }
    Ok(0)
}

fn apply_convert_overrides(config: &mut Config, args: &ConvertArgs) -> Result<()> {
    log::trace!("Applying convert command CLI overrides to config...");
    if args.sections.no_content {
        config.output.include_file_content = false;
    }
    if args.sections.no_stats {
        config.output.include_file_stats = false;
    }
    if args.sections.no_structure {
        config.output.include_project_structure = false;
    }
    if args.sections.no_timestamp {
        config.output.include_timestamp = false;
    }
    if let Some(size) = &args.max_file_size {
        config.output.max_file_size = parse_size(size)?;
    }
    Ok(())
}

/// Accepts plain byte counts and unit strings like `512KiB` or `2 MB`.
fn parse_size(value: &str) -> Result<u64> {
    let byte_value = Byte::from_str(value.trim()).map_err(|e| {
        AppError::InvalidArgument(format!("Invalid --max-file-size '{}': {}", value, e))
    })?;
    Ok(byte_value.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_unit_sizes() {
        assert_eq!(parse_size("1048576").unwrap(), 1_048_576);
        assert_eq!(parse_size("512KiB").unwrap(), 512 * 1024);
        assert_eq!(parse_size("2MB").unwrap(), 2_000_000);
        assert!(parse_size("lots").is_err());
    }
}
