use crate::cli_args::ConfigArgs;
use crate::load_config_for_command;
use crate::output::write_to_stdout;
use anyhow::{Context, Result};

/// Prints the configuration a `convert` run would use, file values and path
/// overrides applied.
pub fn handle_config_command(args: ConfigArgs) -> Result<()> {
    let config = load_config_for_command(&args.config_file, &args.paths)
        .context("Failed to load configuration for config command")?;
    let toml_string = config
        .to_toml_string()
        .context("Failed to serialize configuration to TOML")?;
    write_to_stdout(&toml_string)
}
