use crate::cli_args::ListArgs;
use crate::load_config_for_command;
use crate::output::{print_data, print_project_table};
use anyhow::{Context, Result};
use chrono::Local;
use code2md_core::{self as core, Classifier};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ListedProject {
    pub name: String,
    pub source_path: String,
    pub output_file: String,
}

pub fn handle_list_command(args: ListArgs, quiet: bool) -> Result<()> {
    let config = load_config_for_command(&args.config_file, &args.paths)
        .context("Failed to load configuration for list command")?;
    let classifier =
        Classifier::from_config(&config).context("Failed to build file classifier")?;

    let projects = core::discover_projects(&config.code_base_dir(), &classifier, Local::now())
        .context("Failed to discover projects")?;
    let listed: Vec<ListedProject> = projects
        .iter()
        .map(|p| ListedProject {
            name: p.name.clone(),
            source_path: p.source_path.display().to_string(),
            output_file: format!("{}.md", p.output_stem),
        })
        .collect();

    match args.format.as_deref() {
        Some(format) => print_data(&listed, format),
        None if listed.is_empty() => {
            if !quiet {
                println!("No projects found in {}", config.code_base_dir().display());
            }
            Ok(())
        }
        None => print_project_table(&listed),
    }
}
