use anyhow::{Context, Result};
use code2md_core::{BatchReport, human_size};
use colored::*;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::io::{self, Write};

use crate::commands::list::ListedProject;

/// One row per project in discovery order, then totals and the index path.
pub fn print_batch_summary(report: &BatchReport) -> Result<()> {
    if report.results.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Project").fg(Color::Green),
        Cell::new("Status").fg(Color::Green),
        Cell::new("Files").fg(Color::Green),
        Cell::new("Size").fg(Color::Green),
        Cell::new("Output / Reason").fg(Color::Green),
    ]);

    for result in &report.results {
        match result {
            Ok(doc) => {
                let stats = &doc.index_entry.file_counts;
                table.add_row(vec![
                    Cell::new(&doc.project_name).fg(Color::Cyan),
                    Cell::new("ok").fg(Color::Green),
                    Cell::new(stats.file_count()).set_alignment(CellAlignment::Right),
                    Cell::new(human_size(stats.total_bytes()))
                        .set_alignment(CellAlignment::Right)
                        .fg(Color::DarkGrey),
                    Cell::new(doc.output_path.display()),
                ]);
            }
            Err(err) => {
                table.add_row(vec![
                    Cell::new(err.project_name()).fg(Color::Cyan),
                    Cell::new("failed").fg(Color::Red),
                    Cell::new("-").set_alignment(CellAlignment::Right),
                    Cell::new("-").set_alignment(CellAlignment::Right),
                    Cell::new(err.reason()).fg(Color::Red),
                ]);
            }
        }
    }

    println!();
    println!("{}", " Conversion Summary ".green().bold().underline());
    println!("{table}");
    println!(
        "{:<12} {}",
        "Succeeded:".green(),
        report.succeeded().to_string().cyan()
    );
    let failed = report.failed().to_string();
    println!(
        "{:<12} {}",
        "Failed:".green(),
        if report.failed() > 0 {
            failed.red().bold()
        } else {
            failed.cyan()
        }
    );
    if let Some(index) = &report.index_path {
        println!(
            "{:<12} {}",
            "Index:".green(),
            index.display().to_string().blue()
        );
    } else if report.index_error.is_some() {
        println!("{:<12} {}", "Index:".green(), "not written".red().bold());
    }
    println!();
    Ok(())
}

pub fn print_project_table(projects: &[ListedProject]) -> Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Project").fg(Color::Green),
        Cell::new("Source").fg(Color::Green),
        Cell::new("Output").fg(Color::Green),
    ]);
    for project in projects {
        table.add_row(vec![
            Cell::new(&project.name).fg(Color::Cyan),
            Cell::new(&project.source_path).fg(Color::DarkGrey),
            Cell::new(&project.output_file),
        ]);
    }
    println!("{table}");
    println!(
        "{} project(s)",
        projects.len().to_string().cyan().bold()
    );
    Ok(())
}

/// Structured output for `-f json|yaml`.
pub fn print_data<T: Serialize>(data: &T, format: &str) -> Result<()> {
    let content = match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yml::to_string(data).context("Failed to serialize to YAML")?,
        _ => serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?,
    };
    write_to_stdout(&content)
}

pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
