use crate::classify::{Category, Classifier};
use crate::config::{Config, INDEX_FILENAME};
use crate::discover::{ProjectEntry, discover_projects, select_project};
use crate::document::{GeneratedDocument, IndexEntry, assemble, render_index, write_atomically};
use crate::error::{AppError, ProjectError, Result};
use crate::render::render_files;
use crate::stats::aggregate;
use crate::tree::build_tree;
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Outcome of one run: one result per project, in discovery order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<std::result::Result<GeneratedDocument, ProjectError>>,
    /// Set when the index was (re)written.
    pub index_path: Option<PathBuf>,
    /// Set when documents were produced but the index could not be written.
    pub index_error: Option<AppError>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn documents(&self) -> impl Iterator<Item = &GeneratedDocument> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProjectError> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }
}

/// Converts every project under the configured code directory.
pub fn run(config: &Config) -> Result<BatchReport> {
    run_at(config, Local::now())
}

/// Like [`run`], stamping every document and the index with `timestamp`.
/// The same inputs and timestamp produce byte-identical output.
pub fn run_at(config: &Config, timestamp: DateTime<Local>) -> Result<BatchReport> {
    let classifier = Classifier::from_config(config)?;
    let projects = discover_projects(&config.code_base_dir(), &classifier, timestamp)?;

    let mut report = BatchReport::default();
    for project in &projects {
        let outcome = process_project(project, &classifier, config);
        match &outcome {
            Ok(doc) => log::info!(
                "Converted '{}' -> {}",
                project.name,
                doc.output_path.display()
            ),
            Err(e) => log::warn!("Skipping '{}': {}", project.name, e),
        }
        report.results.push(outcome);
    }

    if report.succeeded() > 0 {
        let entries: Vec<IndexEntry> = report.documents().map(|d| d.index_entry.clone()).collect();
        let index_path = config.markdown_base_dir().join(INDEX_FILENAME);
        let generated_at = config.output.include_timestamp.then_some(&timestamp);
        match write_atomically(&index_path, &render_index(&entries, generated_at)) {
            Ok(()) => {
                log::info!("Index written to {}", index_path.display());
                report.index_path = Some(index_path);
            }
            Err(e) => {
                log::error!("Failed to write index {}: {}", index_path.display(), e);
                report.index_error = Some(AppError::FileWrite {
                    path: index_path,
                    source: e,
                });
            }
        }
    } else {
        log::warn!("No project was converted; index not written.");
    }

    log::info!(
        "Batch finished: {} succeeded, {} failed.",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

/// Converts only the project selected by `pattern`. The index is left alone.
pub fn run_single(config: &Config, pattern: &str) -> Result<BatchReport> {
    let classifier = Classifier::from_config(config)?;
    let code_base_dir = config.code_base_dir();
    let projects = discover_projects(&code_base_dir, &classifier, Local::now())?;
    let project = select_project(projects, &code_base_dir, pattern)?;
    log::info!("Selected project '{}'", project.name);
    Ok(BatchReport {
        results: vec![process_project(&project, &classifier, config)],
        ..BatchReport::default()
    })
}

/// Tree, statistics, rendering, assembly and write for one project.
/// Any failure is confined to this project.
pub fn process_project(
    project: &ProjectEntry,
    classifier: &Classifier,
    config: &Config,
) -> std::result::Result<GeneratedDocument, ProjectError> {
    log::debug!("Processing project: {}", project.source_path.display());
    let tree = build_tree(&project.source_path, classifier).map_err(|e| {
        ProjectError::Unreadable {
            name: project.name.clone(),
            path: project.source_path.clone(),
            reason: e.to_string(),
        }
    })?;

    let has_files = tree
        .files()
        .iter()
        .any(|node| node.category != Category::Ignored);
    if !has_files {
        return Err(ProjectError::Empty {
            name: project.name.clone(),
            path: project.source_path.clone(),
        });
    }

    let stats = aggregate(&tree);
    let rendered = if config.output.include_file_content {
        render_files(&tree, classifier, config)
    } else {
        Vec::new()
    };

    let document = assemble(project, &tree, &stats, &rendered, config);
    document.write().map_err(|e| ProjectError::Write {
        name: project.name.clone(),
        path: document.output_path.clone(),
        source: e,
    })?;
    Ok(document)
}
