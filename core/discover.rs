use crate::classify::Classifier;
use crate::config::INDEX_FILENAME;
use crate::error::{AppError, Result};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// `20240115`, `2024-01-15`, `2024_01_15_release`, ...
static DATE_STAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}[-_.]?\d{2}[-_.]?\d{2}(?:$|[-_. ])").expect("valid regex"));
static TRAILING_DATE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_\d{8}$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectEntry {
    pub name: String,
    pub source_path: PathBuf,
    /// File stem of the generated document, unique within one batch.
    pub output_stem: String,
    pub discovered_at: DateTime<Local>,
}

/// Lists the projects under `code_base_dir` in name order.
///
/// Every non-ignored subdirectory is a project, except date-stamped wrapper
/// directories (a date-like name and nothing but subdirectories inside),
/// whose own subdirectories are the projects instead. Empty directories are
/// still returned; the driver reports them as failed.
pub fn discover_projects(
    code_base_dir: &Path,
    classifier: &Classifier,
    discovered_at: DateTime<Local>,
) -> Result<Vec<ProjectEntry>> {
    if !code_base_dir.is_dir() {
        return Err(AppError::SourceDirMissing(code_base_dir.to_path_buf()));
    }
    log::info!("Discovering projects in: {}", code_base_dir.display());

    let mut names = OutputNames::default();
    let mut projects = Vec::new();
    for candidate in list_subdirectories(code_base_dir, classifier)? {
        if is_date_wrapper(&candidate, classifier) {
            log::debug!("Descending into dated wrapper: {}", candidate.display());
            for inner in list_subdirectories(&candidate, classifier)? {
                projects.push(make_entry(inner, &mut names, discovered_at));
            }
        } else {
            projects.push(make_entry(candidate, &mut names, discovered_at));
        }
    }
    log::info!("Discovered {} project(s).", projects.len());
    Ok(projects)
}

fn make_entry(
    source_path: PathBuf,
    names: &mut OutputNames,
    discovered_at: DateTime<Local>,
) -> ProjectEntry {
    let name = source_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    let output_stem = names.allocate(&name);
    log::debug!(
        "Project '{}' at {} -> {}.md",
        name,
        source_path.display(),
        output_stem
    );
    ProjectEntry {
        name,
        source_path,
        output_stem,
        discovered_at,
    }
}

fn list_subdirectories(dir: &Path, classifier: &Classifier) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if classifier.is_ignored(&name, true) {
            log::trace!("Skipping ignored directory: {}", entry.path().display());
            continue;
        }
        dirs.push(entry.into_path());
    }
    Ok(dirs)
}

fn is_date_wrapper(dir: &Path, classifier: &Classifier) -> bool {
    let Some(name) = dir.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    if !DATE_STAMP.is_match(&name) {
        return false;
    }
    let mut has_subdir = false;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let Ok(entry) = entry else {
            return false;
        };
        let entry_name = entry.file_name().to_string_lossy();
        let is_dir = entry.file_type().is_dir();
        if classifier.is_ignored(&entry_name, is_dir) {
            continue;
        }
        if !is_dir {
            return false;
        }
        has_subdir = true;
    }
    has_subdir
}

/// Drops a trailing `_YYYYMMDD` stamp: `Motor_20240115` -> `Motor`.
pub fn normalize_project_name(name: &str) -> String {
    TRAILING_DATE_SUFFIX.replace(name, "").into_owned()
}

/// Makes a name safe to use as a file stem on common filesystems.
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "project".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Hands out document stems, appending `_2`, `_3`, ... on collisions.
/// Comparison ignores case so outputs stay distinct on case-insensitive
/// filesystems; the index file name is reserved.
#[derive(Debug)]
pub struct OutputNames {
    used: HashSet<String>,
}

impl Default for OutputNames {
    fn default() -> Self {
        let reserved = Path::new(INDEX_FILENAME)
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        OutputNames {
            used: HashSet::from([reserved]),
        }
    }
}

impl OutputNames {
    pub fn allocate(&mut self, project_name: &str) -> String {
        let base = sanitize_file_stem(&normalize_project_name(project_name));
        let mut candidate = base.clone();
        let mut suffix = 2;
        while !self.used.insert(candidate.to_lowercase()) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        candidate
    }
}

/// Picks the single project whose name, or path below `code_base_dir`,
/// contains `pattern` (case-insensitive). An exact name match wins over
/// substring matches.
pub fn select_project(
    projects: Vec<ProjectEntry>,
    code_base_dir: &Path,
    pattern: &str,
) -> Result<ProjectEntry> {
    let needle = pattern.to_lowercase();
    let exact_count = projects
        .iter()
        .filter(|p| p.name.to_lowercase() == needle)
        .count();
    if exact_count == 1 {
        if let Some(found) = projects
            .iter()
            .find(|p| p.name.to_lowercase() == needle)
        {
            return Ok(found.clone());
        }
    }

    let (mut matches, rest): (Vec<ProjectEntry>, Vec<ProjectEntry>) =
        projects.into_iter().partition(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.source_path
                    .strip_prefix(code_base_dir)
                    .unwrap_or(&p.source_path)
                    .to_string_lossy()
                    .to_lowercase()
                    .contains(&needle)
        });

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(AppError::ProjectNotFound {
            pattern: pattern.to_string(),
            available: rest.into_iter().map(|p| p.name).collect(),
        }),
        _ => Err(AppError::AmbiguousProject {
            pattern: pattern.to_string(),
            matches: matches
                .into_iter()
                .map(|p| p.source_path.display().to_string())
                .collect(),
        }),
    }
}
