use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Failures that stop a whole command, as opposed to a single project.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("TOML Parsing Error: {0}")]
    TomlParse(String),

    #[error("TOML Serialization Error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("File Read Error: Path '{path}', Error: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File Write Error: Path '{path}', Error: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source directory not found: {}", .0.display())]
    SourceDirMissing(PathBuf),

    #[error("WalkDir Error: {0}")]
    WalkDir(String),

    #[error("Glob Pattern Error: {0}")]
    Glob(String),

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),

    #[error("No project matches '{pattern}' (available: {})", available.join(", "))]
    ProjectNotFound {
        pattern: String,
        available: Vec<String>,
    },

    #[error("Pattern '{pattern}' matches several projects: {}", matches.join(", "))]
    AmbiguousProject {
        pattern: String,
        matches: Vec<String>,
    },
}

impl From<globset::Error> for AppError {
    fn from(err: globset::Error) -> Self {
        AppError::Glob(format!("Globset error: {}", err))
    }
}

impl From<walkdir::Error> for AppError {
    fn from(err: walkdir::Error) -> Self {
        AppError::WalkDir(err.to_string())
    }
}

/// A single project that could not be turned into a document. The batch keeps
/// going; these are collected into the final report.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("project '{name}' has no processable files under {}", path.display())]
    Empty { name: String, path: PathBuf },

    #[error("project '{name}' could not be read: {reason}")]
    Unreadable {
        name: String,
        path: PathBuf,
        reason: String,
    },

    #[error("failed to write document for '{name}' to {}: {source}", path.display())]
    Write {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProjectError {
    pub fn project_name(&self) -> &str {
        match self {
            ProjectError::Empty { name, .. }
            | ProjectError::Unreadable { name, .. }
            | ProjectError::Write { name, .. } => name,
        }
    }

    /// Short reason used in batch summaries, without the project name prefix.
    pub fn reason(&self) -> String {
        match self {
            ProjectError::Empty { .. } => "no processable files".to_string(),
            ProjectError::Unreadable { reason, .. } => format!("unreadable: {}", reason),
            ProjectError::Write { path, source, .. } => {
                format!("write failed ({}): {}", path.display(), source)
            }
        }
    }
}
