pub mod classify;
pub mod config;
pub mod discover;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod stats;
pub mod tree;

pub use classify::{Category, ClassificationTable, Classifier, LanguageEntry};
pub use config::{Config, IgnoreConfig, OutputConfig, PathsConfig};
pub use discover::{ProjectEntry, discover_projects, select_project};
pub use document::{GeneratedDocument, IndexEntry, assemble, render_index};
pub use error::{AppError, ProjectError, Result};
pub use pipeline::{BatchReport, process_project, run, run_at, run_single};
pub use render::{OmitReason, RenderedFile, human_size, render_file, render_files};
pub use stats::{CategoryStats, Statistics, aggregate};
pub use tree::{FileNode, build_tree};
