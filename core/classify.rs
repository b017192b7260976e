use crate::config::Config;
use crate::error::{AppError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

pub mod table;

pub use table::{
    ClassificationTable, IgnoreRules, LanguageEntry, get_builtin_ignore_patterns,
    get_builtin_table,
};

const DEFAULT_LANGUAGE_TAG: &str = "text";

/// Statistics bucket of a file. Variant order is the order used in
/// statistics tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Source,
    Header,
    ProjectMeta,
    Config,
    Other,
    Ignored,
}

impl Category {
    /// Every category that can show up in a rendered document.
    pub const COUNTED: [Category; 5] = [
        Category::Source,
        Category::Header,
        Category::ProjectMeta,
        Category::Config,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Source => "Source",
            Category::Header => "Header",
            Category::ProjectMeta => "Project metadata",
            Category::Config => "Config",
            Category::Other => "Other",
            Category::Ignored => "Ignored",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable lookup built once per run from a classification table and a set
/// of ignore patterns. Alternate behavior is obtained by building it from
/// different tables, never by changing the lookup code.
#[derive(Debug, Clone)]
pub struct Classifier {
    extensions: HashMap<String, LanguageEntry>,
    filenames: HashMap<String, LanguageEntry>,
    ignore_dirs: GlobSet,
    ignore_files: GlobSet,
}

impl Classifier {
    pub fn new(table: &ClassificationTable, ignores: &IgnoreRules) -> Result<Self> {
        let extensions = table
            .extensions
            .iter()
            .map(|(k, v)| (table::normalize_key(k), v.clone()))
            .collect();
        let filenames = table
            .filenames
            .iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.clone()))
            .collect();
        log::trace!(
            "Building classifier ({} extensions, {} file names, {} dir ignores, {} file ignores)",
            table.extensions.len(),
            table.filenames.len(),
            ignores.dirs.len(),
            ignores.files.len()
        );
        Ok(Self {
            extensions,
            filenames,
            ignore_dirs: build_name_glob_set(&ignores.dirs)?,
            ignore_files: build_name_glob_set(&ignores.files)?,
        })
    }

    /// Builtin table and ignores, extended by whatever the config adds.
    pub fn from_config(config: &Config) -> Result<Self> {
        let table = get_builtin_table().merged_with(&config.classification);
        let mut ignores = if config.ignore.use_builtin {
            get_builtin_ignore_patterns().clone()
        } else {
            log::debug!("Built-in ignore patterns disabled by configuration.");
            IgnoreRules::default()
        };
        ignores.dirs.extend(config.ignore.dirs.iter().cloned());
        ignores.files.extend(config.ignore.files.iter().cloned());
        Self::new(&table, &ignores)
    }

    pub fn classify(&self, file_name: &str) -> Category {
        if self.ignore_files.is_match(file_name) {
            return Category::Ignored;
        }
        self.lookup(file_name)
            .map_or(Category::Other, |entry| entry.category)
    }

    /// True when an entry with this name must be pruned from traversal.
    /// Directory patterns only apply to directories and file patterns only to
    /// files, so a file called `build` survives a `build` directory rule.
    pub fn is_ignored(&self, name: &str, is_dir: bool) -> bool {
        if is_dir {
            self.ignore_dirs.is_match(name)
        } else {
            self.ignore_files.is_match(name)
        }
    }

    pub fn language_tag(&self, file_name: &str) -> &str {
        self.lookup(file_name)
            .and_then(|entry| entry.language.as_deref())
            .unwrap_or(DEFAULT_LANGUAGE_TAG)
    }

    // Exact file names win over extensions (`CMakeLists.txt` is not plain text).
    fn lookup(&self, file_name: &str) -> Option<&LanguageEntry> {
        let lower_name = file_name.to_lowercase();
        if let Some(entry) = self.filenames.get(&lower_name) {
            return Some(entry);
        }
        let extension = Path::new(&lower_name)
            .extension()
            .and_then(|ext| ext.to_str())?;
        self.extensions.get(extension)
    }
}

fn build_name_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern_str in patterns {
        let processed_pattern = pattern_str.trim().trim_end_matches('/');
        if processed_pattern.is_empty() {
            continue;
        }
        match Glob::new(processed_pattern) {
            Ok(glob) => {
                log::trace!("Adding ignore pattern: {}", processed_pattern);
                builder.add(glob);
            }
            Err(e) => {
                log::error!("Invalid ignore pattern \"{}\": {}", pattern_str, e);
                return Err(AppError::Glob(format!(
                    "Invalid ignore pattern \"{}\": {}",
                    pattern_str, e
                )));
            }
        }
    }
    builder.build().map_err(AppError::from)
}
