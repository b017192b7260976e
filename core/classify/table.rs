// core/classify/table.rs
use super::Category;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// One row of the classification table: the statistics bucket and the
/// fenced-block language tag used when rendering content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageEntry {
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationTable {
    #[serde(default)]
    pub extensions: IndexMap<String, LanguageEntry>,
    #[serde(default)]
    pub filenames: IndexMap<String, LanguageEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IgnoreRules {
    #[serde(default)]
    pub dirs: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

static BUILTIN_TABLE: Lazy<ClassificationTable> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/languages.yaml"
    ));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/languages.yaml")
});
static BUILTIN_IGNORE_PATTERNS: Lazy<IgnoreRules> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/builtin_ignores.yaml"
    ));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/builtin_ignores.yaml")
});

pub fn get_builtin_table() -> &'static ClassificationTable {
    &BUILTIN_TABLE
}
pub fn get_builtin_ignore_patterns() -> &'static IgnoreRules {
    &BUILTIN_IGNORE_PATTERNS
}

/// Table keys are stored lowercase and without a leading dot so that
/// `".C"`, `"c"` and `"C"` in a user config all address the same row.
pub fn normalize_key(key: &str) -> String {
    key.trim().trim_start_matches('.').to_lowercase()
}

impl ClassificationTable {
    /// Returns a copy of this table with `overrides` layered on top; an
    /// override replaces the whole row for its key.
    pub fn merged_with(&self, overrides: &ClassificationTable) -> ClassificationTable {
        let mut merged = self.clone();
        for (ext, entry) in &overrides.extensions {
            log::trace!("Classification override for extension '{}': {:?}", ext, entry);
            merged.extensions.insert(normalize_key(ext), entry.clone());
        }
        for (name, entry) in &overrides.filenames {
            log::trace!("Classification override for file name '{}': {:?}", name, entry);
            merged.filenames.insert(name.trim().to_lowercase(), entry.clone());
        }
        merged
    }
}
