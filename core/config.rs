use crate::classify::ClassificationTable;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILENAME: &str = "code2md.toml";
pub const DEFAULT_CODE_BASE_DIR: &str = "Code";
pub const DEFAULT_MARKDOWN_BASE_DIR: &str = "Markdown";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;
pub const INDEX_FILENAME: &str = "INDEX.md";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub ignore: IgnoreConfig,
    #[serde(default)]
    pub classification: ClassificationTable,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    #[serde(default = "default_code_base_dir")]
    pub code_base_dir: PathBuf,
    #[serde(default = "default_markdown_base_dir")]
    pub markdown_base_dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub include_file_content: bool,
    #[serde(default = "default_true")]
    pub include_file_stats: bool,
    #[serde(default = "default_true")]
    pub include_project_structure: bool,
    #[serde(default = "default_true")]
    pub include_timestamp: bool,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IgnoreConfig {
    #[serde(default = "default_true")]
    pub use_builtin: bool,
    #[serde(default)]
    pub dirs: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_code_base_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CODE_BASE_DIR)
}
fn default_markdown_base_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MARKDOWN_BASE_DIR)
}
fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            code_base_dir: default_code_base_dir(),
            markdown_base_dir: default_markdown_base_dir(),
        }
    }
}
impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            include_file_content: default_true(),
            include_file_stats: default_true(),
            include_project_structure: default_true(),
            include_timestamp: default_true(),
            max_file_size: default_max_file_size(),
        }
    }
}
impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            use_builtin: default_true(),
            dirs: Vec::new(),
            files: Vec::new(),
        }
    }
}

impl Config {
    /// Finds the config file to load: an explicit path wins, otherwise
    /// `code2md.toml` in `working_dir` is used when it exists.
    pub fn resolve_config_path(
        working_dir: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p_str) => {
                let mut path = expand_path(Path::new(p_str));
                if !path.exists() && path.extension().is_none() {
                    path.set_extension("toml");
                }
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = working_dir.join(DEFAULT_CONFIG_FILENAME);
                if default_path.exists() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&toml_content).map_err(|e| match e {
            AppError::TomlParse(msg) => AppError::TomlParse(format!(
                "Error parsing config file '{}': {}",
                config_path.display(),
                msg
            )),
            other => other,
        })
    }

    pub fn from_toml_str(toml_content: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_content).map_err(|e| {
            AppError::TomlParse(format!("{}. Check TOML syntax and structure.", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(AppError::from)
    }

    pub fn validate(&self) -> Result<()> {
        if self.paths.code_base_dir.as_os_str().is_empty() {
            return Err(AppError::Config("paths.code_base_dir must not be empty".into()));
        }
        if self.paths.markdown_base_dir.as_os_str().is_empty() {
            return Err(AppError::Config(
                "paths.markdown_base_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Source root with `~` expanded.
    pub fn code_base_dir(&self) -> PathBuf {
        expand_path(&self.paths.code_base_dir)
    }

    /// Output directory with `~` expanded.
    pub fn markdown_base_dir(&self) -> PathBuf {
        expand_path(&self.paths.markdown_base_dir)
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).as_ref())
}
