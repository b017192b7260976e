use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigFileOpts {
    #[arg(
        long,
        help = "Path of the TOML config file (default: ./code2md.toml when present).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Configuration"
    )]
    pub config: Option<String>,

    #[arg(
        long,
        help = "Ignore any config file and use built-in defaults.",
        conflicts_with = "config",
        help_heading = "Configuration"
    )]
    pub no_config: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PathOpts {
    #[arg(
        long,
        help = "Directory whose subdirectories are the projects (default: Code).",
        value_name = "DIR",
        help_heading = "Paths"
    )]
    pub code_dir: Option<PathBuf>,

    #[arg(
        long,
        help = "Directory receiving the generated documents (default: Markdown).",
        value_name = "DIR",
        help_heading = "Paths"
    )]
    pub markdown_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SectionToggles {
    #[arg(long, help = "Leave file contents out of the documents.", help_heading = "Sections")]
    pub no_content: bool,

    #[arg(long, help = "Leave the statistics table out.", help_heading = "Sections")]
    pub no_stats: bool,

    #[arg(long, help = "Leave the structure diagram out.", help_heading = "Sections")]
    pub no_structure: bool,

    #[arg(long, help = "Omit generation timestamps.", help_heading = "Sections")]
    pub no_timestamp: bool,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Convert source-code projects into Markdown documents.",
    long_about = "code2md treats every subdirectory of the code directory as a project and \nwrites one Markdown document per project (information, structure diagram, \nstatistics, embedded file contents) plus an INDEX.md linking them.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  code2md convert\n  code2md convert --project motor --no-content\n  code2md convert --code-dir ~/work/Code --max-file-size 512KiB\n  code2md list -f json",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        visible_alias = "c",
        visible_alias = "run",
        about = "Convert every project (or one with --project) to Markdown."
    )]
    Convert(ConvertArgs),

    #[command(visible_alias = "l", about = "List the projects that would be converted.")]
    List(ListArgs),

    #[command(about = "Print the effective configuration as TOML.")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub config_file: ConfigFileOpts,

    #[command(flatten)]
    pub paths: PathOpts,

    #[arg(
        short,
        long,
        help = "Convert only the project whose name or path contains PATTERN.",
        value_name = "PATTERN"
    )]
    pub project: Option<String>,

    #[command(flatten)]
    pub sections: SectionToggles,

    #[arg(
        long,
        help = "Largest file embedded verbatim, e.g. 1048576, 512KiB, 2MB.",
        value_name = "SIZE"
    )]
    pub max_file_size: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub config_file: ConfigFileOpts,

    #[command(flatten)]
    pub paths: PathOpts,

    #[arg(short = 'f', long, help = "Print structured output instead of a table.", value_name = "FORMAT", value_parser = ["json", "yaml"])]
    pub format: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub config_file: ConfigFileOpts,

    #[command(flatten)]
    pub paths: PathOpts,
}
