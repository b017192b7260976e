use crate::classify::Category;
use crate::config::Config;
use crate::discover::ProjectEntry;
use crate::render::{RenderedFile, human_size};
use crate::stats::Statistics;
use crate::tree::FileNode;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What the index needs to know about one written document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub project_name: String,
    /// Path relative to the output directory; documents are stored flat so
    /// this is just the file name.
    pub relative_output_path: String,
    pub file_counts: Statistics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDocument {
    pub project_name: String,
    pub output_path: PathBuf,
    pub sections: Vec<String>,
    pub index_entry: IndexEntry,
}

impl GeneratedDocument {
    pub fn to_markdown(&self) -> String {
        self.sections.join("\n")
    }

    /// Writes the whole document or nothing: content goes to a temporary file
    /// in the target directory which is then renamed over the target.
    pub fn write(&self) -> io::Result<()> {
        write_atomically(&self.output_path, &self.to_markdown())
    }
}

/// Builds the Markdown for one project. Sections are header, structure,
/// statistics, contents; each of the last three is gated only by its own flag.
pub fn assemble(
    project: &ProjectEntry,
    tree: &FileNode,
    stats: &Statistics,
    rendered_files: &[RenderedFile<'_>],
    config: &Config,
) -> GeneratedDocument {
    log::debug!("Assembling document for project '{}'", project.name);
    let mut sections = vec![header_section(project, config)];

    if config.output.include_project_structure {
        sections.push(structure_section(&project.name, tree));
    }
    if config.output.include_file_stats {
        sections.push(statistics_section(stats));
    }
    if config.output.include_file_content {
        sections.push("## File Contents\n".to_string());
        sections.extend(
            rendered_files
                .iter()
                .map(|rendered| file_section(rendered, config.output.include_timestamp)),
        );
    }

    let file_name = format!("{}.md", project.output_stem);
    GeneratedDocument {
        project_name: project.name.clone(),
        output_path: config.markdown_base_dir().join(&file_name),
        sections,
        index_entry: IndexEntry {
            project_name: project.name.clone(),
            relative_output_path: file_name,
            file_counts: stats.clone(),
        },
    }
}

fn header_section(project: &ProjectEntry, config: &Config) -> String {
    let mut out = format!("# {}\n\n## Project Information\n\n", project.name);
    out.push_str(&format!("- **Project Name**: {}\n", project.name));
    if config.output.include_timestamp {
        out.push_str(&format!(
            "- **Generated**: {}\n",
            project.discovered_at.format(TIMESTAMP_FORMAT)
        ));
    }
    out.push_str(&format!(
        "- **Source Path**: `{}`\n",
        project.source_path.display()
    ));
    out
}

fn structure_section(project_name: &str, tree: &FileNode) -> String {
    format!(
        "## Project Structure\n\n```text\n{}```\n",
        render_tree_diagram(project_name, tree)
    )
}

/// Box-drawing diagram of `tree`, one line per node, rooted at
/// `root_label/`.
pub fn render_tree_diagram(root_label: &str, tree: &FileNode) -> String {
    let mut out = format!("{}/\n", root_label);
    push_tree_lines(&mut out, tree, "");
    out
}

fn push_tree_lines(out: &mut String, node: &FileNode, prefix: &str) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i + 1 == count;
        let branch = if is_last { "└── " } else { "├── " };
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(child.name());
        if child.is_directory {
            out.push('/');
        }
        if child.unreadable.is_some() {
            out.push_str(" [unreadable]");
        }
        out.push('\n');
        if child.is_directory {
            let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
            push_tree_lines(out, child, &child_prefix);
        }
    }
}

fn statistics_section(stats: &Statistics) -> String {
    let mut out = String::from(
        "## File Statistics\n\n| Category | Files | Bytes | Size |\n| --- | ---: | ---: | ---: |\n",
    );
    for category in Category::COUNTED {
        let row = stats.get(category);
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            category,
            row.file_count,
            row.total_bytes,
            human_size(row.total_bytes)
        ));
    }
    out.push_str(&format!(
        "| **Total** | **{}** | **{}** | **{}** |\n",
        stats.file_count(),
        stats.total_bytes(),
        human_size(stats.total_bytes())
    ));
    out
}

fn file_section(rendered: &RenderedFile<'_>, include_timestamp: bool) -> String {
    let node = rendered.node;
    let mut out = format!(
        "### `{}`\n\n- **Language**: {}\n- **Category**: {}\n- **Size**: {}\n",
        node.relative_path,
        rendered.language,
        node.category,
        human_size(node.size_bytes)
    );
    if include_timestamp {
        if let Some(modified) = &node.modified {
            out.push_str(&format!(
                "- **Modified**: {}\n",
                modified.format(TIMESTAMP_FORMAT)
            ));
        }
    }
    out.push('\n');
    out.push_str(&rendered.body_markdown());
    out
}

/// The `INDEX.md` body: one row per document, sorted by project name.
pub fn render_index(entries: &[IndexEntry], generated_at: Option<&DateTime<Local>>) -> String {
    let mut sorted: Vec<&IndexEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| {
        a.project_name
            .cmp(&b.project_name)
            .then_with(|| a.relative_output_path.cmp(&b.relative_output_path))
    });

    let mut out = String::from("# Project Index\n\n");
    if let Some(ts) = generated_at {
        out.push_str(&format!("- **Generated**: {}\n", ts.format(TIMESTAMP_FORMAT)));
    }
    out.push_str(&format!("- **Projects**: {}\n", sorted.len()));
    if sorted.is_empty() {
        return out;
    }

    out.push_str("\n## Projects\n\n| Project | Files | Source | Header | Size |\n| --- | ---: | ---: | ---: | ---: |\n");
    for entry in sorted {
        let stats = &entry.file_counts;
        out.push_str(&format!(
            "| [{}]({}) | {} | {} | {} | {} |\n",
            escape_link_text(&entry.project_name),
            urlencoding::encode(&entry.relative_output_path),
            stats.file_count(),
            stats.get(Category::Source).file_count,
            stats.get(Category::Header).file_count,
            human_size(stats.total_bytes())
        ));
    }
    out
}

/// Backslash-escapes characters that would end the link text or the table
/// cell early.
fn escape_link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '[' | ']' | '|' | '*' | '_' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn write_atomically(path: &Path, content: &str) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    log::trace!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::OmitReason;
    use crate::stats::aggregate;
    use chrono::TimeZone;

    fn file(path: &str, category: Category, size: u64) -> FileNode {
        FileNode {
            relative_path: path.to_string(),
            absolute_path: PathBuf::from("/src/Foo").join(path),
            category,
            size_bytes: size,
            is_directory: false,
            children: Vec::new(),
            unreadable: None,
            modified: None,
        }
    }

    fn dir(path: &str, children: Vec<FileNode>) -> FileNode {
        FileNode {
            relative_path: path.to_string(),
            absolute_path: PathBuf::from("/src/Foo").join(path),
            category: Category::Other,
            size_bytes: 0,
            is_directory: true,
            children,
            unreadable: None,
            modified: None,
        }
    }

    fn sample_tree() -> FileNode {
        dir(
            "",
            vec![
                dir(
                    "inc",
                    vec![file("inc/b.h", Category::Header, 30)],
                ),
                dir("lib", vec![dir("lib/empty", Vec::new())]),
                file("a.c", Category::Source, 50),
            ],
        )
    }

    fn project() -> ProjectEntry {
        ProjectEntry {
            name: "Foo".to_string(),
            source_path: PathBuf::from("/src/Foo"),
            output_stem: "Foo".to_string(),
            discovered_at: Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap(),
        }
    }

    fn rendered<'a>(tree: &'a FileNode) -> Vec<RenderedFile<'a>> {
        let files = tree.files();
        vec![
            RenderedFile {
                node: files[0],
                language: "c".to_string(),
                content: Some("#define B 1\n".to_string()),
                truncated: false,
                omitted: None,
            },
            RenderedFile {
                node: files[1],
                language: "c".to_string(),
                content: None,
                truncated: true,
                omitted: Some(OmitReason::TooLarge { size: 50, limit: 10 }),
            },
        ]
    }

    #[test]
    fn tree_diagram_uses_box_drawing() {
        let diagram = render_tree_diagram("Foo", &sample_tree());
        let expected = "Foo/\n\
                        ├── inc/\n\
                        │   └── b.h\n\
                        ├── lib/\n\
                        │   └── empty/\n\
                        └── a.c\n";
        assert_eq!(diagram, expected);
    }

    #[test]
    fn full_document_has_sections_in_order() {
        let tree = sample_tree();
        let stats = aggregate(&tree);
        let files = rendered(&tree);
        let doc = assemble(&project(), &tree, &stats, &files, &Config::default());
        let md = doc.to_markdown();

        let header = md.find("## Project Information").unwrap();
        let structure = md.find("## Project Structure").unwrap();
        let statistics = md.find("## File Statistics").unwrap();
        let contents = md.find("## File Contents").unwrap();
        assert!(header < structure && structure < statistics && statistics < contents);

        assert!(md.starts_with("# Foo\n"));
        assert!(md.contains("- **Generated**: 2024-03-09 14:05:00\n"));
        assert!(md.contains("- **Source Path**: `/src/Foo`\n"));
        assert!(md.contains("| Source | 1 | 50 | 50 B |"));
        assert!(md.contains("| Header | 1 | 30 | 30 B |"));
        assert!(md.contains("| **Total** | **2** | **80** | **80 B** |"));
        assert!(md.contains("```c\n#define B 1\n```\n"));
        assert!(md.contains("> Content omitted: file too large (50 bytes, limit 10).\n"));
        assert!(md.find("### `inc/b.h`").unwrap() < md.find("### `a.c`").unwrap());

        assert_eq!(doc.output_path, PathBuf::from("Markdown/Foo.md"));
        assert_eq!(doc.index_entry.relative_output_path, "Foo.md");
        assert_eq!(doc.index_entry.file_counts.file_count(), 2);
    }

    #[test]
    fn each_flag_gates_only_its_section() {
        let tree = sample_tree();
        let stats = aggregate(&tree);
        let files = rendered(&tree);

        let mut config = Config::default();
        config.output.include_file_content = false;
        let md = assemble(&project(), &tree, &stats, &files, &config).to_markdown();
        assert!(md.contains("## Project Structure"));
        assert!(md.contains("## File Statistics"));
        assert!(!md.contains("## File Contents"));
        assert!(!md.contains("#define B 1"));

        let mut config = Config::default();
        config.output.include_project_structure = false;
        config.output.include_file_stats = false;
        let md = assemble(&project(), &tree, &stats, &files, &config).to_markdown();
        assert!(!md.contains("## Project Structure"));
        assert!(!md.contains("## File Statistics"));
        assert!(md.contains("## File Contents"));

        let mut config = Config::default();
        config.output.include_timestamp = false;
        let md = assemble(&project(), &tree, &stats, &files, &config).to_markdown();
        assert!(!md.contains("**Generated**"));
        assert!(md.contains("## Project Information"));
    }

    #[test]
    fn index_lists_entries_sorted_with_counts() {
        let tree = sample_tree();
        let stats = aggregate(&tree);
        let entries = vec![
            IndexEntry {
                project_name: "Zeta".to_string(),
                relative_output_path: "Zeta.md".to_string(),
                file_counts: Statistics::default(),
            },
            IndexEntry {
                project_name: "Alpha Board".to_string(),
                relative_output_path: "Alpha Board.md".to_string(),
                file_counts: stats,
            },
        ];
        let ts = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let md = render_index(&entries, Some(&ts));
        assert!(md.starts_with("# Project Index\n"));
        assert!(md.contains("- **Generated**: 2024-01-02 03:04:05\n"));
        assert!(md.contains("- **Projects**: 2\n"));
        assert!(md.contains("| [Alpha Board](Alpha%20Board.md) | 2 | 1 | 1 | 80 B |"));
        assert!(md.find("Alpha Board").unwrap() < md.find("Zeta").unwrap());
    }

    #[test]
    fn index_links_survive_markdown_metacharacters() {
        let entries = vec![IndexEntry {
            project_name: "Motor (v2) [A]|x".to_string(),
            relative_output_path: "Motor (v2) [A]|x.md".to_string(),
            file_counts: Statistics::default(),
        }];
        let md = render_index(&entries, None);
        assert!(md.contains(
            "| [Motor (v2) \\[A\\]\\|x](Motor%20%28v2%29%20%5BA%5D%7Cx.md) | 0 | 0 | 0 | 0 B |"
        ));
    }

    #[test]
    fn modified_line_follows_the_timestamp_flag() {
        let mut tree = sample_tree();
        let ts = Local.with_ymd_and_hms(2023, 11, 30, 8, 15, 0).unwrap();
        tree.children[0].children[0].modified = Some(ts);
        let stats = aggregate(&tree);
        let files = rendered(&tree);

        let md = assemble(&project(), &tree, &stats, &files, &Config::default()).to_markdown();
        assert!(md.contains("- **Size**: 30 B\n- **Modified**: 2023-11-30 08:15:00\n"));
        assert_eq!(md.matches("**Modified**").count(), 1);

        let mut config = Config::default();
        config.output.include_timestamp = false;
        let md = assemble(&project(), &tree, &stats, &files, &config).to_markdown();
        assert!(!md.contains("**Modified**"));
    }

    #[test]
    fn atomic_write_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out/Doc.md");
        write_atomically(&target, "first version\n").unwrap();
        write_atomically(&target, "second\n").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "second\n");
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("out"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "file").unwrap();
        let target = blocker.join("Doc.md");
        assert!(write_atomically(&target, "content").is_err());
        assert!(!target.exists());
    }
}
