use crate::classify::{Category, Classifier};
use crate::error::{AppError, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileNode {
    /// Path relative to the project root, `/`-separated. Empty for the root.
    pub relative_path: String,
    #[serde(skip)]
    pub absolute_path: PathBuf,
    pub category: Category,
    pub size_bytes: u64,
    pub is_directory: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
    /// Set when the entry could not be inspected; such nodes are kept with
    /// size 0 instead of failing the project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unreadable: Option<String>,
    /// Last modification time, from the same stat that gave the size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Local>>,
}

impl FileNode {
    fn directory(relative_path: String, absolute_path: PathBuf) -> Self {
        FileNode {
            relative_path,
            absolute_path,
            category: Category::Other,
            size_bytes: 0,
            is_directory: true,
            children: Vec::new(),
            unreadable: None,
            modified: None,
        }
    }

    fn unreadable_entry(relative_path: String, absolute_path: PathBuf, reason: String) -> Self {
        FileNode {
            relative_path,
            absolute_path,
            category: Category::Other,
            size_bytes: 0,
            is_directory: false,
            children: Vec::new(),
            unreadable: Some(reason),
            modified: None,
        }
    }

    /// Final path component, or the whole relative path for the root.
    pub fn name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }

    /// Files of this subtree in tree order (pre-order, children already
    /// sorted).
    pub fn files(&self) -> Vec<&FileNode> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a FileNode>) {
        if !self.is_directory {
            out.push(self);
            return;
        }
        for child in &self.children {
            child.collect_files(out);
        }
    }

    fn sort_children(&mut self) {
        self.children.sort_by(compare_nodes);
    }
}

/// Directories first, then by name ignoring case, then by exact name so the
/// order is total.
pub fn compare_nodes(a: &FileNode, b: &FileNode) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
        .then_with(|| a.name().cmp(b.name()))
}

/// Walks `root_path` into a sorted `FileNode` hierarchy. Ignored entries are
/// pruned before descending; per-entry failures become unreadable nodes.
/// Only failing to list the root itself is an error.
pub fn build_tree(root_path: &Path, classifier: &Classifier) -> Result<FileNode> {
    log::debug!("Building file tree for: {}", root_path.display());
    let root_meta = fs::metadata(root_path).map_err(|e| AppError::FileRead {
        path: root_path.to_path_buf(),
        source: e,
    })?;
    if !root_meta.is_dir() {
        return Err(AppError::InvalidArgument(format!(
            "Project root is not a directory: {}",
            root_path.display()
        )));
    }

    let walker = WalkDir::new(root_path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            let keep = !classifier.is_ignored(&name, points_to_directory(entry));
            if !keep {
                log::trace!("Pruning ignored entry: {}", entry.path().display());
            }
            keep
        });

    // Open directories from the root down; index == depth.
    let mut stack: Vec<FileNode> = vec![FileNode::directory(String::new(), root_path.to_path_buf())];

    for entry_result in walker {
        match entry_result {
            Ok(entry) => {
                if entry.depth() == 0 {
                    continue;
                }
                close_directories(&mut stack, entry.depth());
                let node = node_from_entry(&entry, root_path, classifier);
                if node.is_directory {
                    stack.push(node);
                } else {
                    push_child(&mut stack, node);
                }
            }
            Err(err) => {
                let Some(path) = err.path().map(Path::to_path_buf) else {
                    log::warn!("Error walking directory: {}", err);
                    continue;
                };
                if path.as_path() == root_path {
                    return Err(AppError::WalkDir(err.to_string()));
                }
                log::warn!("Unreadable entry {}: {}", path.display(), err);
                let reason = err
                    .io_error()
                    .map_or_else(|| err.to_string(), |io| io.to_string());
                record_failure(&mut stack, root_path, path, reason);
            }
        }
    }

    close_directories(&mut stack, 1);
    let mut root = stack
        .pop()
        .ok_or_else(|| AppError::WalkDir("tree stack unexpectedly empty".to_string()))?;
    root.sort_children();
    log::debug!(
        "File tree built for {} ({} files).",
        root_path.display(),
        root.files().len()
    );
    Ok(root)
}

// Symlinks are judged by their target so directory rules apply to them.
fn points_to_directory(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_dir() || (file_type.is_symlink() && entry.path().is_dir())
}

fn node_from_entry(entry: &DirEntry, root_path: &Path, classifier: &Classifier) -> FileNode {
    let path = entry.path().to_path_buf();
    let relative_path = relative_string(&path, root_path);
    let name = entry.file_name().to_string_lossy().into_owned();
    let file_type = entry.file_type();

    if file_type.is_dir() {
        return FileNode::directory(relative_path, path);
    }

    // Symlinks are sized through their target but never descended into.
    let metadata = if file_type.is_symlink() {
        fs::metadata(&path)
    } else {
        entry.metadata().map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("metadata unavailable"))
        })
    };

    match metadata {
        Ok(meta) if meta.is_file() => FileNode {
            relative_path,
            absolute_path: path,
            category: classifier.classify(&name),
            size_bytes: meta.len(),
            is_directory: false,
            children: Vec::new(),
            unreadable: None,
            modified: meta.modified().ok().map(DateTime::<Local>::from),
        },
        // Linked directory: listed as an empty directory, never entered.
        Ok(meta) if meta.is_dir() => FileNode::directory(relative_path, path),
        Ok(_) => FileNode::unreadable_entry(
            relative_path,
            path,
            "not a regular file".to_string(),
        ),
        Err(e) => {
            log::warn!("Cannot stat {}: {}", path.display(), e);
            FileNode::unreadable_entry(relative_path, path, e.to_string())
        }
    }
}

fn record_failure(stack: &mut Vec<FileNode>, root_path: &Path, path: PathBuf, reason: String) {
    let depth = relative_depth(&path, root_path);
    // A directory we already opened but could not list.
    if let Some(open_dir) = stack.get_mut(depth) {
        if open_dir.absolute_path == path {
            open_dir.unreadable = Some(reason);
            return;
        }
    }
    close_directories(stack, depth.max(1));
    let relative_path = relative_string(&path, root_path);
    push_child(stack, FileNode::unreadable_entry(relative_path, path, reason));
}

/// Pops open directories until `stack.len() == depth`, attaching each one to
/// its parent.
fn close_directories(stack: &mut Vec<FileNode>, depth: usize) {
    while stack.len() > depth {
        let Some(mut finished) = stack.pop() else {
            return;
        };
        finished.sort_children();
        push_child(stack, finished);
    }
}

fn push_child(stack: &mut [FileNode], node: FileNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn relative_depth(path: &Path, root_path: &Path) -> usize {
    pathdiff::diff_paths(path, root_path)
        .map_or(1, |rel| {
            rel.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .count()
        })
}

fn relative_string(path: &Path, root_path: &Path) -> String {
    let relative = pathdiff::diff_paths(path, root_path).unwrap_or_else(|| path.to_path_buf());
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
