use crate::classify::{Category, Classifier};
use crate::config::Config;
use crate::tree::FileNode;
use byte_unit::{Byte, UnitType};
use encoding_rs::{Encoding, GBK};
use std::fmt;
use std::fs;

/// Why a file's content was left out of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OmitReason {
    TooLarge { size: u64, limit: u64 },
    Unreadable(String),
}

impl fmt::Display for OmitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OmitReason::TooLarge { size, limit } => {
                write!(f, "file too large ({} bytes, limit {})", size, limit)
            }
            OmitReason::Unreadable(reason) => write!(f, "unreadable ({})", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFile<'a> {
    pub node: &'a FileNode,
    pub language: String,
    pub content: Option<String>,
    pub truncated: bool,
    pub omitted: Option<OmitReason>,
}

impl<'a> RenderedFile<'a> {
    fn omitted(node: &'a FileNode, language: String, reason: OmitReason) -> Self {
        RenderedFile {
            node,
            language,
            content: None,
            truncated: true,
            omitted: Some(reason),
        }
    }

    /// Fenced block with the verbatim content, or a placeholder line.
    pub fn body_markdown(&self) -> String {
        match (&self.content, &self.omitted) {
            (Some(content), _) => fenced_block(&self.language, content),
            (None, Some(reason)) => format!("> Content omitted: {}.\n", reason),
            (None, None) => "> Content omitted.\n".to_string(),
        }
    }
}

/// Reads one file for embedding. Never fails: oversized, binary or
/// unreadable files come back with `truncated` set and a reason.
pub fn render_file<'a>(
    node: &'a FileNode,
    classifier: &Classifier,
    config: &Config,
) -> RenderedFile<'a> {
    let language = classifier.language_tag(node.name()).to_string();
    let limit = config.output.max_file_size;

    if let Some(reason) = &node.unreadable {
        return RenderedFile::omitted(node, language, OmitReason::Unreadable(reason.clone()));
    }
    if node.size_bytes > limit {
        log::debug!(
            "Skipping content of {} ({} bytes > limit {})",
            node.relative_path,
            node.size_bytes,
            limit
        );
        return RenderedFile::omitted(
            node,
            language,
            OmitReason::TooLarge {
                size: node.size_bytes,
                limit,
            },
        );
    }

    let bytes = match fs::read(&node.absolute_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Failed to read {}: {}", node.absolute_path.display(), e);
            return RenderedFile::omitted(
                node,
                language,
                OmitReason::Unreadable(format!("read failed: {}", e)),
            );
        }
    };
    if bytes.len() as u64 > limit {
        // Grew between the stat and the read.
        return RenderedFile::omitted(
            node,
            language,
            OmitReason::TooLarge {
                size: bytes.len() as u64,
                limit,
            },
        );
    }
    match decode_text(&bytes) {
        Ok(content) => RenderedFile {
            node,
            language,
            content: Some(content),
            truncated: false,
            omitted: None,
        },
        Err(reason) => {
            log::debug!("Skipping {}: {}", node.relative_path, reason);
            RenderedFile::omitted(node, language, OmitReason::Unreadable(reason.to_string()))
        }
    }
}

/// Decodes file bytes as text: BOM-marked UTF-8/UTF-16 first, then plain
/// UTF-8, then GBK (common in Keil and other vendor IDE projects).
fn decode_text(bytes: &[u8]) -> std::result::Result<String, &'static str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return encoding
            .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
            .map(|text| text.into_owned())
            .ok_or("malformed text after byte order mark");
    }
    if bytes.contains(&0) {
        return Err("binary content");
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }
    GBK.decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or("not valid UTF-8 or GBK text")
}

/// Every renderable file of `tree`, in tree order.
pub fn render_files<'a>(
    tree: &'a FileNode,
    classifier: &Classifier,
    config: &Config,
) -> Vec<RenderedFile<'a>> {
    tree.files()
        .into_iter()
        .filter(|node| node.category != Category::Ignored)
        .map(|node| render_file(node, classifier, config))
        .collect()
}

/// Wraps `content` in a fence longer than any backtick run inside it, so
/// embedded Markdown cannot close the block early.
pub fn fenced_block(language: &str, content: &str) -> String {
    let mut longest_run = 0;
    let mut current_run = 0;
    for ch in content.chars() {
        if ch == '`' {
            current_run += 1;
            longest_run = longest_run.max(current_run);
        } else {
            current_run = 0;
        }
    }
    let fence = "`".repeat((longest_run + 1).max(3));
    let mut block = format!("{}{}\n{}", fence, language, content);
    if !content.is_empty() && !content.ends_with('\n') {
        block.push('\n');
    }
    block.push_str(&fence);
    block.push('\n');
    block
}

/// `512 B`, `1.5 KiB`, `2.0 MiB`.
pub fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{:.1}", adjusted)
}
