// src/persist.rs
//! The persisted artifact: a source file holding one array literal of
//! double-quoted canonical lines,
//!
//! ```text
//! const rawData = [
//!   "58 03/28/26 A Al-Nassr vs. Al-Ahli 33' Header",
//!   "57 03/21/26 H Al-Nassr vs. Al-Hilal 12' Penalty",
//! ];
//! ```
//!
//! Only the text between the brackets is ever rewritten.

use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

static RE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("quoted regex"));

const DEFAULT_INDENT: &str = "  ";

#[derive(Debug, Clone)]
pub struct ArtifactDocument {
    path: PathBuf,
    content: String,
    /// Byte range of the array body (between `[` and `]`).
    body: Range<usize>,
    lines: Vec<String>,
    item_indent: String,
    closing_indent: String,
}

impl ArtifactDocument {
    pub fn load(path: &Path, array_name: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Self::parse(path, array_name, content)
    }

    pub fn parse(path: &Path, array_name: &str, content: String) -> Result<Self> {
        let pattern = format!(r"const\s+{}\s*=\s*\[(?s)(.*?)\]\s*;", regex::escape(array_name));
        let re = Regex::new(&pattern).map_err(|_| PipelineError::MalformedArtifact {
            path: path.to_path_buf(),
            marker: array_name.to_string(),
        })?;
        let body = re
            .captures(&content)
            .and_then(|c| c.get(1))
            .map(|m| m.range())
            .ok_or_else(|| PipelineError::MalformedArtifact {
                path: path.to_path_buf(),
                marker: array_name.to_string(),
            })?;

        let text = &content[body.clone()];
        let lines = RE_QUOTED
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect();
        let item_indent = text
            .lines()
            .find(|l| l.trim_start().starts_with('"'))
            .map(|l| l[..l.len() - l.trim_start().len()].to_string())
            .unwrap_or_else(|| DEFAULT_INDENT.to_string());
        let closing_indent = text
            .rsplit_once('\n')
            .map(|(_, tail)| tail)
            .filter(|tail| tail.chars().all(char::is_whitespace))
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            content,
            body,
            lines,
            item_indent,
            closing_indent,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persisted lines, in file order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whole file with the array body replaced by `lines`.
    pub fn render(&self, lines: &[String]) -> String {
        let mut block = String::from("\n");
        for line in lines {
            block.push_str(&self.item_indent);
            block.push('"');
            block.push_str(&line.replace('"', "'"));
            block.push_str("\",\n");
        }
        block.push_str(&self.closing_indent);

        let mut out = String::with_capacity(self.content.len() + block.len());
        out.push_str(&self.content[..self.body.start]);
        out.push_str(&block);
        out.push_str(&self.content[self.body.end..]);
        out
    }

    /// Rewrite the file with `lines` unless that changes nothing.
    /// Returns whether a write happened.
    pub fn write_lines(&self, lines: &[String]) -> Result<bool> {
        let next = self.render(lines);
        if next == self.content {
            tracing::info!(target: "persist", path = %self.path.display(), "no changes needed");
            return Ok(false);
        }

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "artifact".to_string());
        let tmp = self.path.with_file_name(format!(".{file_name}.tmp"));
        fs::write(&tmp, &next).map_err(|e| PipelineError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| PipelineError::io(&self.path, e))?;

        counter!("persist_writes_total").increment(1);
        tracing::info!(target: "persist", path = %self.path.display(), lines = lines.len(), "updated artifact");
        Ok(true)
    }
}

/// New lines (newest first) ahead of the existing ones, which keep their order.
pub fn merge_lines(new_lines: &[String], existing: &[String]) -> Vec<String> {
    new_lines.iter().chain(existing.iter()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\nimport X from './X';\n---\n<script>\n    const rawData = [\n      \"2 01/02/26 H A vs. B 5' Header\",\n      \"1 01/01/26 A A vs. B 9' Penalty\",\n    ];\n    const other = [\"keep\"];\n</script>\n";

    fn doc() -> ArtifactDocument {
        ArtifactDocument::parse(Path::new("Road.astro"), "rawData", SAMPLE.to_string()).unwrap()
    }

    #[test]
    fn parses_lines_and_indentation() {
        let d = doc();
        assert_eq!(d.lines().len(), 2);
        assert_eq!(d.lines()[0], "2 01/02/26 H A vs. B 5' Header");
        assert_eq!(d.item_indent, "      ");
        assert_eq!(d.closing_indent, "    ");
    }

    #[test]
    fn rendering_unchanged_lines_is_identity() {
        let d = doc();
        assert_eq!(d.render(d.lines()), SAMPLE);
    }

    #[test]
    fn only_the_block_changes() {
        let d = doc();
        let merged = merge_lines(&["3 01/03/26 N A vs. B 1' Header".to_string()], d.lines());
        let out = d.render(&merged);
        assert!(out.starts_with("---\nimport X from './X';\n---\n<script>\n    const rawData = [\n      \"3 01/03/26"));
        assert!(out.ends_with("    ];\n    const other = [\"keep\"];\n</script>\n"));
    }

    #[test]
    fn missing_marker_is_malformed() {
        let err = ArtifactDocument::parse(Path::new("x"), "rawData", "const goals = [];".into()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedArtifact { .. }));
    }

    #[test]
    fn embedded_quotes_cannot_break_the_literal() {
        let d = doc();
        let out = d.render(&["1 01/01/26 H The \"Reds\" vs. B 1' Header".to_string()]);
        assert!(out.contains("\"1 01/01/26 H The 'Reds' vs. B 1' Header\","));
    }
}
