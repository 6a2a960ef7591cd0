//! Line-addressable documents and the sources that provide them.
//!
//! The analysis layer never talks to an editor directly. It receives the
//! active document as a [`TextDocument`] and loads every other project file
//! through a [`DocumentSource`], which lets the language server hand out
//! unsaved buffers while the CLI and tests read straight from disk.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::AnalysisError;

/// Zero-based line/column pair. Columns count characters within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open range between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range covering `start..end` columns of a single line.
    pub fn on_line(line: usize, start: usize, end: usize) -> Self {
        Self {
            start: Position::new(line, start),
            end: Position::new(line, end),
        }
    }

    /// Inclusive containment: a caret sitting right after the last character
    /// still counts as inside, matching how editors pick the word under the cursor.
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }
}

/// Text of one document together with the path it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    path: PathBuf,
    text: String,
}

impl TextDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Reads a document from disk.
    pub async fn read(path: &Path) -> Result<Self, AnalysisError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AnalysisError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let text = String::from_utf8(bytes).map_err(|_| AnalysisError::NotUtf8 {
            path: path.to_path_buf(),
        })?;
        Ok(Self::new(path, text))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Directory the document lives in, if the path has one.
    pub fn directory(&self) -> Option<&Path> {
        self.path.parent()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.text.lines().nth(index)
    }

    /// Extracts the text between two positions. Out-of-range positions are
    /// clamped to the end of their line; `None` if the start line does not exist.
    pub fn text_in_range(&self, range: Range) -> Option<String> {
        if range.end < range.start {
            return None;
        }
        let mut out = String::new();
        for line_index in range.start.line..=range.end.line {
            let line = match self.line(line_index) {
                Some(line) => line,
                None if line_index == range.start.line => return None,
                None => break,
            };
            let from = if line_index == range.start.line {
                range.start.column
            } else {
                0
            };
            let to = if line_index == range.end.line {
                range.end.column
            } else {
                usize::MAX
            };
            out.extend(line.chars().skip(from).take(to.saturating_sub(from)));
            if line_index != range.end.line {
                out.push('\n');
            }
        }
        Some(out)
    }
}

/// Provides document text by path.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Returns the current text for `path`, or `None` if it cannot be loaded.
    async fn open(&self, path: &Path) -> Option<TextDocument>;
}

/// Loads documents straight from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemSource;

#[async_trait]
impl DocumentSource for FileSystemSource {
    async fn open(&self, path: &Path) -> Option<TextDocument> {
        match TextDocument::read(path).await {
            Ok(document) => Some(document),
            Err(err) => {
                debug!(%err, "skipping unreadable document");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn line_accessors() {
        let document = TextDocument::new("/doc.md", "first\nsecond\n\nfourth");
        assert_eq!(document.line_count(), 4);
        assert_eq!(document.line(1), Some("second"));
        assert_eq!(document.line(2), Some(""));
        assert_eq!(document.line(9), None);
    }

    #[test]
    fn text_in_range_single_and_multi_line() {
        let document = TextDocument::new("/doc.md", "héllo world\nsecond line");
        assert_eq!(
            document.text_in_range(Range::on_line(0, 1, 5)).as_deref(),
            Some("éllo")
        );
        let range = Range::new(Position::new(0, 6), Position::new(1, 6));
        assert_eq!(
            document.text_in_range(range).as_deref(),
            Some("world\nsecond")
        );
        assert!(document.text_in_range(Range::on_line(5, 0, 1)).is_none());
    }

    #[test]
    fn range_contains_end_position() {
        let range = Range::on_line(2, 4, 8);
        assert!(range.contains(Position::new(2, 4)));
        assert!(range.contains(Position::new(2, 8)));
        assert!(!range.contains(Position::new(2, 9)));
        assert!(!range.contains(Position::new(1, 5)));
    }

    #[tokio::test]
    async fn file_system_source_reads_and_skips() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("doc.md");
        fs::write(&path, "{#intro}\n").unwrap();
        fs::write(temp.path().join("binary.md"), [0xff, 0xfe, 0x00]).unwrap();

        let document = FileSystemSource.open(&path).await.expect("document loads");
        assert_eq!(document.text(), "{#intro}\n");
        assert!(FileSystemSource
            .open(&temp.path().join("binary.md"))
            .await
            .is_none());
        assert!(FileSystemSource
            .open(&temp.path().join("missing.md"))
            .await
            .is_none());
    }
}
