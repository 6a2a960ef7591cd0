use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::{Position, Range, TextDocument};
use crate::error::AnalysisError;
use crate::patterns::{byte_to_column, identifier_spans};

/// Suffix that marks a file as part of the documentation set.
pub const MARKDOWN_SUFFIX: &str = ".md";

/// Returns whether `path` exists.
///
/// Any error while checking (permission denied, a parent that vanished in the
/// meantime) is reported as "does not exist" rather than surfaced.
pub async fn path_exists(path: &Path) -> bool {
    match tokio::fs::try_exists(path).await {
        Ok(exists) => exists,
        Err(err) => {
            debug!(path = %path.display(), %err, "existence check failed");
            false
        }
    }
}

/// Returns whether the file name ends with `.md`. The comparison is
/// case-sensitive, so `README.MD` does not qualify.
pub fn is_markdown_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(MARKDOWN_SUFFIX))
        .unwrap_or(false)
}

/// Collects every markdown file below `root`.
///
/// Walks the tree with an explicit work list, so deep hierarchies do not grow
/// the call stack. Symlinked directories are not entered. Directories that
/// cannot be listed are skipped. The returned set is sorted by path, which
/// callers rely on for a stable merge order.
pub async fn list_markdown_files(root: &Path) -> BTreeSet<PathBuf> {
    let mut files = BTreeSet::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(directory) = pending.pop() {
        match read_directory(&directory).await {
            Ok(entries) => {
                for (path, is_dir) in entries {
                    if is_dir {
                        pending.push(path);
                    } else if is_markdown_file(&path) {
                        files.insert(path);
                    }
                }
            }
            Err(err) => debug!(%err, "skipping directory"),
        }
    }

    files
}

/// Lists one directory as `(path, is_directory)` pairs. Entries whose type
/// cannot be determined are dropped.
async fn read_directory(directory: &Path) -> Result<Vec<(PathBuf, bool)>, AnalysisError> {
    let list_error = |source| AnalysisError::ListDirectory {
        path: directory.to_path_buf(),
        source,
    };
    let mut reader = tokio::fs::read_dir(directory).await.map_err(list_error)?;
    let mut entries = Vec::new();
    loop {
        let entry = match reader.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                debug!(%err, "stopping directory listing early");
                break;
            }
        };
        // file_type() does not follow symlinks, so linked directories are skipped.
        match entry.file_type().await {
            Ok(file_type) if file_type.is_dir() => entries.push((entry.path(), true)),
            Ok(file_type) if file_type.is_file() => entries.push((entry.path(), false)),
            Ok(_) => {}
            Err(err) => debug!(path = %entry.path().display(), %err, "unknown entry type"),
        }
    }
    Ok(entries)
}

/// Finds the identifier under the caret.
///
/// Uses the identifier character class as the word boundary, the same way an
/// editor's "word range at position" helper would. A caret placed directly
/// after the last character still selects the word.
pub fn word_at_position(document: &TextDocument, position: Position) -> Option<(String, Range)> {
    let line = document.line(position.line)?;
    identifier_spans(line).into_iter().find_map(|span| {
        let start = byte_to_column(line, span.start);
        let end = byte_to_column(line, span.end);
        let range = Range::on_line(position.line, start, end);
        range
            .contains(position)
            .then(|| (line[span].to_string(), range))
    })
}

/// Text of `line` before the caret column.
pub(crate) fn line_prefix(document: &TextDocument, position: Position) -> Option<String> {
    let line = document.line(position.line)?;
    Some(line.chars().take(position.column).collect())
}
