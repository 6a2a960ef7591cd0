use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::document::{Position, TextDocument};
use crate::project::DEFAULT_MARKER_FILE;

/// A throwaway documentation project on disk.
///
/// Files are written relative to a temporary root which is removed when the
/// fixture is dropped. Panics on I/O failure; only meant for tests.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    /// Empty directory without a marker file.
    pub fn bare() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Directory with `conf.py` at its root.
    pub fn sphinx() -> Self {
        Self::bare().with_file(DEFAULT_MARKER_FILE, "")
    }

    pub fn with_file(self, relative: &str, text: &str) -> Self {
        self.write(relative, text);
        self
    }

    pub fn write(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture directory");
        }
        fs::write(&path, text).expect("write fixture file");
        path
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Reads a fixture file back as a document.
    pub fn document(&self, relative: &str) -> TextDocument {
        let path = self.path(relative);
        let text = fs::read_to_string(&path).expect("read fixture file");
        TextDocument::new(path, text)
    }
}

/// Position of the first character of `needle` in `source`.
pub fn position_of(source: &str, needle: &str) -> Position {
    let offset = source
        .find(needle)
        .unwrap_or_else(|| panic!("needle not found: {needle}"));
    let mut line = 0;
    let mut column = 0;
    for ch in source[..offset].chars() {
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    Position::new(line, column)
}

/// Position just past the end of `needle` in `source`.
pub fn position_after(source: &str, needle: &str) -> Position {
    let start = position_of(source, needle);
    let last_line = needle.rsplit('\n').next().unwrap_or(needle);
    if needle.contains('\n') {
        Position::new(
            start.line + needle.matches('\n').count(),
            last_line.chars().count(),
        )
    } else {
        Position::new(start.line, start.column + needle.chars().count())
    }
}
