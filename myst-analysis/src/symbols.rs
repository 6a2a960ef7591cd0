//! Per-document symbol extraction.
//!
//! Scans a single document line by line with the pattern table and records
//! where each identifier is defined and where it is referenced.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::document::{Range, TextDocument};
use crate::patterns::{
    byte_to_column, definition_patterns, reference_patterns, LinePattern, PatternKind,
};

/// Where an identifier occurs: document path plus the identifier's exact span.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SymbolLocation {
    pub path: PathBuf,
    pub range: Range,
    /// Pattern that produced the occurrence.
    pub kind: PatternKind,
}

impl SymbolLocation {
    pub fn new(path: impl Into<PathBuf>, range: Range, kind: PatternKind) -> Self {
        Self {
            path: path.into(),
            range,
            kind,
        }
    }
}

/// Identifier to its (single) definition site.
pub type DefinitionMap = BTreeMap<String, SymbolLocation>;

/// Identifier to every site referencing it, in scan order.
pub type ReferenceMap = BTreeMap<String, Vec<SymbolLocation>>;

/// Collects definition sites. When an identifier is defined more than once,
/// the last occurrence in the document wins.
pub fn index_definitions(document: &TextDocument) -> DefinitionMap {
    let mut definitions = DefinitionMap::new();
    scan(document, definition_patterns(), |identifier, location| {
        definitions.insert(identifier.to_string(), location);
    });
    definitions
}

/// Collects every reference site.
pub fn index_references(document: &TextDocument) -> ReferenceMap {
    let mut references = ReferenceMap::new();
    scan(document, reference_patterns(), |identifier, location| {
        references
            .entry(identifier.to_string())
            .or_default()
            .push(location);
    });
    references
}

/// Visits matches in line order; within a line, in pattern-table order and
/// then left to right.
fn scan<F>(document: &TextDocument, patterns: &[LinePattern], mut visit: F)
where
    F: FnMut(&str, SymbolLocation),
{
    let path: &Path = document.path();
    for (line_index, line) in document.lines().enumerate() {
        for pattern in patterns {
            for found in pattern.captures(line) {
                let start = byte_to_column(line, found.span.start);
                let end = byte_to_column(line, found.span.end);
                let range = Range::on_line(line_index, start, end);
                visit(found.identifier, SymbolLocation::new(path, range, found.kind));
            }
        }
    }
}
