//! Project discovery and project-wide indexing.
//!
//! A project is the tree below the nearest ancestor directory that contains
//! the marker file (`conf.py` for Sphinx projects). Documents outside any
//! project are indexed on their own.
//!
//! Project indexes are rebuilt on every call. Files are loaded and scanned
//! concurrently on the calling task, then merged in path order so the result
//! does not depend on which file finished first.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{debug, warn};

use crate::document::{DocumentSource, TextDocument};
use crate::symbols::{
    index_definitions, index_references, DefinitionMap, ReferenceMap, SymbolLocation,
};
use crate::utils::{list_markdown_files, path_exists};

/// Marker file identifying a project root.
pub const DEFAULT_MARKER_FILE: &str = "conf.py";

/// What a query operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectScope {
    /// No marker found; only the requesting document is scanned.
    SingleDocument,
    /// Every markdown file below this directory is scanned.
    Rooted(PathBuf),
}

impl ProjectScope {
    pub fn root(&self) -> Option<&Path> {
        match self {
            ProjectScope::SingleDocument => None,
            ProjectScope::Rooted(root) => Some(root),
        }
    }
}

/// Walks from `start_dir` towards the filesystem root and returns the first
/// directory containing `marker`.
pub async fn resolve_root(start_dir: &Path, marker: &str) -> Option<PathBuf> {
    let mut current = Some(start_dir);
    while let Some(directory) = current {
        if path_exists(&directory.join(marker)).await {
            return Some(directory.to_path_buf());
        }
        current = directory.parent();
    }
    None
}

/// Determines the scope for `document` by resolving from its directory.
///
/// Documents without an absolute directory (buffers of non-file URIs) are
/// always indexed on their own; resolving them would search the process's
/// working directory instead of the document's.
pub async fn resolve_scope(document: &TextDocument, marker: &str) -> ProjectScope {
    let Some(directory) = document.directory().filter(|dir| dir.is_absolute()) else {
        return ProjectScope::SingleDocument;
    };
    match resolve_root(directory, marker).await {
        Some(root) => ProjectScope::Rooted(root),
        None => ProjectScope::SingleDocument,
    }
}

/// An identifier defined in more than one project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateDefinition {
    pub identifier: String,
    /// The location present in the merged map.
    pub kept: SymbolLocation,
    /// The location it replaced.
    pub shadowed: SymbolLocation,
}

/// Merged definitions for a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDefinitions {
    pub definitions: DefinitionMap,
    /// Cross-file conflicts, in merge order.
    pub duplicates: Vec<DuplicateDefinition>,
}

/// Indexes definitions in every markdown file below `root`.
///
/// Files are merged in ascending path order; for an identifier defined in
/// several files, the file whose path sorts last wins and each replaced
/// location is recorded in [`ProjectDefinitions::duplicates`].
pub async fn project_definitions(root: &Path, source: &dyn DocumentSource) -> ProjectDefinitions {
    let mut merged = ProjectDefinitions::default();
    for per_file in index_files(root, source, index_definitions).await {
        for (identifier, location) in per_file {
            let previous = merged
                .definitions
                .insert(identifier.clone(), location.clone());
            if let Some(shadowed) = previous {
                warn!(
                    identifier = %identifier,
                    kept = %location.path.display(),
                    shadowed = %shadowed.path.display(),
                    "identifier defined in more than one file"
                );
                merged.duplicates.push(DuplicateDefinition {
                    identifier,
                    kept: location,
                    shadowed,
                });
            }
        }
    }
    merged
}

/// Indexes references in every markdown file below `root`. References from
/// all files are kept; each identifier's locations are ordered by file path,
/// then by position.
pub async fn project_references(root: &Path, source: &dyn DocumentSource) -> ReferenceMap {
    let mut merged = ReferenceMap::new();
    for per_file in index_files(root, source, index_references).await {
        for (identifier, locations) in per_file {
            merged.entry(identifier).or_default().extend(locations);
        }
    }
    merged
}

/// Loads and indexes each project file concurrently. Results come back in
/// path order; unreadable files are left out.
async fn index_files<T>(
    root: &Path,
    source: &dyn DocumentSource,
    index: fn(&TextDocument) -> T,
) -> Vec<T> {
    let files = list_markdown_files(root).await;
    debug!(root = %root.display(), files = files.len(), "indexing project");
    let pending = files.iter().map(|path| async move {
        match source.open(path).await {
            Some(document) => Some(index(&document)),
            None => {
                debug!(path = %path.display(), "document unavailable, skipping");
                None
            }
        }
    });
    join_all(pending).await.into_iter().flatten().collect()
}
