//! Cross-reference analysis for MyST markdown projects
//!
//! This crate resolves the lightweight cross-reference convention used by
//! MyST/Sphinx documentation: section labels (`{#label}`), `figure-md`
//! directives and `:name:` options define identifiers; `` {numref}`label` ``
//! roles and `[text](label)` links refer to them.
//!
//! # Architecture
//!
//! - `patterns`: the identifier grammar as a table of named line patterns
//! - `utils`: existence checks, markdown predicate, file-tree walk, word under caret
//! - `symbols`: per-document definition and reference extraction
//! - `project`: project root discovery and project-wide merging
//! - `workspace`: scope-aware query entry point and settings
//! - `go_to_definition`, `references`, `completion`: editor features
//!
//! # Design Principles
//!
//! - **Line-oriented**: no markdown parsing, every construct fits on one line
//! - **Query-scoped**: indexes are rebuilt per request and never cached
//! - **Fail soft**: unreadable files and missing markers produce empty results,
//!   never errors
//! - **Protocol-agnostic**: usable by the language server, the CLI or tests
//!
//! # Usage
//!
//! ```rust,no_run
//! use myst_analysis::document::{FileSystemSource, Position, TextDocument};
//! use myst_analysis::go_to_definition::goto_definition;
//! use myst_analysis::workspace::{IndexSettings, Workspace};
//!
//! # async fn demo() {
//! let settings = IndexSettings::default();
//! let workspace = Workspace::new(&FileSystemSource, &settings);
//! let document = TextDocument::new("/docs/index.md", "See {numref}`fig-tree`.");
//! let target = goto_definition(&workspace, &document, Position::new(0, 15)).await;
//! # }
//! ```

// Core building blocks
pub mod document;
pub mod error;
pub mod patterns;
pub mod project;
pub mod symbols;
pub mod utils;
pub mod workspace;

// Editor features
pub mod completion;
pub mod go_to_definition;
pub mod references;

// Test support (available in tests and as dev-dependency)
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
