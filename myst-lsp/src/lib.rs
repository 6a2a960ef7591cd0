//! Language Server Protocol (LSP) implementation for MyST cross-references
//!
//! This crate exposes the cross-reference analysis of `myst-analysis` to any LSP-compatible
//! editor (VSCode, Neovim, Emacs, Helix, etc.) that edits MyST/Sphinx markdown.
//!
//! # Framework
//!
//! Built on tower-lsp: async handlers over tokio, `&self` trait methods with shared state
//! behind `tokio::sync::RwLock`. The analysis layer is async as well, so request handlers
//! simply await it.
//!
//! # Feature Set
//!
//! 1. Go to Definition (`textDocument/definition`):
//!    - Jump from a `numref` role or `[text](fig-tree)` link to the `figure-md` directive,
//!      `{#label}` section marker or `:name:` option that defines it
//!    - Works across every markdown file below the project root (`conf.py`)
//! 2. Find References (`textDocument/references`):
//!    - All `numref` roles and link targets naming the identifier, optionally with the
//!      definition site first
//! 3. Completion (`textDocument/completion`):
//!    - Offered right after a `numref` opener (trigger `` ` ``) or `](` (trigger `(`)
//!    - Lists every identifier defined in the project
//!
//! # Architecture
//!
//! LSP Layer (tower-lsp):
//! - JSON-RPC transport, capability negotiation, request routing
//!
//! Server Layer (this crate):
//! - Implements the `LanguageServer` trait
//! - Keeps open buffers in a `DocumentStore`, which also serves file contents to the
//!   project indexer so unsaved edits are visible across files
//! - Holds the `myst` configuration section (`markerFile`)
//! - Converts between analysis positions and LSP positions
//!
//! Feature Layer (myst-analysis):
//! - Pattern table, per-document indexing, project aggregation
//! - All logic and dense unit tests
//!
//! # Error Handling and Robustness
//!
//! Every request degrades to an empty response (`Ok(None)`) instead of a JSON-RPC error:
//! a request for a buffer that is not open, an identifier with no definition and unreadable
//! project files are all ordinary outcomes. No `unwrap()`/`expect()` on request paths.
//! The server is fuzzed with `proptest` over arbitrary document text.
//!
//! # Usage
//!
//! ```rust,no_run
//! use myst_lsp::MystLanguageServer;
//! use tower_lsp::{LspService, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let stdin = tokio::io::stdin();
//!     let stdout = tokio::io::stdout();
//!
//!     let (service, socket) = LspService::new(MystLanguageServer::new);
//!     Server::new(stdin, stdout, socket).serve(service).await;
//! }
//! ```
//!
//! The `myst-lsp` binary does the same when started without arguments;
//! `myst-lsp symbols docs/index.md` prints the definitions and references
//! visible from a file as JSON.

pub mod server;

pub use server::MystLanguageServer;
