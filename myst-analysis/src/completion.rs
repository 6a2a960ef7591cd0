//! Identifier completion for MyST cross-references.
//!
//! Completion only applies right after a reference opener:
//!
//! - **numref role**: the caret directly follows `` {numref}` ``.
//! - **link target**: the caret directly follows `](`.
//!
//! Anywhere else the request is "not applicable" and yields `None`, which is
//! different from an applicable request that happens to have no candidates
//! (an empty vector).
//!
//! Candidates are every identifier visible from the document, i.e. the keys
//! of the definition map for the document's scope.

use std::path::Path;

use lsp_types::CompletionItemKind;
use pathdiff::diff_paths;

use crate::document::{Position, TextDocument};
use crate::project::ProjectScope;
use crate::symbols::SymbolLocation;
use crate::utils::line_prefix;
use crate::workspace::Workspace;

/// Text that must immediately precede the caret for numref completion.
pub const NUMREF_OPENER: &str = "{numref}`";
/// Text that must immediately precede the caret for link target completion.
pub const LINK_TARGET_OPENER: &str = "](";

/// Trigger characters the editor should send completion requests for.
pub const TRIGGER_CHARACTERS: [&str; 2] = ["`", "("];

/// A completion suggestion with display metadata.
///
/// Maps to LSP `CompletionItem` but remains protocol-agnostic apart from the
/// item kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    /// The identifier shown in the menu and inserted.
    pub label: String,
    /// What kind of construct defines it and in which file.
    pub detail: Option<String>,
    pub kind: CompletionItemKind,
}

impl CompletionCandidate {
    fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            detail: None,
            kind,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Which reference opener precedes the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionContext {
    NumRef,
    LinkTarget,
}

impl CompletionContext {
    fn trigger_character(self) -> &'static str {
        match self {
            CompletionContext::NumRef => "`",
            CompletionContext::LinkTarget => "(",
        }
    }
}

/// Classifies the caret position.
///
/// When the editor reports a trigger character it has to be the last
/// character of the detected opener; a backtick after `](` or a parenthesis
/// after `` {numref} `` does not qualify.
pub fn detect_context(
    document: &TextDocument,
    position: Position,
    trigger_char: Option<&str>,
) -> Option<CompletionContext> {
    let prefix = line_prefix(document, position)?;
    let context = if prefix.ends_with(NUMREF_OPENER) {
        CompletionContext::NumRef
    } else if prefix.ends_with(LINK_TARGET_OPENER) {
        CompletionContext::LinkTarget
    } else {
        return None;
    };

    match trigger_char {
        Some(trigger) if trigger != context.trigger_character() => None,
        _ => Some(context),
    }
}

/// Returns the identifiers that can be completed at `position`, or `None` if
/// the caret is not right after a reference opener.
pub async fn completion_items(
    workspace: &Workspace<'_>,
    document: &TextDocument,
    position: Position,
    trigger_char: Option<&str>,
) -> Option<Vec<CompletionCandidate>> {
    detect_context(document, position, trigger_char)?;

    let scope = workspace.scope(document).await;
    let project = workspace.definitions_in(&scope, document).await;
    let base = match &scope {
        ProjectScope::Rooted(root) => Some(root.as_path()),
        ProjectScope::SingleDocument => document.directory(),
    };

    Some(
        project
            .definitions
            .into_iter()
            .map(|(identifier, location)| {
                CompletionCandidate::new(identifier, CompletionItemKind::REFERENCE)
                    .with_detail(describe_location(&location, base))
            })
            .collect(),
    )
}

fn describe_location(location: &SymbolLocation, base: Option<&Path>) -> String {
    let relative = base
        .and_then(|base| diff_paths(&location.path, base))
        .unwrap_or_else(|| location.path.clone());
    match normalize_path(&relative) {
        Some(path) => format!("{} in {path}", location.kind),
        None => location.kind.to_string(),
    }
}

fn normalize_path(path: &Path) -> Option<String> {
    path.components().next()?;
    let value = path.to_string_lossy().replace('\\', "/");
    if value == "." {
        return None;
    }
    Some(value)
}
