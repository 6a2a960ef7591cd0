//! Query entry point tying scope resolution to indexing.
//!
//! Every query starts from the document the editor is asking about, resolves
//! its [`ProjectScope`] and then indexes either that document alone or the
//! whole project. Nothing is cached between queries.

use serde::{Deserialize, Serialize};

use crate::document::{DocumentSource, Position, TextDocument};
use crate::project::{
    project_definitions, project_references, resolve_scope, ProjectDefinitions, ProjectScope,
    DEFAULT_MARKER_FILE,
};
use crate::symbols::{
    index_definitions, index_references, DefinitionMap, ReferenceMap, SymbolLocation,
};
use crate::utils::word_at_position;

/// User-adjustable indexing options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexSettings {
    /// File whose presence marks a project root.
    pub marker_file: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            marker_file: DEFAULT_MARKER_FILE.to_string(),
        }
    }
}

/// Settings plus the source used to load project files.
#[derive(Clone, Copy)]
pub struct Workspace<'a> {
    source: &'a dyn DocumentSource,
    settings: &'a IndexSettings,
}

impl<'a> Workspace<'a> {
    pub fn new(source: &'a dyn DocumentSource, settings: &'a IndexSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &IndexSettings {
        self.settings
    }

    pub async fn scope(&self, document: &TextDocument) -> ProjectScope {
        resolve_scope(document, &self.settings.marker_file).await
    }

    /// Definitions visible from `document`.
    pub async fn definitions(&self, document: &TextDocument) -> DefinitionMap {
        let scope = self.scope(document).await;
        self.definitions_in(&scope, document).await.definitions
    }

    /// Definitions for an already resolved scope. Single-document scopes never
    /// report duplicates; within one document the last definition simply wins.
    pub async fn definitions_in(
        &self,
        scope: &ProjectScope,
        document: &TextDocument,
    ) -> ProjectDefinitions {
        match scope {
            ProjectScope::SingleDocument => ProjectDefinitions {
                definitions: index_definitions(document),
                duplicates: Vec::new(),
            },
            ProjectScope::Rooted(root) => project_definitions(root, self.source).await,
        }
    }

    /// References visible from `document`.
    pub async fn references(&self, document: &TextDocument) -> ReferenceMap {
        let scope = self.scope(document).await;
        self.references_in(&scope, document).await
    }

    pub async fn references_in(
        &self,
        scope: &ProjectScope,
        document: &TextDocument,
    ) -> ReferenceMap {
        match scope {
            ProjectScope::SingleDocument => index_references(document),
            ProjectScope::Rooted(root) => project_references(root, self.source).await,
        }
    }

    /// Definition of the identifier under the caret, if any.
    pub async fn definition_at(
        &self,
        document: &TextDocument,
        position: Position,
    ) -> Option<SymbolLocation> {
        let (identifier, _) = word_at_position(document, position)?;
        self.definitions(document).await.remove(&identifier)
    }

    /// Every reference to the identifier under the caret.
    pub async fn references_at(
        &self,
        document: &TextDocument,
        position: Position,
    ) -> Vec<SymbolLocation> {
        let Some((identifier, _)) = word_at_position(document, position) else {
            return Vec::new();
        };
        self.references(document)
            .await
            .remove(&identifier)
            .unwrap_or_default()
    }
}
