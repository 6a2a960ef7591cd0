//! Main language server implementation

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use myst_analysis::completion::{completion_items, CompletionCandidate, TRIGGER_CHARACTERS};
use myst_analysis::document::{
    DocumentSource, FileSystemSource, Position as AstPosition, Range as AstRange, TextDocument,
};
use myst_analysis::go_to_definition::goto_definition;
use myst_analysis::references::find_references;
use myst_analysis::symbols::SymbolLocation;
use myst_analysis::workspace::{IndexSettings, Workspace};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tower_lsp::async_trait;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionOptions, CompletionParams, CompletionResponse,
    DidChangeConfigurationParams, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, GotoDefinitionParams, GotoDefinitionResponse, InitializeParams,
    InitializeResult, InitializedParams, Location, MessageType, OneOf, Position, Range,
    ReferenceParams, ServerCapabilities, ServerInfo, TextDocumentItem, TextDocumentSyncCapability,
    TextDocumentSyncKind, Url, WorkDoneProgressOptions,
};
use tower_lsp::Client;
use tracing::{debug, info, warn};

/// Key of the settings object in `initializationOptions` and
/// `workspace/didChangeConfiguration` payloads.
pub const CONFIGURATION_SECTION: &str = "myst";

#[async_trait]
pub trait LspClient: Send + Sync + Clone + 'static {
    async fn show_message(&self, typ: MessageType, message: String);
}

#[async_trait]
impl LspClient for Client {
    async fn show_message(&self, typ: MessageType, message: String) {
        self.show_message(typ, message).await;
    }
}

#[async_trait]
pub trait FeatureProvider: Send + Sync + 'static {
    async fn goto_definition(
        &self,
        workspace: &Workspace<'_>,
        document: &TextDocument,
        position: AstPosition,
    ) -> Option<SymbolLocation>;
    async fn references(
        &self,
        workspace: &Workspace<'_>,
        document: &TextDocument,
        position: AstPosition,
        include_declaration: bool,
    ) -> Vec<SymbolLocation>;
    async fn completion(
        &self,
        workspace: &Workspace<'_>,
        document: &TextDocument,
        position: AstPosition,
        trigger_char: Option<&str>,
    ) -> Option<Vec<CompletionCandidate>>;
}

#[derive(Default)]
pub struct DefaultFeatureProvider;

impl DefaultFeatureProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FeatureProvider for DefaultFeatureProvider {
    async fn goto_definition(
        &self,
        workspace: &Workspace<'_>,
        document: &TextDocument,
        position: AstPosition,
    ) -> Option<SymbolLocation> {
        goto_definition(workspace, document, position).await
    }

    async fn references(
        &self,
        workspace: &Workspace<'_>,
        document: &TextDocument,
        position: AstPosition,
        include_declaration: bool,
    ) -> Vec<SymbolLocation> {
        find_references(workspace, document, position, include_declaration).await
    }

    async fn completion(
        &self,
        workspace: &Workspace<'_>,
        document: &TextDocument,
        position: AstPosition,
        trigger_char: Option<&str>,
    ) -> Option<Vec<CompletionCandidate>> {
        completion_items(workspace, document, position, trigger_char).await
    }
}

/// Open editor buffers keyed by file path.
///
/// Doubles as the [`DocumentSource`] for project indexing: unsaved buffer
/// contents take precedence over what is on disk.
#[derive(Default)]
pub struct DocumentStore {
    entries: RwLock<HashMap<PathBuf, Arc<TextDocument>>>,
}

impl DocumentStore {
    async fn upsert(&self, uri: &Url, text: String) -> Arc<TextDocument> {
        let document = Arc::new(TextDocument::new(document_path(uri), text));
        self.entries
            .write()
            .await
            .insert(document.path().to_path_buf(), document.clone());
        document
    }

    async fn get(&self, uri: &Url) -> Option<Arc<TextDocument>> {
        self.entries.read().await.get(&document_path(uri)).cloned()
    }

    async fn remove(&self, uri: &Url) {
        self.entries.write().await.remove(&document_path(uri));
    }
}

#[async_trait]
impl DocumentSource for DocumentStore {
    async fn open(&self, path: &Path) -> Option<TextDocument> {
        let buffered = self.entries.read().await.get(path).cloned();
        match buffered {
            Some(document) => Some(document.as_ref().clone()),
            None => FileSystemSource.open(path).await,
        }
    }
}

/// Filesystem path for a document URI. Non-file URIs keep their path
/// component so they can still be indexed on their own.
fn document_path(uri: &Url) -> PathBuf {
    uri.to_file_path()
        .unwrap_or_else(|_| PathBuf::from(uri.path()))
}

/// Settings read from the `myst` section of the client configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MystConfiguration {
    #[serde(flatten)]
    pub index: IndexSettings,
}

impl MystConfiguration {
    /// Extracts the `myst` section from a settings payload. `None` if the
    /// payload has no such section.
    fn from_settings(settings: &Value) -> Option<std::result::Result<Self, String>> {
        let section = settings.get(CONFIGURATION_SECTION)?;
        let parsed = serde_json::from_value::<MystConfiguration>(section.clone())
            .map_err(|err| err.to_string())
            .and_then(|config| {
                if config.index.marker_file.trim().is_empty() {
                    Err("markerFile must not be empty".to_string())
                } else {
                    Ok(config)
                }
            });
        Some(parsed)
    }
}

pub struct MystLanguageServer<C = Client, P = DefaultFeatureProvider> {
    client: C,
    documents: DocumentStore,
    features: Arc<P>,
    config: RwLock<MystConfiguration>,
}

impl MystLanguageServer<Client, DefaultFeatureProvider> {
    pub fn new(client: Client) -> Self {
        Self::with_features(client, Arc::new(DefaultFeatureProvider::new()))
    }
}

impl<C, P> MystLanguageServer<C, P>
where
    C: LspClient,
    P: FeatureProvider,
{
    pub fn with_features(client: C, features: Arc<P>) -> Self {
        Self {
            client,
            documents: DocumentStore::default(),
            features,
            config: RwLock::new(MystConfiguration::default()),
        }
    }

    pub async fn configuration(&self) -> MystConfiguration {
        self.config.read().await.clone()
    }

    async fn apply_settings(&self, settings: &Value) {
        match MystConfiguration::from_settings(settings) {
            Some(Ok(config)) => {
                info!(marker_file = %config.index.marker_file, "configuration updated");
                *self.config.write().await = config;
            }
            Some(Err(err)) => {
                warn!(%err, "ignoring invalid configuration");
                self.client
                    .show_message(
                        MessageType::WARNING,
                        format!("Ignoring invalid {CONFIGURATION_SECTION} settings: {err}"),
                    )
                    .await;
            }
            None => debug!("no {CONFIGURATION_SECTION} section in settings"),
        }
    }

    async fn index_settings(&self) -> IndexSettings {
        self.config.read().await.index.clone()
    }

    /// Locations in the requesting document reuse its URI so that non-file
    /// schemes survive the round trip. Other targets are loaded once each to
    /// translate their columns.
    async fn to_lsp_locations(
        &self,
        locations: &[SymbolLocation],
        request_uri: &Url,
        request: &TextDocument,
    ) -> Vec<Location> {
        let mut targets: HashMap<PathBuf, Option<TextDocument>> = HashMap::new();
        let mut converted = Vec::with_capacity(locations.len());
        for location in locations {
            if location.path == request.path() {
                converted.push(Location {
                    uri: request_uri.clone(),
                    range: to_lsp_range(&location.range, Some(request)),
                });
                continue;
            }
            let Ok(uri) = Url::from_file_path(&location.path) else {
                continue;
            };
            if !targets.contains_key(&location.path) {
                let loaded = self.documents.open(&location.path).await;
                targets.insert(location.path.clone(), loaded);
            }
            let target = targets.get(&location.path).and_then(Option::as_ref);
            converted.push(Location {
                uri,
                range: to_lsp_range(&location.range, target),
            });
        }
        converted
    }
}

/// UTF-16 code units before character `column` of `line`. Columns past the
/// end of the line keep their overhang.
fn char_to_utf16_column(line: &str, column: usize) -> usize {
    let units: usize = line.chars().take(column).map(char::len_utf16).sum();
    units + column.saturating_sub(line.chars().count())
}

/// Character column holding UTF-16 offset `units` of `line`. An offset inside
/// a surrogate pair lands after the character.
fn utf16_to_char_column(line: &str, units: usize) -> usize {
    let mut seen = 0;
    let mut count = 0;
    for ch in line.chars() {
        if seen >= units {
            return count;
        }
        seen += ch.len_utf16();
        count += 1;
    }
    count + units.saturating_sub(seen)
}

/// LSP positions count UTF-16 code units; analysis positions count chars.
/// Without the line text the column passes through unchanged.
fn to_lsp_position(position: &AstPosition, document: Option<&TextDocument>) -> Position {
    let column = match document.and_then(|document| document.line(position.line)) {
        Some(line) => char_to_utf16_column(line, position.column),
        None => position.column,
    };
    Position::new(position.line as u32, column as u32)
}

fn to_lsp_range(range: &AstRange, document: Option<&TextDocument>) -> Range {
    Range {
        start: to_lsp_position(&range.start, document),
        end: to_lsp_position(&range.end, document),
    }
}

fn from_lsp_position(position: Position, document: &TextDocument) -> AstPosition {
    let line = position.line as usize;
    let units = position.character as usize;
    let column = match document.line(line) {
        Some(text) => utf16_to_char_column(text, units),
        None => units,
    };
    AstPosition::new(line, column)
}

fn to_lsp_completion_item(candidate: &CompletionCandidate) -> CompletionItem {
    CompletionItem {
        label: candidate.label.clone(),
        kind: Some(candidate.kind),
        detail: candidate.detail.clone(),
        ..Default::default()
    }
}

#[async_trait]
impl<C, P> tower_lsp::LanguageServer for MystLanguageServer<C, P>
where
    C: LspClient,
    P: FeatureProvider,
{
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(options) = params.initialization_options.as_ref() {
            self.apply_settings(options).await;
        }
        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            definition_provider: Some(OneOf::Left(true)),
            references_provider: Some(OneOf::Left(true)),
            completion_provider: Some(CompletionOptions {
                resolve_provider: Some(false),
                trigger_characters: Some(
                    TRIGGER_CHARACTERS
                        .iter()
                        .map(|trigger| trigger.to_string())
                        .collect(),
                ),
                work_done_progress_options: WorkDoneProgressOptions::default(),
                all_commit_characters: None,
                ..Default::default()
            }),
            ..ServerCapabilities::default()
        };

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "myst-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("myst-lsp initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let TextDocumentItem { uri, text, .. } = params.text_document;
        debug!(%uri, "opened");
        self.documents.upsert(&uri, text).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.apply_settings(&params.settings).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents
                .upsert(&params.text_document.uri, change.text)
                .await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!(uri = %params.text_document.uri, "closed");
        self.documents.remove(&params.text_document.uri).await;
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let Some(document) = self.documents.get(&uri).await else {
            return Ok(None);
        };
        let settings = self.index_settings().await;
        let workspace = Workspace::new(&self.documents, &settings);
        let position =
            from_lsp_position(params.text_document_position_params.position, &document);
        let Some(location) = self
            .features
            .goto_definition(&workspace, &document, position)
            .await
        else {
            return Ok(None);
        };
        let location = self
            .to_lsp_locations(&[location], &uri, &document)
            .await
            .pop();
        Ok(location.map(GotoDefinitionResponse::Scalar))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let Some(document) = self.documents.get(&uri).await else {
            return Ok(None);
        };
        let settings = self.index_settings().await;
        let workspace = Workspace::new(&self.documents, &settings);
        let position = from_lsp_position(params.text_document_position.position, &document);
        let include_declaration = params.context.include_declaration;
        let found = self
            .features
            .references(&workspace, &document, position, include_declaration)
            .await;
        let locations = self.to_lsp_locations(&found, &uri, &document).await;
        if locations.is_empty() {
            Ok(None)
        } else {
            Ok(Some(locations))
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let Some(document) = self.documents.get(&uri).await else {
            return Ok(None);
        };
        let settings = self.index_settings().await;
        let workspace = Workspace::new(&self.documents, &settings);
        let position = from_lsp_position(params.text_document_position.position, &document);

        // Extract trigger character from context
        let trigger_char = params
            .context
            .as_ref()
            .and_then(|ctx| ctx.trigger_character.as_deref());

        let candidates = self
            .features
            .completion(&workspace, &document, position, trigger_char)
            .await;
        Ok(candidates.map(|candidates| {
            CompletionResponse::Array(candidates.iter().map(to_lsp_completion_item).collect())
        }))
    }
}
