use myst_analysis::document::{FileSystemSource, TextDocument};
use myst_analysis::symbols::{DefinitionMap, ReferenceMap};
use myst_analysis::workspace::{IndexSettings, Workspace};
use myst_lsp::MystLanguageServer;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter; falls back to `RUST_LOG`.
const LOG_ENV: &str = "MYST_LSP_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args: Vec<String> = env::args().collect();

    // If called with "symbols" subcommand, handle it and exit
    if args.len() >= 2 && args[1] == "symbols" {
        return handle_symbols(&args[2..]).await;
    }

    // Default: run as LSP server
    info!(version = env!("CARGO_PKG_VERSION"), "starting myst-lsp on stdio");
    let stdin = stdin();
    let stdout = stdout();
    let (service, socket) = LspService::new(MystLanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
    ExitCode::SUCCESS
}

/// Output of the `symbols` subcommand.
#[derive(Serialize)]
struct SymbolReport<'a> {
    /// Project root, `null` when the file is indexed on its own.
    root: Option<&'a Path>,
    definitions: &'a DefinitionMap,
    references: &'a ReferenceMap,
}

/// Logs go to stderr; stdout carries the protocol.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

async fn handle_symbols(args: &[String]) -> ExitCode {
    let mut input_path: Option<&str> = None;
    let mut settings = IndexSettings::default();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg == "--marker" && i + 1 < args.len() {
            settings.marker_file = args[i + 1].clone();
            i += 2;
        } else if !arg.starts_with('-') && input_path.is_none() {
            input_path = Some(arg);
            i += 1;
        } else {
            eprintln!("Error: Unexpected argument {arg}");
            return ExitCode::FAILURE;
        }
    }

    let Some(input) = input_path else {
        eprintln!("Usage: myst-lsp symbols <file.md> [--marker <file>]");
        return ExitCode::FAILURE;
    };

    // Relative inputs are anchored so the root search has directories to walk.
    let path = match env::current_dir() {
        Ok(cwd) => cwd.join(input),
        Err(_) => PathBuf::from(input),
    };
    let document = match TextDocument::read(&path).await {
        Ok(document) => document,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let workspace = Workspace::new(&FileSystemSource, &settings);
    let scope = workspace.scope(&document).await;
    let project = workspace.definitions_in(&scope, &document).await;
    let references = workspace.references_in(&scope, &document).await;

    let report = SymbolReport {
        root: scope.root(),
        definitions: &project.definitions,
        references: &references,
    };
    match serde_json::to_string_pretty(&report) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing symbols for {input}: {e}");
            ExitCode::FAILURE
        }
    }
}
