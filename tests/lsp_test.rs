//! Language server tests driving the backend over a temporary workspace.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]
#![allow(missing_docs)]
#![allow(deprecated)]
#![allow(clippy::indexing_slicing)]

use std::path::{
    Path,
    PathBuf,
};

use linguist_language_server::Backend;
use linguist_language_server::ide::{
    COMMANDS,
    LIST_LANGUAGES,
    TRANSLATE,
};
use pretty_assertions::assert_eq;
use serde_json::{
    Value,
    json,
};
use tempfile::TempDir;
use tower_lsp::lsp_types::*;
use tower_lsp::{
    LanguageServer,
    LspService,
};

fn create_test_backend() -> Backend {
    let (service, _socket) = LspService::new(Backend::new);
    service.inner().clone()
}

/// Copies the fixtures into `<tmp>/i18n` next to a workspace config file.
fn create_workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/i18n");
    let i18n = temp_dir.path().join("i18n");
    std::fs::create_dir_all(&i18n).unwrap();

    for name in ["FilterMate_fr.ts", "FilterMate_de.ts"] {
        std::fs::copy(fixtures.join(name), i18n.join(name)).unwrap();
    }
    std::fs::write(
        temp_dir.path().join(".linguist-lsp.json"),
        r#"{"primaryLanguages": ["fr_FR"], "defaultLanguage": "fr"}"#,
    )
    .unwrap();

    temp_dir
}

fn initialize_params(root: &Path) -> InitializeParams {
    InitializeParams {
        workspace_folders: Some(vec![WorkspaceFolder {
            uri: Url::from_file_path(root).unwrap(),
            name: "plugin".to_string(),
        }]),
        ..InitializeParams::default()
    }
}

/// Initializes the backend and indexes the workspace without the client round-trips of `initialized`.
async fn start(root: &Path) -> Backend {
    let backend = create_test_backend();
    backend.initialize(initialize_params(root)).await.unwrap();
    backend.index_workspace_folder(root).await;
    backend
}

async fn execute(backend: &Backend, command: &str, arguments: Vec<Value>) -> Option<Value> {
    backend
        .execute_command(ExecuteCommandParams {
            command: command.to_string(),
            arguments,
            work_done_progress_params: WorkDoneProgressParams::default(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_initialize_advertises_capabilities() {
    let workspace = create_workspace();
    let backend = create_test_backend();

    let result = backend.initialize(initialize_params(workspace.path())).await.unwrap();

    let capabilities = result.capabilities;
    assert!(matches!(capabilities.hover_provider, Some(HoverProviderCapability::Simple(true))));
    assert!(matches!(
        capabilities.text_document_sync,
        Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL))
    ));
    assert_eq!(capabilities.execute_command_provider.unwrap().commands, COMMANDS.to_vec());
    assert_eq!(result.server_info.unwrap().name, "linguist-language-server");
    tokio_test::assert_ok!(backend.shutdown().await);
}

#[tokio::test]
async fn test_hover_lists_translations_primary_first() {
    let workspace = create_workspace();
    let backend = start(workspace.path()).await;
    let path = workspace.path().join("i18n/FilterMate_fr.ts");
    let uri = Url::from_file_path(&path).unwrap();

    backend
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: "xml".to_string(),
                version: 1,
                text: std::fs::read_to_string(&path).unwrap(),
            },
        })
        .await;

    let hover = backend
        .hover(HoverParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri },
                position: Position { line: 20, character: 10 },
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
        })
        .await
        .unwrap()
        .unwrap();

    let HoverContents::Markup(markup) = hover.contents else {
        panic!("Expected Markup content");
    };
    assert_eq!(markup.kind, MarkupKind::Markdown);
    assert!(markup.value.starts_with("**Context:** `FilterMateDockWidget`\n\n**Source:** Filter\n\n"));
    let french = markup.value.find("**fr_FR**: Filtrer").unwrap();
    let german = markup.value.find("**de_DE**: Filtern").unwrap();
    assert!(french < german, "{}", markup.value);
}

#[tokio::test]
async fn test_hover_outside_message_returns_none() {
    let workspace = create_workspace();
    let backend = start(workspace.path()).await;
    let uri = Url::from_file_path(workspace.path().join("i18n/FilterMate_de.ts")).unwrap();

    let hover = backend
        .hover(HoverParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri },
                position: Position { line: 2, character: 0 },
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
        })
        .await
        .unwrap();

    assert!(hover.is_none());
}

#[tokio::test]
async fn test_translate_command() {
    let workspace = create_workspace();
    let backend = start(workspace.path()).await;

    let cases = [
        (json!(["FilterMateDockWidget", "Filter"]), "Filtrer"),
        (json!(["FilterMateDockWidget", "Filter", "de"]), "Filtern"),
        (json!(["FilterMateDockWidget", "Filter", "fr_FR", "noun"]), "Filtre"),
        (json!(["FilterMateDockWidget", "Zoom to layer"]), "Zoom to layer"),
        (json!(["FilterMateDockWidget", "Filter", "es"]), "Filter"),
        (json!(["FilterMateDockWidget", "%n layer(s) selected", null, "", 5]), "%n couches sélectionnées"),
        (json!(["FilterMateDockWidget", "%n layer(s) selected", "fr", "", 1]), "%n couche sélectionnée"),
    ];

    for (arguments, expected) in cases {
        let Value::Array(arguments) = arguments else {
            panic!("Expected an argument array");
        };
        let result = execute(&backend, TRANSLATE, arguments.clone()).await;
        assert_eq!(result, Some(json!(expected)), "arguments: {arguments:?}");
    }

    assert_eq!(execute(&backend, TRANSLATE, vec![json!("FilterMate")]).await, None);
    assert_eq!(execute(&backend, "linguist.unknown", Vec::new()).await, None);
}

#[tokio::test]
async fn test_list_languages_command() {
    let workspace = create_workspace();
    let backend = start(workspace.path()).await;

    let result = execute(&backend, LIST_LANGUAGES, Vec::new()).await.unwrap();

    let Value::Array(entries) = result else {
        panic!("Expected an array");
    };
    let summary: Vec<(&str, u64)> = entries
        .iter()
        .map(|entry| (entry["language"].as_str().unwrap(), entry["messages"].as_u64().unwrap()))
        .collect();
    assert_eq!(summary, vec![("de_DE", 3), ("fr_FR", 8)]);
    assert!(entries[1]["path"].as_str().unwrap().ends_with("FilterMate_fr.ts"));
}

#[tokio::test]
async fn test_edits_to_open_document_are_used() {
    let workspace = create_workspace();
    let backend = start(workspace.path()).await;
    let path = workspace.path().join("i18n/FilterMate_de.ts");
    let uri = Url::from_file_path(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();

    backend
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: "xml".to_string(),
                version: 1,
                text: text.clone(),
            },
        })
        .await;
    backend
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier { uri: uri.clone(), version: 2 },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: text.replace("Filtern", "Filtrieren"),
            }],
        })
        .await;

    let translated =
        execute(&backend, TRANSLATE, vec![json!("FilterMateDockWidget"), json!("Filter"), json!("de")])
            .await;
    assert_eq!(translated, Some(json!("Filtrieren")));

    backend
        .did_close(DidCloseTextDocumentParams { text_document: TextDocumentIdentifier { uri } })
        .await;
}
