//! Document synchronization handlers.

use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams,
    DidCloseTextDocumentParams,
    DidOpenTextDocumentParams,
};

use super::super::backend::Backend;

pub async fn handle_did_open(backend: &Backend, params: DidOpenTextDocumentParams) {
    let uri = params.text_document.uri;
    let text = params.text_document.text;
    tracing::debug!(uri = %uri, "Document opened");

    if !backend.accepts_document(&uri, &text).await {
        tracing::debug!(uri = %uri, "Not a catalog, ignoring");
        return;
    }

    backend.state.opened_files.lock().await.insert(uri.clone());
    backend.update_and_diagnose(uri, text).await;
}

pub async fn handle_did_change(backend: &Backend, params: DidChangeTextDocumentParams) {
    let uri = params.text_document.uri;

    if !backend.state.opened_files.lock().await.contains(&uri) {
        return;
    }

    // FULL sync なので最後の変更が全文
    let Some(change) = params.content_changes.into_iter().next_back() else {
        return;
    };

    backend.update_and_diagnose(uri, change.text).await;
}

pub async fn handle_did_close(backend: &Backend, params: DidCloseTextDocumentParams) {
    let uri = params.text_document.uri;

    if backend.state.opened_files.lock().await.remove(&uri) {
        backend.client.publish_diagnostics(uri, Vec::new(), None).await;
    }
}
