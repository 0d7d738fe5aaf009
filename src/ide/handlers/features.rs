//! LSP 機能ハンドラー
//!
//! `hover` の処理を担当します。

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    Hover,
    HoverContents,
    HoverParams,
    MarkupContent,
    MarkupKind,
};

use super::super::backend::Backend;
use crate::syntax::message_key_at_position;
use crate::types::SourcePosition;

/// `textDocument/hover` リクエストを処理
pub async fn handle_hover(backend: &Backend, params: HoverParams) -> Result<Option<Hover>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Hover request");

    let Some(file_path) = Backend::uri_to_path(&uri) else {
        return Ok(None);
    };

    let primary_languages =
        backend.config_manager.lock().await.get_settings().primary_languages.clone();

    let (db, catalogs) = backend.state.lock_db_and_catalogs().await;
    let Some(file) = catalogs.get(&file_path).copied() else {
        tracing::debug!("Catalog not found in cache: {}", file_path.display());
        return Ok(None);
    };
    let mut entries: Vec<_> = catalogs.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let files: Vec<_> = entries.into_iter().map(|(_, file)| *file).collect();
    drop(catalogs);

    let Some(key) = message_key_at_position(&*db, file, SourcePosition::from(position)) else {
        tracing::debug!("No message found at position");
        return Ok(None);
    };

    let hover_text = crate::ide::hover::generate_hover_content(
        &*db,
        key,
        &files,
        primary_languages.as_deref(),
    );
    drop(db);

    Ok(Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: hover_text,
        }),
        range: None,
    }))
}
