//! Workspace-related handlers.

use tower_lsp::lsp_types::{
    DidChangeConfigurationParams,
    DidChangeWatchedFilesParams,
    DidChangeWorkspaceFoldersParams,
    FileChangeType,
    MessageType,
};

use super::super::backend::Backend;
use crate::config::{
    LinguistSettings,
    ServerSettings,
};

pub async fn handle_did_change_configuration(
    backend: &Backend,
    params: DidChangeConfigurationParams,
) {
    tracing::info!(settings = %params.settings, "didChangeConfiguration received");

    let new_settings = serde_json::from_value::<ServerSettings>(params.settings.clone())
        .map(|wrapped| wrapped.linguist)
        .or_else(|_| serde_json::from_value::<LinguistSettings>(params.settings));

    let new_settings = match new_settings {
        Ok(settings) => settings,
        Err(error) => {
            tracing::warn!(%error, "ignoring unreadable configuration");
            return;
        }
    };

    let mut config_manager = backend.config_manager.lock().await;
    match config_manager.update_settings(new_settings) {
        Ok(()) => {
            drop(config_manager);
            tracing::info!("configuration updated successfully");

            backend.reindex_workspace().await;
        }
        Err(error) => {
            drop(config_manager);
            tracing::error!(%error, "configuration validation error");
            backend
                .client
                .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
                .await;
        }
    }
}

pub async fn handle_did_change_workspace_folders(
    backend: &Backend,
    params: DidChangeWorkspaceFoldersParams,
) {
    tracing::debug!(
        added = params.event.added.len(),
        removed = params.event.removed.len(),
        "Workspace folders changed"
    );
    backend.reindex_workspace().await;
}

pub async fn handle_did_change_watched_files(
    backend: &Backend,
    params: DidChangeWatchedFilesParams,
) {
    for change in params.changes {
        let Some(file_path) = Backend::uri_to_path(&change.uri) else {
            continue;
        };

        if Backend::is_config_file(&file_path) {
            backend.handle_config_file_change(&file_path).await;
            continue;
        }

        if backend.is_catalog_file(&file_path).await {
            tracing::debug!("Catalog file changed: {:?}, type: {:?}", file_path, change.typ);

            match change.typ {
                FileChangeType::CREATED | FileChangeType::CHANGED => {
                    backend.reload_catalog_file(&file_path).await;
                }
                FileChangeType::DELETED => {
                    backend.remove_catalog_file(&file_path).await;
                }
                _ => {}
            }
        }
    }
}
