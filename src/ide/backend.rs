//! LSP Backend 実装

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    DidChangeConfigurationParams,
    DidChangeTextDocumentParams,
    DidChangeWatchedFilesParams,
    DidChangeWatchedFilesRegistrationOptions,
    DidChangeWorkspaceFoldersParams,
    DidCloseTextDocumentParams,
    DidOpenTextDocumentParams,
    ExecuteCommandParams,
    FileSystemWatcher,
    GlobPattern,
    Hover,
    HoverParams,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    MessageType,
    NumberOrString,
    ProgressParams,
    ProgressParamsValue,
    Registration,
    Url,
    WorkDoneProgress,
    WorkDoneProgressBegin,
    WorkDoneProgressEnd,
    WorkDoneProgressReport,
    WorkspaceFolder,
    notification::Progress,
};
use tower_lsp::{
    Client,
    LanguageServer,
};

use super::handlers;
use super::state::ServerState;
use crate::config::{
    CONFIG_FILE_NAME,
    ConfigManager,
};
use crate::db::CatalogDatabaseImpl;
use crate::indexer::workspace::WorkspaceIndexer;
use crate::input::catalog::CatalogFile;

/// 進捗通知のトークン
const INDEXING_TOKEN: &str = "linguist-indexing";

/// LSP Backend
#[derive(Clone)]
pub struct Backend {
    /// LSP クライアント
    pub client: Client,
    /// 設定管理
    pub config_manager: Arc<Mutex<ConfigManager>>,
    /// ワークスペースインデクサー
    pub workspace_indexer: Arc<WorkspaceIndexer>,
    /// 共有状態
    pub state: ServerState,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("config_manager", &"<ConfigManager>")
            .field("workspace_indexer", &"<WorkspaceIndexer>")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Backend {
    /// 新しい `Backend` を作成
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            config_manager: Arc::new(Mutex::new(ConfigManager::new())),
            workspace_indexer: Arc::new(WorkspaceIndexer::new()),
            state: ServerState::new(CatalogDatabaseImpl::default()),
        }
    }

    /// ワークスペースフォルダを取得
    ///
    /// # Errors
    /// クライアントとの通信に失敗した場合
    pub(crate) async fn get_workspace_folders(&self) -> Result<Vec<WorkspaceFolder>> {
        self.client.workspace_folders().await.map(Option::unwrap_or_default)
    }

    /// URI をファイルパスに変換
    pub(crate) fn uri_to_path(uri: &Url) -> Option<PathBuf> {
        let path = uri.to_file_path().ok();
        if path.is_none() {
            tracing::warn!("Failed to convert URI to file path: {}", uri);
        }
        path
    }

    /// 設定ファイルかどうか
    pub(crate) fn is_config_file(path: &Path) -> bool {
        path.file_name().is_some_and(|name| name == CONFIG_FILE_NAME)
    }

    /// 設定のパターンに一致するカタログファイルかどうか
    pub(crate) async fn is_catalog_file(&self, path: &Path) -> bool {
        let matcher = self.config_manager.lock().await.file_matcher();
        matcher.is_some_and(|matcher| matcher.is_ok_and(|matcher| matcher.is_catalog_file(path)))
    }

    /// 開かれたドキュメントを扱うかどうか
    ///
    /// パターンに一致しない `.ts` でも、TS 文書に見えれば受け付けます。
    pub(crate) async fn accepts_document(&self, uri: &Url, text: &str) -> bool {
        let Some(path) = Self::uri_to_path(uri) else {
            return false;
        };
        if self.is_catalog_file(&path).await {
            return true;
        }

        path.extension().is_some_and(|ext| ext == "ts") && looks_like_catalog(text)
    }

    /// ワークスペースフォルダをインデックス（進捗通知付き）
    pub async fn index_workspace_folder(&self, workspace_path: &Path) {
        let token = NumberOrString::String(INDEXING_TOKEN.to_string());

        self.send_progress(
            &token,
            WorkDoneProgress::Begin(WorkDoneProgressBegin {
                title: "Indexing Translation Catalogs".to_string(),
                cancellable: Some(false),
                message: Some("Starting...".to_string()),
                percentage: Some(0),
            }),
        )
        .await;

        // ロックを保持し続けないように設定を複製
        let config_manager = self.config_manager.lock().await.clone();
        let db = self.state.db.lock().await.clone();
        let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<(u32, u32)>(100);

        let progress_task = {
            let client = self.client.clone();
            let token = token.clone();
            tokio::spawn(async move {
                while let Some((current, total)) = progress_rx.recv().await {
                    let percentage = (current * 100).checked_div(total).unwrap_or(0);
                    client
                        .send_notification::<Progress>(ProgressParams {
                            token: token.clone(),
                            value: ProgressParamsValue::WorkDone(WorkDoneProgress::Report(
                                WorkDoneProgressReport {
                                    cancellable: Some(false),
                                    message: Some(format!(
                                        "Processing catalogs: {current}/{total}"
                                    )),
                                    percentage: Some(percentage),
                                },
                            )),
                        })
                        .await;
                }
            })
        };

        let progress_callback = move |current: u32, total: u32| {
            let _ = progress_tx.try_send((current, total));
        };

        self.state.set_indexing(true);
        let index_result = self
            .workspace_indexer
            .index_workspace(
                db,
                workspace_path,
                &config_manager,
                self.state.catalogs.clone(),
                Some(progress_callback),
            )
            .await;
        self.state.set_indexing(false);
        let _ = progress_task.await;

        let end_message = match index_result {
            Ok(summary) => {
                tracing::info!(?summary, "Workspace indexing complete");
                format!("Indexed {} catalog(s)", summary.loaded)
            }
            Err(error) => {
                self.client
                    .log_message(MessageType::ERROR, format!("error indexing workspace: {error}"))
                    .await;
                format!("Indexing failed: {error}")
            }
        };
        self.send_progress(
            &token,
            WorkDoneProgress::End(WorkDoneProgressEnd { message: Some(end_message) }),
        )
        .await;

        self.process_pending_updates().await;
    }

    /// 進捗通知を送信
    async fn send_progress(&self, token: &NumberOrString, progress: WorkDoneProgress) {
        self.client
            .send_notification::<Progress>(ProgressParams {
                token: token.clone(),
                value: ProgressParamsValue::WorkDone(progress),
            })
            .await;
    }

    /// ワークスペースを再インデックス
    ///
    /// 新しい Salsa データベースを作成して、全ファイルを再インデックスします。
    /// 開いているファイルはエディタの内容を引き継ぎます。
    pub(crate) async fn reindex_workspace(&self) {
        self.client.log_message(MessageType::INFO, "Reindexing workspace...").await;

        let open_documents: Vec<(Url, String)> = {
            let (mut db, mut catalogs) = self.state.lock_db_and_catalogs().await;
            let opened_files = self.state.opened_files.lock().await;
            let documents = opened_files
                .iter()
                .filter_map(|uri| {
                    let file = catalogs.get(&uri.to_file_path().ok()?)?;
                    Some((uri.clone(), file.text(&*db).clone()))
                })
                .collect();
            drop(opened_files);

            // 古いキャッシュをクリア
            *db = CatalogDatabaseImpl::default();
            catalogs.clear();
            documents
        };

        let mut folders: Vec<PathBuf> = self
            .get_workspace_folders()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter_map(|folder| folder.uri.to_file_path().ok())
            .collect();
        if folders.is_empty()
            && let Some(root) = self.config_manager.lock().await.workspace_root().cloned()
        {
            folders.push(root);
        }

        for folder in folders {
            self.index_workspace_folder(&folder).await;
        }

        for (uri, text) in open_documents {
            self.update_and_diagnose(uri, text).await;
        }
        self.client.log_message(MessageType::INFO, "Reindexing complete").await;
    }

    /// カタログを登録または更新
    ///
    /// インデックス中は更新を保留し、`None` を返します。
    async fn upsert_catalog(&self, path: PathBuf, text: String) -> Option<CatalogFile> {
        use salsa::Setter;

        let (mut db, mut catalogs) = self.state.lock_db_and_catalogs().await;
        if let Some(file) = catalogs.get(&path).copied() {
            drop(catalogs);
            if self.state.is_indexing() {
                drop(db);
                tracing::debug!(path = %path.display(), "Deferring update until indexing completes");
                self.state.pending_updates.lock().await.insert(path, text);
                return None;
            }
            // Salsa が依存クエリを自動的に無効化
            file.set_text(&mut *db).to(text);
            Some(file)
        } else {
            let file = CatalogFile::new(&*db, path.to_string_lossy().to_string(), text);
            catalogs.insert(path, file);
            Some(file)
        }
    }

    /// インデックス中に保留された更新を反映
    pub(crate) async fn process_pending_updates(&self) {
        let pending: Vec<_> = self.state.pending_updates.lock().await.drain().collect();
        if pending.is_empty() {
            return;
        }

        tracing::debug!(count = pending.len(), "Applying pending updates");
        for (path, text) in pending {
            let _ = self.upsert_catalog(path, text).await;
        }
        self.send_diagnostics_to_opened_files().await;
    }

    /// ファイル内容を更新して診断を送信
    pub(crate) async fn update_and_diagnose(&self, uri: Url, text: String) {
        let Some(path) = Self::uri_to_path(&uri) else {
            return;
        };

        if self.upsert_catalog(path, text).await.is_some() {
            self.publish_catalog_diagnostics(uri).await;
        }
    }

    /// 1 ファイルの診断を送信
    async fn publish_catalog_diagnostics(&self, uri: Url) {
        let Some(path) = Self::uri_to_path(&uri) else {
            return;
        };
        let config = self.config_manager.lock().await.get_settings().diagnostics;

        let diagnostics = {
            let (db, catalogs) = self.state.lock_db_and_catalogs().await;
            let Some(file) = catalogs.get(&path).copied() else {
                return;
            };
            drop(catalogs);
            crate::ide::diagnostics::generate_diagnostics(&*db, file, &config)
        };

        tracing::debug!(uri = %uri, count = diagnostics.len(), "Publishing diagnostics");
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }

    /// 開いている全ファイルの診断を送信
    pub(crate) async fn send_diagnostics_to_opened_files(&self) {
        let opened: Vec<Url> = self.state.opened_files.lock().await.iter().cloned().collect();
        for uri in opened {
            self.publish_catalog_diagnostics(uri).await;
        }
    }

    /// ディスク上のカタログを再読み込み
    ///
    /// 開いているファイルはエディタの内容を優先するため無視します。
    pub(crate) async fn reload_catalog_file(&self, path: &Path) {
        if let Ok(uri) = Url::from_file_path(path)
            && self.state.opened_files.lock().await.contains(&uri)
        {
            return;
        }

        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                let _ = self.upsert_catalog(path.to_path_buf(), text).await;
            }
            Err(error) => tracing::warn!("Failed to read catalog {:?}: {}", path, error),
        }
    }

    /// カタログを登録解除
    pub(crate) async fn remove_catalog_file(&self, path: &Path) {
        self.state.catalogs.lock().await.remove(path);
        self.state.pending_updates.lock().await.remove(path);
    }

    /// 設定ファイルの変更を反映
    pub(crate) async fn handle_config_file_change(&self, path: &Path) {
        let mut config_manager = self.config_manager.lock().await;
        if config_manager.config_path().as_deref() != Some(path) {
            return;
        }

        let result = config_manager.reload();
        drop(config_manager);
        match result {
            Ok(()) => {
                tracing::info!("Configuration file reloaded");
                self.reindex_workspace().await;
            }
            Err(error) => {
                self.client
                    .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
                    .await;
            }
        }
    }

    /// カタログと設定ファイルの監視を登録
    pub(crate) async fn register_file_watchers(&self) {
        let options = DidChangeWatchedFilesRegistrationOptions {
            watchers: ["**/*.ts".to_string(), format!("**/{CONFIG_FILE_NAME}")]
                .into_iter()
                .map(|pattern| FileSystemWatcher {
                    glob_pattern: GlobPattern::String(pattern),
                    kind: None,
                })
                .collect(),
        };

        let register_options = match serde_json::to_value(options) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(%error, "Failed to serialize watcher options");
                return;
            }
        };

        let registration = Registration {
            id: "linguist-watched-files".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: Some(register_options),
        };

        if let Err(error) = self.client.register_capability(vec![registration]).await {
            tracing::warn!(%error, "Failed to register file watchers");
        }
    }
}

/// XML 宣言、DOCTYPE、または `<TS` で始まるか
fn looks_like_catalog(text: &str) -> bool {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    ["<?xml", "<!DOCTYPE TS", "<TS"].iter().any(|prefix| text.starts_with(prefix))
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handlers::lifecycle::handle_initialize(self, params).await
    }

    async fn initialized(&self, params: InitializedParams) {
        handlers::lifecycle::handle_initialized(self, params).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handlers::lifecycle::handle_shutdown().await
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        handlers::workspace::handle_did_change_workspace_folders(self, params).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        handlers::workspace::handle_did_change_configuration(self, params).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        handlers::workspace::handle_did_change_watched_files(self, params).await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        handlers::document_sync::handle_did_open(self, params).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        handlers::document_sync::handle_did_change(self, params).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        handlers::document_sync::handle_did_close(self, params).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        handlers::features::handle_hover(self, params).await
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        handlers::execute_command::handle_execute_command(self, params).await
    }
}
