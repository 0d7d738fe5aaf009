//! Workspace indexer: finds `.ts` catalogs and registers them as salsa inputs.
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use futures::StreamExt as _;
use ignore::WalkBuilder;
use tokio::sync::Mutex;

use crate::config::{
    ConfigManager,
    FileMatcher,
};
use crate::db::CatalogDatabaseImpl;
use crate::indexer::types::{
    IndexSummary,
    IndexerError,
};
use crate::input::catalog::CatalogFile;

/// カタログファイルのインデクサー
#[derive(Clone, Debug, Default)]
pub struct WorkspaceIndexer;

impl WorkspaceIndexer {
    /// 新しいインデクサーを作成
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// ワークスペースをインデックス
    ///
    /// 見つかったカタログを読み込み、`catalogs` に登録します。
    /// 読み込めないファイルは警告を出してスキップします。
    ///
    /// # Errors
    /// - パターンが不正な場合
    /// - ワークスペースパスが存在しない場合
    pub async fn index_workspace<F>(
        &self,
        db: CatalogDatabaseImpl,
        workspace_path: &Path,
        config_manager: &ConfigManager,
        catalogs: Arc<Mutex<HashMap<PathBuf, CatalogFile>>>,
        progress_callback: Option<F>,
    ) -> Result<IndexSummary, IndexerError>
    where
        F: Fn(u32, u32) + Send + Sync,
    {
        tracing::debug!(workspace_path = %workspace_path.display(), "Indexing workspace");
        if !workspace_path.is_dir() {
            return Err(IndexerError::InvalidPath(workspace_path.display().to_string()));
        }

        let settings = config_manager.get_settings();
        let matcher = FileMatcher::new(workspace_path.to_path_buf(), settings)?;
        let files = Self::find_catalog_files(&matcher);
        let total = u32::try_from(files.len()).unwrap_or(u32::MAX);
        tracing::info!(count = files.len(), "Found catalog files");

        // 並列でファイルを読み込み
        let mut reads = futures::stream::iter(files.iter().cloned())
            .map(|path| async move {
                let text = tokio::fs::read_to_string(&path).await;
                (path, text)
            })
            .buffer_unordered(settings.indexing.effective_threads());

        let mut summary = IndexSummary { discovered: files.len(), loaded: 0 };
        let mut processed = 0_u32;
        while let Some((path, text)) = reads.next().await {
            processed += 1;
            if let Some(callback) = &progress_callback {
                callback(processed, total);
            }

            let text = match text {
                Ok(text) => text,
                Err(e) => {
                    // 読み込みエラーは警告として扱い、処理を続行
                    tracing::warn!("Failed to read catalog {:?}: {}", path, e);
                    continue;
                }
            };

            // 既に開かれているファイルはエディタの内容を優先
            let mut registered = catalogs.lock().await;
            if let Entry::Vacant(entry) = registered.entry(path) {
                let uri = entry.key().to_string_lossy().to_string();
                entry.insert(CatalogFile::new(&db, uri, text));
                summary.loaded += 1;
            }
        }

        tracing::info!(loaded = summary.loaded, "Workspace indexing finished");
        Ok(summary)
    }

    /// カタログファイルを検索
    #[must_use]
    pub fn find_catalog_files(matcher: &FileMatcher) -> Vec<PathBuf> {
        let workspace_path = matcher.workspace_root();
        let mut found_files = Vec::new();

        // ignore クレートでファイルを走査
        for result in WalkBuilder::new(workspace_path)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            if matcher.is_catalog_file(entry.path()) {
                found_files.push(entry.path().to_path_buf());
            }
        }

        found_files.sort();
        found_files
    }
}
