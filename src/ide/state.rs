//! LSP サーバーの共有状態

use std::collections::{
    HashMap,
    HashSet,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};

use tokio::sync::{
    Mutex,
    MutexGuard,
};
use tower_lsp::lsp_types::Url;

use crate::db::CatalogDatabaseImpl;
use crate::input::catalog::CatalogFile;

/// LSP サーバーの共有状態
///
/// `Backend` から状態管理の責務を分離し、ハンドラー間で共有可能にします。
///
/// # ロック順序
///
/// 複数のロックを同時に取得する場合は、以下の順序を厳守してください：
/// 1. `db`
/// 2. `catalogs` / `opened_files`
#[derive(Clone)]
pub struct ServerState {
    /// Salsa データベース
    pub db: Arc<Mutex<CatalogDatabaseImpl>>,
    /// `CatalogFile` 管理（ファイルパス → `CatalogFile`）
    pub catalogs: Arc<Mutex<HashMap<PathBuf, CatalogFile>>>,
    /// 現在開いているファイルの URI
    pub opened_files: Arc<Mutex<HashSet<Url>>>,
    /// インデックス中に受け取った更新（ファイルパス → 新しい内容）
    pub pending_updates: Arc<Mutex<HashMap<PathBuf, String>>>,
    /// インデックス中かどうか
    indexing: Arc<AtomicBool>,
}

impl ServerState {
    /// 新しい `ServerState` を作成
    #[must_use]
    pub fn new(db: CatalogDatabaseImpl) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            catalogs: Arc::new(Mutex::new(HashMap::new())),
            opened_files: Arc::new(Mutex::new(HashSet::new())),
            pending_updates: Arc::new(Mutex::new(HashMap::new())),
            indexing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// インデックス中は入力を変更できない（Salsa の書き込みが他のハンドルを待つため）
    #[must_use]
    pub fn is_indexing(&self) -> bool {
        self.indexing.load(Ordering::Acquire)
    }

    /// インデックス状態を設定
    pub fn set_indexing(&self, indexing: bool) {
        self.indexing.store(indexing, Ordering::Release);
    }

    /// `db` と `catalogs` のロックを一括取得
    ///
    /// ロック順序（`db` → `catalogs`）を保証します。
    pub async fn lock_db_and_catalogs(
        &self,
    ) -> (MutexGuard<'_, CatalogDatabaseImpl>, MutexGuard<'_, HashMap<PathBuf, CatalogFile>>) {
        let db = self.db.lock().await;
        let catalogs = self.catalogs.lock().await;
        (db, catalogs)
    }

    /// 登録済みカタログをパス順で取得
    pub async fn catalog_files(&self) -> Vec<CatalogFile> {
        let catalogs = self.catalogs.lock().await;
        let mut entries: Vec<_> = catalogs.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, file)| *file).collect()
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("db", &"<CatalogDatabaseImpl>")
            .field("catalogs", &"<HashMap<PathBuf, CatalogFile>>")
            .field("opened_files", &"<HashSet<Url>>")
            .field("pending_updates", &"<HashMap<PathBuf, String>>")
            .field("indexing", &self.is_indexing())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn clone_shares_state() {
        let state1 = ServerState::new(CatalogDatabaseImpl::default());
        let state2 = state1.clone();

        expect_that!(Arc::strong_count(&state1.db), eq(2));
        expect_that!(Arc::ptr_eq(&state1.db, &state2.db), eq(true));
        expect_that!(Arc::ptr_eq(&state1.catalogs, &state2.catalogs), eq(true));
    }

    #[googletest::test]
    fn debug_impl_works() {
        let state = ServerState::new(CatalogDatabaseImpl::default());

        let debug_str = format!("{state:?}");

        expect_that!(debug_str, contains_substring("ServerState"));
        expect_that!(debug_str, contains_substring("catalogs"));
        expect_that!(debug_str, contains_substring("opened_files"));
    }

    #[tokio::test]
    async fn catalog_files_are_sorted_by_path() {
        let state = ServerState::new(CatalogDatabaseImpl::default());
        {
            let (db, mut catalogs) = state.lock_db_and_catalogs().await;
            for name in ["FilterMate_fr.ts", "FilterMate_de.ts"] {
                let file = CatalogFile::new(&*db, format!("/i18n/{name}"), "<TS/>".to_string());
                catalogs.insert(PathBuf::from("/i18n").join(name), file);
            }
        }

        let files = state.catalog_files().await;
        let db = state.db.lock().await;
        let uris: Vec<&str> = files.iter().map(|file| file.uri(&*db).as_str()).collect();

        assert_eq!(uris, vec!["/i18n/FilterMate_de.ts", "/i18n/FilterMate_fr.ts"]);
    }

    #[googletest::test]
    fn indexing_flag_is_shared() {
        let state1 = ServerState::new(CatalogDatabaseImpl::default());
        let state2 = state1.clone();

        state1.set_indexing(true);
        expect_that!(state2.is_indexing(), eq(true));
        state2.set_indexing(false);
        expect_that!(state1.is_indexing(), eq(false));
    }

    #[tokio::test]
    async fn cloned_state_shares_modifications() {
        let state1 = ServerState::new(CatalogDatabaseImpl::default());
        let state2 = state1.clone();

        state1.opened_files.lock().await.insert(Url::parse("file:///i18n/FilterMate_fr.ts").unwrap());

        assert_eq!(state2.opened_files.lock().await.len(), 1);
    }
}
