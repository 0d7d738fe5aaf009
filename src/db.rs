//! Salsa データベース定義

/// カタログ解析用のデータベーストレイト
#[salsa::db]
pub trait CatalogDatabase: salsa::Database {}

/// カタログデータベースの実装
#[salsa::db]
#[derive(Clone, Default)]
pub struct CatalogDatabaseImpl {
    /// Salsa のストレージ
    storage: salsa::Storage<Self>,
}

impl std::fmt::Debug for CatalogDatabaseImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogDatabaseImpl").finish_non_exhaustive()
    }
}

#[salsa::db]
impl salsa::Database for CatalogDatabaseImpl {}

#[salsa::db]
impl CatalogDatabase for CatalogDatabaseImpl {}
