//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数を提供します。

use crate::db::CatalogDatabaseImpl;
use crate::input::catalog::CatalogFile;

/// 1 コンテキストだけの TS 文書を作成する
///
/// # Arguments
/// * `language` - `language` 属性（例: "fr_FR"）
/// * `context` - コンテキスト名
/// * `messages` - `<message>` 要素を連結した文字列
pub(crate) fn catalog_text(language: &str, context: &str, messages: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n<TS version=\"2.1\" language=\"{language}\">\n<context>\n    <name>{context}</name>\n{messages}</context>\n</TS>\n"
    )
}

/// テスト用の `CatalogFile` を作成する
pub(crate) fn create_catalog_file(
    db: &CatalogDatabaseImpl,
    path: &str,
    language: &str,
    context: &str,
    messages: &str,
) -> CatalogFile {
    CatalogFile::new(db, path.to_string(), catalog_text(language, context, messages))
}
