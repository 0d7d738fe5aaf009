//! Execute Command ハンドラー
//!
//! `workspace/executeCommand` リクエストを処理し、
//! カスタムコマンドを実行します。

use serde_json::{
    Value,
    json,
};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::ExecuteCommandParams;

use super::super::backend::Backend;
use crate::input::catalog::catalog_language;
use crate::syntax::parse_catalog;

/// 翻訳を取得するコマンド
pub const TRANSLATE: &str = "linguist.translate";
/// 読み込み済みの言語一覧を返すコマンド
pub const LIST_LANGUAGES: &str = "linguist.listLanguages";

/// サーバーが提供するコマンド
pub const COMMANDS: &[&str] = &[TRANSLATE, LIST_LANGUAGES];

/// `workspace/executeCommand` リクエストを処理
pub async fn handle_execute_command(
    backend: &Backend,
    params: ExecuteCommandParams,
) -> Result<Option<Value>> {
    tracing::debug!(command = %params.command, "Execute Command request");

    match params.command.as_str() {
        TRANSLATE => handle_translate(backend, &params.arguments).await,
        LIST_LANGUAGES => handle_list_languages(backend).await,
        _ => {
            tracing::warn!("Unknown command: {}", params.command);
            Ok(None)
        }
    }
}

/// `linguist.translate` コマンドを実行
///
/// # Arguments
/// * `arguments[0]` - コンテキスト名 (例: "FilterMateDockWidget")
/// * `arguments[1]` - ソース文字列
/// * `arguments[2]` - 言語コード（省略時は `defaultLanguage`）
/// * `arguments[3]` - 曖昧さ回避コメント（省略可）
/// * `arguments[4]` - 複数形の件数（省略可）
///
/// 翻訳が見つからない場合はソース文字列を返します。
async fn handle_translate(backend: &Backend, args: &[Value]) -> Result<Option<Value>> {
    let context = args.first().and_then(Value::as_str);
    let source = args.get(1).and_then(Value::as_str);

    let (Some(context), Some(source)) = (context, source) else {
        tracing::warn!("Invalid arguments for {}", TRANSLATE);
        return Ok(None);
    };

    let default_language =
        backend.config_manager.lock().await.get_settings().default_language.clone();
    let language =
        args.get(2).and_then(Value::as_str).map(ToString::to_string).or(default_language);
    let comment = args.get(3).and_then(Value::as_str).unwrap_or_default();
    let count = args.get(4).and_then(Value::as_i64);

    let Some(language) = language else {
        tracing::debug!("No language requested and no defaultLanguage configured");
        return Ok(Some(Value::String(source.to_string())));
    };

    let files = backend.state.catalog_files().await;
    let db = backend.state.db.lock().await;

    // 完全一致を優先し、なければ基本言語（`fr` → `fr_FR`）で探す
    let languages: Vec<_> =
        files.iter().map(|&file| (file, catalog_language(&*db, file))).collect();
    let file = languages
        .iter()
        .find(|(_, lang)| lang.as_deref() == Some(language.as_str()))
        .or_else(|| {
            languages
                .iter()
                .find(|(_, lang)| lang.as_deref().is_some_and(|l| same_base_language(l, &language)))
        })
        .map(|(file, _)| *file);

    let Some(file) = file else {
        tracing::debug!(language = %language, "No catalog for language");
        return Ok(Some(Value::String(source.to_string())));
    };

    let parsed = parse_catalog(&*db, file);
    let text = match count {
        Some(n) => parsed.catalog.translate_plural(context, source, comment, n),
        None => parsed.catalog.translate_disambiguated(context, source, comment),
    };

    Ok(Some(Value::String(text.to_string())))
}

/// `linguist.listLanguages` コマンドを実行
///
/// 言語とファイルの一覧を言語順で返します。
async fn handle_list_languages(backend: &Backend) -> Result<Option<Value>> {
    let files = backend.state.catalog_files().await;
    let db = backend.state.db.lock().await;

    let mut entries: Vec<(String, String, usize)> = files
        .iter()
        .filter_map(|&file| {
            let language = catalog_language(&*db, file)?;
            let messages = parse_catalog(&*db, file).catalog.message_count();
            Some((language, file.uri(&*db).clone(), messages))
        })
        .collect();
    drop(db);
    entries.sort();

    let value = entries
        .into_iter()
        .map(|(language, path, messages)| {
            json!({ "language": language, "path": path, "messages": messages })
        })
        .collect();

    Ok(Some(Value::Array(value)))
}

/// `fr` と `fr_FR` のように基本言語が一致するか
fn same_base_language(a: &str, b: &str) -> bool {
    let base = |code: &str| {
        code.split(['_', '-']).next().map(str::to_ascii_lowercase).unwrap_or_default()
    };
    base(a) == base(b)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("fr", "fr_FR", true)]
    #[case("pt-BR", "pt_PT", true)]
    #[case("FR", "fr", true)]
    #[case("de", "fr", false)]
    fn test_same_base_language(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        assert_eq!(same_base_language(a, b), expected);
    }
}
