//! 診断メッセージ生成モジュール

use tower_lsp::lsp_types::{
    Diagnostic,
    DiagnosticSeverity,
    NumberOrString,
};

use crate::config::{
    DiagnosticsConfig,
    Severity,
};
use crate::db::CatalogDatabase;
use crate::input::catalog::CatalogFile;
use crate::lint::check_catalog;
use crate::syntax::parse_catalog;

/// 診断のソース名
pub const DIAGNOSTIC_SOURCE: &str = "linguist";

/// カタログファイルの診断メッセージを生成
///
/// パース時の構造エラーと lint ルールの結果を LSP の診断に変換します。
/// `off` に設定されたルールは出力されません。
pub fn generate_diagnostics(
    db: &dyn CatalogDatabase,
    file: CatalogFile,
    config: &DiagnosticsConfig,
) -> Vec<Diagnostic> {
    tracing::debug!("Generating diagnostics for catalog '{}'", file.uri(db));
    let parsed = parse_catalog(db, file);

    check_catalog(&parsed, config)
        .into_iter()
        .filter_map(|issue| {
            Some(Diagnostic {
                range: issue.range.into(),
                severity: Some(to_lsp_severity(issue.severity)?),
                code: Some(NumberOrString::String(issue.kind.code().to_string())),
                code_description: None,
                source: Some(DIAGNOSTIC_SOURCE.to_string()),
                message: issue.message,
                related_information: None,
                tags: None,
                data: None,
            })
        })
        .collect()
}

const fn to_lsp_severity(severity: Severity) -> Option<DiagnosticSeverity> {
    match severity {
        Severity::Error => Some(DiagnosticSeverity::ERROR),
        Severity::Warning => Some(DiagnosticSeverity::WARNING),
        Severity::Information => Some(DiagnosticSeverity::INFORMATION),
        Severity::Hint => Some(DiagnosticSeverity::HINT),
        Severity::Off => None,
    }
}
