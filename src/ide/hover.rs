//! Hover implementation

use std::fmt::Write as _;
use std::path::Path;

use crate::catalog::{
    Message,
    TranslationKind,
    extract_placeholders,
};
use crate::db::CatalogDatabase;
use crate::input::catalog::{
    CatalogFile,
    catalog_language,
};
use crate::interned::MessageKey;
use crate::syntax::parse_catalog;

/// Generate hover content for a message
///
/// # ソート順
/// 言語は以下の順序でソートされます：
/// 1. `primary_languages`（設定順）
/// 2. その他（アルファベット順）
///
/// メッセージを含まないカタログは表示しません。
pub fn generate_hover_content(
    db: &dyn CatalogDatabase,
    key: MessageKey<'_>,
    catalogs: &[CatalogFile],
    primary_languages: Option<&[String]>,
) -> String {
    let context = key.context(db);
    let source = key.source(db);
    let comment = key.comment(db);

    let mut content = format!("**Context:** `{context}`\n\n**Source:** {source}\n\n");
    if !comment.is_empty() {
        let _ = write!(content, "**Disambiguation:** {comment}\n\n");
    }

    let placeholders = extract_placeholders(source);
    if !placeholders.is_empty() {
        let list: Vec<String> = placeholders.iter().map(|p| format!("`{p}`")).collect();
        let _ = write!(content, "**Placeholders:** {}\n\n", list.join(", "));
    }

    let mut translations_found: Vec<(String, String)> = catalogs
        .iter()
        .filter_map(|&file| {
            let parsed = parse_catalog(db, file);
            let message = parsed.catalog.find_message(context, source, comment)?;
            let language = catalog_language(db, file).unwrap_or_else(|| {
                Path::new(file.uri(db))
                    .file_stem()
                    .map_or_else(String::new, |stem| stem.to_string_lossy().to_string())
            });
            Some((language, format_translation(message)))
        })
        .collect();

    sort_translations_by_priority(&mut translations_found, primary_languages);

    for (language, value) in translations_found {
        let _ = writeln!(content, "**{language}**: {value}");
    }

    content
}

/// 翻訳を表示用文字列に変換
fn format_translation(message: &Message) -> String {
    let Some(translation) = &message.translation else {
        return "*(missing)*".to_string();
    };

    let text = if message.numerus {
        translation.numerus_forms.join(" | ")
    } else {
        translation.text.clone()
    };
    let text = if text.is_empty() { "*(empty)*".to_string() } else { text };

    if translation.kind == TranslationKind::Unfinished {
        format!("{text} *(unfinished)*")
    } else {
        text
    }
}

/// 翻訳結果を優先度順にソート
fn sort_translations_by_priority(
    translations: &mut [(String, String)],
    primary_languages: Option<&[String]>,
) {
    translations.sort_by(|a, b| {
        get_language_priority(&a.0, primary_languages)
            .cmp(&get_language_priority(&b.0, primary_languages))
    });
}

/// Language priority for sorting
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum LanguagePriority<'a> {
    /// Primary language with its position index
    Primary(usize),
    /// Other language (sorted alphabetically)
    Other(&'a str),
}

/// 言語の優先度を計算
fn get_language_priority<'a>(
    lang: &'a str,
    primary_languages: Option<&[String]>,
) -> LanguagePriority<'a> {
    if let Some(primaries) = primary_languages
        && let Some(pos) = primaries.iter().position(|p| p == lang)
    {
        return LanguagePriority::Primary(pos);
    }

    LanguagePriority::Other(lang)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::db::CatalogDatabaseImpl;
    use crate::test_utils::create_catalog_file;

    fn files(db: &CatalogDatabaseImpl) -> Vec<CatalogFile> {
        let context = "FilterMateDockWidget";
        vec![
            create_catalog_file(
                db,
                "/i18n/FilterMate_fr.ts",
                "fr_FR",
                context,
                "<message><source>Filter {layer}</source><translation>Filtrer {layer}</translation></message>",
            ),
            create_catalog_file(
                db,
                "/i18n/FilterMate_de.ts",
                "de",
                context,
                "<message><source>Filter {layer}</source><translation type=\"unfinished\">Filtern {layer}</translation></message>",
            ),
            create_catalog_file(
                db,
                "/i18n/FilterMate_ja.ts",
                "ja",
                context,
                "<message><source>Reset</source><translation>リセット</translation></message>",
            ),
        ]
    }

    #[googletest::test]
    fn hover_lists_every_language_with_the_message() {
        let db = CatalogDatabaseImpl::default();
        let files = files(&db);
        let key = MessageKey::new(
            &db,
            "FilterMateDockWidget".to_string(),
            "Filter {layer}".to_string(),
            String::new(),
        );

        let content = generate_hover_content(&db, key, &files, None);

        assert_eq!(
            content,
            "**Context:** `FilterMateDockWidget`\n\n**Source:** Filter {layer}\n\n**Placeholders:** `{layer}`\n\n**de**: Filtern {layer} *(unfinished)*\n**fr_FR**: Filtrer {layer}\n"
        );
    }

    #[googletest::test]
    fn hover_puts_primary_languages_first() {
        let db = CatalogDatabaseImpl::default();
        let files = files(&db);
        let key = MessageKey::new(
            &db,
            "FilterMateDockWidget".to_string(),
            "Filter {layer}".to_string(),
            String::new(),
        );
        let primary = vec!["fr_FR".to_string()];

        let content = generate_hover_content(&db, key, &files, Some(&primary));

        expect_that!(content, contains_substring("**fr_FR**: Filtrer {layer}\n**de**:"));
    }

    #[rstest]
    #[case(&["ja", "fr"], &["ja", "fr", "de", "en"])]
    #[case(&[], &["de", "en", "fr", "ja"])]
    fn sorts_by_priority(#[case] primary: &[&str], #[case] expected: &[&str]) {
        let primary: Vec<String> = primary.iter().map(ToString::to_string).collect();
        let mut translations: Vec<(String, String)> = ["fr", "en", "ja", "de"]
            .iter()
            .map(|lang| ((*lang).to_string(), String::new()))
            .collect();

        sort_translations_by_priority(&mut translations, Some(&primary));

        let languages: Vec<&str> = translations.iter().map(|(lang, _)| lang.as_str()).collect();
        assert_eq!(languages, expected);
    }
}
