//! TS document parsing and serialization.

mod error;
mod parser;
mod writer;

pub use error::CatalogError;
pub use parser::{
    ParsedCatalog,
    SyntaxIssue,
    SyntaxIssueKind,
    parse_str,
};
pub use writer::write_catalog;

use crate::catalog::TranslationCatalog;
use crate::db::CatalogDatabase;
use crate::input::catalog::CatalogFile;
use crate::interned::MessageKey;
use crate::types::SourcePosition;

impl ParsedCatalog {
    /// Whether parsing stopped early or the root was not `<TS>`.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.issues.iter().any(|issue| {
            matches!(issue.kind, SyntaxIssueKind::MalformedXml | SyntaxIssueKind::UnexpectedRoot)
        })
    }

    /// Strict view: fails on malformed documents, ignores structural issues.
    ///
    /// # Errors
    /// Returns [`CatalogError::Malformed`] for the first fatal issue.
    pub fn into_result(self) -> Result<TranslationCatalog, CatalogError> {
        let fatal = self.issues.into_iter().find(|issue| {
            matches!(issue.kind, SyntaxIssueKind::MalformedXml | SyntaxIssueKind::UnexpectedRoot)
        });

        match fatal {
            Some(issue) => Err(CatalogError::Malformed {
                line: issue.range.start.line + 1,
                column: issue.range.start.character + 1,
                message: issue.message,
            }),
            None => Ok(self.catalog),
        }
    }
}

/// Reads and parses a catalog from disk, failing on malformed XML.
///
/// # Errors
/// Returns [`CatalogError::Io`] if the file cannot be read and
/// [`CatalogError::Malformed`] if it is not a well-formed TS document.
pub fn read_catalog(path: &std::path::Path) -> Result<TranslationCatalog, CatalogError> {
    let text = std::fs::read_to_string(path)?;
    parse_str(&text).into_result()
}

/// Parses a catalog file.
#[salsa::tracked]
pub fn parse_catalog(db: &dyn CatalogDatabase, file: CatalogFile) -> ParsedCatalog {
    tracing::debug!(uri = %file.uri(db), "Parsing catalog");
    parse_str(file.text(db))
}

/// Finds the message whose element contains `position`.
///
/// Obsolete and vanished messages are skipped; lookups never use them.
#[salsa::tracked]
pub fn message_key_at_position(
    db: &dyn CatalogDatabase,
    file: CatalogFile,
    position: SourcePosition,
) -> Option<MessageKey<'_>> {
    let parsed = parse_catalog(db, file);

    parsed.catalog.contexts.iter().find_map(|context| {
        context
            .messages
            .iter()
            .find(|message| {
                message.source.is_some()
                    && !message.is_retired()
                    && message.ranges.message.contains(position)
            })
            .map(|message| {
                MessageKey::new(
                    db,
                    context.name.clone(),
                    message.source_text().to_string(),
                    message.disambiguation().to_string(),
                )
            })
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;

    use super::*;
    use crate::db::CatalogDatabaseImpl;

    const TEXT: &str = "<TS language=\"de\">\n<context>\n<name>FilterMate</name>\n<message>\n<source>Filter</source>\n<comment>verb</comment>\n<translation>Filtern</translation>\n</message>\n</context>\n</TS>\n";

    #[googletest::test]
    fn test_message_key_at_position() {
        let db = CatalogDatabaseImpl::default();
        let file = CatalogFile::new(&db, "file:///i18n/FilterMate_de.ts".to_string(), TEXT.to_string());

        let key = message_key_at_position(&db, file, SourcePosition { line: 4, character: 10 });

        expect_that!(key.is_some(), eq(true));
        let key = key.unwrap();
        expect_that!(key.context(&db), eq("FilterMate"));
        expect_that!(key.source(&db), eq("Filter"));
        expect_that!(key.comment(&db), eq("verb"));

        let outside = message_key_at_position(&db, file, SourcePosition { line: 1, character: 0 });
        expect_that!(outside.is_none(), eq(true));
    }

    #[googletest::test]
    fn test_message_key_at_position_skips_retired() {
        let db = CatalogDatabaseImpl::default();
        let text = TEXT.replace("<translation>Filtern", "<translation type=\"obsolete\">Filtern");
        let file = CatalogFile::new(&db, "file:///i18n/FilterMate_de.ts".to_string(), text);

        let key = message_key_at_position(&db, file, SourcePosition { line: 4, character: 10 });

        expect_that!(key.is_none(), eq(true));
    }

    #[googletest::test]
    fn test_parse_catalog_tracks_text_changes() {
        use salsa::Setter;

        let mut db = CatalogDatabaseImpl::default();
        let file = CatalogFile::new(&db, "file:///FilterMate_de.ts".to_string(), TEXT.to_string());
        expect_that!(parse_catalog(&db, file).catalog.translate("FilterMate", "Export"), eq("Export"));

        let updated = TEXT.replace("<source>Filter</source>", "<source>Export</source>");
        file.set_text(&mut db).to(updated);

        let parsed = parse_catalog(&db, file);
        expect_that!(parsed.catalog.translate_disambiguated("FilterMate", "Export", "verb"), eq("Filtern"));
    }

    #[googletest::test]
    fn test_into_result() {
        let ok = parse_str(TEXT).into_result();
        expect_that!(ok.is_ok(), eq(true));

        let err = parse_str("<TS>\n<context>").into_result();
        expect_that!(err.is_err(), eq(true));
        if let Err(error) = err {
            expect_that!(error.to_string(), contains_substring("Malformed catalog at"));
        }
    }
}
