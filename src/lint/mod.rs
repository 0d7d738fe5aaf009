//! Catalog linting.
//!
//! Turns structural parse issues and content defects (placeholder drift,
//! duplicate sources, unfinished or empty translations, plural form counts)
//! into [`CatalogIssue`]s with a configured [`Severity`]. Nothing here fails:
//! a malformed document yields an issue and whatever could be parsed is still
//! checked.

mod rules;

use crate::config::{
    DiagnosticsConfig,
    Severity,
};
use crate::syntax::{
    ParsedCatalog,
    SyntaxIssueKind,
};
use crate::types::SourceRange;

/// What a [`CatalogIssue`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    MalformedXml,
    UnexpectedRoot,
    MissingName,
    MissingSource,
    MissingTranslation,
    DuplicateElement,
    PlaceholderMismatch,
    DuplicateSource,
    UnfinishedTranslation,
    EmptyTranslation,
    NumerusFormCount,
}

impl IssueKind {
    /// Stable diagnostic code shown to clients.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MalformedXml => "malformed-xml",
            Self::UnexpectedRoot => "unexpected-root",
            Self::MissingName => "missing-name",
            Self::MissingSource => "missing-source",
            Self::MissingTranslation => "missing-translation",
            Self::DuplicateElement => "duplicate-element",
            Self::PlaceholderMismatch => "placeholder-mismatch",
            Self::DuplicateSource => "duplicate-source",
            Self::UnfinishedTranslation => "unfinished-translation",
            Self::EmptyTranslation => "empty-translation",
            Self::NumerusFormCount => "numerus-form-count",
        }
    }

    /// Severity configured for this kind.
    #[must_use]
    pub const fn severity(self, config: &DiagnosticsConfig) -> Severity {
        match self {
            Self::MalformedXml | Self::UnexpectedRoot => config.malformed_xml,
            Self::MissingName
            | Self::MissingSource
            | Self::MissingTranslation
            | Self::DuplicateElement => config.missing_element,
            Self::PlaceholderMismatch => config.placeholder_mismatch,
            Self::DuplicateSource => config.duplicate_source,
            Self::UnfinishedTranslation => config.unfinished_translation,
            Self::EmptyTranslation => config.empty_translation,
            Self::NumerusFormCount => config.numerus_form_count,
        }
    }
}

impl From<SyntaxIssueKind> for IssueKind {
    fn from(kind: SyntaxIssueKind) -> Self {
        match kind {
            SyntaxIssueKind::MalformedXml => Self::MalformedXml,
            SyntaxIssueKind::UnexpectedRoot => Self::UnexpectedRoot,
            SyntaxIssueKind::MissingName => Self::MissingName,
            SyntaxIssueKind::MissingSource => Self::MissingSource,
            SyntaxIssueKind::MissingTranslation => Self::MissingTranslation,
            SyntaxIssueKind::DuplicateElement => Self::DuplicateElement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    pub kind: IssueKind,
    pub range: SourceRange,
    pub severity: Severity,
    pub message: String,
}

/// Lints a parsed catalog.
///
/// Issues are ordered by position. Rules configured as `off` produce nothing.
#[must_use]
pub fn check_catalog(parsed: &ParsedCatalog, config: &DiagnosticsConfig) -> Vec<CatalogIssue> {
    let mut found: Vec<(IssueKind, SourceRange, String)> = parsed
        .issues
        .iter()
        .map(|issue| (IssueKind::from(issue.kind), issue.range, issue.message.clone()))
        .collect();
    rules::check_messages(&parsed.catalog, &mut found);

    let mut issues: Vec<CatalogIssue> = found
        .into_iter()
        .filter_map(|(kind, range, message)| {
            let severity = kind.severity(config);
            severity.is_enabled().then_some(CatalogIssue { kind, range, severity, message })
        })
        .collect();
    issues.sort_by_key(|issue| issue.range.start);
    issues
}
