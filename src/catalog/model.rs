//! Translation catalog data model.

use crate::types::SourceRange;

/// A whole `.ts` document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslationCatalog {
    /// `version` attribute of the `TS` root (e.g. "2.1").
    pub version: Option<String>,
    /// Target language (e.g. "fr_FR").
    pub language: Option<String>,
    /// Language of the source strings (e.g. "en_US").
    pub source_language: Option<String>,
    pub contexts: Vec<Context>,
}

/// A named group of messages belonging to one UI surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Context {
    pub name: String,
    pub messages: Vec<Message>,
    pub range: SourceRange,
}

/// One translation entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    /// `id` attribute, only present for id-based catalogs.
    pub id: Option<String>,
    /// `numerus="yes"`: translation is a list of plural forms.
    pub numerus: bool,
    pub locations: Vec<Location>,
    /// `None` when the `<source>` element is missing.
    pub source: Option<String>,
    pub old_source: Option<String>,
    /// Disambiguation text.
    pub comment: Option<String>,
    pub old_comment: Option<String>,
    pub extra_comment: Option<String>,
    pub translator_comment: Option<String>,
    /// `None` when the `<translation>` element is missing.
    pub translation: Option<Translation>,
    pub ranges: MessageRanges,
}

/// Source positions of the interesting parts of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageRanges {
    /// The whole `<message>` element.
    pub message: SourceRange,
    /// The `<source>` element, if present.
    pub source: Option<SourceRange>,
    /// The `<translation>` element, if present.
    pub translation: Option<SourceRange>,
}

/// `<location filename=".." line=".."/>`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub filename: Option<String>,
    pub line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Translation {
    pub kind: TranslationKind,
    /// Text of a singular translation. Empty for numerus messages.
    pub text: String,
    /// `<numerusform>` contents, in plural-rule order.
    pub numerus_forms: Vec<String>,
}

/// The `type` attribute of `<translation>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TranslationKind {
    #[default]
    Finished,
    Unfinished,
    Obsolete,
    Vanished,
}

impl TranslationKind {
    /// Parses the attribute value. Unknown values are treated as finished.
    #[must_use]
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("unfinished") => Self::Unfinished,
            Some("obsolete") => Self::Obsolete,
            Some("vanished") => Self::Vanished,
            _ => Self::Finished,
        }
    }

    /// The attribute value to write, `None` for finished translations.
    #[must_use]
    pub const fn as_attribute(self) -> Option<&'static str> {
        match self {
            Self::Finished => None,
            Self::Unfinished => Some("unfinished"),
            Self::Obsolete => Some("obsolete"),
            Self::Vanished => Some("vanished"),
        }
    }

    /// Obsolete and vanished messages are kept in the file but no longer used.
    #[must_use]
    pub const fn is_retired(self) -> bool {
        matches!(self, Self::Obsolete | Self::Vanished)
    }
}

impl Translation {
    #[must_use]
    pub fn finished(text: impl Into<String>) -> Self {
        Self { kind: TranslationKind::Finished, text: text.into(), numerus_forms: Vec::new() }
    }

    #[must_use]
    pub fn unfinished(text: impl Into<String>) -> Self {
        Self { kind: TranslationKind::Unfinished, text: text.into(), numerus_forms: Vec::new() }
    }

    /// Whether the translation can be shown to users.
    #[must_use]
    pub fn is_usable(&self, numerus: bool) -> bool {
        if self.kind != TranslationKind::Finished {
            return false;
        }
        if numerus {
            !self.numerus_forms.is_empty() && self.numerus_forms.iter().all(|f| !f.is_empty())
        } else {
            !self.text.is_empty()
        }
    }

    /// All translated texts: the singular text or every numerus form.
    pub fn texts(&self, numerus: bool) -> Box<dyn Iterator<Item = &str> + '_> {
        if numerus {
            Box::new(self.numerus_forms.iter().map(String::as_str))
        } else {
            Box::new(std::iter::once(self.text.as_str()))
        }
    }
}

impl Message {
    /// Creates a singular message with a source and a translation.
    #[must_use]
    pub fn new(source: impl Into<String>, translation: Translation) -> Self {
        Self { source: Some(source.into()), translation: Some(translation), ..Self::default() }
    }

    #[must_use]
    pub fn source_text(&self) -> &str {
        self.source.as_deref().unwrap_or_default()
    }

    /// The disambiguation comment, empty when absent.
    #[must_use]
    pub fn disambiguation(&self) -> &str {
        self.comment.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.translation.as_ref().is_some_and(|t| t.kind.is_retired())
    }
}

impl Context {
    #[must_use]
    pub fn new(name: impl Into<String>, messages: Vec<Message>) -> Self {
        Self { name: name.into(), messages, range: SourceRange::default() }
    }
}

impl TranslationCatalog {
    /// Iterates over every `(context, source, translation)` triple.
    ///
    /// Messages without a source are skipped; a missing translation yields an
    /// empty text. Numerus translations are joined with `\u{9c}` the way Qt
    /// flattens plural forms.
    pub fn triples(&self) -> impl Iterator<Item = (&str, &str, String)> + '_ {
        self.contexts.iter().flat_map(|context| {
            context.messages.iter().filter_map(move |message| {
                let source = message.source.as_deref()?;
                let translation = message.translation.as_ref().map_or_else(String::new, |t| {
                    if message.numerus { t.numerus_forms.join("\u{9c}") } else { t.text.clone() }
                });
                Some((context.name.as_str(), source, translation))
            })
        })
    }

    /// Total number of messages over all contexts.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.contexts.iter().map(|c| c.messages.len()).sum()
    }
}
