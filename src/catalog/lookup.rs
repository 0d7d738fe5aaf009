//! Lookup by `(context, source)` with fallback to the source string.

use super::model::{
    Message,
    TranslationCatalog,
};
use super::plural::plural_form_index;

impl TranslationCatalog {
    /// Finds the message for `(context, source, disambiguation)`.
    ///
    /// Retired (obsolete/vanished) messages are ignored. An empty `comment`
    /// matches messages without a disambiguation.
    #[must_use]
    pub fn find_message(&self, context: &str, source: &str, comment: &str) -> Option<&Message> {
        self.contexts
            .iter()
            .filter(|c| c.name == context)
            .flat_map(|c| c.messages.iter())
            .find(|m| {
                !m.is_retired()
                    && m.source.as_deref() == Some(source)
                    && m.disambiguation() == comment
            })
    }

    /// Translates `source` in `context`, falling back to `source` itself.
    ///
    /// # Examples
    /// ```
    /// use linguist_language_server::catalog::{Context, Message, Translation, TranslationCatalog};
    ///
    /// let catalog = TranslationCatalog {
    ///     contexts: vec![Context::new(
    ///         "FilterMateDockWidget",
    ///         vec![Message::new("Filter", Translation::finished("Filtrer"))],
    ///     )],
    ///     ..TranslationCatalog::default()
    /// };
    ///
    /// assert_eq!(catalog.translate("FilterMateDockWidget", "Filter"), "Filtrer");
    /// assert_eq!(catalog.translate("FilterMateDockWidget", "Export"), "Export");
    /// ```
    #[must_use]
    pub fn translate<'a>(&'a self, context: &str, source: &'a str) -> &'a str {
        self.translate_disambiguated(context, source, "")
    }

    /// Like [`Self::translate`] with a disambiguation comment.
    #[must_use]
    pub fn translate_disambiguated<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        comment: &str,
    ) -> &'a str {
        self.find_message(context, source, comment)
            .filter(|m| !m.numerus)
            .and_then(|m| m.translation.as_ref())
            .filter(|t| t.is_usable(false))
            .map_or(source, |t| t.text.as_str())
    }

    /// Translates a numerus message for count `n`.
    ///
    /// The form is selected with the plural rule of the catalog language.
    /// Falls back to `source` when the message is missing, unfinished or has
    /// fewer forms than the selected index.
    #[must_use]
    pub fn translate_plural<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        comment: &str,
        n: i64,
    ) -> &'a str {
        let Some(message) = self.find_message(context, source, comment) else {
            return source;
        };
        let Some(translation) = message.translation.as_ref().filter(|t| t.is_usable(message.numerus))
        else {
            return source;
        };
        if !message.numerus {
            return translation.text.as_str();
        }

        let language = self.language.as_deref().unwrap_or("en");
        let index = plural_form_index(language, n);
        translation.numerus_forms.get(index).map_or(source, String::as_str)
    }
}
