//! Per-message content rules.

use std::collections::HashMap;

use super::IssueKind;
use crate::catalog::{
    Message,
    TranslationCatalog,
    TranslationKind,
    compare_placeholders,
    plural_form_count,
};
use crate::types::SourceRange;

type Found = Vec<(IssueKind, SourceRange, String)>;

pub(super) fn check_messages(catalog: &TranslationCatalog, found: &mut Found) {
    let language = catalog.language.as_deref().filter(|language| !language.is_empty());
    // Contexts with the same name are one context for lookup purposes.
    let mut seen: HashMap<(&str, &str, &str), SourceRange> = HashMap::new();

    for context in &catalog.contexts {
        for message in context.messages.iter().filter(|m| !m.is_retired()) {
            let Some(source) = message.source.as_deref() else {
                continue;
            };
            let source_range = message.ranges.source.unwrap_or(message.ranges.message);

            let key = (context.name.as_str(), source, message.disambiguation());
            if let Some(first) = seen.get(&key) {
                found.push((
                    IssueKind::DuplicateSource,
                    source_range,
                    format!(
                        "Duplicate source '{source}' in context '{}' (first defined on line {})",
                        context.name,
                        first.start.line + 1
                    ),
                ));
            } else {
                seen.insert(key, source_range);
            }

            check_translation(message, source, language, found);
        }
    }
}

fn check_translation(message: &Message, source: &str, language: Option<&str>, found: &mut Found) {
    let Some(translation) = &message.translation else {
        return;
    };
    let range = message.ranges.translation.unwrap_or(message.ranges.message);

    if translation.kind == TranslationKind::Unfinished {
        found.push((
            IssueKind::UnfinishedTranslation,
            range,
            format!("Translation of '{source}' is unfinished"),
        ));
    } else if translation.texts(message.numerus).any(str::is_empty)
        || (message.numerus && translation.numerus_forms.is_empty())
    {
        found.push((
            IssueKind::EmptyTranslation,
            range,
            format!("Translation of '{source}' is empty"),
        ));
    }

    // An untouched numerus translation has no forms yet; unfinished already covers it.
    let untranslated =
        translation.kind == TranslationKind::Unfinished && translation.numerus_forms.is_empty();
    if message.numerus
        && !untranslated
        && let Some(language) = language
    {
        let expected = plural_form_count(language);
        let actual = translation.numerus_forms.len();
        if actual != expected {
            found.push((
                IssueKind::NumerusFormCount,
                range,
                format!("Expected {expected} plural form(s) for '{language}', found {actual}"),
            ));
        }
    }

    for text in translation.texts(message.numerus).filter(|text| !text.is_empty()) {
        let diff = compare_placeholders(source, text, message.numerus);
        if diff.is_empty() {
            continue;
        }

        let mut detail = Vec::new();
        if !diff.missing.is_empty() {
            detail.push(format!("missing {}", diff.missing.join(", ")));
        }
        if !diff.unexpected.is_empty() {
            detail.push(format!("unexpected {}", diff.unexpected.join(", ")));
        }
        for (token, expected, actual) in &diff.count_mismatches {
            detail.push(format!("{token} appears {actual} time(s), expected {expected}"));
        }
        found.push((
            IssueKind::PlaceholderMismatch,
            range,
            format!("Placeholders differ from the source: {}", detail.join("; ")),
        ));
        // One report per message is enough.
        break;
    }
}
