//! Placeholder tokens and interpolation.
//!
//! Recognized tokens:
//! - brace style: `{name}`, `{0}`, `{name:.2f}`, `{name!r}` (normalized to `{name}`),
//!   and the auto-numbered `{}` / `{:.2f}` (normalized to `{}`)
//! - Qt positional: `%1` .. `%99`, `%L1`, `%n`, `%Ln`
//! - printf style: `%s`, `%d`, `%(name)s`
//!
//! `{{`, `}}` and `%%` are literal characters, not placeholders.

use std::collections::{
    BTreeMap,
    BTreeSet,
};

/// printf conversion characters accepted after `%`.
const PRINTF_CONVERSIONS: &[char] = &['s', 'd', 'i', 'f', 'r', 'x', 'g', 'e'];

/// Extracts the set of placeholder tokens in `text`.
///
/// # Examples
/// ```
/// use linguist_language_server::catalog::extract_placeholders;
///
/// let tokens = extract_placeholders("Database deleted: {filename} (%1)");
/// assert!(tokens.contains("{filename}"));
/// assert!(tokens.contains("%1"));
/// ```
#[must_use]
pub fn extract_placeholders(text: &str) -> BTreeSet<String> {
    placeholder_counts(text).into_keys().collect()
}

/// Counts every placeholder token in `text`.
///
/// # Examples
/// ```
/// use linguist_language_server::catalog::placeholder_counts;
///
/// let counts = placeholder_counts("%s of %s ({})");
/// assert_eq!(counts.get("%s"), Some(&2));
/// assert_eq!(counts.get("{}"), Some(&1));
/// ```
#[must_use]
pub fn placeholder_counts(text: &str) -> BTreeMap<String, usize> {
    let mut tokens = BTreeMap::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while let Some(&c) = chars.get(i) {
        match c {
            '{' => {
                if chars.get(i + 1) == Some(&'{') {
                    i += 2;
                    continue;
                }
                if let Some((token, consumed)) = brace_token(chars.get(i + 1..).unwrap_or_default())
                {
                    *tokens.entry(token).or_insert(0) += 1;
                    i += consumed + 1;
                    continue;
                }
            }
            '%' => {
                if let Some((token, consumed)) =
                    percent_token(chars.get(i + 1..).unwrap_or_default())
                {
                    *tokens.entry(token).or_insert(0) += 1;
                    i += consumed + 1;
                    continue;
                }
                if chars.get(i + 1) == Some(&'%') {
                    i += 2;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }

    tokens
}

/// Parses the part after `{`; returns the normalized token and chars consumed.
fn brace_token(rest: &[char]) -> Option<(String, usize)> {
    let close = rest.iter().position(|&c| c == '}')?;
    let inner: String = rest.get(..close)?.iter().collect();
    let name = inner.split([':', '!']).next().unwrap_or_default();

    // `{}` and `{:spec}` are auto-numbered fields
    if name.is_empty() {
        let auto_numbered = inner.is_empty() || inner.starts_with([':', '!']);
        return auto_numbered.then(|| ("{}".to_string(), close + 1));
    }

    let is_identifier = name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && !name.starts_with('.');
    is_identifier.then(|| (format!("{{{name}}}"), close + 1))
}

/// Parses the part after `%`; returns the token and chars consumed.
fn percent_token(rest: &[char]) -> Option<(String, usize)> {
    let (localized, body) = match rest.first() {
        Some('L') => (true, rest.get(1..).unwrap_or_default()),
        _ => (false, rest),
    };
    let prefix_len = usize::from(localized);
    let prefix = if localized { "%L" } else { "%" };

    match body.first() {
        Some('n') => Some((format!("{prefix}n"), prefix_len + 1)),
        Some(c) if c.is_ascii_digit() && *c != '0' => {
            let digits: String = body.iter().take(2).take_while(|c| c.is_ascii_digit()).collect();
            let len = digits.len();
            Some((format!("{prefix}{digits}"), prefix_len + len))
        }
        Some('(') if !localized => {
            let close = body.iter().position(|&c| c == ')')?;
            let conversion = body.get(close + 1)?;
            if !PRINTF_CONVERSIONS.contains(conversion) {
                return None;
            }
            let name: String = body.get(1..close)?.iter().collect();
            Some((format!("%({name}){conversion}"), close + 2))
        }
        Some(c) if !localized && PRINTF_CONVERSIONS.contains(c) => Some((format!("%{c}"), 1)),
        _ => None,
    }
}

/// Result of comparing the placeholder sets of a source and a translation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaceholderDiff {
    /// Tokens present in the source but absent from the translation.
    pub missing: Vec<String>,
    /// Tokens present in the translation but absent from the source.
    pub unexpected: Vec<String>,
    /// Tokens present in both, as `(token, source count, translation count)`
    /// when the counts differ.
    pub count_mismatches: Vec<(String, usize, usize)>,
}

impl PlaceholderDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.count_mismatches.is_empty()
    }
}

/// Compares the placeholder tokens of `source` and `translation` by name and count.
///
/// For numerus messages `%n` may be dropped or repeated by a plural form
/// (languages often spell out "one"), so pass `numerus = true` to ignore it there.
#[must_use]
pub fn compare_placeholders(source: &str, translation: &str, numerus: bool) -> PlaceholderDiff {
    let expected = placeholder_counts(source);
    let actual = placeholder_counts(translation);
    let plural_count = |token: &str| numerus && (token == "%n" || token == "%Ln");

    let mut diff = PlaceholderDiff::default();
    for (token, &count) in &expected {
        match actual.get(token) {
            None if !plural_count(token.as_str()) => diff.missing.push(token.clone()),
            Some(&found) if found != count && !plural_count(token.as_str()) => {
                diff.count_mismatches.push((token.clone(), count, found));
            }
            _ => {}
        }
    }
    diff.unexpected =
        actual.keys().filter(|token| !expected.contains_key(*token)).cloned().collect();
    diff
}

/// Substitutes `{name}` tokens with `args` and `%n` with `count`.
///
/// Unknown tokens are left untouched. `{{` and `}}` collapse to single braces.
///
/// # Examples
/// ```
/// use linguist_language_server::catalog::interpolate;
///
/// let text = interpolate("{count} layers filtered", &[("count", "3")], None);
/// assert_eq!(text, "3 layers filtered");
/// ```
#[must_use]
pub fn interpolate(template: &str, args: &[(&str, &str)], count: Option<i64>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(index) = rest.find(['{', '}', '%']) {
        let (before, tail) = rest.split_at(index);
        result.push_str(before);

        if let Some(after) = tail.strip_prefix("{{") {
            result.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            result.push('}');
            rest = after;
        } else if let Some(after) = tail.strip_prefix('{')
            && let Some(close) = after.find('}')
            && let Some((_, value)) = args.iter().find(|(name, _)| {
                after.get(..close).is_some_and(|inner| {
                    inner.split([':', '!']).next().is_some_and(|n| n == *name)
                })
            })
        {
            result.push_str(value);
            rest = after.get(close + 1..).unwrap_or_default();
        } else if let Some(count) = count
            && let Some(after) = tail.strip_prefix("%n").or_else(|| tail.strip_prefix("%Ln"))
        {
            result.push_str(&count.to_string());
            rest = after;
        } else {
            let mut chars = tail.chars();
            if let Some(c) = chars.next() {
                result.push(c);
            }
            rest = chars.as_str();
        }
    }

    result.push_str(rest);
    result
}
