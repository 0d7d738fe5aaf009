//! Catalog file input definitions.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use crate::db::CatalogDatabase;
use crate::syntax::parse_catalog;

/// ISO 639-1 language codes.
static LANGUAGE_CODES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "af", "am", "ar", "as", "az", "be", "bg", "bn", "bo", "bs", "ca", "cs", "cy", "da", "de",
        "dz", "el", "en", "eo", "es", "et", "eu", "fa", "fi", "fo", "fr", "ga", "gd", "gl", "gu",
        "he", "hi", "hr", "hu", "hy", "id", "is", "it", "ja", "ka", "kk", "km", "kn", "ko", "ky",
        "lb", "lo", "lt", "lv", "mi", "mk", "ml", "mn", "mr", "ms", "mt", "my", "nb", "ne", "nl",
        "nn", "no", "oc", "pa", "pl", "ps", "pt", "ro", "ru", "sa", "se", "si", "sk", "sl", "sq",
        "sr", "sv", "sw", "ta", "te", "th", "ti", "tl", "tr", "tt", "ug", "uk", "ur", "uz", "vi",
        "wa", "xh", "zh", "zu",
    ]
    .into_iter()
    .collect()
});

/// Returns `true` for codes like `fr`, `pt_BR`, `zh-Hant-TW`.
fn is_language_code(code: &str) -> bool {
    let mut parts = code.split(['_', '-']);
    let Some(base) = parts.next() else {
        return false;
    };
    LANGUAGE_CODES.contains(base.to_lowercase().as_str())
        && parts.all(|part| (2..=4).contains(&part.len()) && part.chars().all(char::is_alphanumeric))
}

/// Detects the catalog language from its file path.
///
/// Qt projects name catalogs `<app>_<lang>.ts`; the language may also be a
/// directory name.
///
/// # Examples
/// - `i18n/FilterMate_fr.ts` → `fr`
/// - `i18n/FilterMate_pt_BR.ts` → `pt_BR`
/// - `translations/de/app.ts` → `de`
pub(crate) fn detect_language_from_path(file_path: &Path) -> Option<String> {
    let stem = file_path.file_stem()?.to_string_lossy();
    let parts: Vec<&str> = stem.split(['_', '-', '.']).collect();

    // Longest suffix first so `pt_BR` wins over `BR`
    for take in (1..=parts.len().min(3)).rev() {
        let Some(suffix) = parts.get(parts.len() - take..) else {
            continue;
        };
        let candidate = suffix.join("_");
        if is_language_code(&candidate) {
            return Some(candidate);
        }
    }

    file_path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| is_language_code(name))
}

/// Salsa input holding one `.ts` file.
#[salsa::input]
pub struct CatalogFile {
    #[returns(ref)]
    pub uri: String,

    #[returns(ref)]
    pub text: String,
}

/// Language of a catalog: the `language` attribute, else guessed from the path.
#[salsa::tracked]
pub fn catalog_language(db: &dyn CatalogDatabase, file: CatalogFile) -> Option<String> {
    let parsed = parse_catalog(db, file);
    parsed
        .catalog
        .language
        .filter(|language| !language.is_empty())
        .or_else(|| detect_language_from_path(Path::new(file.uri(db))))
}

/// Load a catalog file and create a [`CatalogFile`] input.
///
/// # Errors
/// Returns error if the file cannot be read.
pub fn load_catalog_file(
    db: &dyn CatalogDatabase,
    file_path: &Path,
) -> Result<CatalogFile, std::io::Error> {
    let text = std::fs::read_to_string(file_path)?;
    Ok(CatalogFile::new(db, file_path.to_string_lossy().to_string(), text))
}
