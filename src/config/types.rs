use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "catalogFiles.includePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Settings as sent by clients that namespace them (`{"linguist": {...}}`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    pub linguist: LinguistSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinguistSettings {
    pub catalog_files: CatalogFilesConfig,

    /// Excluded from every file search.
    pub exclude_patterns: Vec<String>,

    /// Languages listed first on hover, in this order.
    pub primary_languages: Option<Vec<String>>,

    /// Language used by `linguist.translate` when none is given.
    pub default_language: Option<String>,

    pub indexing: IndexingConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    /// Maximum number of catalog files read concurrently.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,
}

impl IndexingConfig {
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1)).max(1)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogFilesConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for CatalogFilesConfig {
    fn default() -> Self {
        Self {
            include_patterns: vec!["**/{i18n,translations,locales}/**/*.ts".to_string()],
            exclude_patterns: Vec::new(),
        }
    }
}

/// Diagnostic severity for one lint rule. `off` disables the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    #[serde(alias = "info")]
    Information,
    Hint,
    Off,
}

impl Severity {
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticsConfig {
    /// Malformed XML and a non-`TS` root element.
    pub malformed_xml: Severity,
    /// Message without exactly one `<source>` and one `<translation>`.
    pub missing_element: Severity,
    pub placeholder_mismatch: Severity,
    pub duplicate_source: Severity,
    pub unfinished_translation: Severity,
    pub empty_translation: Severity,
    pub numerus_form_count: Severity,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            malformed_xml: Severity::Warning,
            missing_element: Severity::Warning,
            placeholder_mismatch: Severity::Warning,
            duplicate_source: Severity::Warning,
            unfinished_translation: Severity::Hint,
            empty_translation: Severity::Information,
            numerus_form_count: Severity::Warning,
        }
    }
}

impl LinguistSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Empty language code
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.catalog_files.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "catalogFiles.includePatterns",
                "At least one pattern is required. Example: [\"**/i18n/*.ts\"]",
            ));
        }

        let pattern_lists = [
            ("catalogFiles.includePatterns", &self.catalog_files.include_patterns),
            ("catalogFiles.excludePatterns", &self.catalog_files.exclude_patterns),
            ("excludePatterns", &self.exclude_patterns),
        ];
        for (field, patterns) in pattern_lists {
            for (index, pattern) in patterns.iter().enumerate() {
                if pattern.is_empty() {
                    errors.push(ValidationError::new(
                        format!("{field}[{index}]"),
                        "The pattern cannot be empty",
                    ));
                } else if let Err(e) = globset::Glob::new(pattern) {
                    errors.push(ValidationError::new(
                        format!("{field}[{index}]"),
                        format!("Invalid glob pattern '{pattern}': {e}"),
                    ));
                }
            }
        }

        if let Some(languages) = &self.primary_languages {
            for (index, language) in languages.iter().enumerate() {
                if language.trim().is_empty() {
                    errors.push(ValidationError::new(
                        format!("primaryLanguages[{index}]"),
                        "The language code cannot be empty. Example: \"fr_FR\"",
                    ));
                }
            }
        }

        if let Some(language) = &self.default_language
            && language.trim().is_empty()
        {
            errors.push(ValidationError::new(
                "defaultLanguage",
                "The language code cannot be empty. Please specify a language (e.g., \"fr\"), or remove this field",
            ));
        }

        if self.indexing.num_threads == Some(0) {
            errors.push(ValidationError::new(
                "indexing.numThreads",
                "The thread count must be at least 1",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for LinguistSettings {
    fn default() -> Self {
        Self {
            catalog_files: CatalogFilesConfig::default(),
            exclude_patterns: vec!["node_modules/**".to_string(), "target/**".to_string()],
            primary_languages: None,
            default_language: None,
            indexing: IndexingConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}
