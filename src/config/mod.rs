//! Server configuration: `.linguist-lsp.json` and client settings.
mod manager;
mod matcher;
mod types;

pub use manager::{
    CONFIG_FILE_NAME,
    ConfigManager,
};
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    CatalogFilesConfig,
    ConfigError,
    DiagnosticsConfig,
    IndexingConfig,
    LinguistSettings,
    ServerSettings,
    Severity,
    ValidationError,
};
