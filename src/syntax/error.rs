use thiserror::Error;

/// Errors surfaced by the strict catalog APIs.
///
/// The lenient parser never returns these; it records issues instead.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The document is not well-formed XML or not a TS document.
    #[error("Malformed catalog at {line}:{column}: {message}")]
    Malformed {
        /// 1-based line.
        line: u32,
        /// 1-based column (UTF-16 units).
        column: u32,
        message: String,
    },
    /// Error when serializing a catalog
    #[error("Failed to write catalog: {0}")]
    Write(String),
    /// Error when reading a catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
}
