//! Indexer type definitions.

use thiserror::Error;

use crate::config::MatcherError;

#[derive(Error, Debug)]
pub enum IndexerError {
    /// Catalog file patterns could not be compiled
    #[error("Invalid catalog file pattern: {0}")]
    Pattern(#[from] MatcherError),
    /// Error when the workspace path is unusable
    #[error("Failed to read file: {0}")]
    InvalidPath(String),
}

/// Summary of one indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexSummary {
    /// Catalogs found by the file search.
    pub discovered: usize,
    /// Catalogs read and registered.
    pub loaded: usize,
}
