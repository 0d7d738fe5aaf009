//! Workspace catalog discovery and loading.

pub mod types;
pub mod workspace;
