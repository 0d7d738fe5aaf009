//! IDE 機能を提供するモジュール

pub mod backend;
pub mod diagnostics;
mod handlers;
pub mod hover;
pub mod state;

pub use handlers::execute_command::{
    COMMANDS,
    LIST_LANGUAGES,
    TRANSLATE,
};
