//! rwmap command-line interface
//!
//! Option parsing, the optional TOML configuration file and error rendering
//! for the `rwmap` binary. The generation itself lives in `rwmap-core`.

pub mod cli;
pub mod commands;
pub mod diagnostics;

pub mod error {
    use miette::Diagnostic;
    use thiserror::Error;

    #[derive(Error, Debug, Diagnostic)]
    pub enum CliError {
        #[error(transparent)]
        #[diagnostic(transparent)]
        Core(#[from] rwmap_core::Error),

        #[error("IO error: {0}")]
        #[diagnostic(code(rwmap::cli::io))]
        Io(#[from] std::io::Error),

        #[error("Failed to serialize syntax tree: {0}")]
        #[diagnostic(code(rwmap::cli::dump_ast))]
        Json(#[from] serde_json::Error),

        #[error("Configuration error: {0}")]
        #[diagnostic(
            code(rwmap::cli::config),
            help("see `rwmap --help` for the keys a configuration file may set")
        )]
        Config(String),
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};
