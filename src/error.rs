//! # Error Handling
//!
//! This module defines the centralized error type for `docker-hadoop`. It uses
//! `thiserror` to build one `Error` enum covering every failure mode of a run,
//! grouped the way an operator needs to act on them:
//!
//! - **Configuration errors** (invalid replica counts, conflicting flags,
//!   duplicate instance names or host ports). These are raised before any
//!   filesystem or network I/O happens.
//! - **Network errors** raised while downloading an artifact.
//! - **Extraction errors** for corrupt archives or entries that would escape
//!   the destination directory.
//! - **Filesystem errors**, always carrying the path involved.
//! - **Template errors**, naming the template and, when known, the undefined
//!   variable.
//!
//! The `Result` alias is used throughout the library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for docker-hadoop operations
#[derive(Error, Debug)]
pub enum Error {
    /// The feature selection or cluster configuration is invalid.
    ///
    /// Includes an optional hint about how to fix it.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An artifact could not be downloaded.
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// An archive could not be extracted, or contained an unsafe entry.
    #[error("Extraction error for {}: {message}", archive.display())]
    Extraction { archive: PathBuf, message: String },

    /// A filesystem operation failed on a specific path.
    #[error("Filesystem error at {}: {message}", path.display())]
    Filesystem { path: PathBuf, message: String },

    /// A template could not be rendered.
    ///
    /// May include the name of the undefined variable when applicable.
    #[error("Template error in {}: {message}{}", template.display(), variable.as_ref().map(|v| format!(" (variable: {})", v)).unwrap_or_default())]
    Template {
        template: PathBuf,
        message: String,
        /// The template variable that caused the error, if applicable
        variable: Option<String>,
    },

    /// The manifest or template data model could not be serialized.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// A mutex guarding phase results has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Build a configuration error without a hint.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            hint: None,
        }
    }

    /// Build a filesystem error from an I/O failure on `path`.
    pub fn filesystem(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
