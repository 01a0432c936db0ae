//! Error types
//!
//! Configuration errors are fatal. Everything else is scoped to one file: it
//! is logged, the file ends up `Failed`, and the poll loop carries on.

use hotfolder_printer::PrintError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config file; a template was written in its place
    #[error("Configuration file not found: {0} (a template has been created, edit it and restart)")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid JSON or unknown enum value
    #[error("Invalid configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Per-file processing errors
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not ready after {0:?}")]
    ReadinessTimeout(Duration),

    #[error("Print dispatch failed: {0}")]
    Dispatch(#[from] PrintError),

    #[error("Post-print {action} failed: {source}")]
    PostAction {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
