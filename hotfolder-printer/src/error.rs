//! Error types for the printer library

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// No usable document viewer executable
    #[error("Viewer executable not found: {0}")]
    ViewerNotFound(String),

    /// The print subprocess could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The print subprocess exited unsuccessfully
    #[error("{program} exited with {status}")]
    ViewerExit { program: PathBuf, status: ExitStatus },

    /// Timeout waiting for the print subprocess
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// No printer installed
    #[error("No printers available")]
    NoPrinters,

    /// Configured printer does not exist
    #[error("Printer not found: {0}")]
    PrinterNotFound(String),

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation not available on this platform
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Windows-specific printing error
    #[cfg(windows)]
    #[error("Windows printer error: {0}")]
    WindowsPrinter(String),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
