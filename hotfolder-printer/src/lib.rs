//! # hotfolder-printer
//!
//! Document printing library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - Printer enumeration and default printer lookup
//! - Viewer executable discovery
//! - Viewer command-line printing with a bounded, scoped subprocess
//! - OS shell print action (fallback)
//!
//! Deciding WHAT to print and when (readiness, delays, moving printed files)
//! stays in the `hotfolder` application.
//!
//! ## Example
//!
//! ```ignore
//! use hotfolder_printer::{Dispatcher, PrintDispatcher, PrintMethod, ViewerOptions, resolve};
//!
//! let printer = resolve(Some("Office")).await?;
//! let dispatcher = PrintDispatcher::new(PrintMethod::Acrobat, printer, ViewerOptions::default());
//! dispatcher.dispatch(Path::new("C:\\Sync\\PDFs\\invoice.pdf")).await?;
//! ```

mod dispatch;
mod error;
mod printer;
mod process;
mod viewer;

// Re-exports
pub use dispatch::{
    Dispatcher, PrintDispatcher, PrintMethod, ShellDispatcher, ViewerDispatcher, ViewerOptions,
};
pub use error::{PrintError, PrintResult};
pub use printer::{
    PrinterHandle, default_printer, list_printers, log_available_printers, resolve, resolve_from,
};
pub use process::{ChildGuard, Completion};
pub use viewer::{VIEWER_CANDIDATES, locate as locate_viewer};
