//! # hotfolder
//!
//! Watches a folder for newly arrived documents and prints each one once it
//! is fully written, then moves or deletes it.
//!
//! ```text
//! hotfolder/src/
//! ├── config.rs       # JSON configuration
//! ├── readiness.rs    # "is the sync client done with this file?"
//! ├── watcher/        # poll loop and per-file state machine
//! ├── post_action.rs  # move / delete after printing
//! ├── logger.rs       # stdout + log file
//! ├── signal.rs       # Ctrl+C / SIGTERM
//! └── cli.rs          # command line
//! ```
//!
//! Printing itself lives in the `hotfolder-printer` crate.

pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod post_action;
pub mod readiness;
pub mod signal;
pub mod watcher;

pub use cli::Cli;
pub use config::{DEFAULT_CONFIG_FILE, WatchConfig};
pub use error::{ConfigError, FileError};
pub use logger::init_logger;
pub use post_action::PostAction;
pub use readiness::{Readiness, ReadinessPolicy, ReadinessProbe};
pub use signal::shutdown_signal;
pub use watcher::{Stage, TrackedFile, Watcher};

pub fn print_banner() {
    println!(
        r#"
  _           _    __       _     _
 | |__   ___ | |_ / _| ___ | | __| | ___ _ __
 | '_ \ / _ \| __| |_ / _ \| |/ _` |/ _ \ '__|
 | | | | (_) | |_|  _| (_) | | (_| |  __/ |
 |_| |_|\___/ \__|_|  \___/|_|\__,_|\___|_|
    "#
    );
}
