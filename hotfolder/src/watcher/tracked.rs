//! Per-file processing state

use crate::readiness::ReadinessProbe;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Where a tracked file is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitingReady,
    /// Ready, waiting out the print delay before dispatch
    Printing,
    /// Dispatched, waiting for the spooler before the post-action
    PostDelay,
    Completed,
    Failed,
    Dropped,
}

impl Stage {
    /// Terminal stages are never advanced again
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Dropped)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AwaitingReady => "awaiting-ready",
            Self::Printing => "printing",
            Self::PostDelay => "post-delay",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Dropped => "dropped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum FileState {
    AwaitingReady(ReadinessProbe),
    Printing { due: Instant },
    PostDelay { due: Instant },
    Completed,
    Failed,
    Dropped,
}

impl FileState {
    pub(crate) fn stage(&self) -> Stage {
        match self {
            Self::AwaitingReady(_) => Stage::AwaitingReady,
            Self::Printing { .. } => Stage::Printing,
            Self::PostDelay { .. } => Stage::PostDelay,
            Self::Completed => Stage::Completed,
            Self::Failed => Stage::Failed,
            Self::Dropped => Stage::Dropped,
        }
    }
}

/// A matching file seen in the watch folder
#[derive(Debug, Clone)]
pub struct TrackedFile {
    pub(crate) path: PathBuf,
    pub(crate) state: FileState,
}

impl TrackedFile {
    /// A newly discovered file starts waiting for readiness
    pub(crate) fn discovered(path: PathBuf, now: Instant) -> Self {
        Self {
            path,
            state: FileState::AwaitingReady(ReadinessProbe::new(now)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }
}
