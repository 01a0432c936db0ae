//! Scoped print subprocess
//!
//! A [`ChildGuard`] owns the spawned process. It is killed on timeout, and on
//! every other exit path through `kill_on_drop`, including when the awaiting
//! future is cancelled at shutdown.

use crate::error::{PrintError, PrintResult};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// How a bounded wait on the subprocess ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Exited successfully within the timeout
    Exited,
    /// Still running at the timeout and has been terminated
    Lingering,
}

/// Owned handle to a running print subprocess
#[derive(Debug)]
pub struct ChildGuard {
    child: Child,
    program: PathBuf,
}

impl ChildGuard {
    /// Spawn `program` with `args`, detached from our stdio
    pub fn spawn<I, S>(program: &Path, args: I) -> PrintResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let child = cmd.spawn().map_err(|source| PrintError::Spawn {
            program: program.to_path_buf(),
            source,
        })?;

        debug!(program = %program.display(), pid = ?child.id(), "Spawned print process");

        Ok(Self {
            child,
            program: program.to_path_buf(),
        })
    }

    /// Wait for the process to exit, terminating it after `timeout`
    pub async fn wait_bounded(mut self, timeout: Duration) -> PrintResult<Completion> {
        let waited = tokio::time::timeout(timeout, self.child.wait()).await;
        match waited {
            Ok(Ok(status)) if status.success() => Ok(Completion::Exited),
            Ok(Ok(status)) => Err(PrintError::ViewerExit {
                program: self.program.clone(),
                status,
            }),
            Ok(Err(e)) => Err(PrintError::Io(e)),
            Err(_) => {
                if let Err(e) = self.child.kill().await {
                    warn!(program = %self.program.display(), error = %e, "Failed to terminate print process");
                }
                Ok(Completion::Lingering)
            }
        }
    }
}
