//! What happens to a file once its print request has drained

use crate::error::FileError;
use chrono::Local;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAction {
    /// Move into this folder, created on demand
    Move(PathBuf),
    Delete,
    /// Neither flag set, the file stays where it is
    Leave,
}

impl fmt::Display for PostAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move(dir) => write!(f, "move to {}", dir.display()),
            Self::Delete => f.write_str("delete"),
            Self::Leave => f.write_str("leave in place"),
        }
    }
}

impl PostAction {
    /// Apply to `file`, returning its new location when moved
    pub async fn apply(&self, file: &Path) -> Result<Option<PathBuf>, FileError> {
        match self {
            Self::Move(dir) => {
                let target = move_into(file, dir).await.map_err(|source| {
                    FileError::PostAction {
                        action: "move",
                        source,
                    }
                })?;
                info!(file = %file.display(), to = %target.display(), "Moved after printing");
                Ok(Some(target))
            }
            Self::Delete => {
                tokio::fs::remove_file(file)
                    .await
                    .map_err(|source| FileError::PostAction {
                        action: "delete",
                        source,
                    })?;
                info!(file = %file.display(), "Deleted after printing");
                Ok(None)
            }
            Self::Leave => Ok(None),
        }
    }
}

async fn move_into(file: &Path, dir: &Path) -> std::io::Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;

    tokio::fs::create_dir_all(dir).await?;

    let mut target = dir.join(name);
    if tokio::fs::try_exists(&target).await? {
        target = free_name(file, dir).await?;
    }

    tokio::fs::rename(file, &target).await?;
    Ok(target)
}

/// `<stem>_<timestamp><ext>`, with a counter if that is taken too
async fn free_name(file: &Path, dir: &Path) -> std::io::Result<PathBuf> {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = file
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let stamp = Local::now().format("%Y%m%d_%H%M%S");

    let mut candidate = dir.join(format!("{}_{}{}", stem, stamp, ext));
    let mut n = 1;
    while tokio::fs::try_exists(&candidate).await? {
        candidate = dir.join(format!("{}_{}_{}{}", stem, stamp, n, ext));
        n += 1;
    }
    Ok(candidate)
}
