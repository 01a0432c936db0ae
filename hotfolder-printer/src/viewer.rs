//! Document viewer discovery
//!
//! The `acrobat` print method drives a PDF viewer through its command line.
//! The executable comes from configuration, or from the well-known install
//! locations below, checked in priority order.

use crate::error::{PrintError, PrintResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Known viewer install locations, highest priority first
#[cfg(windows)]
pub const VIEWER_CANDIDATES: &[&str] = &[
    // Acrobat DC
    r"C:\Program Files\Adobe\Acrobat DC\Acrobat\Acrobat.exe",
    r"C:\Program Files (x86)\Adobe\Acrobat DC\Acrobat\Acrobat.exe",
    // Acrobat Reader DC
    r"C:\Program Files\Adobe\Acrobat Reader DC\Reader\AcroRd32.exe",
    r"C:\Program Files (x86)\Adobe\Acrobat Reader DC\Reader\AcroRd32.exe",
    // Reader 11
    r"C:\Program Files\Adobe\Reader 11.0\Reader\AcroRd32.exe",
    r"C:\Program Files (x86)\Adobe\Reader 11.0\Reader\AcroRd32.exe",
];

/// Known viewer install locations, highest priority first
#[cfg(not(windows))]
pub const VIEWER_CANDIDATES: &[&str] = &[
    "/usr/bin/acroread",
    "/usr/local/bin/acroread",
    "/opt/Adobe/Reader9/bin/acroread",
];

/// Locate the viewer executable
///
/// A configured path is authoritative: if it does not exist the lookup fails
/// instead of silently falling back to another viewer.
pub fn locate(configured: Option<&Path>) -> PrintResult<PathBuf> {
    let candidates: Vec<&Path> = VIEWER_CANDIDATES.iter().map(Path::new).collect();
    locate_in(configured, &candidates)
}

/// Same as [`locate`] with an explicit candidate list
pub fn locate_in(configured: Option<&Path>, candidates: &[&Path]) -> PrintResult<PathBuf> {
    if let Some(path) = configured.filter(|p| !p.as_os_str().is_empty()) {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(PrintError::ViewerNotFound(path.display().to_string()));
    }

    for candidate in candidates {
        if candidate.is_file() {
            info!(path = %candidate.display(), "Auto-detected viewer");
            return Ok(candidate.to_path_buf());
        }
        debug!(path = %candidate.display(), "Viewer candidate missing");
    }

    Err(PrintError::ViewerNotFound(
        "no viewer in known install locations".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let configured = dir.path().join("viewer.exe");
        let other = dir.path().join("other.exe");
        std::fs::write(&configured, b"").unwrap();
        std::fs::write(&other, b"").unwrap();

        let found = locate_in(Some(&configured), &[other.as_path()]).unwrap();
        assert_eq!(found, configured);
    }

    #[test]
    fn test_missing_configured_path_does_not_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.exe");
        let other = dir.path().join("other.exe");
        std::fs::write(&other, b"").unwrap();

        let result = locate_in(Some(&missing), &[other.as_path()]);
        assert!(matches!(result, Err(PrintError::ViewerNotFound(_))));
    }

    #[test]
    fn test_candidates_in_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.exe");
        let second = dir.path().join("second.exe");
        let third = dir.path().join("third.exe");
        std::fs::write(&second, b"").unwrap();
        std::fs::write(&third, b"").unwrap();

        let found = locate_in(
            Some(Path::new("")),
            &[first.as_path(), second.as_path(), third.as_path()],
        )
        .unwrap();
        assert_eq!(found, second);
    }

    #[test]
    fn test_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.exe");
        assert!(matches!(
            locate_in(None, &[missing.as_path()]),
            Err(PrintError::ViewerNotFound(_))
        ));
    }
}
