//! File readiness detection
//!
//! A file counts as fully written once its size and modification time stay
//! unchanged for `stability_checks` consecutive samples and it can be opened
//! exclusively. Samples are taken once per poll, so waiting never blocks the
//! loop. This is a heuristic: a writer that pauses longer than the stability
//! window will be taken as finished.

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;

/// Result of one readiness sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Still changing, empty, or held open by a writer
    Pending,
    Ready,
    /// Deleted or moved away
    Vanished,
    /// Did not settle within the timeout
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Consecutive unchanged samples required
    pub stability_checks: u32,
    /// Maximum time a file may stay pending
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sample {
    len: u64,
    modified: Option<SystemTime>,
}

/// Per-file readiness state
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    last: Option<Sample>,
    stable: u32,
    since: Instant,
}

impl ReadinessProbe {
    pub fn new(now: Instant) -> Self {
        Self {
            last: None,
            stable: 0,
            since: now,
        }
    }

    /// Number of consecutive unchanged samples so far
    pub fn stable_count(&self) -> u32 {
        self.stable
    }

    /// Take one sample of `path`
    pub fn observe(&mut self, path: &Path, policy: &ReadinessPolicy, now: Instant) -> Readiness {
        match std::fs::metadata(path) {
            Ok(meta) => {
                let sample = Sample {
                    len: meta.len(),
                    modified: meta.modified().ok(),
                };
                // Empty files never count as stable
                if sample.len > 0 && self.last == Some(sample) {
                    self.stable += 1;
                } else {
                    self.stable = 0;
                }
                self.last = Some(sample);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Readiness::Vanished,
            Err(e) => {
                debug!(file = %path.display(), error = %e, "Metadata unavailable, still syncing");
                self.stable = 0;
            }
        }

        if self.stable >= policy.stability_checks {
            match open_exclusive(path) {
                Ok(_) => return Readiness::Ready,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Readiness::Vanished,
                Err(e) => {
                    debug!(file = %path.display(), error = %e, "File in use, still syncing");
                }
            }
        }

        if now.saturating_duration_since(self.since) >= policy.timeout {
            Readiness::TimedOut
        } else {
            Readiness::Pending
        }
    }
}

/// Open with no sharing; fails with a sharing violation while a writer holds it
#[cfg(windows)]
fn open_exclusive(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;

    std::fs::OpenOptions::new()
        .read(true)
        .share_mode(0)
        .open(path)
}

/// Advisory exclusive lock, released when the file is dropped
#[cfg(not(windows))]
fn open_exclusive(path: &Path) -> io::Result<File> {
    let file = File::open(path)?;
    fs2::FileExt::try_lock_exclusive(&file)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: ReadinessPolicy = ReadinessPolicy {
        stability_checks: 2,
        timeout: Duration::from_secs(30),
    };

    fn file_with(dir: &Path, content: &[u8]) -> std::path::PathBuf {
        let path = dir.join("scan.pdf");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_never_ready_below_stability_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = file_with(dir.path(), &[7u8; 10 * 1024]);
        let policy = ReadinessPolicy {
            stability_checks: 3,
            ..POLICY
        };
        let start = Instant::now();
        let mut probe = ReadinessProbe::new(start);

        for tick in 0..3 {
            let now = start + Duration::from_secs(tick);
            assert_eq!(probe.observe(&path, &policy, now), Readiness::Pending);
            assert!(probe.stable_count() < policy.stability_checks);
        }
        assert_eq!(
            probe.observe(&path, &policy, start + Duration::from_secs(3)),
            Readiness::Ready
        );
    }

    #[test]
    fn test_static_file_ready_after_stability_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = file_with(dir.path(), b"%PDF-1.7 static");
        let start = Instant::now();
        let mut probe = ReadinessProbe::new(start);

        let ticks = (0..=POLICY.stability_checks)
            .map(|i| probe.observe(&path, &POLICY, start + Duration::from_secs(i as u64)))
            .collect::<Vec<_>>();
        assert_eq!(
            ticks,
            vec![Readiness::Pending, Readiness::Pending, Readiness::Ready]
        );
    }

    #[test]
    fn test_growing_file_resets_stability() {
        let dir = tempfile::tempdir().unwrap();
        let path = file_with(dir.path(), b"part one");
        let now = Instant::now();
        let mut probe = ReadinessProbe::new(now);

        probe.observe(&path, &POLICY, now);
        probe.observe(&path, &POLICY, now);
        assert_eq!(probe.stable_count(), 1);

        std::fs::write(&path, b"part one, part two").unwrap();
        assert_eq!(probe.observe(&path, &POLICY, now), Readiness::Pending);
        assert_eq!(probe.stable_count(), 0);
    }

    #[test]
    fn test_empty_file_never_ready() {
        let dir = tempfile::tempdir().unwrap();
        let path = file_with(dir.path(), b"");
        let start = Instant::now();
        let mut probe = ReadinessProbe::new(start);

        for tick in 0..5 {
            assert_eq!(
                probe.observe(&path, &POLICY, start + Duration::from_secs(tick)),
                Readiness::Pending
            );
        }
        assert_eq!(
            probe.observe(&path, &POLICY, start + POLICY.timeout),
            Readiness::TimedOut
        );
    }

    #[test]
    fn test_vanished_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = file_with(dir.path(), b"gone soon");
        let now = Instant::now();
        let mut probe = ReadinessProbe::new(now);

        assert_eq!(probe.observe(&path, &POLICY, now), Readiness::Pending);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(probe.observe(&path, &POLICY, now), Readiness::Vanished);
    }

    #[cfg(unix)]
    #[test]
    fn test_locked_file_stays_pending() {
        let dir = tempfile::tempdir().unwrap();
        let path = file_with(dir.path(), b"held by a sync client");
        let writer = File::open(&path).unwrap();
        fs2::FileExt::lock_exclusive(&writer).unwrap();

        let now = Instant::now();
        let mut probe = ReadinessProbe::new(now);
        for _ in 0..4 {
            assert_eq!(probe.observe(&path, &POLICY, now), Readiness::Pending);
        }

        drop(writer);
        assert_eq!(probe.observe(&path, &POLICY, now), Readiness::Ready);
    }
}
