//! Folder watcher and print sequencer
//!
//! Every poll lists the watch folder, starts tracking new matching files and
//! moves each tracked file through
//! `AwaitingReady -> Printing -> PostDelay -> Completed | Failed | Dropped`.
//! Waiting is a due time checked on each poll, so files in different stages
//! progress independently. Only dispatch blocks, bounded by the dispatcher.
//!
//! The registry is the only state. A file is dispatched at most once while it
//! stays in the folder; once a finished file leaves the folder its entry is
//! forgotten, so a later file with the same name is treated as new.

mod tracked;

pub use tracked::{Stage, TrackedFile};

use crate::config::WatchConfig;
use crate::error::FileError;
use crate::post_action::PostAction;
use crate::readiness::{Readiness, ReadinessPolicy};
use hotfolder_printer::Dispatcher;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracked::FileState;
use tracing::{debug, error, info, warn};

/// Drives a single file through its stages
struct Sequencer<D> {
    dispatcher: D,
    policy: ReadinessPolicy,
    print_delay: Duration,
    post_delay: Duration,
    post_action: PostAction,
}

impl<D: Dispatcher> Sequencer<D> {
    /// Advance `file` as far as `now` allows, sampling readiness at most once
    async fn advance(&self, file: &mut TrackedFile, now: Instant) {
        let mut sampled = false;

        loop {
            let next = match &mut file.state {
                FileState::AwaitingReady(probe) => {
                    if sampled {
                        return;
                    }
                    sampled = true;
                    match probe.observe(&file.path, &self.policy, now) {
                        Readiness::Pending => {
                            debug!(
                                file = %file.path.display(),
                                stable = probe.stable_count(),
                                "Waiting for file to be ready"
                            );
                            return;
                        }
                        Readiness::Ready => match now.checked_add(self.print_delay) {
                            Some(due) => {
                                info!(file = %file.path.display(), "File ready");
                                FileState::Printing { due }
                            }
                            None => {
                                error!(
                                    file = %file.path.display(),
                                    delay = ?self.print_delay,
                                    "Print delay out of range, skipping file"
                                );
                                FileState::Failed
                            }
                        },
                        Readiness::Vanished => {
                            info!(file = %file.path.display(), "File removed before it was ready, dropped");
                            FileState::Dropped
                        }
                        Readiness::TimedOut => {
                            warn!(
                                file = %file.path.display(),
                                error = %FileError::ReadinessTimeout(self.policy.timeout),
                                "Skipping file"
                            );
                            FileState::Failed
                        }
                    }
                }
                FileState::Printing { due } => {
                    if now < *due {
                        return;
                    }
                    if !file.path.exists() {
                        info!(file = %file.path.display(), "File removed before printing, dropped");
                        FileState::Dropped
                    } else {
                        match self.dispatcher.dispatch(&file.path).await {
                            Ok(()) => match now.checked_add(self.post_delay) {
                                Some(due) => FileState::PostDelay { due },
                                None => {
                                    error!(
                                        file = %file.path.display(),
                                        delay = ?self.post_delay,
                                        "Post-action delay out of range, leaving file in place"
                                    );
                                    FileState::Failed
                                }
                            },
                            Err(e) => {
                                error!(
                                    file = %file.path.display(),
                                    error = %FileError::from(e),
                                    "Failed to print, leaving file in place"
                                );
                                FileState::Failed
                            }
                        }
                    }
                }
                FileState::PostDelay { due } => {
                    if now < *due {
                        return;
                    }
                    if self.post_action != PostAction::Leave && !file.path.exists() {
                        info!(file = %file.path.display(), "File removed before post-action");
                        FileState::Dropped
                    } else {
                        match self.post_action.apply(&file.path).await {
                            Ok(_) => FileState::Completed,
                            Err(e) => {
                                error!(
                                    file = %file.path.display(),
                                    error = %e,
                                    "Post-print action failed, leaving file in place"
                                );
                                FileState::Failed
                            }
                        }
                    }
                }
                FileState::Completed | FileState::Failed | FileState::Dropped => return,
            };
            file.state = next;
        }
    }
}

/// Polls the watch folder and owns the tracked-file registry
pub struct Watcher<D> {
    config: WatchConfig,
    sequencer: Sequencer<D>,
    tracked: BTreeMap<PathBuf, TrackedFile>,
}

impl<D: Dispatcher> Watcher<D> {
    pub fn new(config: WatchConfig, dispatcher: D) -> Self {
        let sequencer = Sequencer {
            dispatcher,
            policy: ReadinessPolicy {
                stability_checks: config.stability_checks,
                timeout: config.ready_timeout(),
            },
            print_delay: config.print_delay(),
            post_delay: config.post_action_delay(),
            post_action: config.post_action(),
        };
        Self {
            config,
            sequencer,
            tracked: BTreeMap::new(),
        }
    }

    pub fn dispatcher(&self) -> &D {
        &self.sequencer.dispatcher
    }

    /// Stage of a tracked file, `None` if not (or no longer) tracked
    pub fn stage(&self, path: &Path) -> Option<Stage> {
        self.tracked.get(path).map(TrackedFile::stage)
    }

    pub fn tracked(&self) -> impl Iterator<Item = &TrackedFile> {
        self.tracked.values()
    }

    /// One poll: discover, prune, advance
    pub async fn tick(&mut self, now: Instant) {
        let present = match self.scan().await {
            Ok(present) => present,
            Err(e) => {
                warn!(
                    folder = %self.config.watch_folder.display(),
                    error = %e,
                    "Failed to list watch folder"
                );
                return;
            }
        };

        self.tracked
            .retain(|path, file| !file.stage().is_terminal() || present.contains(path));

        for path in present {
            if !self.tracked.contains_key(&path) {
                info!(file = %path.display(), "New file detected");
                let file = TrackedFile::discovered(path.clone(), now);
                self.tracked.insert(path, file);
            }
        }

        for file in self.tracked.values_mut() {
            if !file.stage().is_terminal() {
                self.sequencer.advance(file, now).await;
            }
        }
    }

    /// Matching regular files directly inside the watch folder
    async fn scan(&self) -> std::io::Result<BTreeSet<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.config.watch_folder).await?;
        let mut found = BTreeSet::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            match entry.file_type().await {
                Ok(ft) if ft.is_file() => {}
                _ => continue,
            }
            if self.config.matches_extension(&path) {
                found.insert(path);
            }
        }

        Ok(found)
    }

    /// Poll until `shutdown` is cancelled
    ///
    /// A poll in progress is abandoned on shutdown; any viewer process it
    /// started is terminated when its guard drops.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(folder = %self.config.watch_folder.display(), "Watching folder");

        let mut interval = tokio::time::interval(self.config.check_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Watcher received shutdown signal");
                    break;
                }
                _ = interval.tick() => {}
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown during poll, abandoning in-flight work");
                    break;
                }
                _ = self.tick(Instant::now()) => {}
            }
        }

        let in_flight = self
            .tracked
            .values()
            .filter(|f| !f.stage().is_terminal())
            .count();
        info!(in_flight, "Watcher stopped");
    }
}
