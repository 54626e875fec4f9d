use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io;
use std::iter::FusedIterator;
use tracing::{debug, info, warn};
use treeskel_core::{ProgressMessage, RunState, SkelPath};
use treeskel_scanner::{entry_exists, walk_source, EntryKind, ValidatedPair};
use walkdir::DirEntry;

use crate::command::CopyReport;
use crate::sink::ProgressSink;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationStats {
    pub dirs_created: u64,
    pub files_created: u64,
    pub symlinks_skipped: u64,
    pub failures: u64,
}

impl ReplicationStats {
    fn record(&mut self, message: &ProgressMessage) {
        match message {
            ProgressMessage::TargetCreated { .. } | ProgressMessage::DirectoryCreated { .. } => {
                self.dirs_created += 1
            }
            ProgressMessage::FileCreated { .. } => self.files_created += 1,
            ProgressMessage::SymlinkSkipped { .. } => self.symlinks_skipped += 1,
            m if m.is_failure() => self.failures += 1,
            _ => {}
        }
    }
}

pub struct Replicator;

impl Replicator {
    /// Start writing the skeleton of `source` into `target`.
    ///
    /// Nothing touches the disk until the returned iterator is polled. The
    /// roots are used as given; run the `Validator` first unless bypassing it
    /// is the point.
    pub fn run(source: impl Into<Utf8PathBuf>, target: impl Into<Utf8PathBuf>) -> Replication {
        Replication {
            source: source.into(),
            target: target.into(),
            stage: Stage::Start,
            state: RunState::Idle,
            pending: VecDeque::new(),
            stats: ReplicationStats::default(),
        }
    }

    pub fn run_validated(pair: ValidatedPair) -> Replication {
        Self::run(pair.source, pair.target)
    }
}

enum Stage {
    Start,
    Walking(walkdir::IntoIter),
    Done,
}

/// A running skeleton copy, yielding one status message per action.
///
/// The last message is either `Completed` or `Aborted`; after that the
/// iterator is exhausted for good.
pub struct Replication {
    source: Utf8PathBuf,
    target: Utf8PathBuf,
    stage: Stage,
    state: RunState,
    pending: VecDeque<ProgressMessage>,
    stats: ReplicationStats,
}

impl Replication {
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }

    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn stats(&self) -> &ReplicationStats {
        &self.stats
    }

    /// Run to the end, handing every message to `sink` as it is produced.
    pub fn drain_into<S: ProgressSink + ?Sized>(mut self, sink: &mut S) -> CopyReport {
        for message in self.by_ref() {
            sink.emit(&message);
        }
        CopyReport {
            source: self.source,
            target: self.target,
            state: self.state,
            stats: self.stats,
        }
    }

    fn start(&mut self) {
        info!("Replicating structure {} -> {}", self.source, self.target);
        self.state = RunState::Running;
        self.pending.push_back(ProgressMessage::Started {
            source: self.source.clone(),
            target: self.target.clone(),
        });

        if !self.target.exists() {
            let message = match fs::create_dir_all(&self.target) {
                Ok(()) => ProgressMessage::TargetCreated {
                    path: self.target.clone(),
                },
                Err(e) => {
                    warn!("Cannot create target {}: {}", self.target, e);
                    ProgressMessage::DirectoryCreateFailed {
                        path: self.target.clone(),
                        reason: e.to_string(),
                    }
                }
            };
            self.pending.push_back(message);
        }

        self.stage = Stage::Walking(walk_source(&self.source).into_iter());
    }

    fn visit(&mut self, walked: walkdir::Result<DirEntry>) {
        let entry = match walked {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| self.source.to_string());
                let reason = e
                    .io_error()
                    .map(|io| io.to_string())
                    .unwrap_or_else(|| e.to_string());
                warn!("Cannot read {}: {}", path, reason);
                self.pending
                    .push_back(ProgressMessage::ReadFailed { path, reason });
                return;
            }
        };

        let kind = EntryKind::of(&entry);
        let Some(rel) = Utf8Path::from_path(entry.path())
            .and_then(|path| SkelPath::relative(&self.source, path))
        else {
            if kind == EntryKind::Directory {
                self.skip_current_dir();
            }
            self.pending.push_back(ProgressMessage::ReadFailed {
                path: entry.path().display().to_string(),
                reason: "path is not valid UTF-8".to_string(),
            });
            return;
        };

        match kind {
            EntryKind::LinkedDirectory => {
                debug!("Not following directory link {}", rel);
                self.pending.push_back(ProgressMessage::SymlinkSkipped {
                    path: rel.under(&self.source),
                });
            }
            EntryKind::Directory => {
                // The target root was handled in `start`.
                if rel.is_root() {
                    return;
                }
                let dst = rel.under(&self.target);
                if dst.exists() {
                    return;
                }
                let message = match fs::create_dir_all(&dst) {
                    Ok(()) => ProgressMessage::DirectoryCreated { path: dst },
                    Err(e) => {
                        warn!("Cannot create directory {}: {}", dst, e);
                        ProgressMessage::DirectoryCreateFailed {
                            path: dst,
                            reason: e.to_string(),
                        }
                    }
                };
                self.pending.push_back(message);
            }
            EntryKind::File => {
                let dst = rel.under(&self.target);
                if entry_exists(&dst) {
                    self.abort(dst);
                    return;
                }
                match create_placeholder(&dst) {
                    Ok(()) => self
                        .pending
                        .push_back(ProgressMessage::FileCreated { path: dst }),
                    // Appeared between the check and the create.
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => self.abort(dst),
                    Err(e) => {
                        warn!("Cannot create placeholder {}: {}", dst, e);
                        self.pending.push_back(ProgressMessage::FileCreateFailed {
                            path: dst,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    fn skip_current_dir(&mut self) {
        if let Stage::Walking(walker) = &mut self.stage {
            walker.skip_current_dir();
        }
    }

    fn abort(&mut self, existing: Utf8PathBuf) {
        warn!("{} already exists, aborting", existing);
        self.pending
            .push_back(ProgressMessage::Aborted { path: existing });
        self.state = RunState::AbortedOnConflict;
        self.stage = Stage::Done;
    }

    fn finish(&mut self) {
        info!(
            "Structure copied: {} dirs, {} files, {} failures",
            self.stats.dirs_created, self.stats.files_created, self.stats.failures
        );
        self.pending.push_back(ProgressMessage::Completed);
        self.state = RunState::Completed;
        self.stage = Stage::Done;
    }
}

impl Iterator for Replication {
    type Item = ProgressMessage;

    fn next(&mut self) -> Option<ProgressMessage> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                self.stats.record(&message);
                return Some(message);
            }
            if matches!(self.stage, Stage::Start) {
                self.start();
                continue;
            }
            let walked = match &mut self.stage {
                Stage::Walking(walker) => walker.next(),
                _ => return None,
            };
            match walked {
                Some(walked) => self.visit(walked),
                None => self.finish(),
            }
        }
    }
}

impl FusedIterator for Replication {}

/// Zero-length file at `path`; fails rather than truncating anything there.
fn create_placeholder(path: &Utf8Path) -> io::Result<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(drop)
}
