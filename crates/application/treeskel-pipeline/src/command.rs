use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use treeskel_core::RunState;
use treeskel_scanner::{ValidationError, Validator};

use crate::replicate::{ReplicationStats, Replicator};
use crate::sink::ProgressSink;

/// Answers the "target is not empty, continue?" question.
pub trait ConfirmPort {
    fn confirm_non_empty_target(&self, target: &Utf8Path) -> bool;
}

impl<F> ConfirmPort for F
where
    F: Fn(&Utf8Path) -> bool,
{
    fn confirm_non_empty_target(&self, target: &Utf8Path) -> bool {
        self(target)
    }
}

/// Consents without asking.
pub struct AssumeYes;

impl ConfirmPort for AssumeYes {
    fn confirm_non_empty_target(&self, _target: &Utf8Path) -> bool {
        true
    }
}

/// Raw paths as typed by the user; cleaned during validation.
#[derive(Debug, Clone)]
pub struct CopyRequest {
    pub source: String,
    pub target: String,
    pub assume_yes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyReport {
    pub source: Utf8PathBuf,
    pub target: Utf8PathBuf,
    pub state: RunState,
    pub stats: ReplicationStats,
}

impl CopyReport {
    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }
}

impl fmt::Display for CopyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.state {
            RunState::Completed => "completed",
            RunState::AbortedOnConflict => "aborted on conflict",
            RunState::Running => "interrupted",
            RunState::Idle => "not started",
        };
        write!(
            f,
            "{outcome}: {} directories, {} files, {} symlinks skipped, {} failures",
            self.stats.dirs_created,
            self.stats.files_created,
            self.stats.symlinks_skipped,
            self.stats.failures
        )
    }
}

/// Validate, ask for consent if needed, then write the skeleton.
///
/// Validation problems come back as `Err` before anything is written. A file
/// that turns up during the copy is not an error: it ends the stream with
/// `Aborted` and the report says `AbortedOnConflict`.
pub fn copy_structure<C, S>(
    request: &CopyRequest,
    confirm: &C,
    sink: &mut S,
) -> Result<CopyReport, ValidationError>
where
    C: ConfirmPort + ?Sized,
    S: ProgressSink + ?Sized,
{
    let pair = Validator::check_with(&request.source, &request.target, |target| {
        request.assume_yes || confirm.confirm_non_empty_target(target)
    })?;

    let report = Replicator::run_validated(pair).drain_into(sink);
    info!("Copy finished, {}", report);
    Ok(report)
}
