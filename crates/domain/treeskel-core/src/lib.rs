use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod path_utils;

pub use path_utils::{RelativeEntry, SkelPath};

/// One status item produced while a skeleton is being written.
///
/// `Display` renders the plain-text status line shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressMessage {
    Started {
        source: Utf8PathBuf,
        target: Utf8PathBuf,
    },
    TargetCreated {
        path: Utf8PathBuf,
    },
    SymlinkSkipped {
        path: Utf8PathBuf,
    },
    DirectoryCreated {
        path: Utf8PathBuf,
    },
    DirectoryCreateFailed {
        path: Utf8PathBuf,
        reason: String,
    },
    FileCreated {
        path: Utf8PathBuf,
    },
    FileCreateFailed {
        path: Utf8PathBuf,
        reason: String,
    },
    /// A directory or entry under the source could not be read.
    ReadFailed {
        path: String,
        reason: String,
    },
    /// A placeholder would have overwritten an existing entry; nothing
    /// follows this message.
    Aborted {
        path: Utf8PathBuf,
    },
    Completed,
}

impl ProgressMessage {
    /// True for the two messages that end a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Aborted { .. } | Self::Completed)
    }

    /// True for per-item failures that do not stop the traversal.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::DirectoryCreateFailed { .. }
                | Self::FileCreateFailed { .. }
                | Self::ReadFailed { .. }
        )
    }
}

impl fmt::Display for ProgressMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { source, target } => {
                write!(f, "Starting copy process from {source} to {target}")
            }
            Self::TargetCreated { path } => write!(f, "Created target directory: {path}"),
            Self::SymlinkSkipped { path } => write!(f, "Skipping symbolic link: {path}"),
            Self::DirectoryCreated { path } => write!(f, "Created directory: {path}"),
            Self::DirectoryCreateFailed { path, reason } => {
                write!(f, "Failed to create directory {path}: {reason}")
            }
            Self::FileCreated { path } => write!(f, "Created empty file: {path}"),
            Self::FileCreateFailed { path, reason } => {
                write!(f, "Failed to create file {path}: {reason}")
            }
            Self::ReadFailed { path, reason } => write!(f, "Failed to read {path}: {reason}"),
            Self::Aborted { path } => write!(
                f,
                "File {path} already exists. Operation aborted to avoid overwriting."
            ),
            Self::Completed => f.write_str("Directory structure copy process completed!"),
        }
    }
}

/// Lifecycle of one replication run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Completed,
    AbortedOnConflict,
}

impl RunState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::AbortedOnConflict)
    }
}
