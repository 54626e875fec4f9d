use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use treeskel_core::SkelPath;

pub mod walk;
pub use walk::{entry_exists, walk_source, EntryKind};

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Both source and target directories must be specified.")]
    EmptyInput,
    #[error("Source directory {0} does not exist.")]
    MissingSource(Utf8PathBuf),
    #[error("Source {0} is not a directory.")]
    SourceNotDirectory(Utf8PathBuf),
    #[error("Target {0} exists and is not a directory.")]
    TargetNotDirectory(Utf8PathBuf),
    #[error("Target directory {target_root} is the source directory or lies inside it ({source_root}).")]
    Overlap {
        source_root: Utf8PathBuf,
        target_root: Utf8PathBuf,
    },
    #[error("Conflicting files detected in the target directory ({0}). Operation aborted to avoid overwriting.")]
    ConflictDetected(Utf8PathBuf),
    #[error("Operation aborted: target directory {0} is not empty.")]
    Aborted(Utf8PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cleaned source and target roots that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPair {
    pub source: Utf8PathBuf,
    pub target: Utf8PathBuf,
}

#[derive(Debug)]
pub enum Outcome {
    Ready(ValidatedPair),
    /// The target already has entries; the caller must ask before going on.
    NeedsConfirmation(PendingConfirmation),
}

/// A check paused on the non-empty target question. The conflict scan has
/// not run yet.
#[derive(Debug)]
pub struct PendingConfirmation {
    pair: ValidatedPair,
}

impl PendingConfirmation {
    pub fn source(&self) -> &Utf8Path {
        &self.pair.source
    }

    pub fn target(&self) -> &Utf8Path {
        &self.pair.target
    }

    /// Resume the check with the user's consent.
    pub fn accept(self) -> Result<ValidatedPair, ValidationError> {
        debug!("Non-empty target {} accepted", self.pair.target);
        Validator::ensure_no_conflict(&self.pair)?;
        Ok(self.pair)
    }

    pub fn decline(self) -> ValidationError {
        info!("Non-empty target {} declined", self.pair.target);
        ValidationError::Aborted(self.pair.target)
    }
}

pub struct Validator;

impl Validator {
    /// Read-only pre-flight for a skeleton copy.
    ///
    /// Order: blank input, missing source, wrong entry types, overlap,
    /// non-empty target (pauses), conflicting files.
    pub fn check(source: &str, target: &str) -> Result<Outcome, ValidationError> {
        let (Some(source), Some(target)) =
            (SkelPath::clean_input(source), SkelPath::clean_input(target))
        else {
            return Err(ValidationError::EmptyInput);
        };
        info!("Validating {} -> {}", source, target);

        if !source.exists() {
            return Err(ValidationError::MissingSource(source));
        }
        if !source.is_dir() {
            return Err(ValidationError::SourceNotDirectory(source));
        }
        // The target, or the deepest ancestor of it that exists, must be a directory.
        if let Some(existing) = target.ancestors().find(|a| a.exists()) {
            if !existing.is_dir() {
                return Err(ValidationError::TargetNotDirectory(existing.to_path_buf()));
            }
        }
        if Self::is_overlap(&source, &target)? {
            return Err(ValidationError::Overlap {
                source_root: source,
                target_root: target,
            });
        }

        let pair = ValidatedPair { source, target };
        if Self::is_non_empty_dir(&pair.target)? {
            return Ok(Outcome::NeedsConfirmation(PendingConfirmation { pair }));
        }

        Self::ensure_no_conflict(&pair)?;
        Ok(Outcome::Ready(pair))
    }

    /// `check` with the confirmation answered by `confirm`, which is only
    /// called for a non-empty target.
    pub fn check_with(
        source: &str,
        target: &str,
        confirm: impl FnOnce(&Utf8Path) -> bool,
    ) -> Result<ValidatedPair, ValidationError> {
        match Self::check(source, target)? {
            Outcome::Ready(pair) => Ok(pair),
            Outcome::NeedsConfirmation(pending) => {
                if confirm(pending.target()) {
                    pending.accept()
                } else {
                    Err(pending.decline())
                }
            }
        }
    }

    /// First path under `target` that a placeholder for a file under `source`
    /// would land on, if any. Stops at the first hit.
    pub fn find_conflict(source: &Utf8Path, target: &Utf8Path) -> Option<Utf8PathBuf> {
        for entry in walk_source(source) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry during conflict scan: {}", e);
                    continue;
                }
            };
            if EntryKind::of(&entry) != EntryKind::File {
                continue;
            }
            let Some(path) = Utf8Path::from_path(entry.path()) else {
                warn!("Skipping non UTF-8 path: {}", entry.path().display());
                continue;
            };
            let Some(rel) = SkelPath::relative(source, path) else {
                continue;
            };
            let candidate = rel.under(target);
            if entry_exists(&candidate) {
                debug!("Conflict: {} already exists", candidate);
                return Some(candidate);
            }
        }
        None
    }

    /// True when `target` resolves to `source` or to a path inside it.
    pub fn is_overlap(source: &Utf8Path, target: &Utf8Path) -> std::io::Result<bool> {
        let source = resolve(source.as_std_path())?;
        let target = resolve(target.as_std_path())?;
        Ok(target.starts_with(&source))
    }

    fn ensure_no_conflict(pair: &ValidatedPair) -> Result<(), ValidationError> {
        match Self::find_conflict(&pair.source, &pair.target) {
            Some(path) => Err(ValidationError::ConflictDetected(path)),
            None => Ok(()),
        }
    }

    fn is_non_empty_dir(path: &Utf8Path) -> Result<bool, ValidationError> {
        if !path.is_dir() {
            return Ok(false);
        }
        Ok(fs::read_dir(path)?.next().is_some())
    }
}

/// Absolute, symlink-resolved form of `path`. Components that do not exist
/// yet are appended lexically to the deepest existing ancestor.
fn resolve(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    for ancestor in absolute.ancestors() {
        let Ok(mut resolved) = fs::canonicalize(ancestor) else {
            continue;
        };
        // Ancestors of `absolute` always prefix it.
        let rest = absolute.strip_prefix(ancestor).unwrap_or(Path::new(""));
        for component in rest.components() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(part) => resolved.push(part),
                _ => {}
            }
        }
        return Ok(resolved);
    }
    Ok(absolute)
}
