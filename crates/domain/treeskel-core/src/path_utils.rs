use camino::{Utf8Path, Utf8PathBuf};

/// Characters stripped from both ends of a user-supplied path after
/// whitespace trimming.
pub const QUOTE_CHARS: [char; 2] = ['\'', '"'];

pub struct SkelPath;

impl SkelPath {
    /// Clean a raw path string as typed or pasted by a user.
    ///
    /// Surrounding whitespace goes first, then any run of quote characters at
    /// either end. Whitespace inside the quotes is kept. Returns `None` when
    /// nothing is left.
    pub fn clean_input(raw: &str) -> Option<Utf8PathBuf> {
        let cleaned = raw.trim().trim_matches(&QUOTE_CHARS[..]);
        if cleaned.is_empty() {
            None
        } else {
            Some(Utf8PathBuf::from(cleaned))
        }
    }

    /// Path of `entry` relative to `root`, or `None` if `entry` is not under it.
    pub fn relative(root: &Utf8Path, entry: &Utf8Path) -> Option<RelativeEntry> {
        entry
            .strip_prefix(root)
            .ok()
            .map(|rel| RelativeEntry::new(rel.to_owned()))
    }
}

/// A path below the source root, used to address the matching path below the
/// target root. The source root itself is the empty entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativeEntry {
    rel: Utf8PathBuf,
}

impl RelativeEntry {
    pub fn new(rel: Utf8PathBuf) -> Self {
        Self { rel }
    }

    pub fn root() -> Self {
        Self::new(Utf8PathBuf::new())
    }

    pub fn is_root(&self) -> bool {
        self.rel.as_str().is_empty()
    }

    pub fn as_path(&self) -> &Utf8Path {
        &self.rel
    }

    /// Number of components below the root (the root is depth 0).
    pub fn depth(&self) -> usize {
        self.rel.components().count()
    }

    /// Prefix substitution: the same relative path re-rooted under `root`.
    pub fn under(&self, root: &Utf8Path) -> Utf8PathBuf {
        if self.is_root() {
            root.to_owned()
        } else {
            root.join(&self.rel)
        }
    }
}

impl std::fmt::Display for RelativeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            f.write_str(".")
        } else {
            write!(f, "{}", self.rel)
        }
    }
}
