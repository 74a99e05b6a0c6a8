//! The administrative header of an RCS file.

use serde::{Deserialize, Serialize};

use super::id::RevisionId;

/// Comment leader used when none is given.
pub const DEFAULT_COMMENT: &str = "# ";

/// A `user:revision` entry of the `locks` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub user: String,
    pub revision: RevisionId,
}

impl Lock {
    pub fn new(user: impl Into<String>, revision: RevisionId) -> Self {
        Self {
            user: user.into(),
            revision,
        }
    }
}

/// Line terminator used for the structural parts of a file.
///
/// Quoted strings are never rewritten; only the newlines the writer
/// produces itself follow this setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Whole-file spacing that is not tied to any one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLayout {
    pub line_ending: LineEnding,
    /// Blank lines before `desc` beyond the canonical two.
    pub desc_offset: usize,
    /// Newlines after the final quoted block. Canonical files have one;
    /// zero means the file ends right after the closing `@`.
    pub eof_newlines: usize,
}

impl Default for FileLayout {
    fn default() -> Self {
        Self {
            line_ending: LineEnding::Lf,
            desc_offset: 0,
            eof_newlines: 1,
        }
    }
}

/// A `name:revision` entry of the `symbols` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub revision: RevisionId,
}

/// Header fields preceding the revision index.
///
/// `symbols` keeps insertion order; writers sort by name when emitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminHeader {
    /// Tip of the trunk.
    pub head: RevisionId,
    /// Default branch, used when no revision is requested.
    pub default_branch: Option<String>,
    pub access: Vec<String>,
    pub symbols: Vec<Symbol>,
    pub locks: Vec<Lock>,
    pub strict: bool,
    /// Opaque checksum, emitted quoted.
    pub integrity: Option<String>,
    /// Leader prefixed to log lines by downstream tools.
    pub comment: String,
    /// Keyword expansion mode (`kv`, `kvl`, `k`, `o`, `b`, `v`).
    pub expand: Option<String>,
    pub description: String,
    #[serde(default)]
    pub layout: FileLayout,
}

impl AdminHeader {
    /// A header with the given head and every other field at its default.
    pub fn new(head: RevisionId) -> Self {
        Self {
            head,
            default_branch: None,
            access: Vec::new(),
            symbols: Vec::new(),
            locks: Vec::new(),
            strict: false,
            integrity: None,
            comment: DEFAULT_COMMENT.to_string(),
            expand: None,
            description: String::new(),
            layout: FileLayout::default(),
        }
    }

    /// Look up the revision a symbolic name points at.
    pub fn symbol(&self, name: &str) -> Option<&RevisionId> {
        self.symbols
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.revision)
    }

    /// Symbols ordered by name, the order in which they are written.
    pub fn sorted_symbols(&self) -> Vec<&Symbol> {
        let mut sorted: Vec<&Symbol> = self.symbols.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        sorted
    }
}
