//! Revision nodes.
//!
//! A node carries both halves of a revision: the index entry (date, author,
//! state, branch and next links) and the content entry (log and text).

use serde::{Deserialize, Serialize};

use super::id::RevisionId;

/// Default state for new revisions.
pub const DEFAULT_STATE: &str = "Exp";

/// One revision of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionNode {
    pub id: RevisionId,
    /// `YYYY.MM.DD.hh.mm.ss`, kept verbatim.
    pub date: String,
    pub author: String,
    pub state: String,
    /// First revision of every branch forking here, in file order.
    pub branches: Vec<RevisionId>,
    /// Following revision on the same line, `None` at the end of a line.
    pub next: Option<RevisionId>,
    /// CVS commit identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
    pub log: String,
    /// Full revision text. Deltas are out of scope for this model.
    pub text: String,
    /// Blank lines seen before this revision's id line in the content
    /// section, beyond the two every entry gets.
    #[serde(default)]
    pub layout_offset: usize,
}

impl RevisionNode {
    pub fn new(id: RevisionId, date: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id,
            date: date.into(),
            author: author.into(),
            state: DEFAULT_STATE.to_string(),
            branches: Vec::new(),
            next: None,
            commit_id: None,
            log: String::new(),
            text: String::new(),
            layout_offset: 0,
        }
    }

    pub fn with_next(mut self, next: RevisionId) -> Self {
        self.next = Some(next);
        self
    }

    pub fn with_branch(mut self, branch: RevisionId) -> Self {
        self.branches.push(branch);
        self
    }

    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = log.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Every revision this node links to: branch heads first, then `next`.
    pub fn successors(&self) -> impl Iterator<Item = &RevisionId> {
        self.branches.iter().chain(self.next.iter())
    }
}
