//! Dotted-numeric revision identifiers.
//!
//! Trunk revisions have two components (`1.4`). A branch revision extends
//! the identifier of the revision it forks from by two components: the
//! branch number and the sequence number on that branch (`1.4.2.1`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::StructuralError;

/// A validated revision identifier such as `1.2` or `1.2.1.3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionId(String);

impl RevisionId {
    /// Parse and validate an identifier.
    pub fn parse(s: &str) -> Result<Self, StructuralError> {
        let invalid = || StructuralError::InvalidId(s.to_string());
        let mut count = 0;
        for part in s.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            count += 1;
        }
        if count < 2 || count % 2 != 0 {
            return Err(invalid());
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Number of dotted components (always even).
    pub fn arity(&self) -> usize {
        self.components().count()
    }

    /// True for two-component trunk revisions.
    pub fn is_trunk(&self) -> bool {
        self.arity() == 2
    }

    /// The revision this branch revision forks from, or `None` on the trunk.
    pub fn branch_point(&self) -> Option<RevisionId> {
        if self.is_trunk() {
            return None;
        }
        let keep = self.arity() - 2;
        let prefix: Vec<&str> = self.components().take(keep).collect();
        Some(Self(prefix.join(".")))
    }

    /// The last component: position of this revision along its line.
    pub fn sequence(&self) -> u64 {
        self.components()
            .last()
            .and_then(|c| c.parse().ok())
            .unwrap_or(0)
    }

    /// The identifier without its sequence number, naming the line of
    /// development (`1.2.1.3` -> `1.2.1`).
    pub fn line(&self) -> &str {
        match self.0.rfind('.') {
            Some(dot) => &self.0[..dot],
            None => &self.0,
        }
    }

    /// Whether `other` can follow `self` through a `next` link.
    ///
    /// Trunk revisions may link across major numbers (`2.1` -> `1.9`);
    /// branch revisions must stay on the same branch.
    pub fn same_line(&self, other: &RevisionId) -> bool {
        if self.is_trunk() {
            return other.is_trunk();
        }
        self.arity() == other.arity() && self.line() == other.line()
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RevisionId {
    type Err = StructuralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RevisionId {
    type Error = StructuralError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RevisionId> for String {
    fn from(id: RevisionId) -> Self {
        id.0
    }
}

impl AsRef<str> for RevisionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
