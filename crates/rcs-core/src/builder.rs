//! Graph construction from declarative revision descriptions.
//!
//! `GraphBuilder` collects header fields and [`RevisionSpec`]s, then
//! validates everything at once and returns a [`RevisionGraph`] whose nodes
//! are in canonical write order. It is what fixture generators and other
//! tools use to assemble an RCS file from scratch.
//!
//! # Example
//!
//! ```rust
//! use rcs_core::builder::{GraphBuilder, RevisionSpec};
//!
//! let mut builder = GraphBuilder::new("1.2");
//! builder
//!     .description("File with branches")
//!     .revision(
//!         RevisionSpec::new("1.2", "2023.01.01.00.00.00", "user")
//!             .next("1.1")
//!             .branch("1.2.1.1")
//!             .log("Second revision")
//!             .text("Line 1\nLine 2\n"),
//!     )
//!     .revision(
//!         RevisionSpec::new("1.1", "2022.01.01.00.00.00", "user")
//!             .log("Initial revision")
//!             .text("Line 1\n"),
//!     )
//!     .revision(
//!         RevisionSpec::new("1.2.1.1", "2023.02.01.00.00.00", "user")
//!             .log("Branch revision")
//!             .text("Line 1\nLine 2\nBranch Line\n"),
//!     );
//! builder.symbol("beta", "1.2.1.1").unwrap();
//!
//! let graph = builder.build().unwrap();
//! let order: Vec<&str> = graph.revisions().iter().map(|n| n.id.as_str()).collect();
//! assert_eq!(order, ["1.2", "1.2.1.1", "1.1"]);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::header::{AdminHeader, FileLayout, Lock, Symbol, DEFAULT_COMMENT};
use crate::graph::id::RevisionId;
use crate::graph::node::{RevisionNode, DEFAULT_STATE};
use crate::graph::{RevisionGraph, StructuralError};

/// Declarative description of one revision.
///
/// Identifiers are plain strings here and are validated by
/// [`GraphBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSpec {
    pub id: String,
    pub date: String,
    pub author: String,
    #[serde(default = "default_state")]
    pub state: String,
    /// Next revision on the same line (the predecessor for trunk revisions).
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub branches: Vec<String>,
    #[serde(default, rename = "commitid")]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub text: String,
}

fn default_state() -> String {
    DEFAULT_STATE.to_string()
}

impl RevisionSpec {
    pub fn new(id: &str, date: &str, author: &str) -> Self {
        Self {
            id: id.to_string(),
            date: date.to_string(),
            author: author.to_string(),
            state: default_state(),
            next: None,
            branches: Vec::new(),
            commit_id: None,
            log: String::new(),
            text: String::new(),
        }
    }

    pub fn state(mut self, state: &str) -> Self {
        self.state = state.to_string();
        self
    }

    pub fn next(mut self, next: &str) -> Self {
        self.next = Some(next.to_string());
        self
    }

    pub fn branch(mut self, branch: &str) -> Self {
        self.branches.push(branch.to_string());
        self
    }

    pub fn commit_id(mut self, commit_id: &str) -> Self {
        self.commit_id = Some(commit_id.to_string());
        self
    }

    pub fn log(mut self, log: &str) -> Self {
        self.log = log.to_string();
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    fn into_node(self) -> Result<RevisionNode, StructuralError> {
        let next = match self.next.as_deref() {
            None | Some("") => None,
            Some(n) => Some(RevisionId::parse(n)?),
        };
        let branches = self
            .branches
            .iter()
            .map(|b| RevisionId::parse(b))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RevisionNode {
            id: RevisionId::parse(&self.id)?,
            date: self.date,
            author: self.author,
            state: self.state,
            branches,
            next,
            commit_id: self.commit_id,
            log: self.log,
            text: self.text,
            layout_offset: 0,
        })
    }
}

/// A builder for revision graphs.
///
/// Header setters never fail; symbol and lock setters validate their
/// revision id immediately, and symbols reject duplicate names. Graph-level
/// invariants are checked by [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    head: String,
    default_branch: Option<String>,
    access: Vec<String>,
    symbols: Vec<Symbol>,
    symbol_names: HashSet<String>,
    locks: Vec<Lock>,
    strict: bool,
    integrity: Option<String>,
    comment: String,
    expand: Option<String>,
    description: String,
    revisions: Vec<RevisionSpec>,
}

impl GraphBuilder {
    /// Start a graph whose trunk tip is `head`.
    pub fn new(head: &str) -> Self {
        Self {
            head: head.to_string(),
            default_branch: None,
            access: Vec::new(),
            symbols: Vec::new(),
            symbol_names: HashSet::new(),
            locks: Vec::new(),
            strict: false,
            integrity: None,
            comment: DEFAULT_COMMENT.to_string(),
            expand: None,
            description: String::new(),
            revisions: Vec::new(),
        }
    }

    // === Header fields ===

    pub fn default_branch(&mut self, branch: &str) -> &mut Self {
        self.default_branch = Some(branch.to_string());
        self
    }

    /// Append a user to the access list. Order is kept; repeats are not
    /// collapsed.
    pub fn access(&mut self, user: &str) -> &mut Self {
        self.access.push(user.to_string());
        self
    }

    /// Add a symbolic name. Fails if the name is already taken or the
    /// revision id is malformed.
    pub fn symbol(&mut self, name: &str, revision: &str) -> Result<&mut Self, StructuralError> {
        let revision = RevisionId::parse(revision)?;
        if !self.symbol_names.insert(name.to_string()) {
            return Err(StructuralError::DuplicateSymbol(name.to_string()));
        }
        self.symbols.push(Symbol {
            name: name.to_string(),
            revision,
        });
        Ok(self)
    }

    pub fn lock(&mut self, user: &str, revision: &str) -> Result<&mut Self, StructuralError> {
        let revision = RevisionId::parse(revision)?;
        self.locks.push(Lock::new(user, revision));
        Ok(self)
    }

    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    pub fn integrity(&mut self, integrity: &str) -> &mut Self {
        self.integrity = Some(integrity.to_string());
        self
    }

    pub fn comment(&mut self, comment: &str) -> &mut Self {
        self.comment = comment.to_string();
        self
    }

    pub fn expand(&mut self, expand: &str) -> &mut Self {
        self.expand = Some(expand.to_string());
        self
    }

    pub fn description(&mut self, description: &str) -> &mut Self {
        self.description = description.to_string();
        self
    }

    // === Revisions ===

    /// Add a revision. Order of addition does not matter; `build` sorts.
    pub fn revision(&mut self, spec: RevisionSpec) -> &mut Self {
        self.revisions.push(spec);
        self
    }

    /// Validate everything and produce the graph in canonical order.
    pub fn build(self) -> Result<RevisionGraph, StructuralError> {
        let header = AdminHeader {
            head: RevisionId::parse(&self.head)?,
            default_branch: self.default_branch,
            access: self.access,
            symbols: self.symbols,
            locks: self.locks,
            strict: self.strict,
            integrity: self.integrity,
            comment: self.comment,
            expand: self.expand,
            description: self.description,
            layout: FileLayout::default(),
        };
        let nodes = self
            .revisions
            .into_iter()
            .map(RevisionSpec::into_node)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(head = %header.head, revisions = nodes.len(), "building revision graph");
        RevisionGraph::with_canonical_order(header, nodes)
    }
}
