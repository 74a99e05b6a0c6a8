//! The revision graph: an administrative header plus an arena of revision
//! nodes.
//!
//! Nodes never own each other. Every reference (`next`, `branches`, symbol
//! and lock targets, `head`) is a [`RevisionId`] resolved against the arena
//! through a lookup table, which keeps the trunk/branch tree free of
//! ownership cycles and mirrors the identifier addressing of the file
//! format itself.
//!
//! A graph is validated when it is constructed and is immutable afterwards,
//! so writers can rely on every invariant holding.

pub mod header;
pub mod id;
pub mod node;

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use self::header::AdminHeader;
use self::id::RevisionId;
use self::node::RevisionNode;

/// Invariant violations detected while constructing a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("invalid revision id {0:?}: expected an even number of dotted numbers")]
    InvalidId(String),

    #[error("duplicate revision id: {0}")]
    DuplicateRevision(RevisionId),

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("head {0} does not name a revision")]
    UnresolvedHead(RevisionId),

    #[error("head {0} is not a trunk revision")]
    HeadNotOnTrunk(RevisionId),

    #[error("revision {revision}: next {next} does not name a revision")]
    DanglingNext {
        revision: RevisionId,
        next: RevisionId,
    },

    #[error("revision {revision}: next {next} is not on the same line of development")]
    NextOffLine {
        revision: RevisionId,
        next: RevisionId,
    },

    #[error("revision {revision}: branch {branch} does not name a revision")]
    DanglingBranch {
        revision: RevisionId,
        branch: RevisionId,
    },

    #[error("revision {revision}: branch {branch} does not fork from it")]
    BranchPrefixMismatch {
        revision: RevisionId,
        branch: RevisionId,
    },

    #[error("revision {revision}: branch {branch} must start at sequence number 1")]
    BranchNotFirst {
        revision: RevisionId,
        branch: RevisionId,
    },

    #[error("symbol {name} points at missing revision {revision}")]
    DanglingSymbol { name: String, revision: RevisionId },

    #[error("lock held by {user} on missing revision {revision}")]
    DanglingLock { user: String, revision: RevisionId },

    #[error("revision {0} is not reachable from head")]
    Orphan(RevisionId),

    #[error("revision {0} is reached more than once")]
    MultipleParents(RevisionId),
}

/// A validated revision graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionGraph {
    header: AdminHeader,
    /// Nodes in the order they are written.
    revisions: Vec<RevisionNode>,
    #[serde(skip)]
    index: HashMap<RevisionId, usize>,
}

impl RevisionGraph {
    /// Validate `header` and `nodes`, keeping the nodes in the given order.
    ///
    /// This is the entry point for graphs read from an existing file, where
    /// the file's own ordering must be preserved.
    pub fn new(header: AdminHeader, nodes: Vec<RevisionNode>) -> Result<Self, StructuralError> {
        let index = build_index(&nodes)?;
        let graph = Self {
            header,
            revisions: nodes,
            index,
        };
        graph.validate()?;
        debug!(
            head = %graph.header.head,
            revisions = graph.revisions.len(),
            "revision graph validated"
        );
        Ok(graph)
    }

    /// Validate `header` and `nodes`, then reorder the nodes canonically:
    /// head first, each revision followed by its branch subtrees (in the
    /// order its `branches` list names them), then by its `next`.
    pub fn with_canonical_order(
        header: AdminHeader,
        nodes: Vec<RevisionNode>,
    ) -> Result<Self, StructuralError> {
        let graph = Self::new(header, nodes)?;
        let order = graph.walk()?;
        let mut slots: Vec<Option<RevisionNode>> =
            graph.revisions.into_iter().map(Some).collect();
        let revisions: Vec<RevisionNode> = order
            .into_iter()
            .filter_map(|i| slots.get_mut(i).and_then(Option::take))
            .collect();
        let index = build_index(&revisions)?;
        Ok(Self {
            header: graph.header,
            revisions,
            index,
        })
    }

    pub fn header(&self) -> &AdminHeader {
        &self.header
    }

    /// Nodes in write order.
    pub fn revisions(&self) -> &[RevisionNode] {
        &self.revisions
    }

    pub fn get(&self, id: &RevisionId) -> Option<&RevisionNode> {
        self.index.get(id).map(|&i| &self.revisions[i])
    }

    pub fn contains(&self, id: &RevisionId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// The trunk, from head down to the initial revision.
    pub fn trunk(&self) -> Vec<&RevisionNode> {
        let mut out = Vec::new();
        let mut cursor = self.get(&self.header.head);
        while let Some(node) = cursor {
            out.push(node);
            cursor = node.next.as_ref().and_then(|n| self.get(n));
        }
        out
    }

    /// Consume the graph, returning its header and nodes in write order.
    pub fn into_parts(self) -> (AdminHeader, Vec<RevisionNode>) {
        (self.header, self.revisions)
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), StructuralError> {
        let head = &self.header.head;
        if !self.contains(head) {
            return Err(StructuralError::UnresolvedHead(head.clone()));
        }
        if !head.is_trunk() {
            return Err(StructuralError::HeadNotOnTrunk(head.clone()));
        }

        for node in &self.revisions {
            self.check_links(node)?;
        }

        let mut seen = HashSet::new();
        for symbol in &self.header.symbols {
            if !seen.insert(symbol.name.as_str()) {
                return Err(StructuralError::DuplicateSymbol(symbol.name.clone()));
            }
            if !self.contains(&symbol.revision) {
                return Err(StructuralError::DanglingSymbol {
                    name: symbol.name.clone(),
                    revision: symbol.revision.clone(),
                });
            }
        }
        for lock in &self.header.locks {
            if !self.contains(&lock.revision) {
                return Err(StructuralError::DanglingLock {
                    user: lock.user.clone(),
                    revision: lock.revision.clone(),
                });
            }
        }

        self.walk().map(|_| ())
    }

    fn check_links(&self, node: &RevisionNode) -> Result<(), StructuralError> {
        if let Some(next) = &node.next {
            if !self.contains(next) {
                return Err(StructuralError::DanglingNext {
                    revision: node.id.clone(),
                    next: next.clone(),
                });
            }
            if !node.id.same_line(next) {
                return Err(StructuralError::NextOffLine {
                    revision: node.id.clone(),
                    next: next.clone(),
                });
            }
        }
        for branch in &node.branches {
            if branch.branch_point().as_ref() != Some(&node.id) {
                return Err(StructuralError::BranchPrefixMismatch {
                    revision: node.id.clone(),
                    branch: branch.clone(),
                });
            }
            if branch.sequence() != 1 {
                return Err(StructuralError::BranchNotFirst {
                    revision: node.id.clone(),
                    branch: branch.clone(),
                });
            }
            if !self.contains(branch) {
                return Err(StructuralError::DanglingBranch {
                    revision: node.id.clone(),
                    branch: branch.clone(),
                });
            }
        }
        Ok(())
    }

    /// Depth-first walk from head, returning arena indices in canonical
    /// order. Fails if a node is reached twice or never reached.
    fn walk(&self) -> Result<Vec<usize>, StructuralError> {
        let mut order = Vec::with_capacity(self.revisions.len());
        let mut visited = vec![false; self.revisions.len()];
        let mut stack = vec![&self.header.head];

        while let Some(id) = stack.pop() {
            let Some(&i) = self.index.get(id) else {
                return Err(StructuralError::UnresolvedHead(id.clone()));
            };
            if visited[i] {
                return Err(StructuralError::MultipleParents(id.clone()));
            }
            visited[i] = true;
            order.push(i);

            let node = &self.revisions[i];
            // Pushed in reverse so branches pop before next, in list order.
            stack.extend(node.next.iter());
            stack.extend(node.branches.iter().rev());
        }

        if let Some(orphan) = visited.iter().position(|v| !v) {
            return Err(StructuralError::Orphan(self.revisions[orphan].id.clone()));
        }
        Ok(order)
    }
}

fn build_index(nodes: &[RevisionNode]) -> Result<HashMap<RevisionId, usize>, StructuralError> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.insert(node.id.clone(), i).is_some() {
            return Err(StructuralError::DuplicateRevision(node.id.clone()));
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::header::{Lock, Symbol};
    use super::*;

    fn rev(s: &str) -> RevisionId {
        RevisionId::parse(s).unwrap()
    }

    fn node(id: &str) -> RevisionNode {
        RevisionNode::new(rev(id), "2023.01.01.00.00.00", "user")
    }

    fn branched() -> Vec<RevisionNode> {
        vec![
            node("1.1"),
            node("1.2.1.1"),
            node("1.2").with_next(rev("1.1")).with_branch(rev("1.2.1.1")),
        ]
    }

    #[test]
    fn new_keeps_given_order() {
        let g = RevisionGraph::new(AdminHeader::new(rev("1.2")), branched()).unwrap();
        let ids: Vec<&str> = g.revisions().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["1.1", "1.2.1.1", "1.2"]);
    }

    #[test]
    fn canonical_order_places_branches_after_fork_point() {
        let g =
            RevisionGraph::with_canonical_order(AdminHeader::new(rev("1.2")), branched()).unwrap();
        let ids: Vec<&str> = g.revisions().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["1.2", "1.2.1.1", "1.1"]);
        assert_eq!(g.get(&rev("1.2.1.1")).unwrap().id, rev("1.2.1.1"));
    }

    #[test]
    fn canonical_order_nested_branches() {
        let nodes = vec![
            node("1.1"),
            node("1.2")
                .with_next(rev("1.1"))
                .with_branch(rev("1.2.1.1"))
                .with_branch(rev("1.2.2.1")),
            node("1.3").with_next(rev("1.2")),
            node("1.2.1.1").with_next(rev("1.2.1.2")),
            node("1.2.1.2").with_branch(rev("1.2.1.2.1.1")),
            node("1.2.1.2.1.1"),
            node("1.2.2.1"),
        ];
        let g = RevisionGraph::with_canonical_order(AdminHeader::new(rev("1.3")), nodes).unwrap();
        let ids: Vec<&str> = g.revisions().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(
            ids,
            ["1.3", "1.2", "1.2.1.1", "1.2.1.2", "1.2.1.2.1.1", "1.2.2.1", "1.1"]
        );
        let trunk: Vec<&str> = g.trunk().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(trunk, ["1.3", "1.2", "1.1"]);
    }

    #[test]
    fn unresolved_head_rejected() {
        let err = RevisionGraph::new(AdminHeader::new(rev("1.9")), vec![node("1.1")]).unwrap_err();
        assert_eq!(err, StructuralError::UnresolvedHead(rev("1.9")));
    }

    #[test]
    fn branch_head_not_allowed_as_head() {
        let err = RevisionGraph::new(AdminHeader::new(rev("1.1.1.1")), vec![node("1.1.1.1")])
            .unwrap_err();
        assert_eq!(err, StructuralError::HeadNotOnTrunk(rev("1.1.1.1")));
    }

    #[test]
    fn dangling_next_rejected() {
        let err = RevisionGraph::new(
            AdminHeader::new(rev("1.2")),
            vec![node("1.2").with_next(rev("1.1"))],
        )
        .unwrap_err();
        assert!(matches!(err, StructuralError::DanglingNext { .. }));
    }

    #[test]
    fn next_must_stay_on_branch() {
        let nodes = vec![
            node("1.1").with_branch(rev("1.1.1.1")).with_branch(rev("1.1.2.1")),
            node("1.1.1.1").with_next(rev("1.1.2.1")),
            node("1.1.2.1"),
        ];
        let err = RevisionGraph::new(AdminHeader::new(rev("1.1")), nodes).unwrap_err();
        assert!(matches!(err, StructuralError::NextOffLine { .. }));
    }

    #[test]
    fn branch_prefix_mismatch_rejected() {
        let nodes = vec![
            node("1.1"),
            node("1.2").with_next(rev("1.1")),
            node("1.3").with_next(rev("1.2")).with_branch(rev("1.2.1.1")),
            node("1.2.1.1"),
        ];
        let err = RevisionGraph::new(AdminHeader::new(rev("1.3")), nodes).unwrap_err();
        assert_eq!(
            err,
            StructuralError::BranchPrefixMismatch {
                revision: rev("1.3"),
                branch: rev("1.2.1.1"),
            }
        );
    }

    #[test]
    fn branch_must_start_at_one() {
        let nodes = vec![node("1.1").with_branch(rev("1.1.1.2")), node("1.1.1.2")];
        let err = RevisionGraph::new(AdminHeader::new(rev("1.1")), nodes).unwrap_err();
        assert!(matches!(err, StructuralError::BranchNotFirst { .. }));
    }

    #[test]
    fn missing_branch_head_rejected() {
        let nodes = vec![node("1.1").with_branch(rev("1.1.1.1"))];
        let err = RevisionGraph::new(AdminHeader::new(rev("1.1")), nodes).unwrap_err();
        assert_eq!(
            err,
            StructuralError::DanglingBranch {
                revision: rev("1.1"),
                branch: rev("1.1.1.1"),
            }
        );
    }

    #[test]
    fn orphan_rejected() {
        let nodes = vec![node("1.2"), node("1.1")];
        let err = RevisionGraph::new(AdminHeader::new(rev("1.2")), nodes).unwrap_err();
        assert_eq!(err, StructuralError::Orphan(rev("1.1")));
    }

    #[test]
    fn cycle_rejected() {
        let nodes = vec![
            node("1.2").with_next(rev("1.1")),
            node("1.1").with_next(rev("1.2")),
        ];
        let err = RevisionGraph::new(AdminHeader::new(rev("1.2")), nodes).unwrap_err();
        assert_eq!(err, StructuralError::MultipleParents(rev("1.2")));
    }

    #[test]
    fn duplicate_revision_rejected() {
        let err = RevisionGraph::new(AdminHeader::new(rev("1.1")), vec![node("1.1"), node("1.1")])
            .unwrap_err();
        assert_eq!(err, StructuralError::DuplicateRevision(rev("1.1")));
    }

    #[test]
    fn symbol_and_lock_targets_checked() {
        let mut header = AdminHeader::new(rev("1.1"));
        header.symbols.push(Symbol {
            name: "rel".into(),
            revision: rev("1.5"),
        });
        let err = RevisionGraph::new(header, vec![node("1.1")]).unwrap_err();
        assert!(matches!(err, StructuralError::DanglingSymbol { .. }));

        let mut header = AdminHeader::new(rev("1.1"));
        header.locks.push(Lock::new("alice", rev("1.3")));
        let err = RevisionGraph::new(header, vec![node("1.1")]).unwrap_err();
        assert!(matches!(err, StructuralError::DanglingLock { .. }));
    }

    #[test]
    fn duplicate_symbol_rejected() {
        let mut header = AdminHeader::new(rev("1.1"));
        for _ in 0..2 {
            header.symbols.push(Symbol {
                name: "rel".into(),
                revision: rev("1.1"),
            });
        }
        let err = RevisionGraph::new(header, vec![node("1.1")]).unwrap_err();
        assert_eq!(err, StructuralError::DuplicateSymbol("rel".into()));
    }

    #[test]
    fn serializes_to_json_without_index() {
        let g = RevisionGraph::new(AdminHeader::new(rev("1.1")), vec![node("1.1")]).unwrap();
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["header"]["head"], "1.1");
        assert_eq!(json["revisions"][0]["author"], "user");
        assert!(json.get("index").is_none());
    }
}
