//! `rcsfix.toml` manifest parsing: declarative fixture descriptions.
//!
//! ```toml
//! output_dir = "testdata/generated"
//!
//! [[fixture]]
//! file = "branches.v"
//! head = "1.2"
//! description = "File with branches"
//!
//! [[fixture.revision]]
//! id = "1.2"
//! date = "2023.01.01.00.00.00"
//! author = "user"
//! next = "1.1"
//! branches = ["1.2.1.1"]
//! log = "Second revision"
//! text = "Line 1\nLine 2\n"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rcs_core::graph::header::DEFAULT_COMMENT;
use rcs_core::{GraphBuilder, RevisionGraph, RevisionSpec};
use serde::{Deserialize, Serialize};

/// File name searched for by [`FixtureManifest::find_and_load`].
pub const MANIFEST_FILE: &str = "rcsfix.toml";

/// The top-level manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureManifest {
    /// Where generated files go, relative to the manifest's directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default, rename = "fixture")]
    pub fixtures: Vec<FixtureSpec>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_comment() -> String {
    DEFAULT_COMMENT.to_string()
}

/// One generated file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSpec {
    /// Output file name.
    pub file: String,
    pub head: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub access: Vec<String>,
    /// Symbol name to revision. Written sorted by name whatever the order
    /// here.
    #[serde(default)]
    pub symbols: BTreeMap<String, String>,
    /// `user:revision` entries.
    #[serde(default)]
    pub locks: Vec<String>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub integrity: Option<String>,
    #[serde(default = "default_comment")]
    pub comment: String,
    #[serde(default)]
    pub expand: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "revision")]
    pub revisions: Vec<RevisionSpec>,
}

impl FixtureSpec {
    /// Build the revision graph this fixture describes.
    pub fn build(&self) -> Result<RevisionGraph> {
        let mut b = GraphBuilder::new(&self.head);
        if let Some(branch) = &self.branch {
            b.default_branch(branch);
        }
        for user in &self.access {
            b.access(user);
        }
        for (name, revision) in &self.symbols {
            b.symbol(name, revision)
                .with_context(|| format!("{}: symbol {name}", self.file))?;
        }
        for lock in &self.locks {
            let (user, revision) = lock
                .split_once(':')
                .with_context(|| format!("{}: lock {lock:?} is not user:revision", self.file))?;
            b.lock(user, revision)
                .with_context(|| format!("{}: lock {lock}", self.file))?;
        }
        b.strict(self.strict).comment(&self.comment).description(&self.description);
        if let Some(integrity) = &self.integrity {
            b.integrity(integrity);
        }
        if let Some(expand) = &self.expand {
            b.expand(expand);
        }
        for spec in &self.revisions {
            b.revision(spec.clone());
        }
        b.build().with_context(|| format!("building {}", self.file))
    }
}

impl FixtureManifest {
    /// Search upward from `start_dir` for an `rcsfix.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let manifest = Self::load(&candidate)?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                return Ok(None);
            }
        }
    }

    /// Load a manifest from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn fixture(&self, file: &str) -> Option<&FixtureSpec> {
        self.fixtures.iter().find(|f| f.file == file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS_SYMBOLS: &str = r#"
output_dir = "out"

[[fixture]]
file = "access_symbols.v"
head = "1.2"
access = ["alice", "bob"]
symbols = { v1_0 = "1.1", v2_0 = "1.2" }
locks = ["alice:1.2"]
strict = true
description = "Access and Symbols"

[[fixture.revision]]
id = "1.2"
date = "2023.01.01.00.00.00"
author = "alice"
next = "1.1"
log = "Rev 2"
text = "Content 2"

[[fixture.revision]]
id = "1.1"
date = "2022.01.01.00.00.00"
author = "bob"
log = "Rev 1"
text = "Content 1"
"#;

    #[test]
    fn parses_fixture_tables() {
        let m = FixtureManifest::parse(ACCESS_SYMBOLS).unwrap();
        assert_eq!(m.output_dir, PathBuf::from("out"));
        let f = m.fixture("access_symbols.v").unwrap();
        assert_eq!(f.comment, "# ");
        assert_eq!(f.revisions.len(), 2);
        assert_eq!(f.revisions[1].state, "Exp");
    }

    #[test]
    fn empty_manifest_defaults() {
        let m = FixtureManifest::parse("").unwrap();
        assert_eq!(m.output_dir, PathBuf::from("generated"));
        assert!(m.fixtures.is_empty());
    }

    #[test]
    fn builds_graph_from_fixture() {
        let m = FixtureManifest::parse(ACCESS_SYMBOLS).unwrap();
        let g = m.fixtures[0].build().unwrap();
        let h = g.header();
        assert!(h.strict);
        assert_eq!(h.access, ["alice", "bob"]);
        assert_eq!(h.locks[0].user, "alice");
        assert_eq!(h.symbols.len(), 2);
    }

    #[test]
    fn malformed_lock_rejected() {
        let mut m = FixtureManifest::parse(ACCESS_SYMBOLS).unwrap();
        m.fixtures[0].locks = vec!["alice".to_string()];
        let err = m.fixtures[0].build().unwrap_err();
        assert!(format!("{err:#}").contains("not user:revision"));
    }

    #[test]
    fn structural_errors_name_the_fixture() {
        let mut m = FixtureManifest::parse(ACCESS_SYMBOLS).unwrap();
        m.fixtures[0].head = "1.9".to_string();
        let err = m.fixtures[0].build().unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("building access_symbols.v"), "{msg}");
        assert!(msg.contains("1.9"), "{msg}");
    }

    #[test]
    fn find_and_load_searches_upward() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), ACCESS_SYMBOLS).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let (m, found) = FixtureManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(found, dir.path());
        assert_eq!(m.fixtures.len(), 1);
    }
}
