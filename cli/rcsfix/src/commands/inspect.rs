//! `rcsfix inspect`: show a file's header and revisions.

use std::fmt::Write;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rcs_core::RevisionGraph;
use rcs_text::RcsFile;

/// Human-readable summary: header fields, then one line per revision in
/// write order, indented by branch depth.
pub fn summary(graph: &RevisionGraph) -> Result<String> {
    let h = graph.header();
    let mut out = String::new();
    writeln!(out, "head:    {}", h.head)?;
    if let Some(branch) = &h.default_branch {
        writeln!(out, "branch:  {branch}")?;
    }
    writeln!(out, "access:  {}", h.access.join(" "))?;
    let symbols: Vec<String> = h
        .sorted_symbols()
        .iter()
        .map(|s| format!("{}:{}", s.name, s.revision))
        .collect();
    writeln!(out, "symbols: {}", symbols.join(" "))?;
    let locks: Vec<String> = h
        .locks
        .iter()
        .map(|l| format!("{}:{}", l.user, l.revision))
        .collect();
    writeln!(out, "locks:   {}{}", locks.join(" "), if h.strict { " (strict)" } else { "" })?;
    writeln!(out, "comment: {:?}", h.comment)?;
    if let Some(expand) = &h.expand {
        writeln!(out, "expand:  {expand}")?;
    }
    writeln!(out, "revisions: {}", graph.len())?;

    for node in graph.revisions() {
        let depth = (node.id.arity() - 2) / 2;
        write!(
            out,
            "{:indent$}{}  {}  {}  {}",
            "",
            node.id,
            node.date,
            node.author,
            node.state,
            indent = depth * 2
        )?;
        if let Some(next) = &node.next {
            write!(out, "  next={next}")?;
        }
        if !node.branches.is_empty() {
            let branches: Vec<&str> = node.branches.iter().map(|b| b.as_str()).collect();
            write!(out, "  branches={}", branches.join(","))?;
        }
        if node.layout_offset > 0 {
            write!(out, "  +{} blank", node.layout_offset)?;
        }
        writeln!(out)?;
    }
    Ok(out)
}

/// Inspect `path`; `export` selects `text` (default) or `json`.
pub fn run(path: &Path, export: Option<&str>) -> Result<()> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file = RcsFile::from_bytes(data).with_context(|| format!("parsing {}", path.display()))?;

    match export.unwrap_or("text") {
        "text" => print!("{}", summary(&file.graph)?),
        "json" => println!("{}", serde_json::to_string_pretty(&file.graph)?),
        other => bail!("unknown export format {other:?} (expected text or json)"),
    }
    Ok(())
}
