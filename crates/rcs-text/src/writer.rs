//! Canonical text serialization.
//!
//! Output is fully determined by the graph: header fields in fixed order,
//! symbols sorted by name, index and content entries in the graph's node
//! order. Layout the graph can influence is limited to the per-revision
//! `layout_offset` and the header's [`FileLayout`]: line ending, blank
//! lines before `desc` and newlines at end of file.

use std::fmt::Write;

use rcs_core::graph::header::{AdminHeader, FileLayout};
use rcs_core::graph::node::RevisionNode;
use rcs_core::quote::write_quoted;
use rcs_core::RevisionGraph;
use tracing::{debug, trace};

use crate::Error;

/// Newlines between the closing `@` of one quoted block and the next
/// content entry's id.
pub(crate) const CONTENT_GAP: usize = 3;

/// Newlines between the end of the last index entry and `desc`.
pub(crate) const DESC_GAP: usize = 3;

/// Render `graph` as RCS text.
///
/// The graph is re-validated first, so nothing is produced for a graph that
/// violates an invariant.
pub fn to_text(graph: &RevisionGraph) -> Result<String, Error> {
    graph.validate()?;

    let header = graph.header();
    let FileLayout {
        line_ending,
        desc_offset,
        eof_newlines,
    } = header.layout;
    let nl = line_ending.as_str();

    let mut out = String::new();
    write_header(&mut out, header, nl)?;
    push_newlines(&mut out, nl, 2);

    for node in graph.revisions() {
        write_index_entry(&mut out, node, nl)?;
    }
    // Each index entry already ends with its line break and a blank line.
    push_newlines(&mut out, nl, DESC_GAP - 2 + desc_offset);

    out.push_str("desc");
    out.push_str(nl);
    write_quoted(&mut out, &header.description)?;

    for (i, node) in graph.revisions().iter().enumerate() {
        // The gap before the first entry is fixed by the description.
        let offset = if i == 0 { 0 } else { node.layout_offset };
        push_newlines(&mut out, nl, CONTENT_GAP + offset);
        write_content_entry(&mut out, node, nl)?;
    }
    push_newlines(&mut out, nl, eof_newlines);

    debug!(revisions = graph.len(), bytes = out.len(), "serialized revision graph");
    Ok(out)
}

fn push_newlines(out: &mut String, nl: &str, count: usize) {
    for _ in 0..count {
        out.push_str(nl);
    }
}

fn write_header(out: &mut String, header: &AdminHeader, nl: &str) -> Result<(), Error> {
    write!(out, "head\t{};{nl}", header.head)?;
    if let Some(branch) = &header.default_branch {
        write!(out, "branch\t{branch};{nl}")?;
    }

    out.push_str("access");
    for user in &header.access {
        out.push(' ');
        out.push_str(user);
    }
    write!(out, ";{nl}")?;

    out.push_str("symbols");
    let symbols = header.sorted_symbols();
    if !symbols.is_empty() {
        write!(out, "{nl}\t")?;
        for (i, sym) in symbols.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            write!(out, "{}:{}", sym.name, sym.revision)?;
        }
    }
    write!(out, ";{nl}")?;

    out.push_str("locks");
    for lock in &header.locks {
        write!(out, "{nl}\t{}:{}", lock.user, lock.revision)?;
    }
    write!(out, ";{nl}")?;

    if header.strict {
        write!(out, "strict;{nl}")?;
    }
    if let Some(integrity) = &header.integrity {
        out.push_str("integrity\t");
        write_quoted(out, integrity)?;
        write!(out, ";{nl}")?;
    }
    out.push_str("comment\t");
    write_quoted(out, &header.comment)?;
    write!(out, ";{nl}")?;
    if let Some(expand) = &header.expand {
        out.push_str("expand\t");
        write_quoted(out, expand)?;
        write!(out, ";{nl}")?;
    }
    Ok(())
}

fn write_index_entry(out: &mut String, node: &RevisionNode, nl: &str) -> Result<(), Error> {
    write!(out, "{}{nl}", node.id)?;
    write!(
        out,
        "date\t{};\tauthor {};\tstate {};{nl}",
        node.date, node.author, node.state
    )?;
    out.push_str("branches");
    for branch in &node.branches {
        write!(out, "{nl}\t{branch}")?;
    }
    write!(out, ";{nl}")?;
    match &node.next {
        Some(next) => write!(out, "next\t{next};{nl}")?,
        None => write!(out, "next\t;{nl}")?,
    }
    if let Some(commit_id) = &node.commit_id {
        write!(out, "commitid\t{commit_id};{nl}")?;
    }
    out.push_str(nl);
    Ok(())
}

/// Writes from the id line through the closing `@` of `text`.
fn write_content_entry(out: &mut String, node: &RevisionNode, nl: &str) -> Result<(), Error> {
    trace!(revision = %node.id, offset = node.layout_offset, "writing content entry");
    write!(out, "{}{nl}log{nl}", node.id)?;
    write_quoted(out, &node.log)?;
    write!(out, "{nl}text{nl}")?;
    write_quoted(out, &node.text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcs_core::{GraphBuilder, RevisionSpec};

    fn single_revision() -> RevisionGraph {
        let mut b = GraphBuilder::new("1.1");
        b.description("Simple file").revision(
            RevisionSpec::new("1.1", "2022.01.01.00.00.00", "user")
                .log("Initial revision")
                .text("Line 1\n"),
        );
        b.build().unwrap()
    }

    #[test]
    fn single_revision_layout() {
        let text = to_text(&single_revision()).unwrap();
        let expected = "head\t1.1;\n\
access;\n\
symbols;\n\
locks;\n\
comment\t@# @;\n\
\n\
\n\
1.1\n\
date\t2022.01.01.00.00.00;\tauthor user;\tstate Exp;\n\
branches;\n\
next\t;\n\
\n\
\n\
desc\n\
@Simple file@\n\
\n\
\n\
1.1\n\
log\n\
@Initial revision@\n\
text\n\
@Line 1\n\
@\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn content_section_has_one_entry_without_extra_gap() {
        let text = to_text(&single_revision()).unwrap();
        let (_, content) = text.split_once("desc\n@Simple file@\n").unwrap();
        assert!(content.starts_with("\n\n1.1\n"));
        assert_eq!(content.matches("\nlog\n").count(), 1);
        assert_eq!(content.matches("\ntext\n").count(), 1);
    }

    #[test]
    fn delimiters_doubled_in_log() {
        let mut b = GraphBuilder::new("1.1");
        b.description("Quoted @ Strings @").revision(
            RevisionSpec::new("1.1", "2022.01.01.00.00.00", "user")
                .log("This log has an @ sign.")
                .text("void main() {\n\tprintf(\"Hello @ World\");\n}\n"),
        );
        let text = to_text(&b.build().unwrap()).unwrap();
        assert!(text.contains("log\n@This log has an @@ sign.@\n"));
        assert!(text.contains("desc\n@Quoted @@ Strings @@@\n"));
        assert!(text.contains("printf(\"Hello @@ World\");"));
    }

    #[test]
    fn header_optional_fields() {
        let mut b = GraphBuilder::new("1.2");
        b.default_branch("1.2.1")
            .access("alice")
            .access("bob")
            .strict(true)
            .integrity("some@checksum")
            .expand("kv")
            .revision(RevisionSpec::new("1.2", "2023.01.01.00.00.00", "alice").next("1.1"))
            .revision(RevisionSpec::new("1.1", "2022.01.01.00.00.00", "bob"));
        b.lock("alice", "1.2").unwrap();
        b.lock("bob", "1.1").unwrap();
        let text = to_text(&b.build().unwrap()).unwrap();
        let header = "head\t1.2;\n\
branch\t1.2.1;\n\
access alice bob;\n\
symbols;\n\
locks\n\talice:1.2\n\tbob:1.1;\n\
strict;\n\
integrity\t@some@@checksum@;\n\
comment\t@# @;\n\
expand\t@kv@;\n\n\n1.2\n";
        assert!(text.starts_with(header), "{text}");
    }

    #[test]
    fn symbols_sorted_regardless_of_insertion_order() {
        let build = |pairs: &[(&str, &str)]| {
            let mut b = GraphBuilder::new("1.2");
            b.revision(
                RevisionSpec::new("1.2", "2023.01.01.00.00.00", "user")
                    .next("1.1")
                    .branch("1.2.1.1"),
            )
            .revision(RevisionSpec::new("1.1", "2022.01.01.00.00.00", "user"))
            .revision(RevisionSpec::new("1.2.1.1", "2023.02.01.00.00.00", "user"));
            for (name, rev) in pairs {
                b.symbol(name, rev).unwrap();
            }
            to_text(&b.build().unwrap()).unwrap()
        };
        let a = build(&[("beta", "1.2.1.1"), ("v1_0", "1.1")]);
        let b = build(&[("v1_0", "1.1"), ("beta", "1.2.1.1")]);
        assert_eq!(a, b);
        assert!(a.contains("symbols\n\tbeta:1.2.1.1 v1_0:1.1;\n"));
    }

    #[test]
    fn branch_entries_follow_fork_point() {
        let mut b = GraphBuilder::new("1.2");
        b.revision(RevisionSpec::new("1.1", "2022.01.01.00.00.00", "user").log("Initial revision"))
            .revision(
                RevisionSpec::new("1.2", "2023.01.01.00.00.00", "user")
                    .next("1.1")
                    .branch("1.2.1.1")
                    .log("Second revision"),
            )
            .revision(
                RevisionSpec::new("1.2.1.1", "2023.02.01.00.00.00", "user").log("Branch revision"),
            );
        let text = to_text(&b.build().unwrap()).unwrap();

        assert!(text.contains("branches\n\t1.2.1.1;\nnext\t1.1;\n"));
        let ids: Vec<&str> = text.lines().filter(|l| l.starts_with("1.")).collect();
        assert_eq!(ids, ["1.2", "1.2.1.1", "1.1", "1.2", "1.2.1.1", "1.1"]);
    }

    #[test]
    fn serialization_is_idempotent() {
        let g = single_revision();
        assert_eq!(to_text(&g).unwrap(), to_text(&g).unwrap());
    }

    #[test]
    fn layout_offset_adds_blank_lines_except_first() {
        let (header, mut nodes) = {
            let mut b = GraphBuilder::new("1.2");
            b.revision(RevisionSpec::new("1.2", "2023.01.01.00.00.00", "user").next("1.1"))
                .revision(RevisionSpec::new("1.1", "2022.01.01.00.00.00", "user"));
            b.build().unwrap().into_parts()
        };
        nodes[0].layout_offset = 4;
        nodes[1].layout_offset = 2;
        let g = RevisionGraph::new(header, nodes).unwrap();
        let text = to_text(&g).unwrap();
        assert!(text.contains("desc\n@@\n\n\n1.2\nlog\n"));
        assert!(text.contains("text\n@@\n\n\n\n\n1.1\nlog\n"));
    }

    #[test]
    fn commit_id_written_after_next() {
        let mut b = GraphBuilder::new("1.1");
        b.revision(RevisionSpec::new("1.1", "2022.01.01.00.00.00", "user").commit_id("100abc"));
        let text = to_text(&b.build().unwrap()).unwrap();
        assert!(text.contains("next\t;\ncommitid\t100abc;\n\n"));
    }
}
