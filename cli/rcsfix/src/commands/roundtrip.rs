//! `rcsfix roundtrip`: check that files survive parse and re-serialize.
//!
//! Divergences are reported, never fixed: a file that does not come back
//! byte for byte points at either non-canonical spacing the model does not
//! track or a layout rule that needs revisiting.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rcs_text::RcsFile;
use tracing::{info, warn};

/// The first line where two texts disagree.
#[derive(Debug, PartialEq, Eq)]
pub struct Divergence {
    /// 1-based line number.
    pub line: usize,
    pub original: Option<String>,
    pub rewritten: Option<String>,
}

/// Compare line by line, returning the first difference.
pub fn first_difference(original: &str, rewritten: &str) -> Option<Divergence> {
    if original == rewritten {
        return None;
    }
    let mut a = original.split('\n');
    let mut b = rewritten.split('\n');
    let mut line = 1;
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) if x == y => line += 1,
            (None, None) => return None,
            (x, y) => {
                return Some(Divergence {
                    line,
                    original: x.map(str::to_string),
                    rewritten: y.map(str::to_string),
                })
            }
        }
    }
}

/// Check one file. `Ok(None)` means it round-tripped exactly.
pub fn check_file(path: &Path) -> Result<Option<Divergence>> {
    let original =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file = RcsFile::parse(&original).with_context(|| format!("parsing {}", path.display()))?;
    let rewritten = file
        .to_text()
        .with_context(|| format!("serializing {}", path.display()))?;
    Ok(first_difference(&original, &rewritten))
}

/// Check every file, printing one status line each. Fails if any file
/// diverged or could not be read.
pub fn run(files: &[PathBuf]) -> Result<()> {
    let mut failed = 0;
    for path in files {
        match check_file(path) {
            Ok(None) => {
                info!(path = %path.display(), "round trip ok");
                println!("ok      {}", path.display());
            }
            Ok(Some(d)) => {
                failed += 1;
                warn!(path = %path.display(), line = d.line, "round trip diverged");
                println!("DIFFERS {} (line {})", path.display(), d.line);
                println!("  original:  {}", show(d.original.as_deref()));
                println!("  rewritten: {}", show(d.rewritten.as_deref()));
            }
            Err(e) => {
                failed += 1;
                println!("ERROR   {}: {e:#}", path.display());
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} files did not round-trip", files.len());
    }
    Ok(())
}

fn show(line: Option<&str>) -> String {
    match line {
        Some(l) => format!("{l:?}"),
        None => "<end of file>".to_string(),
    }
}
