//! `rcsfix normalize`: rewrite a file in canonical form.
//!
//! Blank-line offsets and the line ending are part of the parsed model and
//! survive; header and index spacing is rewritten.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rcs_text::RcsFile;
use tracing::info;

/// Parse `path` and return its canonical text.
pub fn normalized(path: &Path) -> Result<String> {
    let original =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file = RcsFile::parse(&original).with_context(|| format!("parsing {}", path.display()))?;
    Ok(file.to_text()?)
}

/// Print the canonical form, or overwrite the file with it.
pub fn run(path: &Path, in_place: bool) -> Result<()> {
    let text = normalized(path)?;
    if in_place {
        fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), bytes = text.len(), "normalized in place");
    } else {
        print!("{text}");
    }
    Ok(())
}
