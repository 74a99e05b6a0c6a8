//! `rcsfix generate`: write every fixture described by the manifest.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rcs_text::RcsFile;
use tracing::info;

use crate::manifest::FixtureManifest;

/// Generate fixtures into `output` (or the manifest's `output_dir`, relative
/// to `base_dir`). `only` restricts generation to the named files.
///
/// Every selected fixture is built before anything is written, so a bad
/// fixture leaves the output directory untouched.
pub fn run(
    manifest: &FixtureManifest,
    base_dir: &Path,
    only: &[String],
    output: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    for name in only {
        if manifest.fixture(name).is_none() {
            bail!("no fixture named {name} in manifest");
        }
    }

    let out_dir = match output {
        Some(dir) => dir.to_path_buf(),
        None => base_dir.join(&manifest.output_dir),
    };

    let mut rendered = Vec::new();
    for fixture in &manifest.fixtures {
        if !only.is_empty() && !only.contains(&fixture.file) {
            continue;
        }
        let file = RcsFile::new(fixture.build()?);
        let text = file
            .to_text()
            .with_context(|| format!("serializing {}", fixture.file))?;
        rendered.push((out_dir.join(&fixture.file), text));
    }

    fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let mut written = Vec::with_capacity(rendered.len());
    for (path, text) in rendered {
        fs::write(&path, &text).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), bytes = text.len(), "generated fixture");
        println!("Generated {}", path.display());
        written.push(path);
    }
    Ok(written)
}
