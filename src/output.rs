use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Write every `(file name, contents)` pair into `dir` as a group.
///
/// All contents are staged in temporary files inside `dir` first. Targets are
/// only replaced, by rename, once every file has been staged, so a failure
/// while writing leaves all existing outputs untouched.
pub fn write_all(dir: &Path, artifacts: &[(&str, String)]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut staged = Vec::with_capacity(artifacts.len());
    for (name, contents) in artifacts {
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        tmp.write_all(contents.as_bytes())
            .with_context(|| format!("Failed to stage {name}"))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("Failed to flush {name}"))?;
        staged.push((tmp, dir.join(name)));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (tmp, target) in staged {
        tmp.persist(&target)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace {}", target.display()))?;
        log::debug!("Wrote {}", target.display());
        written.push(target);
    }

    Ok(written)
}
