//! Bundler artifact removal and `.gitignore` upkeep.

use std::path::Path;

use crate::error::Result;
use crate::utils::io;

/// Delete the bundler files that exist. Returns the removed names.
pub fn remove_bundler_files(project_root: &Path, files: &[String]) -> Result<Vec<String>> {
    let mut removed = Vec::new();

    for file in files {
        if io::remove_file(&project_root.join(file), "remove bundler file")? {
            removed.push(file.clone());
        }
    }

    Ok(removed)
}

/// Append `/<dir>` to `.gitignore` unless it already mentions `dir`.
/// Returns whether the file was changed.
pub fn ignore_public_js(project_root: &Path, dir: &str) -> Result<bool> {
    let path = project_root.join(".gitignore");

    if path.exists() && io::read_file(&path, "read")?.contains(dir) {
        return Ok(false);
    }

    io::append_file(&path, &format!("\n/{}\n", dir), "append")?;
    Ok(true)
}
