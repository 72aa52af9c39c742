use anyhow::{bail, Context};
use std::fs::File;
use std::path::Path;

/// Input file must exist, be a regular file and open for reading
pub fn readable_file(path: &Path, label: &str) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", label, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", label, path.display());
    }
    File::open(path)
        .map(|_| ())
        .with_context(|| format!("Failed to open {} file '{}'", label, path.display()))
}

/// Like [`readable_file`], also requiring the given extension
pub fn readable_file_with_extension(path: &Path, extension: &str, label: &str) -> anyhow::Result<()> {
    readable_file(path, label)?;
    let found = path
        .extension()
        .and_then(|ext| ext.to_str())
        .with_context(|| format!("{} file has no extension: {}", label, path.display()))?;
    if !found.eq_ignore_ascii_case(extension) {
        bail!("{} file must have .{} extension: {}", label, extension, path.display());
    }
    Ok(())
}

/// Output directory must exist and accept new files
pub fn writable_dir(path: &Path) -> anyhow::Result<()> {
    if !path.is_dir() {
        bail!("output directory does not exist: {}", path.display());
    }
    tempfile::tempfile_in(path)
        .map(|_| ())
        .with_context(|| format!("output directory is not writable: {}", path.display()))
}
