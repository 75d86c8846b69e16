//! Filesystem locations and directory helpers.

use dirs::home_dir;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{BuildListError, Result};

/// Mode for every directory this crate creates.
pub const DIR_MODE: u32 = 0o711;

/// Default home for keys and configuration: `~/.buildlist`.
pub fn default_home() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".buildlist"))
}

/// Default signing key: `~/.buildlist/keys/skPriv.pem`.
pub fn default_key_path() -> Option<PathBuf> {
    default_home().map(|h| h.join("keys").join("skPriv.pem"))
}

/// Create `path` and any missing ancestors with mode `0711`.
///
/// # Errors
///
/// Returns any I/O error other than the directory already existing.
pub fn create_dir_0711(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(path)
}

/// Create the directories above a file path, if it has any.
///
/// # Errors
///
/// See [`create_dir_0711`].
pub fn create_parent_dirs(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => create_dir_0711(parent),
        _ => Ok(()),
    }
}

/// Whether `path` contains a `.` or `..` segment anywhere.
pub fn has_dot_segments(path: &Path) -> bool {
    // components() drops interior `.`, so split the raw text
    path.to_string_lossy()
        .split(std::path::is_separator)
        .any(|seg| seg == "." || seg == "..")
}

/// Remove everything inside `path`, leaving the directory itself.
///
/// Refuses absolute paths and paths that climb with `..`.
///
/// # Errors
///
/// Returns [`BuildListError::DotSegment`] for refused paths, otherwise any
/// I/O error from the removal.
pub fn clear_dir_contents(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty()
        || path.is_absolute()
        || path.components().any(|c| c == Component::ParentDir)
    {
        return Err(BuildListError::DotSegment(path.to_path_buf()));
    }
    remove_entries(path)
}

fn remove_entries(path: &Path) -> Result<()> {
    for entry in fs::read_dir(path).map_err(|e| BuildListError::from_io_at(e, path))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}
