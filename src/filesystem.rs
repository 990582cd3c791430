//! # Mirror Filesystem Helpers
//!
//! Host filesystem checks used around git invocations.
//!
//! A directory counts as a bare mirror when it has the layout `git clone
//! --mirror` leaves behind: a `HEAD` file, `objects/` and `refs/`
//! directories, and a `config` file that declares `bare = true`. Clones are
//! written into a sibling staging directory (see [`staging_path`]) and only
//! renamed onto the mirror path once complete, so the mirror path never holds
//! a half-written clone.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

const STAGING_SUFFIX: &str = ".mirrorsync-partial";

/// Whether `path` looks like a complete bare repository.
pub fn is_valid_mirror(path: &Path) -> bool {
    path.is_dir()
        && path.join("HEAD").is_file()
        && path.join("objects").is_dir()
        && path.join("refs").is_dir()
        && declares_bare(&path.join("config"))
}

fn declares_bare(config: &Path) -> bool {
    let Ok(text) = fs::read_to_string(config) else {
        return false;
    };
    text.lines().any(|line| {
        line.split_once('=')
            .map(|(k, v)| {
                k.trim().eq_ignore_ascii_case("bare") && v.trim().eq_ignore_ascii_case("true")
            })
            .unwrap_or(false)
    })
}

/// Whether `path` is a directory with no entries.
pub fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// Create every missing parent directory of `path`.
pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
            path: parent.display().to_string(),
            message: format!("cannot create parent directory: {}", e),
        })?;
    }
    Ok(())
}

/// Sibling directory a clone of `path` is written to before it is moved into place.
///
/// `/srv/git/widgets.git` stages in `/srv/git/.widgets.git.mirrorsync-partial`.
pub fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mirror".to_string());
    let staged = format!(".{}{}", name, STAGING_SUFFIX);
    match path.parent() {
        Some(parent) => parent.join(staged),
        None => PathBuf::from(staged),
    }
}

/// Remove a directory tree, treating a missing directory as success.
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Filesystem {
            path: path.display().to_string(),
            message: format!("cannot remove directory: {}", e),
        }),
    }
}

/// Move a finished staging directory onto the mirror path.
///
/// An empty directory already sitting at `dest` is replaced.
pub fn promote(staging: &Path, dest: &Path) -> Result<()> {
    if dest.is_dir() && is_empty_dir(dest) {
        fs::remove_dir(dest).map_err(|e| Error::Filesystem {
            path: dest.display().to_string(),
            message: format!("cannot replace empty directory: {}", e),
        })?;
    }
    fs::rename(staging, dest).map_err(|e| Error::Filesystem {
        path: dest.display().to_string(),
        message: format!("cannot move {} into place: {}", staging.display(), e),
    })
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs;
    use std::path::Path;

    /// Lay out the minimum a bare mirror needs to pass [`super::is_valid_mirror`].
    pub fn fake_mirror(path: &Path) {
        fs::create_dir_all(path.join("objects")).unwrap();
        fs::create_dir_all(path.join("refs")).unwrap();
        fs::write(path.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(
            path.join("config"),
            "[core]\n\trepositoryformatversion = 0\n\tbare = true\n",
        )
        .unwrap();
    }
}
