//! # Collaborator Interfaces
//!
//! The syncer talks to git and to the filesystem through two traits so that
//! the clone-or-update logic can be exercised without either:
//!
//! - **`GitOperations`**: create a bare mirror from a URL, refresh an existing
//!   mirror. Any failure (non-zero exit, timeout, missing binary) is an `Err`.
//! - **`FilesystemOperations`**: existence and mirror-shape checks plus parent
//!   directory creation.
//!
//! [`Git`] implements `GitOperations` by shelling out to the system `git`;
//! [`DefaultFilesystemOperations`] implements `FilesystemOperations` on the
//! host filesystem. Tests substitute mocks for either.

use crate::error::Result;
use crate::filesystem;
use crate::git::Git;
use std::path::Path;

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Creates a bare mirror of `url` at `dest`.
    fn mirror_clone(&self, url: &str, dest: &Path) -> Result<()>;

    /// Refreshes the mirror at `dest`: fetches all refs and prunes stale ones.
    fn mirror_update(&self, dest: &Path) -> Result<()>;
}

/// Trait for the filesystem checks made before choosing clone or update.
pub trait FilesystemOperations: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Directory exists and has the layout of a bare mirror.
    fn is_valid_mirror(&self, path: &Path) -> bool;

    fn is_empty_dir(&self, path: &Path) -> bool;

    fn ensure_parent_dirs(&self, path: &Path) -> Result<()>;
}

impl GitOperations for Git {
    fn mirror_clone(&self, url: &str, dest: &Path) -> Result<()> {
        self.clone_mirror(url, dest)
    }

    fn mirror_update(&self, dest: &Path) -> Result<()> {
        self.remote_update(dest)
    }
}

/// The host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFilesystemOperations;

impl FilesystemOperations for DefaultFilesystemOperations {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_valid_mirror(&self, path: &Path) -> bool {
        filesystem::is_valid_mirror(path)
    }

    fn is_empty_dir(&self, path: &Path) -> bool {
        filesystem::is_empty_dir(path)
    }

    fn ensure_parent_dirs(&self, path: &Path) -> Result<()> {
        filesystem::ensure_parent_dirs(path)
    }
}
