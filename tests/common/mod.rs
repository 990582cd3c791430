//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let Some(git) = system_git() else { return };
//!     let fixture = TestFixture::new();
//!     let source = fixture.bare_source(&git, "widgets");
//!     fixture.with_repos(&format!("section=s\nrepo.url={}\nrepo.path={}\n", source, fixture.mirror("w")));
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::system_git;
    pub use super::TestFixture;
}

/// Path of the system git, or `None` when the host has none.
///
/// Tests that need real git return early when this is `None`.
pub fn system_git() -> Option<PathBuf> {
    let git = which::which("git").ok();
    if git.is_none() {
        println!("Skipping test: git is not installed");
    }
    git
}

/// A temporary directory holding a repos file, source repositories and mirrors.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write the repos file.
    pub fn with_repos(&self, content: &str) -> &Self {
        self.temp_dir
            .child("cgitrepos")
            .write_str(content)
            .expect("Failed to write repos file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn repos_path(&self) -> PathBuf {
        self.path().join("cgitrepos")
    }

    /// Absolute path for a mirror named `name` under `mirrors/`.
    pub fn mirror(&self, name: &str) -> PathBuf {
        self.path().join("mirrors").join(format!("{}.git", name))
    }

    /// Create a bare source repository with one commit, returning its file:// URL.
    pub fn bare_source(&self, git: &Path, name: &str) -> String {
        let work = self.path().join("work").join(name);
        let bare = self.path().join("sources").join(format!("{}.git", name));
        run(git, None, &["init", "--quiet"], &[&work]);
        std::fs::write(work.join("README.md"), format!("# {}\n", name))
            .expect("Failed to write README");
        run(git, Some(&work), &["add", "README.md"], &[]);
        commit(git, &work, "initial");
        run(git, None, &["clone", "--quiet", "--bare"], &[&work, &bare]);
        format!("file://{}", bare.display())
    }

    /// Add a commit to the source repository `name` and push it to its bare copy.
    #[allow(dead_code)]
    pub fn push_commit(&self, git: &Path, name: &str, message: &str) {
        let work = self.path().join("work").join(name);
        let bare = self.path().join("sources").join(format!("{}.git", name));
        std::fs::write(work.join(format!("{}.txt", message)), message)
            .expect("Failed to write file");
        run(git, Some(&work), &["add", "."], &[]);
        commit(git, &work, message);
        run(git, Some(&work), &["push", "--quiet"], &[bare.as_path(), Path::new("HEAD")]);
    }

    /// Command for the mirrorsync binary reading this fixture's repos file.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mirrorsync");
        cmd.current_dir(self.path())
            .env_remove("MIRRORSYNC_CONFIG")
            .env_remove("MIRRORSYNC_GIT")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(self.repos_path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Rev of `HEAD` in the repository at `dir`.
#[allow(dead_code)]
pub fn head_rev(git: &Path, dir: &Path) -> String {
    let output = Command::new(git)
        .arg("-C")
        .arg(dir)
        .args(["rev-parse", "HEAD"])
        .output()
        .expect("Failed to run git rev-parse");
    assert!(output.status.success(), "git rev-parse failed");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn commit(git: &Path, dir: &Path, message: &str) {
    run(
        git,
        Some(dir),
        &[
            "-c",
            "user.name=Mirror Test",
            "-c",
            "user.email=mirror@example.com",
            "commit",
            "--quiet",
            "-m",
            message,
        ],
        &[],
    );
}

fn run(git: &Path, dir: Option<&Path>, args: &[&str], paths: &[&Path]) {
    let mut cmd = Command::new(git);
    if let Some(dir) = dir {
        cmd.arg("-C").arg(dir);
    }
    let status = cmd
        .args(args)
        .args(paths)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .status()
        .expect("Failed to run git");
    assert!(status.success(), "git {:?} failed", args);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_paths() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
        assert!(fixture.mirror("w").ends_with("mirrors/w.git"));
        assert!(fixture.mirror("w").is_absolute());
    }

    #[test]
    fn test_fixture_writes_repos_file() {
        let fixture = TestFixture::new();
        fixture.with_repos("section=s\n");
        assert_eq!(
            std::fs::read_to_string(fixture.repos_path()).unwrap(),
            "section=s\n"
        );
    }
}
