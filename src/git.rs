use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::filesystem;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Handle on a git executable with a per-command timeout.
///
/// This uses the system git command, which automatically handles:
/// - SSH keys from ~/.ssh/
/// - Git credential helpers
/// - Any authentication configured in ~/.gitconfig
///
/// Interactive credential prompts are disabled so an unauthenticated remote
/// fails instead of waiting on a terminal.
#[derive(Debug, Clone)]
pub struct Git {
    program: PathBuf,
    timeout: Duration,
}

/// Captured output of a finished git command.
#[derive(Debug)]
struct GitOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl Git {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Use `explicit` when given, otherwise the first `git` on `$PATH`.
    pub fn locate(explicit: Option<&Path>, timeout: Duration) -> Result<Self> {
        let program = match explicit {
            Some(path) => which::which(path).map_err(|e| Error::GitNotFound {
                message: format!("{}: {}", path.display(), e),
            })?,
            None => which::which("git").map_err(|e| Error::GitNotFound {
                message: format!("no git on $PATH: {}", e),
            })?,
        };
        debug!("using git at {}", program.display());
        Ok(Self::new(program, timeout))
    }

    /// Create a bare mirror of `url` at `dest`.
    ///
    /// The clone is written to a staging directory next to `dest` and moved
    /// into place only after git succeeds, so `dest` is either absent or a
    /// complete mirror. The parent of `dest` must already exist.
    pub fn clone_mirror(&self, url: &str, dest: &Path) -> Result<()> {
        let staging = filesystem::staging_path(dest);
        // leftover from an interrupted run
        filesystem::remove_dir_if_exists(&staging)?;

        let args: [&OsStr; 5] = [
            "clone".as_ref(),
            "--mirror".as_ref(),
            "--".as_ref(),
            url.as_ref(),
            staging.as_os_str(),
        ];
        let result = self
            .run(&args, "clone --mirror", url)
            .and_then(|_| {
                if filesystem::is_valid_mirror(&staging) {
                    Ok(())
                } else {
                    Err(Error::Filesystem {
                        path: staging.display().to_string(),
                        message: "git clone succeeded but left no bare repository".to_string(),
                    })
                }
            })
            .and_then(|_| filesystem::promote(&staging, dest));

        if result.is_err() {
            if let Err(cleanup) = filesystem::remove_dir_if_exists(&staging) {
                warn!("{}", cleanup);
            }
        }
        result
    }

    /// Fetch all refs of the mirror at `dest` and prune the ones gone upstream.
    pub fn remote_update(&self, dest: &Path) -> Result<()> {
        let target = dest.display().to_string();
        let args: [&OsStr; 5] = [
            "-C".as_ref(),
            dest.as_os_str(),
            "remote".as_ref(),
            "update".as_ref(),
            "--prune".as_ref(),
        ];
        self.run(&args, "remote update --prune", &target).map(|_| ())
    }

    /// Run git with `args`, failing on spawn errors, non-zero exit or timeout.
    ///
    /// On timeout or a failed status poll only the git process itself is
    /// killed. Helpers it spawned (`git-remote-https`, `ssh`) are not in its
    /// process group and may outlive it until their own connection drops.
    fn run(&self, args: &[&OsStr], label: &str, target: &str) -> Result<GitOutput> {
        debug!(
            "running {} {}",
            self.program.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut child = Command::new(&self.program)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::GitNotFound {
                        message: format!("{}: {}", self.program.display(), e),
                    }
                } else {
                    Error::GitCommand {
                        command: label.to_string(),
                        target: target.to_string(),
                        stderr: e.to_string(),
                    }
                }
            })?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e.into());
                }
            }
            if Instant::now() >= deadline {
                // Reader threads are left detached: helpers spawned by git
                // (ssh, remote-https) may still hold the pipes open.
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Timeout {
                    command: label.to_string(),
                    target: target.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let output = GitOutput {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        };

        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            debug!("git: {}", line);
        }
        let failed = !output.status.success();
        for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
            if failed {
                warn!("git: {}", line);
            } else {
                debug!("git: {}", line);
            }
        }

        if failed {
            return Err(Error::GitCommand {
                command: label.to_string(),
                target: target.to_string(),
                stderr: failure_detail(&output),
            });
        }
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Exit status plus the last stderr line, which is where git puts its `fatal:` message.
fn failure_detail(output: &GitOutput) -> String {
    let status = match output.status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    };
    match output.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
        Some(line) => format!("{} ({})", line.trim(), status),
        None => status,
    }
}
