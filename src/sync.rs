//! # Mirror Synchronization
//!
//! `MirrorSyncer` takes the records of one section and brings each mirror up
//! to date:
//!
//! 1.  Resolve the record's clone URL. A resolve failure is that record's
//!     outcome; the batch carries on.
//! 2.  If `record.path` holds a valid bare mirror, refresh it (`Updated`).
//! 3.  If it is absent (or an empty directory), clone a mirror into it
//!     (`Cloned`).
//! 4.  Anything else at the path is left alone (`Skipped`).
//!
//! Records are independent: each touches only its own path, so a batch can be
//! spread over a bounded rayon pool. Reports always come back in input order,
//! one per record, whatever order the work finished in.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::config::RepositoryRecord;
use crate::defaults::DEFAULT_JOBS;
use crate::git::Git;
use crate::repository::{DefaultFilesystemOperations, FilesystemOperations, GitOperations};
use crate::resolve::UrlResolver;

/// Result of syncing one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned,
    Updated,
    Failed(String),
    Skipped(String),
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncOutcome::Cloned => "cloned",
            SyncOutcome::Updated => "updated",
            SyncOutcome::Failed(_) => "failed",
            SyncOutcome::Skipped(_) => "skipped",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            SyncOutcome::Failed(reason) | SyncOutcome::Skipped(reason) => Some(reason),
            SyncOutcome::Cloned | SyncOutcome::Updated => None,
        }
    }
}

/// What a sync of one record would do, decided before any git command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPlan {
    Clone { url: String },
    Update { url: String },
    Skip { url: String, reason: String },
    Unresolvable { reason: String },
}

impl SyncPlan {
    pub fn label(&self) -> &'static str {
        match self {
            SyncPlan::Clone { .. } => "clone",
            SyncPlan::Update { .. } => "update",
            SyncPlan::Skip { .. } => "skip",
            SyncPlan::Unresolvable { .. } => "unresolvable",
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            SyncPlan::Clone { url } | SyncPlan::Update { url } | SyncPlan::Skip { url, .. } => {
                Some(url)
            }
            SyncPlan::Unresolvable { .. } => None,
        }
    }
}

/// Per-record report: the record identity, what it resolved to and how it went.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub url: String,
    pub path: PathBuf,
    pub resolved_url: Option<String>,
    pub outcome: SyncOutcome,
    pub elapsed: Duration,
}

/// Decides what a sync would do, using only the resolver and filesystem checks.
pub struct Planner {
    fs_ops: Box<dyn FilesystemOperations>,
    resolver: UrlResolver,
}

impl Planner {
    /// A planner inspecting the host filesystem.
    pub fn new(resolver: UrlResolver) -> Self {
        Self::with_filesystem(Box::new(DefaultFilesystemOperations), resolver)
    }

    pub fn with_filesystem(fs_ops: Box<dyn FilesystemOperations>, resolver: UrlResolver) -> Self {
        Self { fs_ops, resolver }
    }

    /// Decide between clone, update and skip for `record` without side effects.
    pub fn plan(&self, record: &RepositoryRecord) -> SyncPlan {
        let url = match self.resolver.resolve(record) {
            Ok(url) => url,
            Err(e) => {
                return SyncPlan::Unresolvable {
                    reason: e.to_string(),
                }
            }
        };

        let path = &record.path;
        if self.fs_ops.is_valid_mirror(path) {
            SyncPlan::Update { url }
        } else if !self.fs_ops.exists(path) || self.fs_ops.is_empty_dir(path) {
            SyncPlan::Clone { url }
        } else {
            SyncPlan::Skip {
                url,
                reason: format!("{} exists but is not a bare mirror", path.display()),
            }
        }
    }

    /// Plan every record, in input order.
    pub fn plan_all(&self, records: &[RepositoryRecord]) -> Vec<SyncPlan> {
        records.iter().map(|r| self.plan(r)).collect()
    }
}

/// Clone-or-update driver for a batch of records.
pub struct MirrorSyncer {
    git_ops: Box<dyn GitOperations>,
    planner: Planner,
    jobs: usize,
}

impl MirrorSyncer {
    /// A syncer using the given git handle and the host filesystem.
    pub fn new(git: Git, resolver: UrlResolver) -> Self {
        Self::with_operations(
            Box::new(git),
            Box::new(DefaultFilesystemOperations),
            resolver,
        )
    }

    /// A syncer with custom collaborators.
    pub fn with_operations(
        git_ops: Box<dyn GitOperations>,
        fs_ops: Box<dyn FilesystemOperations>,
        resolver: UrlResolver,
    ) -> Self {
        Self {
            git_ops,
            planner: Planner::with_filesystem(fs_ops, resolver),
            jobs: DEFAULT_JOBS,
        }
    }

    /// Maximum number of records synced at once.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Sync one record. Never fails: errors become a `Failed` outcome.
    pub fn sync_one(&self, record: &RepositoryRecord) -> SyncReport {
        let started = Instant::now();
        let plan = self.planner.plan(record);
        let resolved_url = plan.url().map(str::to_string);

        let outcome = match plan {
            SyncPlan::Unresolvable { reason } => {
                error!("Cannot sync {}: {}", record.url, reason);
                SyncOutcome::Failed(reason)
            }
            SyncPlan::Skip { reason, .. } => {
                warn!("Skipping {}: {}", record.url, reason);
                SyncOutcome::Skipped(reason)
            }
            SyncPlan::Clone { url } => {
                info!("Cloning: {} ...", record.url);
                debug!("Source target: {}", url);
                let result = self
                    .planner
                    .fs_ops
                    .ensure_parent_dirs(&record.path)
                    .and_then(|_| self.git_ops.mirror_clone(&url, &record.path));
                match result {
                    Ok(()) => SyncOutcome::Cloned,
                    Err(e) => {
                        error!("Error cloning {}: {}", record.url, e);
                        SyncOutcome::Failed(e.to_string())
                    }
                }
            }
            SyncPlan::Update { .. } => {
                info!("Updating: {} ...", record.url);
                match self.git_ops.mirror_update(&record.path) {
                    Ok(()) => SyncOutcome::Updated,
                    Err(e) => {
                        error!("Error updating {}: {}", record.url, e);
                        SyncOutcome::Failed(e.to_string())
                    }
                }
            }
        };

        SyncReport {
            url: record.url.clone(),
            path: record.path.clone(),
            resolved_url,
            outcome,
            elapsed: started.elapsed(),
        }
    }

    /// Sync every record; one report per record, in input order.
    pub fn sync(&self, records: &[RepositoryRecord]) -> Vec<SyncReport> {
        let threads = self.jobs.min(records.len());
        if threads <= 1 {
            return records.iter().map(|r| self.sync_one(r)).collect();
        }

        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| records.par_iter().map(|r| self.sync_one(r)).collect()),
            Err(e) => {
                warn!("Cannot start {} sync workers ({}), syncing sequentially", threads, e);
                records.iter().map(|r| self.sync_one(r)).collect()
            }
        }
    }
}
