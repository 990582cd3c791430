//! # mirrorsync
//!
//! Keeps local bare git mirrors in sync with the repositories declared in a
//! cgit-style repos file. One run takes one or more section names, reads the
//! records declared in each, and for every record either clones a fresh
//! mirror (when none exists yet) or refreshes the existing one.
//!
//! ## Quick Example
//!
//! ```
//! use mirrorsync::config;
//! use mirrorsync::resolve::UrlResolver;
//!
//! let text = "section=team mirrors\n\
//!             repo.url=acme/widgets\n\
//!             repo.path=/srv/git/acme/widgets.git\n";
//!
//! let records = config::parse(text, "team mirrors").unwrap();
//! assert_eq!(records.len(), 1);
//!
//! let url = UrlResolver::new().resolve(&records[0]).unwrap();
//! assert_eq!(url, "git@github.com:acme/widgets.git");
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: parses the repos file into
//!   `RepositoryRecord`s for one section.
//! - **Resolution (`resolve`)**: expands short-form `<namespace>/<name>` urls
//!   through named providers.
//! - **Synchronization (`sync`)**: decides clone, update or skip per record and
//!   runs it, collecting one `SyncReport` per record in input order.
//! - **Collaborators (`repository`, `git`, `filesystem`)**: the git executable
//!   and the host filesystem behind traits, so the sync logic can be tested
//!   with mocks.
//!
//! Nothing is kept between runs except the mirrors themselves.

pub mod config;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod git;
pub mod output;
pub mod repository;
pub mod resolve;
pub mod suggestions;
pub mod sync;

#[cfg(test)]
mod config_proptest;

/// Process exit codes used by the `mirrorsync` binary.
pub mod exit_codes {
    /// Every record was cloned, updated or skipped.
    pub const SUCCESS: u8 = 0;
    /// At least one record failed, or the run could not start.
    pub const FAILURE: u8 = 1;
    /// Invalid command-line usage (reported by clap).
    pub const USAGE: u8 = 2;
}
