//! # Error Handling
//!
//! This module defines the centralized error type for `mirrorsync`. It uses
//! `thiserror` to derive a single `Error` enum covering every failure mode of
//! the library, grouped into three families:
//!
//! - **Configuration errors** (`ConfigParse`, `SectionNotFound`): the repos
//!   file cannot yield a valid record set. These are fatal and abort a run
//!   before any repository is touched.
//! - **Resolve errors** (`Resolve`, `UnknownProvider`): a record's URL
//!   cannot be expanded into a clone URL. These are reported per record.
//! - **Sync errors** (`GitCommand`, `Timeout`, `GitNotFound`, `Filesystem`,
//!   `Io`): cloning or updating a mirror failed. These are reported per record.
//!
//! `Result<T>` is the alias used throughout the library.

use thiserror::Error;

/// Main error type for mirrorsync operations
#[derive(Error, Debug)]
pub enum Error {
    /// The repos file could not be parsed.
    ///
    /// `line` is the 1-based line number when the problem is tied to a line.
    #[error("Configuration error{}: {message}{}",
        line.map(|l| format!(" at line {}", l)).unwrap_or_default(),
        hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        line: Option<usize>,
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The requested section is not declared in the repos file.
    #[error("Configuration error: section={section} not found{}",
        if available.is_empty() { String::new() } else { format!(" (available: {})", available.join(", ")) })]
    SectionNotFound {
        section: String,
        available: Vec<String>,
    },

    /// A record URL could not be turned into a clone URL.
    #[error("Cannot resolve {url}: {message}")]
    Resolve { url: String, message: String },

    /// A provider name that is not registered with the resolver.
    #[error("Unknown provider '{name}' (known: {})", known.join(", "))]
    UnknownProvider { name: String, known: Vec<String> },

    /// A git command exited unsuccessfully.
    #[error("git {command} failed for {target}: {stderr}")]
    GitCommand {
        command: String,
        target: String,
        stderr: String,
    },

    /// A git command ran longer than the configured timeout and was killed.
    #[error("timeout: git {command} for {target} exceeded {seconds}s")]
    Timeout {
        command: String,
        target: String,
        seconds: u64,
    },

    /// No git executable could be found.
    #[error("git executable not found: {message}")]
    GitNotFound { message: String },

    /// A filesystem operation on a mirror path failed.
    #[error("Filesystem error at {path}: {message}")]
    Filesystem { path: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a line-tied configuration error without a hint.
    pub fn config(line: usize, message: impl Into<String>) -> Self {
        Error::ConfigParse {
            line: Some(line),
            message: message.into(),
            hint: None,
        }
    }

    /// Errors that make the whole repos file unusable.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::ConfigParse { .. } | Error::SectionNotFound { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config_parse() {
        let error = Error::config(7, "line has no '=' separator");
        let display = format!("{}", error);
        assert!(display.contains("Configuration error at line 7"));
        assert!(display.contains("no '=' separator"));
    }

    #[test]
    fn test_error_display_config_parse_with_hint() {
        let error = Error::ConfigParse {
            line: None,
            message: "record acme/widgets has no repo.path".to_string(),
            hint: Some("Add 'repo.path=/srv/git/...' after the repo.url line".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.starts_with("Configuration error: record"));
        assert!(display.contains("hint:"));
        assert!(display.contains("repo.path=/srv/git/"));
    }

    #[test]
    fn test_error_display_section_not_found() {
        let error = Error::SectionNotFound {
            section: "team mirrors".to_string(),
            available: vec!["public".to_string(), "private".to_string()],
        };
        let display = format!("{}", error);
        assert!(display.contains("section=team mirrors not found"));
        assert!(display.contains("available: public, private"));

        let error = Error::SectionNotFound {
            section: "x".to_string(),
            available: vec![],
        };
        assert!(!format!("{}", error).contains("available"));
    }

    #[test]
    fn test_error_display_timeout() {
        let error = Error::Timeout {
            command: "clone --mirror".to_string(),
            target: "git@github.com:acme/widgets.git".to_string(),
            seconds: 900,
        };
        let display = format!("{}", error);
        assert!(display.starts_with("timeout"));
        assert!(display.contains("900s"));
    }

    #[test]
    fn test_error_display_git_command() {
        let error = Error::GitCommand {
            command: "remote update --prune".to_string(),
            target: "/srv/git/acme/widgets.git".to_string(),
            stderr: "fatal: unable to access".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("git remote update --prune failed"));
        assert!(display.contains("/srv/git/acme/widgets.git"));
        assert!(display.contains("unable to access"));
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::config(1, "bad").is_config_error());

        let resolve = Error::Resolve {
            url: "widgets".to_string(),
            message: "expected <namespace>/<name>".to_string(),
        };
        assert!(!resolve.is_config_error());

        let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(!io.is_config_error());
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }
}
