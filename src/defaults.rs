//! Default values for mirrorsync configuration.
//!
//! This module provides centralized default values used by the library and
//! the command line, ensuring consistency and avoiding duplication.

/// Where cgit installations keep their repos file.
///
/// Overridden by `-c/--config` or the `MIRRORSYNC_CONFIG` environment variable.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cgitrepos";

/// Provider used for short-form urls unless `--provider` or `--template` says otherwise.
pub const DEFAULT_PROVIDER: &str = "github";

/// Records of one section synced at the same time.
pub const DEFAULT_JOBS: usize = 4;

/// Upper bound for a single git clone or update, in humantime syntax for `--timeout`.
pub const DEFAULT_GIT_TIMEOUT_ARG: &str = "15m";
