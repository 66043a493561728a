//! Lifecycle supervision for the clash/mihomo proxy daemon.
//!
//! The daemon is an opaque external program. This crate finds a usable
//! binary on the system, reads its version, and owns at most one running
//! instance at a time:
//!
//! - [`discover`] / [`probe`]: run `<binary> -v` over a candidate list
//! - [`extract_version`]: pull `vX.Y.Z` or `alpha-<hash>` out of that output
//! - [`Supervisor`]: start, poll, stop (terminate, then kill on timeout)
//!   and config test (`-t`)

mod discovery;
mod output;
mod process;
mod version;

use std::path::PathBuf;

pub use discovery::{DEFAULT_CANDIDATES, DaemonBinary, DaemonInfo, PROBE_TIMEOUT, discover, probe};
pub use process::{
    DEFAULT_START_GRACE, DEFAULT_STOP_TIMEOUT, PollState, StartOutcome, StopOutcome, Supervisor,
    SupervisorSettings,
};
pub use version::{UNKNOWN_VERSION, extract_version};

/// Errors for daemon supervision.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("no daemon executable found (tried: {})", .candidates.join(", "))]
    BinaryNotFound { candidates: Vec<String> },

    #[error("config directory does not exist: {}", .0.display())]
    ConfigDirMissing(PathBuf),

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("daemon exited right after start ({status}): {output}")]
    ExitedEarly { status: String, output: String },

    #[error("config test failed: {0}")]
    ConfigInvalid(String),

    #[error("failed to terminate daemon: {0}")]
    Terminate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
