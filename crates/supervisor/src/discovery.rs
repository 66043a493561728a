//! Locating a usable daemon executable.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::SupervisorError;
use crate::version::{UNKNOWN_VERSION, extract_version};

/// Executables probed in order when no explicit binary is configured.
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "clash-meta-alpha",
    "clash-alpha",
    "mihomo-alpha",
    "clash-meta",
    "clash",
    "mihomo",
];

/// Max time a `-v` probe may take before the candidate is skipped.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// How to invoke the daemon: a program plus arguments that precede the
/// per-operation flags (`-v`, `-d <dir>`, `-t`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonBinary {
    program: String,
    leading_args: Vec<String>,
}

impl DaemonBinary {
    /// A bare program name (looked up on `PATH`) or path.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// A program invoked with fixed leading arguments, e.g. an interpreter
    /// running a wrapper script.
    pub fn with_args<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            leading_args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The program as configured.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Short display name: the file name of the program without extension.
    pub fn name(&self) -> &str {
        Path::new(&self.program)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.program)
    }

    /// Builds a command with the leading arguments applied, output piped and
    /// the child tied to the lifetime of its handle.
    pub(crate) fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        cmd
    }
}

impl fmt::Display for DaemonBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.leading_args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A daemon binary that answered the version probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonInfo {
    pub binary: DaemonBinary,
    /// Version token from `-v`, `None` when the output did not match.
    pub version: Option<String>,
}

impl DaemonInfo {
    /// The version for display, [`UNKNOWN_VERSION`] when undetected.
    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or(UNKNOWN_VERSION)
    }
}

/// Runs `<binary> -v` and reports whether it is a working daemon.
///
/// Returns `None` if the program cannot be launched, times out, or exits
/// non-zero.
pub async fn probe(binary: &DaemonBinary) -> Option<DaemonInfo> {
    tracing::debug!(binary = %binary, "probing daemon executable");

    let output = match tokio::time::timeout(PROBE_TIMEOUT, binary.command(["-v"]).output()).await
    {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::debug!(binary = %binary, "probe failed to launch: {e}");
            return None;
        }
        Err(_) => {
            tracing::warn!(binary = %binary, "probe timed out");
            return None;
        }
    };

    if !output.status.success() {
        tracing::warn!(binary = %binary, status = %output.status, "probe exited with failure");
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = extract_version(&stdout)
        .or_else(|| extract_version(&String::from_utf8_lossy(&output.stderr)));

    match &version {
        Some(v) => tracing::info!(binary = %binary, version = %v, "daemon executable found"),
        None => tracing::warn!(
            binary = %binary,
            output = %stdout.trim(),
            "daemon executable found but version did not match"
        ),
    }

    Some(DaemonInfo {
        binary: binary.clone(),
        version,
    })
}

/// Probes `candidates` in order and returns the first working one.
pub async fn discover(candidates: &[DaemonBinary]) -> Result<DaemonInfo, SupervisorError> {
    for candidate in candidates {
        if let Some(info) = probe(candidate).await {
            return Ok(info);
        }
    }

    Err(SupervisorError::BinaryNotFound {
        candidates: candidates.iter().map(ToString::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_strips_directories_and_extension() {
        assert_eq!(DaemonBinary::new("mihomo").name(), "mihomo");
        assert_eq!(DaemonBinary::new("/usr/local/bin/clash-meta").name(), "clash-meta");
        assert_eq!(DaemonBinary::new("mihomo.exe").name(), "mihomo");
    }

    #[test]
    fn display_includes_leading_args() {
        let bin = DaemonBinary::with_args("/bin/sh", ["fake-daemon.sh"]);
        assert_eq!(bin.to_string(), "/bin/sh fake-daemon.sh");
        assert_eq!(DaemonBinary::new("clash").to_string(), "clash");
    }

    #[test]
    fn version_label_falls_back_to_unknown() {
        let info = DaemonInfo {
            binary: DaemonBinary::new("clash"),
            version: None,
        };
        assert_eq!(info.version_label(), "unknown");
    }

    #[test]
    fn default_candidates_prefer_alpha_builds() {
        assert_eq!(DEFAULT_CANDIDATES.first(), Some(&"clash-meta-alpha"));
        assert_eq!(DEFAULT_CANDIDATES.last(), Some(&"mihomo"));
    }

    #[tokio::test]
    async fn missing_binaries_are_not_found() {
        let candidates = vec![
            DaemonBinary::new("clash-tray-test-no-such-binary-1"),
            DaemonBinary::new("clash-tray-test-no-such-binary-2"),
        ];
        match discover(&candidates).await {
            Err(SupervisorError::BinaryNotFound { candidates }) => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates[0].contains("no-such-binary-1"));
            }
            other => panic!("expected BinaryNotFound, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn discover_skips_failing_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let failing = crate::process::tests::write_script(dir.path(), "failing.sh", "exit 3\n");
        let working = crate::process::tests::fake_daemon(dir.path());

        let candidates = vec![
            DaemonBinary::new("clash-tray-test-no-such-binary"),
            DaemonBinary::with_args("/bin/sh", [failing]),
            working.clone(),
        ];
        let info = discover(&candidates).await.unwrap();
        assert_eq!(info.binary, working);
        assert_eq!(info.version.as_deref(), Some("v1.18.5"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_without_version_token() {
        let dir = tempfile::tempdir().unwrap();
        let script =
            crate::process::tests::write_script(dir.path(), "plain.sh", "echo 'some daemon'\n");
        let info = probe(&DaemonBinary::with_args("/bin/sh", [script]))
            .await
            .unwrap();
        assert_eq!(info.version, None);
        assert_eq!(info.version_label(), UNKNOWN_VERSION);
    }
}
