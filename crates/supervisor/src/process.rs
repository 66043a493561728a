//! Daemon process supervisor: start, poll, stop, config test.
//!
//! At most one child is owned at a time. Stopping is graceful first
//! (SIGTERM on Unix) and escalates to a forced kill after
//! [`SupervisorSettings::stop_timeout`].

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::process::Child;

use crate::SupervisorError;
use crate::discovery::{DaemonBinary, DaemonInfo, discover};
use crate::output::OutputDrain;

/// Window after spawn during which an exit counts as a failed start.
pub const DEFAULT_START_GRACE: Duration = Duration::from_secs(1);

/// Wait between the graceful terminate and the forced kill.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Supervisor configuration.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// Binaries probed in order; the first answering `-v` is used.
    pub candidates: Vec<DaemonBinary>,
    /// Directory passed to the daemon with `-d`.
    pub config_dir: PathBuf,
    pub start_grace: Duration,
    pub stop_timeout: Duration,
}

impl SupervisorSettings {
    /// Settings with default timeouts.
    pub fn new(candidates: Vec<DaemonBinary>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            candidates,
            config_dir: config_dir.into(),
            start_grace: DEFAULT_START_GRACE,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

/// Result of [`Supervisor::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { pid: u32 },
    AlreadyRunning { pid: u32 },
}

/// Result of [`Supervisor::stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Exited after the graceful terminate request.
    Terminated { status: String },
    /// Ignored the terminate request and was force-killed.
    Killed,
    AlreadyStopped,
}

/// Result of [`Supervisor::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Running { pid: u32, since: DateTime<Local> },
    Stopped,
    /// The daemon died on its own since the last poll. Reported once.
    Exited { status: String },
}

struct RunningDaemon {
    child: Child,
    pid: u32,
    since: DateTime<Local>,
    drain: OutputDrain,
}

/// Owns the daemon process handle.
pub struct Supervisor {
    settings: SupervisorSettings,
    info: Option<DaemonInfo>,
    daemon: Option<RunningDaemon>,
    /// Exit of a daemon that died on its own, until [`Supervisor::poll`]
    /// hands it out.
    exited: Option<String>,
}

impl Supervisor {
    pub fn new(settings: SupervisorSettings) -> Self {
        Self {
            settings,
            info: None,
            daemon: None,
            exited: None,
        }
    }

    pub fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    /// The binary found by the last successful [`detect`](Self::detect).
    pub fn info(&self) -> Option<&DaemonInfo> {
        self.info.as_ref()
    }

    /// Probes the candidate list and caches the result.
    ///
    /// Runs the probe again on every call so a daemon upgraded or installed
    /// while the tray is up gets picked up.
    pub async fn detect(&mut self) -> Result<&DaemonInfo, SupervisorError> {
        match discover(&self.settings.candidates).await {
            Ok(info) => Ok(self.info.insert(info)),
            Err(e) => {
                self.info = None;
                Err(e)
            }
        }
    }

    /// Returns the cached binary, probing if nothing was found yet.
    async fn binary(&mut self) -> Result<DaemonBinary, SupervisorError> {
        if let Some(info) = &self.info {
            return Ok(info.binary.clone());
        }
        Ok(self.detect().await?.binary.clone())
    }

    fn ensure_config_dir(&self) -> Result<(), SupervisorError> {
        if self.settings.config_dir.is_dir() {
            Ok(())
        } else {
            Err(SupervisorError::ConfigDirMissing(
                self.settings.config_dir.clone(),
            ))
        }
    }

    /// Starts the daemon with `-d <config_dir>`.
    ///
    /// Fails with [`SupervisorError::ExitedEarly`] if the process dies within
    /// the start grace period; the error carries the tail of its output.
    pub async fn start(&mut self) -> Result<StartOutcome, SupervisorError> {
        if let Some(pid) = self.live_pid() {
            tracing::info!(pid, "daemon already running");
            return Ok(StartOutcome::AlreadyRunning { pid });
        }

        self.ensure_config_dir()?;
        let binary = self.binary().await?;

        let mut cmd = binary.command([
            std::ffi::OsStr::new("-d"),
            self.settings.config_dir.as_os_str(),
        ]);
        tracing::info!(
            binary = %binary,
            config_dir = %self.settings.config_dir.display(),
            "starting daemon"
        );

        let mut child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
            program: binary.to_string(),
            source,
        })?;

        let mut drain = OutputDrain::new();
        if let Some(stdout) = child.stdout.take() {
            drain.attach(stdout, "stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            drain.attach(stderr, "stderr");
        }

        if let Ok(waited) = tokio::time::timeout(self.settings.start_grace, child.wait()).await {
            let status = match waited {
                Ok(status) => describe(status),
                Err(e) => format!("wait failed: {e}"),
            };
            let output = drain.finish().await;
            tracing::error!(%status, output = %output, "daemon exited during start");
            return Err(SupervisorError::ExitedEarly { status, output });
        }

        let pid = child.id().unwrap_or_default();
        tracing::info!(pid, "daemon started");

        self.daemon = Some(RunningDaemon {
            child,
            pid,
            since: Local::now(),
            drain,
        });

        Ok(StartOutcome::Started { pid })
    }

    /// Stops the daemon: terminate, wait up to the stop timeout, then kill.
    pub async fn stop(&mut self) -> Result<StopOutcome, SupervisorError> {
        self.reap();
        let Some(mut daemon) = self.daemon.take() else {
            return Ok(StopOutcome::AlreadyStopped);
        };

        tracing::info!(pid = daemon.pid, "terminating daemon");
        if let Err(e) = terminate(&mut daemon.child) {
            // Keep the handle so a later stop can retry.
            self.daemon = Some(daemon);
            return Err(e);
        }

        let outcome = match tokio::time::timeout(self.settings.stop_timeout, daemon.child.wait())
            .await
        {
            Ok(Ok(status)) => StopOutcome::Terminated {
                status: describe(status),
            },
            Ok(Err(e)) => return Err(SupervisorError::Io(e)),
            Err(_) => {
                tracing::warn!(
                    pid = daemon.pid,
                    timeout_ms = self.settings.stop_timeout.as_millis() as u64,
                    "daemon ignored terminate, killing"
                );
                if let Err(e) = daemon.child.kill().await {
                    self.daemon = Some(daemon);
                    return Err(SupervisorError::Terminate(e.to_string()));
                }
                StopOutcome::Killed
            }
        };

        daemon.drain.finish().await;
        tracing::info!(?outcome, "daemon stopped");
        Ok(outcome)
    }

    /// Non-blocking liveness check.
    ///
    /// A daemon that died on its own is reported as [`PollState::Exited`]
    /// exactly once, even if [`start`](Self::start), [`stop`](Self::stop) or
    /// [`is_running`](Self::is_running) noticed the exit first.
    pub fn poll(&mut self) -> PollState {
        self.reap();
        if let Some(status) = self.exited.take() {
            return PollState::Exited { status };
        }
        match &self.daemon {
            Some(daemon) => PollState::Running {
                pid: daemon.pid,
                since: daemon.since,
            },
            None => PollState::Stopped,
        }
    }

    /// `true` while a live child is owned.
    pub fn is_running(&mut self) -> bool {
        self.live_pid().is_some()
    }

    /// Pid of the live child, if any.
    pub fn pid(&mut self) -> Option<u32> {
        self.live_pid()
    }

    fn live_pid(&mut self) -> Option<u32> {
        self.reap();
        self.daemon.as_ref().map(|daemon| daemon.pid)
    }

    /// Drops the handle of a child that has exited, keeping its status for
    /// the next [`poll`](Self::poll).
    fn reap(&mut self) {
        let Some(daemon) = self.daemon.as_mut() else {
            return;
        };
        let exit = match daemon.child.try_wait() {
            Ok(None) => return,
            Ok(Some(status)) => describe(status),
            Err(e) => {
                tracing::warn!(pid = daemon.pid, "failed to query daemon status: {e}");
                return;
            }
        };
        tracing::warn!(pid = daemon.pid, status = %exit, "daemon exited unexpectedly");
        self.daemon = None;
        self.exited = Some(exit);
    }

    /// Validates the config directory with `<binary> -t -d <config_dir>`.
    ///
    /// Returns the daemon's report on success.
    pub async fn test_config(&mut self) -> Result<String, SupervisorError> {
        self.ensure_config_dir()?;
        let binary = self.binary().await?;

        tracing::info!(binary = %binary, "testing daemon config");
        let output = binary
            .command([
                std::ffi::OsStr::new("-t"),
                std::ffi::OsStr::new("-d"),
                self.settings.config_dir.as_os_str(),
            ])
            .output()
            .await
            .map_err(|source| SupervisorError::Spawn {
                program: binary.to_string(),
                source,
            })?;

        let mut report = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !report.is_empty() {
                report.push('\n');
            }
            report.push_str(stderr.trim());
        }

        if output.status.success() {
            tracing::info!(report = %report, "daemon config test passed");
            Ok(report)
        } else {
            tracing::error!(status = %output.status, report = %report, "daemon config test failed");
            Err(SupervisorError::ConfigInvalid(report))
        }
    }
}

/// Sends the graceful termination request.
#[cfg(unix)]
fn terminate(child: &mut Child) -> Result<(), SupervisorError> {
    let Some(pid) = child.id() else {
        // Already reaped.
        return Ok(());
    };
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return Err(SupervisorError::Terminate(format!("pid {pid} out of range")));
    };

    // SAFETY: plain signal delivery to a pid we spawned and have not reaped.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(());
        }
        Err(SupervisorError::Terminate(err.to_string()))
    }
}

/// Windows has no graceful signal for a console-less child; terminate
/// directly. The stop timeout still bounds the wait for the exit.
#[cfg(not(unix))]
fn terminate(child: &mut Child) -> Result<(), SupervisorError> {
    child
        .start_kill()
        .map_err(|e| SupervisorError::Terminate(e.to_string()))
}

/// Exit status as shown to the user; Unix signals are spelled out.
fn describe(status: ExitStatus) -> String {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("killed by signal {signal}");
        }
    }
    status.to_string()
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Some(daemon) = self.daemon.as_mut() {
            tracing::info!(pid = daemon.pid, "supervisor dropped, killing daemon");
            let _ = daemon.child.start_kill();
        }
    }
}
