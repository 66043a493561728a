//! Tray actions: turns menu clicks into supervisor calls and toasts.
//!
//! Every failure ends up as a toast; nothing here is fatal to the tray.

use std::path::PathBuf;

use clash_tray_menu::{MenuAction, Notifier, Toast, ToastKind, TrayStatus};
use clash_tray_supervisor::{PollState, StartOutcome, StopOutcome, Supervisor, SupervisorError};

use crate::desktop::Launcher;

/// Whether the event loop keeps going after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Controller<N, L> {
    supervisor: Supervisor,
    notifier: N,
    launcher: L,
    dashboard_url: String,
}

impl<N: Notifier, L: Launcher> Controller<N, L> {
    pub fn new(supervisor: Supervisor, notifier: N, launcher: L, dashboard_url: String) -> Self {
        Self {
            supervisor,
            notifier,
            launcher,
            dashboard_url,
        }
    }

    #[cfg(test)]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    #[cfg(test)]
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    fn config_dir(&self) -> PathBuf {
        self.supervisor.settings().config_dir.clone()
    }

    /// Name used in toasts: the detected executable, or a generic label.
    fn daemon_name(&self) -> String {
        self.supervisor
            .info()
            .map(|info| info.binary.name().to_string())
            .unwrap_or_else(|| "Daemon".to_string())
    }

    /// Probes for the daemon binary once at startup.
    pub async fn init(&mut self) {
        match self.supervisor.detect().await {
            Ok(info) if info.version.is_none() => {
                let name = info.binary.name().to_string();
                self.notifier.notify(Toast::warning_with(
                    "Version not recognized",
                    format!("{name} -v printed no version; see the log for its output"),
                ));
            }
            Ok(_) => {}
            Err(e) => self
                .notifier
                .notify(Toast::error_with("No daemon executable found", e.to_string())),
        }
    }

    /// Dispatches a menu action.
    pub async fn handle(&mut self, action: MenuAction) -> Flow {
        tracing::debug!(?action, "menu action");
        match action {
            MenuAction::Start => self.start().await,
            MenuAction::Stop => self.stop().await,
            MenuAction::Toggle => self.toggle().await,
            MenuAction::OpenDashboard => self.open_dashboard(),
            MenuAction::OpenConfigDir => self.open_config_dir(),
            MenuAction::TestConfig => self.test_config().await,
            MenuAction::Quit => {
                self.shutdown().await;
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    pub async fn start(&mut self) {
        self.check_exit();
        match self.supervisor.start().await {
            Ok(StartOutcome::Started { pid }) => {
                let name = self.daemon_name();
                let version = self
                    .supervisor
                    .info()
                    .map(|info| info.version_label().to_string())
                    .unwrap_or_default();
                self.notifier.notify(Toast::new(
                    ToastKind::Success,
                    format!("{name} started"),
                    Some(format!("{name} {version} (pid {pid})")),
                ));
            }
            Ok(StartOutcome::AlreadyRunning { .. }) => {
                let name = self.daemon_name();
                self.notifier
                    .notify(Toast::info(format!("{name} is already running")));
            }
            Err(e) => self.report("Failed to start daemon", &e),
        }
    }

    pub async fn stop(&mut self) {
        if matches!(self.check_exit(), PollState::Exited { .. }) {
            return;
        }
        let name = self.daemon_name();
        match self.supervisor.stop().await {
            Ok(StopOutcome::Terminated { .. }) => {
                self.notifier.notify(Toast::success(format!("{name} stopped")));
            }
            Ok(StopOutcome::Killed) => {
                self.notifier.notify(Toast::warning_with(
                    format!("{name} stopped"),
                    "it did not exit in time and was killed",
                ));
            }
            Ok(StopOutcome::AlreadyStopped) => {
                self.notifier
                    .notify(Toast::info(format!("{name} is already stopped")));
            }
            Err(e) => self.report("Failed to stop daemon", &e),
        }
    }

    /// Starts when stopped, stops when running.
    ///
    /// A daemon that died since the last tick was still shown as running,
    /// so the toggle only reports the exit.
    pub async fn toggle(&mut self) {
        match self.check_exit() {
            PollState::Running { .. } => self.stop().await,
            PollState::Stopped => self.start().await,
            PollState::Exited { .. } => {}
        }
    }

    pub fn open_dashboard(&mut self) {
        if let Err(e) = self.launcher.open_url(&self.dashboard_url) {
            self.notifier.notify(Toast::error_with(
                "Failed to open dashboard",
                format!("{}: {e}", self.dashboard_url),
            ));
        }
    }

    pub fn open_config_dir(&mut self) {
        let dir = self.config_dir();
        if !dir.is_dir() {
            self.notifier.notify(Toast::warning_with(
                "Failed to open config directory",
                format!("directory does not exist: {}", dir.display()),
            ));
            return;
        }
        if let Err(e) = self.launcher.open_dir(&dir) {
            self.notifier.notify(Toast::error_with(
                "Failed to open config directory",
                format!("{}: {e}", dir.display()),
            ));
        }
    }

    pub async fn test_config(&mut self) {
        match self.supervisor.test_config().await {
            Ok(report) => {
                let summary = report.lines().last().unwrap_or("configuration is valid");
                self.notifier.notify(Toast::new(
                    ToastKind::Success,
                    "Config test passed",
                    Some(summary.to_string()),
                ));
            }
            Err(e) => self.report("Config test failed", &e),
        }
    }

    /// Stops the daemon on the way out. No toast: the tray is going away.
    pub async fn shutdown(&mut self) {
        tracing::info!("shutting down");
        match self.supervisor.stop().await {
            Ok(outcome) => tracing::info!(?outcome, "daemon stopped for exit"),
            Err(e) => tracing::error!("failed to stop daemon on exit: {e}"),
        }
    }

    /// Periodic liveness check. Reports a daemon that died on its own.
    pub fn tick(&mut self) -> TrayStatus {
        let poll = self.check_exit();
        self.status_from(&poll)
    }

    /// Polls the supervisor and warns about an exit nobody asked for.
    fn check_exit(&mut self) -> PollState {
        let poll = self.supervisor.poll();
        if let PollState::Exited { status } = &poll {
            let name = self.daemon_name();
            self.notifier.notify(Toast::warning_with(
                format!("{name} exited unexpectedly"),
                format!("{status}; it was closed outside the tray or crashed"),
            ));
        }
        poll
    }

    fn status_from(&self, poll: &PollState) -> TrayStatus {
        let info = self.supervisor.info();
        let (running, pid, since) = match poll {
            PollState::Running { pid, since } => (true, Some(*pid), Some(*since)),
            PollState::Stopped | PollState::Exited { .. } => (false, None, None),
        };
        TrayStatus {
            binary: info.map(|i| i.binary.name().to_string()),
            version: info.and_then(|i| i.version.clone()),
            running,
            pid,
            since,
        }
    }

    fn report(&mut self, title: &str, err: &SupervisorError) {
        let message = match err {
            // The daemon's own words are more useful than our wrapper text.
            SupervisorError::ExitedEarly { status, output } if !output.is_empty() => {
                format!("{output}\n({status})")
            }
            SupervisorError::ConfigInvalid(report) if !report.is_empty() => report.clone(),
            other => other.to_string(),
        };
        self.notifier.notify(Toast::error_with(title, message));
    }
}
