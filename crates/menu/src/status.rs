use chrono::{DateTime, Local};

use crate::menu::MenuState;

/// Binary label when no daemon executable was found.
pub const NOT_INSTALLED: &str = "daemon not installed";

/// Snapshot of the daemon as shown by the tray.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrayStatus {
    /// Executable name; `None` until one is detected.
    pub binary: Option<String>,
    /// Version token; `None` when unknown.
    pub version: Option<String>,
    pub running: bool,
    pub pid: Option<u32>,
    pub since: Option<DateTime<Local>>,
}

impl TrayStatus {
    pub fn binary_label(&self) -> &str {
        self.binary.as_deref().unwrap_or(NOT_INSTALLED)
    }

    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or("unknown")
    }

    /// Two-line hover text, e.g.
    ///
    /// ```text
    /// mihomo v1.18.5
    /// Running (pid 4242, since 09:15:02)
    /// ```
    pub fn tooltip(&self) -> String {
        let state = match (self.running, self.pid, self.since) {
            (true, Some(pid), Some(since)) => {
                format!("Running (pid {pid}, since {})", since.format("%H:%M:%S"))
            }
            (true, Some(pid), None) => format!("Running (pid {pid})"),
            (true, None, _) => "Running".to_string(),
            (false, ..) => "Stopped".to_string(),
        };
        format!("{} {}\n{state}", self.binary_label(), self.version_label())
    }

    pub fn menu_state(&self) -> MenuState {
        MenuState {
            binary: self.binary_label().to_string(),
            version: self.version_label().to_string(),
            running: self.running,
        }
    }
}
