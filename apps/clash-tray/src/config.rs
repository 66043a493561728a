//! Tray configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/clash-tray/tray.toml`
//! - Windows: `%APPDATA%/clash-tray/tray.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clash_tray_supervisor::{DEFAULT_CANDIDATES, DaemonBinary, SupervisorSettings};
use serde::{Deserialize, Serialize};

/// Tray configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Explicit daemon executable. When set, `candidates` is ignored.
    #[serde(default)]
    pub binary: Option<String>,

    /// Executables probed in order when `binary` is not set.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,

    /// Daemon config directory, passed with `-d`.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Web dashboard opened by a single click or the menu.
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,

    /// Liveness check interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// An exit within this many milliseconds of launch is a failed start.
    #[serde(default = "default_start_grace")]
    pub start_grace_ms: u64,

    /// Seconds to wait after terminate before killing the daemon.
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,

    /// Max delay between the two clicks of a double click.
    #[serde(default = "default_double_click")]
    pub double_click_ms: u64,

    /// Icon files (PNG/ICO) replacing the built-in icons.
    #[serde(default)]
    pub icon_running: Option<PathBuf>,
    #[serde(default)]
    pub icon_stopped: Option<PathBuf>,

    /// Start the daemon as soon as the tray comes up.
    #[serde(default)]
    pub autostart: bool,
}

fn default_candidates() -> Vec<String> {
    DEFAULT_CANDIDATES.iter().map(|c| c.to_string()).collect()
}

fn default_config_dir() -> PathBuf {
    home_dir().join(".config").join("clash")
}

fn default_dashboard_url() -> String {
    "https://d.metacubex.one".into()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_start_grace() -> u64 {
    1000
}

fn default_stop_timeout() -> u64 {
    2
}

fn default_double_click() -> u64 {
    400
}

impl Default for Config {
    fn default() -> Self {
        Self {
            binary: None,
            candidates: default_candidates(),
            config_dir: default_config_dir(),
            dashboard_url: default_dashboard_url(),
            poll_interval_secs: default_poll_interval(),
            start_grace_ms: default_start_grace(),
            stop_timeout_secs: default_stop_timeout(),
            double_click_ms: default_double_click(),
            icon_running: None,
            icon_stopped: None,
            autostart: false,
        }
    }
}

impl Config {
    /// Loads configuration from `path` (or the platform default), creating
    /// a default file if none exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path(),
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("invalid configuration in {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Daemon binaries to probe, in order.
    pub fn daemon_candidates(&self) -> Vec<DaemonBinary> {
        match &self.binary {
            Some(binary) => vec![DaemonBinary::new(binary.clone())],
            None => self.candidates.iter().cloned().map(DaemonBinary::new).collect(),
        }
    }

    pub fn supervisor_settings(&self) -> SupervisorSettings {
        SupervisorSettings {
            candidates: self.daemon_candidates(),
            config_dir: self.config_dir.clone(),
            start_grace: Duration::from_millis(self.start_grace_ms),
            stop_timeout: Duration::from_secs(self.stop_timeout_secs),
        }
    }

    /// Liveness check interval, at least one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn double_click(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }
}

/// Returns the user's home directory.
pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Returns the platform-specific data directory for clash-tray.
pub fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("clash-tray")
    }

    #[cfg(not(target_os = "windows"))]
    {
        home_dir().join(".local").join("share").join("clash-tray")
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("clash-tray").join("tray.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        home_dir()
            .join(".config")
            .join("clash-tray")
            .join("tray.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.binary.is_none());
        assert_eq!(config.candidates.len(), DEFAULT_CANDIDATES.len());
        assert!(config.config_dir.ends_with(".config/clash"));
        assert_eq!(config.dashboard_url, "https://d.metacubex.one");
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.start_grace_ms, 1000);
        assert_eq!(config.stop_timeout_secs, 2);
        assert!(!config.autostart);
    }

    #[test]
    fn config_partial_toml() {
        // Only specify the binary, rest should use defaults.
        let toml_str = r#"binary = "/opt/mihomo/mihomo""#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.binary.as_deref(), Some("/opt/mihomo/mihomo"));
        assert_eq!(config.dashboard_url, "https://d.metacubex.one");
        assert_eq!(config.poll_interval_secs, 5);
    }

    #[test]
    fn explicit_binary_overrides_candidates() {
        let config = Config {
            binary: Some("/opt/mihomo/mihomo".into()),
            ..Config::default()
        };
        let candidates = config.daemon_candidates();
        assert_eq!(candidates, vec![DaemonBinary::new("/opt/mihomo/mihomo")]);
    }

    #[test]
    fn candidates_used_without_binary() {
        let config = Config {
            candidates: vec!["mihomo".into(), "clash".into()],
            ..Config::default()
        };
        let names: Vec<String> = config
            .daemon_candidates()
            .iter()
            .map(|b| b.program().to_string())
            .collect();
        assert_eq!(names, vec!["mihomo", "clash"]);
    }

    #[test]
    fn supervisor_settings_convert_units() {
        let config = Config {
            start_grace_ms: 250,
            stop_timeout_secs: 3,
            ..Config::default()
        };
        let settings = config.supervisor_settings();
        assert_eq!(settings.start_grace, Duration::from_millis(250));
        assert_eq!(settings.stop_timeout, Duration::from_secs(3));
        assert_eq!(settings.config_dir, config.config_dir);
    }

    #[test]
    fn poll_interval_has_floor() {
        let config = Config {
            poll_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn load_creates_default_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("tray.toml");

        let config = Config::load(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(config.poll_interval_secs, 5);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn config_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tray.toml");

        let config = Config {
            binary: Some("mihomo".into()),
            config_dir: PathBuf::from("/srv/clash"),
            autostart: true,
            icon_running: Some(PathBuf::from("/srv/icons/on.png")),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.binary.as_deref(), Some("mihomo"));
        assert_eq!(loaded.config_dir, PathBuf::from("/srv/clash"));
        assert!(loaded.autostart);
        assert_eq!(loaded.icon_running, Some(PathBuf::from("/srv/icons/on.png")));
        assert!(loaded.icon_stopped.is_none());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tray.toml");
        std::fs::write(&path, "poll_interval_secs = \"often\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn config_path_not_empty() {
        let path = config_path();
        assert!(path.to_string_lossy().contains("clash-tray"));
    }
}
