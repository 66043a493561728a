//! Desktop integration: OS notifications and opening URLs/folders.

use std::path::Path;

use clash_tray_menu::{Notifier, Toast, ToastKind};
use notify_rust::{Notification, Timeout};

const APP_NAME: &str = "Clash Tray";

/// Opens URLs and directories with the desktop's default handlers.
pub trait Launcher {
    fn open_url(&mut self, url: &str) -> std::io::Result<()>;
    fn open_dir(&mut self, dir: &Path) -> std::io::Result<()>;
}

/// [`Launcher`] backed by the system opener (`xdg-open`, `start`, `open`).
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn open_url(&mut self, url: &str) -> std::io::Result<()> {
        tracing::info!(url, "opening URL");
        open::that_detached(url)
    }

    fn open_dir(&mut self, dir: &Path) -> std::io::Result<()> {
        tracing::info!(dir = %dir.display(), "opening directory");
        open::that_detached(dir)
    }
}

/// [`Notifier`] showing OS toasts.
///
/// Delivery failures (no notification daemon, denied permission) are logged
/// and otherwise ignored; the toast text always goes to the log as well.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&mut self, toast: Toast) {
        match toast.kind {
            ToastKind::Error => tracing::error!(title = %toast.title, body = %toast.body(), "toast"),
            ToastKind::Warning => tracing::warn!(title = %toast.title, body = %toast.body(), "toast"),
            ToastKind::Success | ToastKind::Info => {
                tracing::info!(title = %toast.title, body = %toast.body(), "toast")
            }
        }

        let result = Notification::new()
            .appname(APP_NAME)
            .summary(&toast.title)
            .body(toast.body())
            .timeout(Timeout::Milliseconds(toast.duration_ms as u32))
            .show();

        if let Err(e) = result {
            tracing::warn!("failed to show notification: {e}");
        }
    }
}
