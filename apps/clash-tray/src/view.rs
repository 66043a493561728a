//! Native tray widgets for the current [`TrayStatus`].

use std::collections::HashMap;

use anyhow::anyhow;
use clash_tray_menu::{MenuAction, MenuState, TrayStatus};
use tray_icon::menu::{Menu, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{TrayIcon, TrayIconBuilder};

use crate::icons::Icons;

/// The tray icon plus handles to the menu items it updates in place.
pub struct TrayView {
    tray: TrayIcon,
    icons: Icons,
    /// Native items in menu order, separators excluded.
    items: Vec<MenuItem>,
    actions: HashMap<MenuId, MenuAction>,
    shown: Option<TrayStatus>,
}

impl TrayView {
    pub fn new(icons: Icons) -> anyhow::Result<Self> {
        let menu = Menu::new();
        let mut items = Vec::new();
        let mut actions = HashMap::new();

        for entry in MenuState::default().build_menu() {
            if entry.is_separator() {
                menu.append(&PredefinedMenuItem::separator())?;
                continue;
            }
            let item = MenuItem::new(&entry.label, entry.enabled, None);
            menu.append(&item)?;
            if let Some(action) = entry.action {
                actions.insert(item.id().clone(), action);
            }
            items.push(item);
        }

        let status = TrayStatus::default();
        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_menu_on_left_click(false)
            .with_tooltip(status.tooltip())
            .with_icon(icons.for_state(false))
            .build()
            .map_err(|e| anyhow!("failed to create tray icon: {e}"))?;

        let mut view = Self {
            tray,
            icons,
            items,
            actions,
            shown: None,
        };
        view.render(&status);
        Ok(view)
    }

    /// Menu action bound to a clicked item, if any.
    pub fn action(&self, id: &MenuId) -> Option<MenuAction> {
        self.actions.get(id).copied()
    }

    /// Pushes `status` into the icon, tooltip and menu. No-op when nothing
    /// changed since the last call.
    pub fn render(&mut self, status: &TrayStatus) {
        if self.shown.as_ref() == Some(status) {
            return;
        }

        let entries = status
            .menu_state()
            .build_menu()
            .into_iter()
            .filter(|entry| !entry.is_separator());
        for (item, entry) in self.items.iter().zip(entries) {
            item.set_text(&entry.label);
            item.set_enabled(entry.enabled);
        }

        let running_changed = self.shown.as_ref().map(|s| s.running) != Some(status.running);
        if running_changed {
            if let Err(e) = self.tray.set_icon(Some(self.icons.for_state(status.running))) {
                tracing::warn!("failed to update tray icon: {e}");
            }
        }
        if let Err(e) = self.tray.set_tooltip(Some(status.tooltip())) {
            tracing::warn!("failed to update tray tooltip: {e}");
        }

        tracing::debug!(running = status.running, pid = ?status.pid, "tray updated");
        self.shown = Some(status.clone());
    }
}
