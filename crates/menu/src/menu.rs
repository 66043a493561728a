//! Context menu for the system tray.

/// Actions that can be triggered from the tray context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    /// Launch the daemon.
    Start,
    /// Stop the daemon.
    Stop,
    /// Start when stopped, stop when running.
    Toggle,
    /// Open the web dashboard in the default browser.
    OpenDashboard,
    /// Open the daemon config directory in the file manager.
    OpenConfigDir,
    /// Run the daemon's config check.
    TestConfig,
    /// Stop the daemon and quit the tray.
    Quit,
}

/// A single menu item.
#[derive(Debug, Clone)]
pub struct MenuItem {
    /// Display text.
    pub label: String,
    /// Whether the item is enabled (clickable).
    pub enabled: bool,
    /// Optional action triggered on click.
    pub action: Option<MenuAction>,
}

impl MenuItem {
    fn action(label: &str, action: MenuAction, enabled: bool) -> Self {
        Self {
            label: label.into(),
            enabled,
            action: Some(action),
        }
    }

    fn separator() -> Self {
        Self {
            label: String::new(),
            enabled: false,
            action: None,
        }
    }

    /// Separators are disabled, empty, action-less items.
    pub fn is_separator(&self) -> bool {
        self.label.is_empty() && self.action.is_none()
    }
}

/// Current state used to build the context menu.
#[derive(Debug, Clone)]
pub struct MenuState {
    /// Daemon executable name, e.g. `mihomo`.
    pub binary: String,
    /// Daemon version label.
    pub version: String,
    /// Whether the daemon is running.
    pub running: bool,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            binary: crate::NOT_INSTALLED.into(),
            version: "unknown".into(),
            running: false,
        }
    }
}

impl MenuState {
    /// Builds the menu items from the current state.
    pub fn build_menu(&self) -> Vec<MenuItem> {
        let status = if self.running { "Running" } else { "Stopped" };

        vec![
            MenuItem {
                label: format!("{} {} — {status}", self.binary, self.version),
                enabled: false,
                action: None,
            },
            MenuItem::separator(),
            MenuItem::action("Start", MenuAction::Start, !self.running),
            MenuItem::action("Stop", MenuAction::Stop, self.running),
            MenuItem::action("Toggle", MenuAction::Toggle, true),
            MenuItem::separator(),
            MenuItem::action("Open Dashboard", MenuAction::OpenDashboard, true),
            MenuItem::action("Open Config Directory", MenuAction::OpenConfigDir, true),
            MenuItem::action("Test Config", MenuAction::TestConfig, true),
            MenuItem::separator(),
            MenuItem::action("Quit", MenuAction::Quit, true),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(items: &[MenuItem], action: MenuAction) -> &MenuItem {
        items
            .iter()
            .find(|i| i.action == Some(action))
            .unwrap_or_else(|| panic!("missing {action:?}"))
    }

    #[test]
    fn default_menu_state() {
        let state = MenuState::default();
        assert_eq!(state.binary, "daemon not installed");
        assert_eq!(state.version, "unknown");
        assert!(!state.running);
    }

    #[test]
    fn header_shows_binary_version_and_status() {
        let state = MenuState {
            binary: "mihomo".into(),
            version: "v1.18.5".into(),
            running: true,
        };
        let items = state.build_menu();
        assert_eq!(items[0].label, "mihomo v1.18.5 — Running");
        assert!(!items[0].enabled);
        assert!(items[0].action.is_none());
    }

    #[test]
    fn stopped_enables_start_only() {
        let items = MenuState::default().build_menu();
        assert!(items[0].label.ends_with("Stopped"));
        assert!(find(&items, MenuAction::Start).enabled);
        assert!(!find(&items, MenuAction::Stop).enabled);
    }

    #[test]
    fn running_enables_stop_only() {
        let state = MenuState {
            running: true,
            ..MenuState::default()
        };
        let items = state.build_menu();
        assert!(!find(&items, MenuAction::Start).enabled);
        assert!(find(&items, MenuAction::Stop).enabled);
    }

    #[test]
    fn quit_is_last_and_enabled() {
        let items = MenuState::default().build_menu();
        let quit = items.last().unwrap();
        assert_eq!(quit.action, Some(MenuAction::Quit));
        assert!(quit.enabled);
    }

    #[test]
    fn every_action_appears_once() {
        let items = MenuState::default().build_menu();
        for action in [
            MenuAction::Start,
            MenuAction::Stop,
            MenuAction::Toggle,
            MenuAction::OpenDashboard,
            MenuAction::OpenConfigDir,
            MenuAction::TestConfig,
            MenuAction::Quit,
        ] {
            let count = items.iter().filter(|i| i.action == Some(action)).count();
            assert_eq!(count, 1, "{action:?}");
        }
    }

    #[test]
    fn separators_detected() {
        let items = MenuState::default().build_menu();
        assert_eq!(items.iter().filter(|i| i.is_separator()).count(), 3);
        assert!(!items[0].is_separator());
    }
}
