//! Tray model for clash-tray.
//!
//! Everything the tray shows, independent of the GUI backend:
//! - [`MenuState`]: builds the context menu from the daemon status
//! - [`TrayStatus`]: snapshot rendered into tooltip, header and icon
//! - [`ClickTracker`]: tells a single click from a double click
//! - [`Toast`] / [`Notifier`]: user-visible status messages
//! - [`render_icon`]: built-in running/stopped icons
//!
//! The actual tray (`tray-icon`/`muda` on a `tao` event loop) lives in the
//! application crate and maps these types onto native widgets.

mod click;
mod icon;
mod menu;
mod status;
mod toast;

pub use click::{ClickAction, ClickTracker, DEFAULT_DOUBLE_CLICK};
pub use icon::{IconImage, render_icon};
pub use menu::{MenuAction, MenuItem, MenuState};
pub use status::{NOT_INSTALLED, TrayStatus};
pub use toast::{Notifier, Toast, ToastKind, ToastQueue};
