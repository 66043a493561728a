//! Tray icons: user-supplied image files or the built-in discs.

use std::path::Path;

use anyhow::{Context, anyhow};
use clash_tray_menu::{IconImage, render_icon};
use tray_icon::Icon;

use crate::config::Config;

/// Edge length of the built-in icons.
const ICON_SIZE: u32 = 32;

/// Both tray icons, decoded once at startup.
pub struct Icons {
    running: Icon,
    stopped: Icon,
}

impl Icons {
    /// Loads configured icon files, falling back to the built-in icon for
    /// any that is unset or unreadable.
    pub fn load(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            running: pick(config.icon_running.as_deref(), true)?,
            stopped: pick(config.icon_stopped.as_deref(), false)?,
        })
    }

    pub fn for_state(&self, running: bool) -> Icon {
        if running {
            self.running.clone()
        } else {
            self.stopped.clone()
        }
    }
}

fn pick(path: Option<&Path>, running: bool) -> anyhow::Result<Icon> {
    if let Some(path) = path {
        match load_file(path) {
            Ok(icon) => return Ok(icon),
            Err(e) => tracing::warn!("using built-in icon: {e:#}"),
        }
    }
    to_icon(render_icon(running, ICON_SIZE))
}

fn load_file(path: &Path) -> anyhow::Result<Icon> {
    tracing::info!(path = %path.display(), "loading tray icon");
    let image = image::open(path)
        .with_context(|| format!("failed to open icon {}", path.display()))?
        .into_rgba8();
    let (width, height) = image.dimensions();
    to_icon(IconImage {
        rgba: image.into_raw(),
        width,
        height,
    })
}

fn to_icon(image: IconImage) -> anyhow::Result<Icon> {
    Icon::from_rgba(image.rgba, image.width, image.height)
        .map_err(|e| anyhow!("invalid icon bitmap: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_png_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("on.png");
        image::RgbaImage::from_pixel(16, 16, image::Rgba([0, 128, 255, 255]))
            .save(&path)
            .unwrap();

        assert!(load_file(&path).is_ok());
    }

    #[test]
    fn unreadable_file_falls_back_to_builtin() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        assert!(load_file(&path).is_err());
        assert!(pick(Some(&path), true).is_ok());
    }

    #[test]
    fn builtin_icons_without_config() {
        assert!(Icons::load(&Config::default()).is_ok());
    }
}
